//! DefiLlama REST client.
//!
//! Three read-only endpoints:
//! - `GET /protocols`       : every tracked protocol with current TVL
//! - `GET /tvl/{slug}`      : current TVL of one protocol
//! - `GET /protocol/{slug}` : detail payload with historical TVL under `tvl`
//!
//! A non-success status is reported as `CompareError::Fetch` and never
//! retried. Body shape is only checked at the top level; field-level shape
//! is left to the core.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use compare_common::constants::SOURCE_DEFILLAMA;
use compare_common::error::{CompareError, CompareResult};
use compare_common::traits::ProtocolSource;
use compare_common::types::{CurrentTvl, ProtocolDetail, ProtocolSummary};

/// DefiLlama data source.
pub struct DefiLlamaModule {
    /// HTTP client for API calls.
    http: reqwest::Client,
    /// API root, e.g. `https://api.llama.fi`.
    base_url: Url,
}

impl DefiLlamaModule {
    pub fn new(base_url: &str, timeout: Duration) -> CompareResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CompareError::Config(format!("Invalid API URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CompareError::Config(format!(
                "API URL '{base_url}' cannot carry a path"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompareError::Config(format!("Failed to build HTTP client: {e}")))?;

        info!(base_url = %base_url, "DefiLlama module initialized");

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a JSON endpoint.
    async fn get_json(&self, segments: &[&str]) -> CompareResult<(String, Value)> {
        let url = self.endpoint(segments);
        let endpoint = url.path().to_string();
        debug!(%url, "GET");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CompareError::Network(format!("{endpoint}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CompareError::Fetch {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = resp.json::<Value>().await.map_err(|e| CompareError::Payload {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        Ok((endpoint, body))
    }
}

#[async_trait]
impl ProtocolSource for DefiLlamaModule {
    fn name(&self) -> &str {
        SOURCE_DEFILLAMA
    }

    async fn protocols(&self) -> CompareResult<Vec<ProtocolSummary>> {
        let (endpoint, body) = self.get_json(&["protocols"]).await?;
        let protocols = parse_protocols(&endpoint, body)?;
        debug!(count = protocols.len(), "protocol list fetched");
        Ok(protocols)
    }

    async fn current_tvl(&self, slug: &str) -> CompareResult<CurrentTvl> {
        let (endpoint, body) = self.get_json(&["tvl", slug]).await?;
        parse_current_tvl(&endpoint, slug, &body)
    }

    async fn protocol_detail(&self, slug: &str) -> CompareResult<ProtocolDetail> {
        let (endpoint, body) = self.get_json(&["protocol", slug]).await?;
        parse_detail(&endpoint, body)
    }
}

/// `/protocols` must be an array; non-object entries are dropped.
fn parse_protocols(endpoint: &str, body: Value) -> CompareResult<Vec<ProtocolSummary>> {
    let Value::Array(items) = body else {
        return Err(CompareError::Payload {
            endpoint: endpoint.into(),
            message: "expected a JSON array of protocols".into(),
        });
    };

    let total = items.len();
    let protocols: Vec<ProtocolSummary> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(ProtocolSummary::from_map(map)),
            _ => None,
        })
        .collect();

    if protocols.len() != total {
        debug!(dropped = total - protocols.len(), "skipped non-object protocol entries");
    }
    Ok(protocols)
}

/// `/tvl/{slug}` answers a bare number; `{"totalLiquidityUSD": n}` is accepted too.
fn parse_current_tvl(endpoint: &str, slug: &str, body: &Value) -> CompareResult<CurrentTvl> {
    let value = match body {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("totalLiquidityUSD").and_then(Value::as_f64),
        _ => None,
    };

    value
        .map(|total_liquidity_usd| CurrentTvl {
            slug: slug.to_string(),
            total_liquidity_usd,
        })
        .ok_or_else(|| CompareError::Payload {
            endpoint: endpoint.into(),
            message: "expected a number or an object with totalLiquidityUSD".into(),
        })
}

fn parse_detail(endpoint: &str, body: Value) -> CompareResult<ProtocolDetail> {
    match body {
        Value::Object(map) => Ok(ProtocolDetail::from_map(map)),
        _ => Err(CompareError::Payload {
            endpoint: endpoint.into(),
            message: "expected a JSON object".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on an ephemeral port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    fn module(base: &str) -> DefiLlamaModule {
        DefiLlamaModule::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let m = module("https://api.llama.fi");
        assert_eq!(m.endpoint(&["protocols"]).as_str(), "https://api.llama.fi/protocols");
        assert_eq!(m.endpoint(&["tvl", "aave"]).as_str(), "https://api.llama.fi/tvl/aave");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let m = module("http://localhost:8080/llama/");
        assert_eq!(
            m.endpoint(&["protocol", "uniswap-v3"]).as_str(),
            "http://localhost:8080/llama/protocol/uniswap-v3"
        );
    }

    #[test]
    fn test_endpoint_encodes_slug() {
        let m = module("https://api.llama.fi");
        assert_eq!(m.endpoint(&["tvl", "a b"]).as_str(), "https://api.llama.fi/tvl/a%20b");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = DefiLlamaModule::new("not a url", Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, CompareError::Config(_)));
        let err = DefiLlamaModule::new("mailto:ops@example.com", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, CompareError::Config(_)));
    }

    #[test]
    fn test_parse_protocols_skips_non_objects() {
        let body = json!([{"name": "Aave", "slug": "aave"}, 7, "x", {"name": "Lido"}]);
        let list = parse_protocols("/protocols", body).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].name(), Some("Lido"));
    }

    #[test]
    fn test_parse_protocols_rejects_object() {
        let err = parse_protocols("/protocols", json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, CompareError::Payload { .. }));
    }

    #[test]
    fn test_parse_current_tvl_shapes() {
        let bare = parse_current_tvl("/tvl/aave", "aave", &json!(1234.5)).unwrap();
        assert_eq!(bare.total_liquidity_usd, 1234.5);
        let wrapped =
            parse_current_tvl("/tvl/aave", "aave", &json!({"totalLiquidityUSD": 99})).unwrap();
        assert_eq!(wrapped.total_liquidity_usd, 99.0);
        assert_eq!(wrapped.slug, "aave");
        assert!(parse_current_tvl("/tvl/aave", "aave", &json!("1")).is_err());
    }

    #[test]
    fn test_parse_detail_requires_object() {
        assert!(parse_detail("/protocol/aave", json!({"tvl": []})).is_ok());
        assert!(parse_detail("/protocol/aave", json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn test_non_success_is_fetch_failure() {
        let base = serve_once("503 Service Unavailable", "").await;
        let err = module(&base).protocols().await.unwrap_err();
        match err {
            CompareError::Fetch { endpoint, status } => {
                assert_eq!(endpoint, "/protocols");
                assert_eq!(status, 503);
            }
            other => panic!("expected fetch failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_protocols_over_http() {
        let base = serve_once("200 OK", r#"[{"name":"Aave","slug":"aave","tvl":10}]"#).await;
        let list = module(&base).protocols().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].tvl(), Some(10.0));
    }

    #[tokio::test]
    async fn test_current_tvl_over_http() {
        let base = serve_once("200 OK", "5000000.25").await;
        let tvl = module(&base).current_tvl("aave").await.unwrap();
        assert_eq!(tvl.total_liquidity_usd, 5_000_000.25);
    }
}
