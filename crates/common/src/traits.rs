//! Data source trait: the contract between the core and source modules.
//!
//! The core builds every table and series from a `&dyn ProtocolSource`, so
//! tests and alternative backends plug in without touching the core.

use async_trait::async_trait;

use crate::error::CompareResult;
use crate::types::{CurrentTvl, ProtocolDetail, ProtocolSummary};

#[async_trait]
pub trait ProtocolSource: Send + Sync {
    /// Source identifier (e.g. "defillama").
    fn name(&self) -> &str;

    /// List every tracked protocol.
    async fn protocols(&self) -> CompareResult<Vec<ProtocolSummary>>;

    /// Current TVL for one protocol.
    async fn current_tvl(&self, slug: &str) -> CompareResult<CurrentTvl>;

    /// Detail payload for one protocol, historical TVL included.
    async fn protocol_detail(&self, slug: &str) -> CompareResult<ProtocolDetail>;
}
