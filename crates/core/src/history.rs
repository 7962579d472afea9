//! Historical TVL series builder.
//!
//! Turns the `tvl` array of a protocol detail payload into a date-ordered
//! series with 1-period and 7-period percent changes. A payload without a
//! `tvl` array is `Unavailable`, which the views surface as a warning.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use compare_common::types::{HistoricalPoint, ProtocolDetail};

/// One point of a historical series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: DateTime<Utc>,
    pub tvl: f64,
    /// Percent change vs. the previous point; `None` for the first point or
    /// when the previous value is zero.
    pub change_1d_pct: Option<f64>,
    /// Percent change vs. 7 points back; `None` for the first 7 points or
    /// when that value is zero.
    pub change_7d_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoricalSeries {
    pub points: Vec<SeriesPoint>,
}

impl HistoricalSeries {
    /// Build from raw samples. Samples are sorted by timestamp; samples
    /// whose timestamp is not a representable date are dropped.
    pub fn from_points(mut samples: Vec<HistoricalPoint>) -> Self {
        samples.sort_by_key(|s| s.timestamp);

        let dated: Vec<(DateTime<Utc>, f64)> = samples
            .into_iter()
            .filter_map(|s| DateTime::from_timestamp(s.timestamp, 0).map(|d| (d, s.tvl)))
            .collect();

        let points = dated
            .iter()
            .enumerate()
            .map(|(i, &(date, tvl))| SeriesPoint {
                date,
                tvl,
                change_1d_pct: i.checked_sub(1).and_then(|j| pct_change(dated[j].1, tvl)),
                change_7d_pct: i.checked_sub(7).and_then(|j| pct_change(dated[j].1, tvl)),
            })
            .collect();

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Last `n` points, oldest first.
    pub fn tail(&self, n: usize) -> &[SeriesPoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    /// (min, max) TVL over the series.
    pub fn tvl_bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().map(|p| p.tvl).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Outcome of building a series from a detail payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "series", rename_all = "lowercase")]
pub enum HistoryOutcome {
    Available(HistoricalSeries),
    /// `tvl` missing or not an array.
    Unavailable,
}

impl HistoryOutcome {
    pub fn series(&self) -> Option<&HistoricalSeries> {
        match self {
            HistoryOutcome::Available(s) => Some(s),
            HistoryOutcome::Unavailable => None,
        }
    }
}

/// Build the historical series of a protocol detail payload.
pub fn build_history(detail: &ProtocolDetail) -> HistoryOutcome {
    let Some(Value::Array(entries)) = detail.get("tvl") else {
        return HistoryOutcome::Unavailable;
    };

    let samples: Vec<HistoricalPoint> = entries.iter().filter_map(parse_sample).collect();
    if samples.len() != entries.len() {
        debug!(
            skipped = entries.len() - samples.len(),
            "skipped malformed historical TVL entries"
        );
    }

    HistoryOutcome::Available(HistoricalSeries::from_points(samples))
}

/// `{"date": ts, "totalLiquidityUSD": v}` or `[ts, v]`.
fn parse_sample(entry: &Value) -> Option<HistoricalPoint> {
    let (ts, tvl) = match entry {
        Value::Object(map) => (map.get("date")?, map.get("totalLiquidityUSD")?),
        Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
        _ => return None,
    };

    let timestamp = ts
        .as_i64()
        .or_else(|| ts.as_f64().map(|f| f as i64))
        .or_else(|| ts.as_str().and_then(|s| s.parse().ok()))?;
    let tvl = tvl.as_f64()?;

    Some(HistoricalPoint { timestamp, tvl })
}

/// `(current - base) / base * 100`; `None` when base is zero or not finite.
pub fn pct_change(base: f64, current: f64) -> Option<f64> {
    if base == 0.0 || !base.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - base) / base * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DAY: i64 = 86_400;

    fn detail(v: Value) -> ProtocolDetail {
        serde_json::from_value(v).unwrap()
    }

    fn daily(values: &[f64]) -> Value {
        let start = 1_600_000_000;
        Value::Array(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| json!({"date": start + i as i64 * DAY, "totalLiquidityUSD": v}))
                .collect(),
        )
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_percent_changes() {
        let d = detail(json!({"tvl": daily(&[100.0, 110.0, 90.0, 95.0, 80.0, 70.0, 60.0, 50.0, 300.0])}));
        let series = build_history(&d).series().cloned().unwrap();
        let p = &series.points;
        assert_eq!(p.len(), 9);

        assert_eq!(p[0].change_1d_pct, None);
        assert!(approx(p[1].change_1d_pct, 10.0));
        assert!(approx(p[2].change_1d_pct, -18.181818181818183));

        for point in &p[..7] {
            assert_eq!(point.change_7d_pct, None);
        }
        assert!(approx(p[7].change_7d_pct, -50.0));
        assert!(approx(p[8].change_7d_pct, (300.0 - 110.0) / 110.0 * 100.0));
        assert!(approx(p[8].change_7d_pct, 172.72727272727272));
    }

    #[test]
    fn test_unavailable_shapes() {
        assert_eq!(build_history(&detail(json!({"tvl": "not-a-list"}))), HistoryOutcome::Unavailable);
        assert_eq!(build_history(&detail(json!({}))), HistoryOutcome::Unavailable);
        assert_eq!(build_history(&detail(json!({"tvl": {"a": 1}}))), HistoryOutcome::Unavailable);
    }

    #[test]
    fn test_empty_array_is_available_and_empty() {
        let outcome = build_history(&detail(json!({"tvl": []})));
        assert!(outcome.series().unwrap().is_empty());
    }

    #[test]
    fn test_zero_base_does_not_fail_series() {
        let d = detail(json!({"tvl": daily(&[0.0, 50.0, 75.0])}));
        let series = build_history(&d).series().cloned().unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.points[1].change_1d_pct, None);
        assert!(approx(series.points[2].change_1d_pct, 50.0));
    }

    #[test]
    fn test_zero_base_seven_back_keeps_one_day_change() {
        let d = detail(json!({"tvl": [
            [1, 0.0], [2, 1.0], [3, 1.0], [4, 1.0], [5, 1.0], [6, 1.0], [7, 1.0], [8, 5.0],
        ]}));
        let series = build_history(&d).series().cloned().unwrap();
        assert_eq!(series.len(), 8);
        assert_eq!(series.points[7].change_7d_pct, None);
        assert!(approx(series.points[7].change_1d_pct, 400.0));
    }

    #[test]
    fn test_pair_entries_and_sorting() {
        let d = detail(json!({"tvl": [[1_600_172_800, 30.0], [1_600_000_000, 10.0], [1_600_086_400, 20.0]]}));
        let series = build_history(&d).series().cloned().unwrap();
        let tvls: Vec<f64> = series.points.iter().map(|p| p.tvl).collect();
        assert_eq!(tvls, vec![10.0, 20.0, 30.0]);
        assert!(approx(series.points[1].change_1d_pct, 100.0));
        assert_eq!(crate::fmt::format_date(&series.points[0].date), "2020-09-13");
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let d = detail(json!({"tvl": [
            {"date": 1_600_000_000, "totalLiquidityUSD": 5.0},
            {"date": 1_600_086_400},
            "garbage",
            {"date": "1600172800", "totalLiquidityUSD": 10},
        ]}));
        let series = build_history(&d).series().cloned().unwrap();
        assert_eq!(series.len(), 2);
        assert!(approx(series.points[1].change_1d_pct, 100.0));
    }

    #[test]
    fn test_tail_latest_and_bounds() {
        let d = detail(json!({"tvl": daily(&[5.0, 1.0, 9.0, 3.0])}));
        let series = build_history(&d).series().cloned().unwrap();
        assert_eq!(series.tail(2).len(), 2);
        assert_eq!(series.tail(2)[0].tvl, 9.0);
        assert_eq!(series.tail(10).len(), 4);
        assert_eq!(series.latest().map(|p| p.tvl), Some(3.0));
        assert_eq!(series.tvl_bounds(), Some((1.0, 9.0)));
        assert_eq!(HistoricalSeries::default().tvl_bounds(), None);
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(0.0, 10.0), None);
        assert_eq!(pct_change(f64::NAN, 10.0), None);
        assert!(approx(pct_change(200.0, 100.0), -50.0));
    }
}
