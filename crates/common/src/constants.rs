//! Shared constants for defi-compare.

/// DefiLlama public API base URL.
pub const DEFILLAMA_API_BASE: &str = "https://api.llama.fi";

/// Source identifier used in errors and logs.
pub const SOURCE_DEFILLAMA: &str = "defillama";

/// Columns the comparison table shows, in display order, when present.
pub const PREFERRED_COLUMNS: &[&str] = &["name", "tvl", "chain", "change_1d", "change_7d", "change_1m"];

/// Keys shown as headline metrics in the detail view; the field list skips them.
pub const HIGHLIGHT_KEYS: &[&str] = &["tvl", "change_1d", "change_7d"];

/// How many protocols are pre-selected when the user picks none.
pub const DEFAULT_SELECTION_COUNT: usize = 5;

/// Request timeout for API calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
