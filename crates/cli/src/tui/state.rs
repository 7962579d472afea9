use compare_common::traits::ProtocolSource;
use compare_common::types::ProtocolSummary;
use compare_core::config::{AppConfig, DashboardConfig};
use compare_core::dashboard::{
    detail_without_history, load_detail, load_overview, load_protocol_list, DetailView, Notice,
    Overview,
};

use crate::factory;

pub const TAB_PROTOCOLS: usize = 0;
pub const TAB_COMPARE: usize = 1;
pub const TAB_DETAIL: usize = 2;

/// All data the TUI needs to render: fetched through a `ProtocolSource`.
pub struct App {
    /// Active tab index.
    pub tab: usize,
    /// Tab names.
    pub tabs: Vec<&'static str>,
    /// Show help overlay.
    pub show_help: bool,
    /// Scroll offset for the detail field list.
    pub scroll: u16,

    pub config: DashboardConfig,
    pub api_url: String,
    source: Option<Box<dyn ProtocolSource>>,

    // ── Protocol picker ─────────────────────────────────────────
    pub overview: Overview,
    /// Picked names, in the order they were picked.
    pub picked: Vec<String>,
    /// Picker cursor into `overview.protocols`.
    pub cursor: usize,
    /// The first refresh seeds `picked` with the top protocols.
    seeded: bool,

    // ── Detail ──────────────────────────────────────────────────
    /// Index into `overview.selected` shown on the detail tab.
    pub detail_index: usize,
    pub detail: Option<DetailView>,
    pub show_history: bool,

    // ── Status ──────────────────────────────────────────────────
    pub last_error: Option<String>,
    pub last_refresh: String,
}

impl App {
    /// Create a new App from the loaded config and attempt initial fetch.
    pub async fn new(config: &AppConfig) -> Self {
        let (source, error) = match factory::from_config(config) {
            Ok(source) => (Some(source), None),
            Err(e) => (None, Some(format!("{e:#}"))),
        };

        let mut app = Self::with_source(config, source);
        app.last_error = error;
        app.refresh().await;
        app
    }

    /// App with no data loaded yet.
    pub fn with_source(config: &AppConfig, source: Option<Box<dyn ProtocolSource>>) -> Self {
        Self {
            tab: TAB_PROTOCOLS,
            tabs: vec!["Protocols", "Compare", "Detail"],
            show_help: false,
            scroll: 0,

            config: config.dashboard.clone(),
            api_url: config.system.api_url.clone(),
            source,

            overview: Overview::default(),
            picked: Vec::new(),
            cursor: 0,
            seeded: false,

            detail_index: 0,
            detail: None,
            show_history: false,

            last_error: None,
            last_refresh: String::from("never"),
        }
    }

    /// Re-fetch the protocol list and the open detail. Non-fatal: failures
    /// land in the overview's notices.
    pub async fn refresh(&mut self) {
        let Some(source) = self.source.as_deref() else {
            return;
        };

        self.overview = if self.seeded {
            match load_protocol_list(source).await {
                Ok(protocols) => Overview::build(protocols, &self.config, &self.picked),
                Err(notice) => Overview {
                    notices: vec![notice],
                    ..Overview::default()
                },
            }
        } else {
            let overview = load_overview(source, &self.config, &[]).await;
            if !overview.protocols.is_empty() {
                self.picked = overview.selection.clone();
                self.seeded = true;
            }
            overview
        };

        self.last_error = self.overview.notices.iter().find_map(|n| match n.level {
            compare_core::NoticeLevel::Error => Some(n.message.clone()),
            _ => None,
        });
        self.last_refresh = chrono::Local::now().format("%H:%M:%S").to_string();
        self.clamp_cursors();

        if self.detail.is_some() || self.tab == TAB_DETAIL {
            self.load_detail().await;
        }
    }

    // ── Picker ──────────────────────────────────────────────────

    /// Protocol under the picker cursor.
    pub fn cursor_protocol(&self) -> Option<&ProtocolSummary> {
        self.overview.protocols.get(self.cursor)
    }

    /// Add or remove the protocol under the cursor and rebuild the
    /// comparison from the list already fetched.
    pub fn toggle_pick(&mut self) {
        let Some(name) = self.cursor_protocol().and_then(ProtocolSummary::name) else {
            return;
        };
        let name = name.to_string();
        if let Some(pos) = self.picked.iter().position(|p| *p == name) {
            self.picked.remove(pos);
        } else {
            self.picked.push(name);
        }
        self.rebuild();
    }

    pub fn clear_picks(&mut self) {
        self.picked.clear();
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let protocols = std::mem::take(&mut self.overview.protocols);
        self.overview = Overview::build(protocols, &self.config, &self.picked);
        self.clamp_cursors();
        self.detail = None;
    }

    fn clamp_cursors(&mut self) {
        self.cursor = self.cursor.min(self.overview.protocols.len().saturating_sub(1));
        self.detail_index = self
            .detail_index
            .min(self.overview.selected.len().saturating_sub(1));
    }

    // ── Detail ──────────────────────────────────────────────────

    pub fn detail_protocol(&self) -> Option<&ProtocolSummary> {
        self.overview.selected.get(self.detail_index)
    }

    /// Build the detail view of the current protocol, fetching history only
    /// when it is toggled on.
    pub async fn load_detail(&mut self) {
        let Some(protocol) = self.detail_protocol().cloned() else {
            self.detail = None;
            return;
        };
        self.scroll = 0;
        self.detail = Some(match self.source.as_deref() {
            Some(source) => load_detail(source, &self.config, &protocol, self.show_history).await,
            None => detail_without_history(&self.config, &protocol),
        });
    }

    pub async fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
        self.load_detail().await;
    }

    pub async fn next_detail(&mut self) {
        if self.detail_index + 1 < self.overview.selected.len() {
            self.detail_index += 1;
            self.load_detail().await;
        }
    }

    pub async fn prev_detail(&mut self) {
        if self.detail_index > 0 {
            self.detail_index -= 1;
            self.load_detail().await;
        }
    }

    /// Notices of the view on the active tab.
    pub fn notices(&self) -> Vec<&Notice> {
        let mut notices: Vec<&Notice> = self.overview.notices.iter().collect();
        if self.tab == TAB_DETAIL {
            if let Some(detail) = &self.detail {
                notices.extend(detail.notices.iter());
            }
        }
        notices
    }

    // ── Navigation ──────────────────────────────────────────────

    pub async fn set_tab(&mut self, idx: usize) {
        if idx < self.tabs.len() {
            self.tab = idx;
            if idx == TAB_DETAIL && self.detail.is_none() {
                self.load_detail().await;
            }
        }
    }

    pub async fn next_tab(&mut self) {
        self.set_tab((self.tab + 1) % self.tabs.len()).await;
    }

    pub async fn prev_tab(&mut self) {
        let idx = if self.tab == 0 { self.tabs.len() - 1 } else { self.tab - 1 };
        self.set_tab(idx).await;
    }

    pub fn scroll_up(&mut self) {
        if self.tab == TAB_PROTOCOLS {
            self.cursor = self.cursor.saturating_sub(1);
        } else {
            self.scroll = self.scroll.saturating_sub(1);
        }
    }

    pub fn scroll_down(&mut self) {
        if self.tab == TAB_PROTOCOLS {
            if self.cursor + 1 < self.overview.protocols.len() {
                self.cursor += 1;
            }
        } else {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use compare_common::error::{CompareError, CompareResult};
    use compare_common::types::{CurrentTvl, ProtocolDetail};
    use compare_core::history::HistoryOutcome;
    use serde_json::json;

    struct StaticSource {
        count: usize,
        fail: bool,
    }

    #[async_trait]
    impl ProtocolSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn protocols(&self) -> CompareResult<Vec<ProtocolSummary>> {
            if self.fail {
                return Err(CompareError::Network("connection refused".into()));
            }
            Ok((0..self.count)
                .map(|i| {
                    serde_json::from_value(json!({
                        "name": format!("P{i}"),
                        "slug": format!("p{i}"),
                        "tvl": 100.0 * (self.count - i) as f64,
                    }))
                    .unwrap()
                })
                .collect())
        }

        async fn current_tvl(&self, slug: &str) -> CompareResult<CurrentTvl> {
            Ok(CurrentTvl {
                slug: slug.into(),
                total_liquidity_usd: 1.0,
            })
        }

        async fn protocol_detail(&self, _slug: &str) -> CompareResult<ProtocolDetail> {
            Ok(serde_json::from_value(json!({"tvl": [[1_600_000_000, 1.0], [1_600_086_400, 2.0]]})).unwrap())
        }
    }

    async fn app(count: usize, fail: bool) -> App {
        let mut app = App::with_source(
            &AppConfig::default(),
            Some(Box::new(StaticSource { count, fail })),
        );
        app.refresh().await;
        app
    }

    #[tokio::test]
    async fn test_first_refresh_seeds_top_five() {
        let app = app(8, false).await;
        assert_eq!(app.picked, vec!["P0", "P1", "P2", "P3", "P4"]);
        assert_eq!(app.overview.selected.len(), 5);
        assert!(app.last_error.is_none());
        assert_ne!(app.last_refresh, "never");
    }

    #[tokio::test]
    async fn test_toggle_pick_keeps_pick_order() {
        let mut app = app(8, false).await;
        app.clear_picks();
        assert!(app.overview.table.is_none());

        app.cursor = 6;
        app.toggle_pick();
        app.cursor = 2;
        app.toggle_pick();
        let rows: Vec<_> = app.overview.selected.iter().filter_map(ProtocolSummary::name).collect();
        assert_eq!(rows, vec!["P6", "P2"]);

        app.toggle_pick();
        assert_eq!(app.picked, vec!["P6"]);
    }

    #[tokio::test]
    async fn test_refresh_after_clearing_stays_empty() {
        let mut app = app(3, false).await;
        app.clear_picks();
        app.refresh().await;
        assert!(app.picked.is_empty());
        assert!(app.overview.selected.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_sets_error() {
        let app = app(3, true).await;
        assert!(app.overview.protocols.is_empty());
        assert!(app.last_error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_detail_and_history_toggle() {
        let mut app = app(3, false).await;
        app.set_tab(TAB_DETAIL).await;
        assert_eq!(app.detail.as_ref().unwrap().name, "P0");
        assert!(app.detail.as_ref().unwrap().history.is_none());

        app.toggle_history().await;
        let history = app.detail.as_ref().unwrap().history.as_ref().unwrap();
        assert_eq!(history.series().map(|s| s.len()), Some(2));
        assert!(matches!(history, HistoryOutcome::Available(_)));

        app.next_detail().await;
        assert_eq!(app.detail.as_ref().unwrap().name, "P1");
        app.prev_detail().await;
        app.prev_detail().await;
        assert_eq!(app.detail_index, 0);
    }

    #[tokio::test]
    async fn test_new_reports_source_error_from_given_config() {
        let mut config = AppConfig::default();
        config.system.api_url = "not a url".into();
        let app = App::new(&config).await;
        assert_eq!(app.api_url, "not a url");
        assert!(app.source.is_none());
        assert!(app.last_error.is_some());
        assert!(app.overview.protocols.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_bounds() {
        let mut app = app(2, false).await;
        app.scroll_up();
        assert_eq!(app.cursor, 0);
        app.scroll_down();
        app.scroll_down();
        assert_eq!(app.cursor, 1);
    }
}
