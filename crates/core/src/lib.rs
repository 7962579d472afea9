pub mod config;
pub mod dashboard;
pub mod fmt;
pub mod history;
pub mod normalize;
pub mod output;
pub mod table;
pub mod workspace;

pub use config::{AppConfig, DashboardConfig, SystemConfig};
pub use dashboard::{load_detail, load_histories, load_live_tvl, load_overview, Notice, NoticeLevel};
pub use table::SelectionOrder;
pub use workspace::init_workspace;
