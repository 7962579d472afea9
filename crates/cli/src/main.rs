mod commands;
mod factory;
mod tui;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use compare_common::error::CompareError;
use compare_core::output::OutputFormat;
use compare_core::table::SelectionOrder;

#[derive(Parser)]
#[command(
    name = "defi-compare",
    about = "DeFi protocol comparison dashboard.\nCompare TVL and recent changes across protocols, drill into one protocol, plot its history.",
    version,
    propagate_version = true
)]
struct Cli {
    #[arg(long, short = 'o', global = true, default_value = "table")]
    output: CliOutputFormat,

    /// Debug logging on stderr (overrides config; RUST_LOG wins over both).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat { Table, Json, JsonPretty }

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> OutputFormat {
        match f {
            CliOutputFormat::Table => OutputFormat::Table,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOrder { Selection, Source }

impl From<CliOrder> for SelectionOrder {
    fn from(o: CliOrder) -> SelectionOrder {
        match o {
            CliOrder::Selection => SelectionOrder::Selection,
            CliOrder::Source => SelectionOrder::Source,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  TOP-LEVEL
// ═══════════════════════════════════════════════════════════════════════

#[derive(Subcommand)]
enum Commands {
    // ── DASHBOARD ───────────────────────────────────────────────

    /// List every protocol the source knows about.
    Protocols {
        /// Show at most N rows.
        #[arg(long)]
        limit: Option<usize>,
        /// Only protocols whose primary chain matches (case-insensitive).
        #[arg(long)]
        chain: Option<String>,
    },

    /// Compare protocols side by side (top protocols when none given).
    ///
    /// Unknown names are reported as warnings and the remaining names are
    /// still compared. `detail` takes a single name and exits with an error
    /// when it is unknown.
    Compare {
        /// Protocol names or slugs, in selection order.
        names: Vec<String>,
        /// Row order of the comparison table (defaults to config).
        #[arg(long)]
        order: Option<CliOrder>,
        /// Also fetch the current TVL of each selected protocol.
        #[arg(long)]
        live: bool,
    },

    /// Show one protocol in depth.
    Detail {
        /// Protocol name or slug.
        name: String,
        /// Include the historical TVL series.
        #[arg(long)]
        history: bool,
        /// History points shown in table mode (defaults to config).
        #[arg(long)]
        tail: Option<usize>,
    },

    /// Historical TVL with 1d/7d percent changes.
    History {
        /// Protocol names or slugs.
        #[arg(required = true)]
        names: Vec<String>,
        /// Points shown per protocol in table mode (defaults to config).
        #[arg(long)]
        tail: Option<usize>,
    },

    /// Launch interactive Terminal UI.
    Tui,

    // ── SETTINGS ────────────────────────────────────────────────

    /// Configure the data source and the dashboard.
    Configure {
        #[command(subcommand)]
        action: ConfigureAction,
    },
}

#[derive(Subcommand)]
enum ConfigureAction {
    /// Show all current configuration.
    Show,
    /// Set the API root URL.
    ApiUrl { url: String },
    /// Set the request timeout in seconds.
    Timeout { secs: u64 },
    /// Toggle verbose mode.
    Verbose { enabled: bool },
    /// Set the comparison row order.
    Order { value: CliOrder },
    /// Set how many top protocols are pre-selected.
    DefaultCount { n: usize },
    /// Set the preferred comparison columns, in display order.
    Columns {
        #[arg(required = true)]
        columns: Vec<String>,
    },
    /// Set the keys shown as headline metrics in the detail view.
    Highlight {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Set how many history points table mode shows.
    HistoryTail { n: usize },
    /// Restore every default.
    Reset,
}

// ═══════════════════════════════════════════════════════════════════════
//  ENTRYPOINT
// ═══════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let fmt: OutputFormat = cli.output.into();

    match run(cli, fmt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, fmt);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli, fmt: OutputFormat) -> Result<()> {
    compare_core::init_workspace()?;
    let config = compare_core::workspace::load_config()?;

    // The TUI owns the terminal; log lines would tear the frame.
    if !matches!(cli.command, Commands::Tui) {
        init_tracing(cli.verbose || config.system.verbose);
    }

    match cli.command {
        Commands::Protocols { limit, chain } => {
            commands::protocols::run(&config, limit, chain.as_deref(), fmt).await
        }
        Commands::Compare { names, order, live } => {
            commands::compare::run(&config, &names, order.map(Into::into), live, fmt).await
        }
        Commands::Detail { name, history, tail } => {
            commands::detail::run(&config, &name, history, tail, fmt).await
        }
        Commands::History { names, tail } => {
            commands::history::run(&config, &names, tail, fmt).await
        }
        Commands::Tui => tui::run(config).await,

        Commands::Configure { action } => match action {
            ConfigureAction::Show => commands::configure::show(fmt),
            ConfigureAction::ApiUrl { url } => commands::configure::set_api_url(&url, fmt),
            ConfigureAction::Timeout { secs } => commands::configure::set_timeout(secs, fmt),
            ConfigureAction::Verbose { enabled } => commands::configure::set_verbose(enabled, fmt),
            ConfigureAction::Order { value } => commands::configure::set_order(value.into(), fmt),
            ConfigureAction::DefaultCount { n } => commands::configure::set_default_count(n, fmt),
            ConfigureAction::Columns { columns } => commands::configure::set_columns(&columns, fmt),
            ConfigureAction::Highlight { keys } => commands::configure::set_highlight(&keys, fmt),
            ConfigureAction::HistoryTail { n } => commands::configure::set_history_tail(n, fmt),
            ConfigureAction::Reset => commands::configure::reset(fmt),
        },
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit code of the error's category; 1 for anything untyped.
fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<CompareError>()
        .map_or(1, |c| u8::try_from(c.exit_code()).unwrap_or(1))
}

/// JSON modes get the `{"ok":false,"error":...}` envelope on stdout so
/// scripts can parse failures; table mode prints to stderr.
fn report_error(e: &anyhow::Error, fmt: OutputFormat) {
    let json = match e.downcast_ref::<CompareError>() {
        Some(c) => c.to_json(),
        None => serde_json::json!({
            "ok": false,
            "error": { "code": "ERROR", "message": format!("{e:#}") },
        }),
    };

    match fmt {
        OutputFormat::Table => eprintln!("Error: {e:#}"),
        OutputFormat::Json => println!("{json}"),
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_category() {
        let network: anyhow::Error = CompareError::Fetch {
            endpoint: "/protocols".into(),
            status: 503,
        }
        .into();
        assert_eq!(exit_code(&network), 2);

        let unknown: anyhow::Error = CompareError::UnknownProtocol("Nope".into()).into();
        assert_eq!(exit_code(&unknown), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_cli_parses_compare() {
        let cli = Cli::try_parse_from([
            "defi-compare", "-o", "json", "compare", "Aave", "Lido", "--order", "source", "--live",
        ])
        .unwrap();
        assert!(matches!(cli.output, CliOutputFormat::Json));
        match cli.command {
            Commands::Compare { names, order, live } => {
                assert_eq!(names, vec!["Aave", "Lido"]);
                assert!(matches!(order, Some(CliOrder::Source)));
                assert!(live);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_compare_help_explains_unknown_names() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let compare = cmd.find_subcommand("compare").unwrap();
        let help = compare.get_long_about().unwrap().to_string();
        assert!(help.contains("Unknown names are reported as warnings"));
        assert!(help.contains("`detail`"));
    }

    #[test]
    fn test_history_requires_names() {
        assert!(Cli::try_parse_from(["defi-compare", "history"]).is_err());
    }
}
