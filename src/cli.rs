//! `trade-journal` command line.
//!
//! Commands run against the cloud journal of the signed-in user, or against
//! the local database with `--demo`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::GeminiClient;
use crate::commands::{self, TradeEdit};
use crate::config::JournalConfig;
use crate::error::JournalError;
use crate::journal::Journal;
use crate::models::{TradeFilters, TradeFormData, TradeType};
use crate::store::{CloudStore, LocalStore, TradeStore};

#[derive(Parser)]
#[command(
    name = "trade-journal",
    version,
    about = "Personal trading journal with P&L statistics, cloud sync and an offline demo mode"
)]
struct Cli {
    /// Use the local offline database instead of the cloud account.
    #[arg(long, global = true, default_value_t = false)]
    demo: bool,

    /// Data directory. Defaults to $TRADE_JOURNAL_HOME or ~/.trade-journal.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session.
    Logout,
    /// Log a new trade.
    Add(NewTrade),
    /// Change fields of an existing trade; P&L is recomputed.
    Edit {
        id: String,
        #[command(flatten)]
        changes: TradeEdit,
    },
    /// Delete a trade.
    Delete { id: String },
    /// List trades, newest first.
    List(FilterArgs),
    /// Show statistics for the filtered trades.
    Stats {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Daily and cumulative P&L.
    Curve(FilterArgs),
    /// Per-strategy results.
    Breakdown(FilterArgs),
    /// Export the filtered trades as CSV.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file or directory. Defaults to trading_journal_<date>.csv.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Full JSON backup and restore.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// AI review of the filtered trades.
    Analyze(FilterArgs),
    /// Show or set the baseline capital.
    Capital { amount: Option<f64> },
    /// Show or update the profile.
    Profile {
        #[arg(long)]
        name: Option<String>,
        /// Image file to upload, or an image URL.
        #[arg(long)]
        photo: Option<String>,
    },
    /// List strategies, or add a custom one.
    Strategies {
        #[arg(long)]
        add: Option<String>,
    },
    /// Position size for a given risk.
    Risk {
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        stop_loss: f64,
        /// Percent of capital to risk.
        #[arg(long, default_value_t = 1.0)]
        risk: f64,
        /// Capital to size against. Defaults to the journal's baseline capital.
        #[arg(long)]
        capital: Option<f64>,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write every trade and the settings to a JSON file.
    Export { path: PathBuf },
    /// Restore a JSON backup, replacing trades with the same id.
    Import { path: PathBuf },
}

#[derive(Args, Debug, Default, Clone)]
struct FilterArgs {
    /// Only trades on this day (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,
    /// Only trades with exactly this strategy.
    #[arg(long)]
    strategy: Option<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Result<TradeFilters, JournalError> {
        TradeFilters::new(self.date.as_deref(), self.strategy.as_deref())
    }
}

#[derive(Args, Debug, Clone)]
struct NewTrade {
    #[arg(long)]
    symbol: String,
    /// YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,
    /// HH:MM
    #[arg(long, default_value = "")]
    time: String,
    /// LONG or SHORT
    #[arg(long = "type", default_value = "LONG")]
    trade_type: TradeType,
    #[arg(long)]
    entry: String,
    #[arg(long)]
    exit: String,
    #[arg(long)]
    qty: String,
    #[arg(long, default_value = "")]
    strategy: String,
    #[arg(long, default_value = "")]
    notes: String,
}

impl From<NewTrade> for TradeFormData {
    fn from(t: NewTrade) -> Self {
        TradeFormData {
            symbol: t.symbol,
            date: t
                .date
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
            time: t.time,
            trade_type: t.trade_type,
            entry: t.entry,
            exit: t.exit,
            qty: t.qty,
            strategy: t.strategy,
            notes: t.notes,
        }
    }
}

/// Entry point for the binary
pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(execute(cli))
}

async fn open_journal(config: &JournalConfig, demo: bool) -> Result<Journal> {
    config.ensure_data_dir()?;
    let store: Box<dyn TradeStore> = if demo {
        Box::new(LocalStore::open(&config.database_path())?)
    } else {
        Box::new(CloudStore::from_saved_session(config)?)
    };
    Ok(Journal::open(store).await?)
}

async fn filtered_journal(config: &JournalConfig, demo: bool, filters: &FilterArgs) -> Result<Journal> {
    let filters = filters.to_filters()?;
    let mut journal = open_journal(config, demo).await?;
    journal.set_filters(filters);
    Ok(journal)
}

async fn execute(cli: Cli) -> Result<()> {
    let config = JournalConfig::load(cli.data_dir)?;
    let demo = cli.demo;

    match cli.command {
        Commands::Login { email, password } => {
            let profile = commands::login(&config, &email, &password).await?;
            println!("Signed in as {}", profile.display_name.or(profile.email).unwrap_or(profile.uid));
        }
        Commands::Signup { name, email, password } => {
            let profile = commands::signup(&config, &name, &email, &password).await?;
            println!("Account created for {}", profile.email.unwrap_or(profile.uid));
        }
        Commands::Logout => {
            if commands::logout(&config)? {
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
        }
        Commands::Add(trade) => {
            let mut journal = open_journal(&config, demo).await?;
            let trade = commands::add_trade(&mut journal, trade.into()).await?;
            println!("Saved {} {} ({:.2})", trade.id, trade.symbol, trade.pnl());
        }
        Commands::Edit { id, changes } => {
            let mut journal = open_journal(&config, demo).await?;
            let trade = commands::edit_trade(&mut journal, &id, changes).await?;
            println!("Updated {} {} ({:.2})", trade.id, trade.symbol, trade.pnl());
        }
        Commands::Delete { id } => {
            let mut journal = open_journal(&config, demo).await?;
            commands::delete_trade(&mut journal, &id).await?;
            println!("Deleted {}", id);
        }
        Commands::List(filters) => {
            let journal = filtered_journal(&config, demo, &filters).await?;
            print!("{}", commands::render_trades(&journal.filtered_trades()));
        }
        Commands::Stats { filters, json } => {
            let journal = filtered_journal(&config, demo, &filters).await?;
            let dashboard = commands::dashboard_stats(&journal);
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{}", commands::render_stats(&dashboard));
            }
        }
        Commands::Curve(filters) => {
            let journal = filtered_journal(&config, demo, &filters).await?;
            print!("{}", commands::render_equity_curve(&journal.equity_curve()));
        }
        Commands::Breakdown(filters) => {
            let journal = filtered_journal(&config, demo, &filters).await?;
            print!("{}", commands::render_strategy_breakdown(&journal.strategy_breakdown()));
        }
        Commands::Export { filters, output } => {
            let journal = filtered_journal(&config, demo, &filters).await?;
            let path = commands::export_csv(&journal, output.as_deref())?;
            println!("Exported to {}", path.display());
        }
        Commands::Backup { action } => {
            let mut journal = open_journal(&config, demo).await?;
            match action {
                BackupAction::Export { path } => {
                    commands::export_backup(&journal, &path)?;
                    println!("Backed up {} trades to {}", journal.trades().len(), path.display());
                }
                BackupAction::Import { path } => {
                    let summary = commands::import_backup(&mut journal, &path)
                        .await
                        .with_context(|| format!("Failed to restore {}", path.display()))?;
                    println!("Restored settings and {} trades", summary.trades_imported);
                }
            }
        }
        Commands::Analyze(filters) => {
            let client = GeminiClient::new(config.gemini()?);
            let journal = filtered_journal(&config, demo, &filters).await?;
            println!("{}", commands::analyze_trades(&journal, &client).await?);
        }
        Commands::Capital { amount } => {
            let mut journal = open_journal(&config, demo).await?;
            let capital = match amount {
                Some(amount) => commands::set_capital(&mut journal, amount).await?,
                None => journal.settings().capital,
            };
            println!("Baseline capital: ₹{:.2}", capital);
        }
        Commands::Profile { name, photo } => {
            let journal = open_journal(&config, demo).await?;
            let profile = if name.is_none() && photo.is_none() {
                commands::get_profile(&journal).await?
            } else {
                commands::update_profile(&journal, name, photo).await?
            };
            print!("{}", commands::render_profile(&profile));
        }
        Commands::Strategies { add } => {
            let mut journal = open_journal(&config, demo).await?;
            if let Some(name) = add {
                if !commands::add_strategy(&mut journal, &name).await? {
                    println!("'{}' already exists", name.trim());
                }
            }
            for strategy in journal.strategies() {
                println!("{}", strategy);
            }
        }
        Commands::Risk { entry, stop_loss, risk, capital } => {
            let baseline = match capital {
                Some(capital) => capital,
                None => open_journal(&config, demo).await?.settings().capital,
            };
            let size = commands::risk_calculator(baseline, capital, risk, entry, stop_loss)?;
            print!("{}", commands::render_position_size(&size));
        }
    }

    Ok(())
}
