//! FX trade calculator
//!
//! Solves the single-trade profit equation for any one of trade profit,
//! profit factor, trade amount, opening rate or closing rate, and computes
//! min/max bands for all five from stored bounds.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fxcalc::db::{self, BoundsRow, Database};
use fxcalc::formula::{
    Precision, RateAdjustmentMode, RoundingMode, TradeDirection, TradeFormula, TradeInputs,
    MAX_SCALE,
};
use fxcalc::scenario::{BoundColumn, ScenarioConfig, ScenarioRunner, Variable};

const DEFAULT_EXPORT: &str = "fxcalc.sql";

/// FX trade formula calculator CLI.
#[derive(Parser)]
#[command(name = "fxcalc")]
#[command(about = "Solve FX trade profit, amount and rates, and compute scenario bands", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(short, long, env = "FXCALC_DATABASE", default_value = "sqlite:./fxcalc.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FXCALC_LOG", default_value = "info")]
    log_level: String,

    /// Delete the database and default export file before running
    #[arg(long)]
    fresh: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Quantity solved by `calc`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    Profit,
    ProfitFactor,
    TradeAmount,
    Opening,
    Closing,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResetKind {
    /// Zero bounds and results
    Zero,
    /// Zero only the input bounds
    Input,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the formula once for a single target quantity
    Calc {
        /// Quantity to solve for
        #[arg(value_enum)]
        target: Target,

        /// Trade direction (BUY or SELL)
        #[arg(long, default_value = "SELL")]
        direction: TradeDirection,

        /// Full bid/ask spread
        #[arg(long, default_value = "0")]
        spread: Decimal,

        /// Base-to-cross conversion rate
        #[arg(long, default_value = "1")]
        rate_bk: Decimal,

        /// Cross-to-quote conversion rate
        #[arg(long, default_value = "1")]
        rate_kn: Decimal,

        /// Trade amount
        #[arg(long)]
        amount: Decimal,

        /// Opening rate
        #[arg(long, default_value = "1")]
        opening: Decimal,

        /// Closing rate
        #[arg(long, default_value = "1")]
        closing: Decimal,

        /// Realized profit (required for every target except profit)
        #[arg(long)]
        profit: Option<Decimal>,

        /// Treat rates as market mids and apply half the spread to each
        #[arg(long)]
        market_based: bool,

        /// Division scale
        #[arg(long, default_value = "10")]
        scale: u32,

        /// Division rounding (half_up, half_even, half_down, up, down)
        #[arg(long, default_value = "half_up")]
        rounding: RoundingMode,
    },

    /// Set one input bound
    Set {
        /// Variable (tradeprofit, profitfactor, tradeamount, openingvalue, closingvalue)
        variable: Variable,

        /// Column (minimum or maximum)
        column: BoundColumn,

        /// New value
        value: Decimal,
    },

    /// Show stored bounds and results
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute result bands from stored bounds and save them
    Query {
        /// Trade direction (BUY or SELL)
        #[arg(long, default_value = "SELL")]
        direction: TradeDirection,

        /// Treat bounds as market mids and apply half the spread to each.
        /// The spread is applied when each band's formulas are built, so
        /// market-based bands differ from execution-based ones
        #[arg(long)]
        market_based: bool,

        /// Compute and store only this variable's band
        #[arg(long)]
        only: Option<Variable>,

        /// Full bid/ask spread
        #[arg(long, default_value = "0.001")]
        spread: Decimal,

        /// Base-to-cross conversion rate
        #[arg(long, default_value = "0.95")]
        rate_bk: Decimal,

        /// Cross-to-quote conversion rate
        #[arg(long, default_value = "0.98")]
        rate_kn: Decimal,

        /// Division scale
        #[arg(long, default_value = "10")]
        scale: u32,

        /// Division rounding (half_up, half_even, half_down, up, down)
        #[arg(long, default_value = "half_up")]
        rounding: RoundingMode,

        /// Where to write the SQL export
        #[arg(long, default_value = DEFAULT_EXPORT)]
        export: PathBuf,
    },

    /// Reset stored values to zero
    Reset {
        #[arg(value_enum)]
        kind: ResetKind,
    },

    /// Write the table as an SQL script
    Export {
        #[arg(default_value = DEFAULT_EXPORT)]
        path: PathBuf,
    },

    /// Show the default scenario configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.fresh {
        let db_path = db::sqlite_path(&cli.database);
        let export = Path::new(DEFAULT_EXPORT);
        let mut paths = vec![export];
        if let Some(p) = db_path.as_deref() {
            paths.push(p);
        }
        db::remove_files(&paths)?;
    }

    match cli.command {
        Commands::Calc {
            target,
            direction,
            spread,
            rate_bk,
            rate_kn,
            amount,
            opening,
            closing,
            profit,
            market_based,
            scale,
            rounding,
        } => {
            let inputs = TradeInputs {
                direction,
                spread,
                rate_bk,
                rate_kn,
                trade_amount: amount,
                opening_value: opening,
                closing_value: closing,
            };
            if scale > MAX_SCALE {
                bail!("--scale must be at most {}", MAX_SCALE);
            }
            let mode = RateAdjustmentMode::from_market_based(market_based);
            let formula = TradeFormula::with_mode(inputs, mode, Precision::new(scale, rounding))?;

            let need_profit = || profit.context("--profit is required for this target");
            let result = match target {
                Target::Profit => formula.checked_profit(amount)?,
                Target::ProfitFactor => formula.profit_factor(need_profit()?, amount)?,
                Target::TradeAmount => formula.trade_amount(need_profit()?, amount)?,
                Target::Opening => formula.opening(need_profit()?, amount)?,
                Target::Closing => formula.closing(need_profit()?, amount)?,
            };

            print_formula(&formula);
            println!("\nResult ({:?}): {}", target, result);
            println!("Rounded:        {}", formula.precision().round(result));
        }

        Commands::Set {
            variable,
            column,
            value,
        } => {
            let db = Database::new(&cli.database).await?;
            db.update_bound(variable, column, value).await?;
            println!("Updated {}.{} = {}", variable, column, value);
        }

        Commands::Show { json } => {
            let db = Database::new(&cli.database).await?;
            let rows = db.rows().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_rows(&rows);
            }
        }

        Commands::Query {
            direction,
            market_based,
            only,
            spread,
            rate_bk,
            rate_kn,
            scale,
            rounding,
            export,
        } => {
            let config = ScenarioConfig {
                direction,
                adjustment: RateAdjustmentMode::from_market_based(market_based),
                spread,
                rate_bk,
                rate_kn,
                precision: Precision::new(scale, rounding),
            };
            let runner = ScenarioRunner::new(config)?;

            let db = Database::new(&cli.database).await?;
            let bounds = db.load_bounds().await?;
            for (variable, band) in bounds.iter() {
                info!(variable = %variable, bounds = %band, "Input bounds");
            }

            match only {
                Some(variable) => {
                    let band = runner.band(variable, &bounds);
                    db.store_band(variable, band).await?;
                }
                None => {
                    let results = runner.run(&bounds);
                    db.store_results(&results).await?;
                }
            }
            db.export_sql(&export).await?;

            let config = runner.config();
            println!(
                "\nQuery executed (Action: {}, Mode: {}, Spread: {}, RateBK: {}, RateKN: {})",
                config.direction, config.adjustment, config.spread, config.rate_bk, config.rate_kn
            );
            print_rows(&db.rows().await?);
        }

        Commands::Reset { kind } => {
            let db = Database::new(&cli.database).await?;
            let rows = match kind {
                ResetKind::Zero => db.reset_all().await?,
                ResetKind::Input => db.reset_inputs().await?,
            };
            println!("Reset {} rows ({:?})", rows, kind);
        }

        Commands::Export { path } => {
            let db = Database::new(&cli.database).await?;
            db.export_sql(&path).await?;
            println!("Database exported to {}", path.display());
        }

        Commands::Config => {
            let config = ScenarioConfig::default();

            println!("\n=== Default Scenario Configuration ===\n");
            println!("  Direction:   {}", config.direction);
            println!("  Mode:        {}", config.adjustment);
            println!("  Spread:      {}", config.spread);
            println!("  Rate BK:     {}", config.rate_bk);
            println!("  Rate KN:     {}", config.rate_kn);
            println!("  Scale:       {}", config.precision.scale);
            println!("  Rounding:    {}", config.precision.rounding);
            println!("\n{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Print the normalized state of a formula.
fn print_formula(formula: &TradeFormula) {
    println!("\n=== Trade Formula ===");
    println!("Direction:       {}", formula.direction());
    println!("Mode:            {}", formula.adjustment_mode());
    println!("Spread:          {}", formula.spread());
    println!("Rate BK / KN:    {} / {}", formula.rate_bk(), formula.rate_kn());
    println!("Trade Amount:    {}", formula.trade_amount_input());
    println!("Opening Value:   {}", formula.opening_value());
    println!("Closing Value:   {}", formula.closing_value());
    println!("Opening Factor:  {}", formula.opening_factor());
    println!("Closing Factor:  {}", formula.closing_factor());
    if formula.is_market_based() {
        println!("(spread applied to both endpoints)");
    }
}

/// Print the bounds table.
fn print_rows(rows: &[BoundsRow]) {
    println!(
        "\n{:<14} {:>20} {:>20} {:>24} {:>24}",
        "VARIABLE", "MINIMUM", "MAXIMUM", "RETURN MIN", "RETURN MAX"
    );
    println!("{}", "-".repeat(106));

    for row in rows {
        println!(
            "{:<14} {:>20} {:>20} {:>24} {:>24}",
            row.variable,
            row.minimum,
            row.maximum,
            truncate(&row.returnmin.to_string(), 24),
            truncate(&row.returnmax.to_string(), 24)
        );
    }
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
