use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

#[cfg(feature = "tui")]
use finance_tracker::ui;
use finance_tracker::{
    export_csv_file, generate_report, import_csv_file, open_database, verify_count, Config,
    ExpenseForm, ReportOutcome,
};

#[derive(Parser)]
#[command(name = "finance-tracker", version, about = "Record expenses and see where the money goes")]
struct Cli {
    /// SQLite database file [default: ./finance_tracker.db]
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive dashboard (default)
    Ui,

    /// Record one expense
    Add {
        name: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        category: String,
    },

    /// Print spending per category
    Report {
        /// Also write the pie chart as PNG
        #[arg(long, value_name = "PATH")]
        png: Option<PathBuf>,

        /// Also write the pie chart as SVG
        #[arg(long, value_name = "PATH")]
        svg: Option<PathBuf>,

        /// Print the breakdown as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write every expense to a CSV file
    Export { path: PathBuf },

    /// Add expenses from a CSV file with name,amount,category columns
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(db) = &cli.db {
        config = config.with_db_path(db);
    }

    let command = cli.command.unwrap_or(Command::Ui);
    init_logging(&config, matches!(command, Command::Ui));
    log::debug!("Using database {}", config.db_path.display());

    match command {
        Command::Ui => run_ui_mode(&config),
        Command::Add {
            name,
            amount,
            category,
        } => run_add(&config, &name, &amount, &category),
        Command::Report { png, svg, json } => run_report(&config, png, svg, json),
        Command::Export { path } => run_export(&config, path),
        Command::Import { path } => run_import(&config, path),
    }
}

/// The TUI owns the terminal, so its log goes to a file; CLI commands log to stderr
fn init_logging(config: &Config, tui: bool) {
    let mut builder = env_logger::Builder::from_env(
        Env::default().default_filter_or(if tui { "info" } else { "warn" }),
    );

    if tui {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_path)
        {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(_) => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

fn run_add(config: &Config, name: &str, amount: &str, category: &str) -> Result<()> {
    let conn = open_database(&config.db_path)?;

    let mut form = ExpenseForm::new(name, amount, category);
    let id = form.save(&conn).context("Expense not saved")?;

    println!("✓ Expense #{} saved", id);
    Ok(())
}

fn run_report(
    config: &Config,
    png: Option<PathBuf>,
    svg: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let conn = open_database(&config.db_path)?;

    let report = match generate_report(&conn).context("Failed to generate report")? {
        ReportOutcome::NoData => {
            println!("No expenses to generate a report.");
            return Ok(());
        }
        ReportOutcome::Ready(report) => report,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        println!("📊 {}", report.chart.title);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for slice in &report.chart.slices {
            println!(
                "{:<24} {:>12.2} {:>7}",
                slice.label,
                slice.value,
                slice.percent_label()
            );
        }
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("{:<24} {:>12.2}", "Total", report.grand_total());
    }

    if let Some(path) = svg {
        fs::write(&path, report.chart.render_svg())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("✓ Chart written to {}", path.display());
    }

    if let Some(path) = png {
        let bytes = report.chart.render_png().context("Failed to render chart")?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("✓ Chart written to {}", path.display());
    }

    Ok(())
}

fn run_export(config: &Config, path: PathBuf) -> Result<()> {
    let conn = open_database(&config.db_path)?;
    let written = export_csv_file(&conn, &path)?;

    println!("✓ Exported {} expenses to {}", written, path.display());
    Ok(())
}

fn run_import(config: &Config, path: PathBuf) -> Result<()> {
    let conn = open_database(&config.db_path)?;
    let summary = import_csv_file(&conn, &path)?;

    println!("✓ Inserted: {} expenses", summary.inserted);
    println!("✓ Skipped invalid rows: {}", summary.skipped);
    println!("✓ Database contains {} expenses", verify_count(&conn)?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    // Make sure the table exists before the first screen is drawn
    open_database(&config.db_path)?;

    let mut app = ui::App::new(config.db_path.clone());
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the add / report subcommands.");
    std::process::exit(1);
}
