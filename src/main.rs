// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use name_picker::{
    load_directory, CatalogConfig, FilterEngine, GenderFilter, InitialFilter, QueryParams,
    ResultLimit, SortMode, YearWindow,
};

#[derive(Parser)]
#[command(name = "name-picker", version, about = "Browse and shortlist baby names by popularity")]
struct Cli {
    /// JSON config file (year range, data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with yobYYYY.txt files (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive picker (default)
    Tui,
    /// Run one query and print the result list
    Query(QueryArgs),
    /// Show one name's full history
    Show { name: String },
}

#[derive(Args)]
struct QueryArgs {
    /// all | female | male | unisex (or A/F/M/U)
    #[arg(long, default_value = "all")]
    gender: GenderFilter,

    /// alphabetical | pop-desc | pop-asc (or A/P/p)
    #[arg(long, default_value = "alphabetical")]
    sort: SortMode,

    /// Starting letter, or "any"
    #[arg(long, default_value = "any")]
    initial: InitialFilter,

    /// Most recent N years, or "all"
    #[arg(long, default_value = "all")]
    years: YearWindow,

    /// Top K results, or "all"
    #[arg(long, default_value = "all")]
    limit: ResultLimit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Command::Tui));
    init_logging(if interactive { "warn" } else { "info" });

    let mut engine = load_engine(&cli)?;

    match cli.command {
        None | Some(Command::Tui) => run_ui_mode(engine)?,
        Some(Command::Query(args)) => run_query(&mut engine, args),
        Some(Command::Show { name }) => run_show(&engine, &name)?,
    }

    Ok(())
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_engine(cli: &Cli) -> Result<FilterEngine> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::from_file(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    println!("📂 Loading names from {:?} ({}-{})...", config.data_dir, config.year_min, config.year_max);

    let data_dir = config.data_dir.clone();
    let mut engine = FilterEngine::new(config);
    let summary = load_directory(&data_dir, &mut engine)?;

    println!(
        "✓ Loaded {} records from {} files ({} distinct names)\n",
        summary.records, summary.files, summary.names
    );

    Ok(engine)
}

fn run_query(engine: &mut FilterEngine, args: QueryArgs) {
    let params = QueryParams {
        gender: args.gender,
        sort: args.sort,
        initial: args.initial,
        years: args.years,
        limit: args.limit,
    };
    engine.set_params(params);

    println!("🔎 {}", params);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let entries = engine.refresh();
    for (i, entry) in entries.iter().enumerate() {
        println!("{:>5}. {}", i + 1, entry);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {} names", entries.len());
}

fn run_show(engine: &FilterEngine, name: &str) -> Result<()> {
    let Some(entry) = engine.lookup(name) else {
        anyhow::bail!("No name {:?} in the catalog", name);
    };

    println!("👶 {} ({})", entry.name(), entry.category().as_str());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let total: u64 = entry.history().values().sum();
    for (year, count) in entry.history().iter().filter(|(_, count)| **count > 0) {
        println!("  {}  {:>8}", year, count);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {} births across {} years", total, entry.history().len());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(engine: FilterEngine) -> Result<()> {
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(engine);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_engine: FilterEngine) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: name-picker query --help");
    std::process::exit(1);
}
