//! manaplex-rewards CLI: history, report, seasons.

use clap::{Parser, Subcommand};
use manaplex_rewards::{
    DateRange, FetchConfig, Fetcher, HistoryPipeline, ParsedPlayerRewardHistory, ResponseCache,
};
use manaplex_rewards_report::render_report;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::History(args) => run_history(args),
        Command::Report(args) => run_report(args),
        Command::Seasons(args) => run_seasons(args),
    }
}

#[derive(Parser)]
#[command(name = "manaplex-rewards")]
#[command(about = "Aggregate Manaplex reward history (daily quests, league rewards, purchases)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and aggregate a player's reward history; writes a JSON summary.
    History(HistoryArgs),
    /// Aggregate and render an HTML report.
    Report(ReportArgs),
    /// Print the date window for a season id.
    Seasons(SeasonArgs),
}

#[derive(Parser)]
struct HistoryArgs {
    #[arg(long)]
    player: String,
    /// Sealed session token (mpx1:… as stored by the dashboard).
    #[arg(long)]
    token: String,
    #[arg(long, conflicts_with_all = ["from", "to"])]
    season: Option<u32>,
    /// RFC3339 window start (requires --to).
    #[arg(long, requires = "to")]
    from: Option<String>,
    /// RFC3339 window end (requires --from).
    #[arg(long, requires = "from")]
    to: Option<String>,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long, default_value = "./reports")]
    reports_dir: PathBuf,
    #[arg(long)]
    offline: bool,
}

#[derive(Parser)]
struct ReportArgs {
    #[arg(long)]
    player: String,
    #[arg(long)]
    token: String,
    #[arg(long, conflicts_with_all = ["from", "to"])]
    season: Option<u32>,
    #[arg(long, requires = "to")]
    from: Option<String>,
    #[arg(long, requires = "from")]
    to: Option<String>,
    /// HTML output path (defaults to <reports_dir>/<player>.html).
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value = "./reports")]
    reports_dir: PathBuf,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
}

#[derive(Parser)]
struct SeasonArgs {
    #[arg(long)]
    season: u32,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    offline: bool,
}

fn cache_path(cache_dir: &std::path::Path) -> PathBuf {
    cache_dir.join("cache.sqlite")
}

fn pipeline(cache_dir: &std::path::Path, offline: bool) -> Result<HistoryPipeline, Box<dyn std::error::Error>> {
    let cache = ResponseCache::open(cache_path(cache_dir))?;
    let config = FetchConfig {
        offline,
        ..Default::default()
    };
    let fetcher = Fetcher::new(config, Some(cache))?;
    Ok(HistoryPipeline::new(fetcher))
}

fn parse_window(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<DateRange>, Box<dyn std::error::Error>> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(Some(DateRange {
            start: OffsetDateTime::parse(from, &Rfc3339)?,
            end: OffsetDateTime::parse(to, &Rfc3339)?,
        })),
        _ => Ok(None),
    }
}

fn fetch_history(
    player: &str,
    token: &str,
    season: Option<u32>,
    from: Option<&str>,
    to: Option<&str>,
    cache_dir: &std::path::Path,
    offline: bool,
) -> Result<ParsedPlayerRewardHistory, Box<dyn std::error::Error>> {
    let pipeline = pipeline(cache_dir, offline)?;
    let rt = tokio::runtime::Runtime::new()?;
    let history = match (season, parse_window(from, to)?) {
        (Some(season_id), _) => {
            rt.block_on(async { pipeline.run_season(player, token, season_id).await })?
        }
        (None, Some(range)) => rt.block_on(async { pipeline.run(player, token, range).await })?,
        (None, None) => return Err("either --season or --from/--to is required".into()),
    };
    Ok(history)
}

fn player_file_stem(player: &str) -> String {
    player
        .chars()
        .take(32)
        .collect::<String>()
        .replace([' ', ':', '/'], "_")
}

fn run_history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let history = fetch_history(
        &args.player,
        &args.token,
        args.season,
        args.from.as_deref(),
        args.to.as_deref(),
        &args.cache_dir,
        args.offline,
    )?;
    std::fs::create_dir_all(&args.reports_dir)?;
    let json_path = args
        .reports_dir
        .join(format!("{}.history.json", player_file_stem(&args.player)));
    std::fs::write(&json_path, serde_json::to_string_pretty(&history)?)?;
    info!(?json_path, "history written");
    println!(
        "{} entries, {} merits, {} cards tracked",
        history.total_entries,
        history.aggregation.total_merits,
        history.aggregation.total_cards.len()
    );
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let history = fetch_history(
        &args.player,
        &args.token,
        args.season,
        args.from.as_deref(),
        args.to.as_deref(),
        &args.cache_dir,
        args.offline,
    )?;
    std::fs::create_dir_all(&args.reports_dir)?;
    let stem = player_file_stem(&args.player);
    let html_path = args
        .out
        .unwrap_or_else(|| args.reports_dir.join(format!("{stem}.html")));
    let json_path = args.reports_dir.join(format!("{stem}.history.json"));
    render_report(&history, &html_path)?;
    std::fs::write(&json_path, serde_json::to_string_pretty(&history)?)?;
    info!(?html_path, ?json_path, "report written");
    println!("Report written to {}", html_path.display());
    Ok(())
}

fn run_seasons(args: SeasonArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ResponseCache::open(cache_path(&args.cache_dir))?;
    let config = FetchConfig {
        offline: args.offline,
        ..Default::default()
    };
    let fetcher = Fetcher::new(config, Some(cache))?;
    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(async { fetcher.season_range(args.season).await })? {
        Some(range) => {
            println!("season {}\t{} → {}", range.season_id, range.start, range.end);
            Ok(())
        }
        None => {
            eprintln!("unknown season id {}", args.season);
            std::process::exit(1);
        }
    }
}
