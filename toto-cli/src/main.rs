mod candidates;
mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::candidates::read_candidates;
use crate::display::{
    display_chain, display_drawings, display_import_summary, display_inconsistencies,
    display_next_best, display_numbers, display_patterns, display_ranked, display_successors,
    display_years,
};
use toto_core::analysis::Analysis;
use toto_core::chain::{Chains, NumberChainKind};
use toto_core::config::{parse_year_filter, AnalysisConfig};
use toto_core::models::{validate_numbers, Drawing, PICK_COUNT, POOL_SIZE};
use toto_core::projection::ProjectionKind;
use toto_core::ranking::{filter_by_next_best, rank_by_pair_cooccurrence, rank_by_probability, Aggregation};
use toto_db::db::{count_drawings, db_path, fetch_drawings_since, fetch_last_drawings, insert_drawing, migrate, open_db, years};
use toto_db::rusqlite::Connection;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatsClass {
    Numbers,
    Color,
    HighLow,
    OddEven,
}

impl StatsClass {
    fn projection(self) -> Option<ProjectionKind> {
        match self {
            StatsClass::Numbers => None,
            StatsClass::Color => Some(ProjectionKind::Color),
            StatsClass::HighLow => Some(ProjectionKind::HighLow),
            StatsClass::OddEven => Some(ProjectionKind::OddEven),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChainKind {
    Color,
    HighLow,
    OddEven,
    SameDrawing,
    Consecutive,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum RankBy {
    #[default]
    Probability,
    Pairs,
}

#[derive(Parser)]
#[command(name = "toto", about = "6/49 pattern statistics and transition chains")]
struct Cli {
    /// JSON analysis settings; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import drawings from a yearly file or a directory of them
    Import {
        /// File named after its year (2020.txt) or a directory of such files
        #[arg(short, long, default_value = "data/drawings")]
        path: PathBuf,
    },

    /// Print the database path
    DbPath,

    /// List the latest drawings
    List {
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Occurrence and gap statistics
    Stats {
        /// First year analysed, or "all"
        #[arg(short, long)]
        since: Option<String>,

        #[arg(short, long)]
        top: Option<usize>,

        #[arg(short, long, default_value = "numbers")]
        class: StatsClass,

        /// Every possible entry, including those never drawn, instead of the top ones
        #[arg(long)]
        all: bool,
    },

    /// Transition chains
    Chains {
        #[arg(short, long)]
        since: Option<String>,

        #[arg(short, long)]
        kind: ChainKind,

        /// Only show successors of this pattern or number
        #[arg(short, long)]
        from: Option<String>,

        /// Successors shown per source
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Most likely projections and numbers of the next drawing
    Next {
        #[arg(short, long)]
        since: Option<String>,

        /// Seed for the random tie-break (defaults to today's date)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Rank candidate sequences read from a file
    Rank {
        #[arg(short, long)]
        since: Option<String>,

        /// One sequence of six comma-separated numbers per line
        #[arg(long)]
        candidates: PathBuf,

        #[arg(short, long, default_value = "probability")]
        by: RankBy,

        /// Multiply number probabilities instead of adding them
        #[arg(long)]
        product: bool,

        /// Keep only candidates matching the next-best projections
        #[arg(long)]
        filter: bool,

        #[arg(short, long)]
        top: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Add a drawing by hand
    Add,
}

/// Today as YYYYMMDD.
fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {:?}", path))?;
    let config: AnalysisConfig = serde_json::from_str(&json)
        .with_context(|| format!("Invalid JSON in {:?}", path))?;
    Ok(config)
}

/// Settings from the config file, overridden by command-line flags.
fn analysis_config(
    base: &AnalysisConfig,
    since: Option<&str>,
    top: Option<usize>,
    seed: Option<u64>,
) -> Result<AnalysisConfig> {
    let mut config = base.clone();
    if let Some(since) = since {
        config.start_year = parse_year_filter(since)?;
    }
    if let Some(top) = top {
        config.top = top;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn seeded_rng(config: &AnalysisConfig) -> StdRng {
    let seed = config.seed.unwrap_or_else(date_seed);
    log::info!("Tie-break seed: {}", seed);
    StdRng::seed_from_u64(seed)
}

/// `None` when the database is empty, after telling the user.
fn load_analysis(conn: &Connection, config: &AnalysisConfig) -> Result<Option<Analysis>> {
    if count_drawings(conn)? == 0 {
        println!("Empty database. Run first: toto import");
        return Ok(None);
    }
    let drawings = fetch_drawings_since(conn, config.effective_start_year())?;
    log::info!(
        "{} drawings since {}",
        drawings.len(),
        config.effective_start_year()
    );
    Analysis::run(&drawings, config).map(Some)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let base = load_config(cli.config.as_deref())?;
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { path } => cmd_import(&conn, &path),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { since, top, class, all } => {
            let config = analysis_config(&base, since.as_deref(), top, None)?;
            cmd_stats(&conn, &config, class, all)
        }
        Command::Chains { since, kind, from, top } => {
            let config = analysis_config(&base, since.as_deref(), top, None)?;
            cmd_chains(&conn, &config, kind, from.as_deref())
        }
        Command::Next { since, seed } => {
            let config = analysis_config(&base, since.as_deref(), None, seed)?;
            cmd_next(&conn, &config)
        }
        Command::Rank {
            since,
            candidates,
            by,
            product,
            filter,
            top,
            seed,
        } => {
            let config = analysis_config(&base, since.as_deref(), top, seed)?;
            let aggregation = if product { Aggregation::Product } else { Aggregation::Sum };
            cmd_rank(&conn, &config, &candidates, by, aggregation, filter)
        }
        Command::Add => cmd_add(&conn),
    }
}

fn cmd_import(conn: &Connection, path: &Path) -> Result<()> {
    let result = import::import_path(conn, path)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_drawings(conn)? == 0 {
        println!("Empty database. Run first: toto import");
        return Ok(());
    }
    display_years(&years(conn)?);
    let drawings = fetch_last_drawings(conn, last)?;
    display_drawings(&drawings);
    Ok(())
}

fn cmd_stats(conn: &Connection, config: &AnalysisConfig, class: StatsClass, all: bool) -> Result<()> {
    let Some(analysis) = load_analysis(conn, config)? else {
        return Ok(());
    };
    let stats = &analysis.stats;
    match (class.projection(), all) {
        (None, false) => display_numbers(&stats.top_numbers(config.top), &[], stats.drawing_count()),
        (None, true) => {
            let unseen: Vec<u8> = (1..=POOL_SIZE).filter(|&n| stats.number(n).is_none()).collect();
            display_numbers(&stats.numbers().ranked(), &unseen, stats.drawing_count())
        }
        (Some(kind), false) => {
            display_patterns(kind, &stats.top_patterns(kind, config.top), &[], stats.drawing_count())
        }
        (Some(kind), true) => display_patterns(
            kind,
            &stats.patterns(kind).ranked(),
            &stats.unseen_patterns(kind, &analysis.projector),
            stats.drawing_count(),
        ),
    }
    display_inconsistencies(stats.inconsistencies());
    Ok(())
}

fn cmd_chains(conn: &Connection, config: &AnalysisConfig, kind: ChainKind, from: Option<&str>) -> Result<()> {
    let Some(analysis) = load_analysis(conn, config)? else {
        return Ok(());
    };
    let chains = &analysis.chains;
    match kind {
        ChainKind::Color => show_pattern_chain(chains, ProjectionKind::Color, from, config.top),
        ChainKind::HighLow => show_pattern_chain(chains, ProjectionKind::HighLow, from, config.top),
        ChainKind::OddEven => show_pattern_chain(chains, ProjectionKind::OddEven, from, config.top),
        ChainKind::SameDrawing => show_number_chain(chains, NumberChainKind::SameDrawing, from, config.top)?,
        ChainKind::Consecutive => show_number_chain(chains, NumberChainKind::Consecutive, from, config.top)?,
    }
    Ok(())
}

fn show_pattern_chain(chains: &Chains, kind: ProjectionKind, from: Option<&str>, top: usize) {
    let chain = chains.patterns(kind);
    match from {
        Some(from) => display_successors(kind.label(), &from.trim().to_string(), chain, top),
        None => display_chain(kind.label(), chain, top),
    }
}

fn show_number_chain(chains: &Chains, kind: NumberChainKind, from: Option<&str>, top: usize) -> Result<()> {
    let chain = chains.numbers(kind);
    match from {
        Some(from) => {
            let number: u8 = from
                .trim()
                .parse()
                .with_context(|| format!("'{}' is not a number", from))?;
            display_successors(kind.label(), &number, chain, top);
        }
        None => display_chain(kind.label(), chain, top),
    }
    Ok(())
}

fn cmd_next(conn: &Connection, config: &AnalysisConfig) -> Result<()> {
    let Some(analysis) = load_analysis(conn, config)? else {
        return Ok(());
    };
    let mut rng = seeded_rng(config);
    let next = analysis.next_best(&mut rng);
    display_next_best(&analysis, &next);
    Ok(())
}

fn cmd_rank(
    conn: &Connection,
    config: &AnalysisConfig,
    candidates_path: &Path,
    by: RankBy,
    aggregation: Aggregation,
    filter: bool,
) -> Result<()> {
    let mut candidates = read_candidates(candidates_path)?;
    let Some(analysis) = load_analysis(conn, config)? else {
        return Ok(());
    };

    if filter {
        let mut rng = seeded_rng(config);
        let next = analysis.next_best(&mut rng);
        let total = candidates.len();
        candidates = filter_by_next_best(&candidates, &next, &analysis.projector);
        println!(
            "{} of {} candidates match the next-best projections",
            candidates.len(),
            total
        );
    }

    match by {
        RankBy::Probability => {
            let ranked = rank_by_probability(&candidates, &analysis.stats, aggregation);
            match aggregation {
                Aggregation::Sum => display_ranked(&ranked, config.top, |s| format!("{:.4}", s)),
                Aggregation::Product => display_ranked(&ranked, config.top, |s| format!("{:.4e}", s)),
            }
        }
        RankBy::Pairs => {
            let ranked = rank_by_pair_cooccurrence(&candidates, &analysis.chains);
            display_ranked(&ranked, config.top, |s| s.to_string());
        }
    }
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Add a drawing by hand\n");

    let this_year = chrono::Local::now().year() as u16;
    let year = prompt_parse(&format!("Year [{}]: ", this_year), this_year)?;
    let next_issue = fetch_drawings_since(conn, year)?
        .iter()
        .filter(|d| d.year == year)
        .map(|d| d.issue)
        .max()
        .unwrap_or(0)
        + 1;
    let issue = prompt_parse(&format!("Issue [{}]: ", next_issue), next_issue)?;
    let numbers = prompt_numbers()?;
    let drawing = Drawing::new(year, issue, numbers);

    println!("\nDrawing to insert:");
    display_drawings(std::slice::from_ref(&drawing));

    let confirm = prompt("\nConfirm? (y/n): ")?;
    if confirm.trim().eq_ignore_ascii_case("y") {
        if insert_drawing(conn, &drawing)? {
            println!("Drawing inserted.");
        } else {
            println!("A drawing with this year and issue already exists.");
        }
    } else {
        println!("Cancelled.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Cannot read input")?;
    Ok(input.trim().to_string())
}

/// Parsed answer, `default` on an empty line.
fn prompt_parse<T: std::str::FromStr>(msg: &str, default: T) -> Result<T> {
    loop {
        let input = prompt(msg)?;
        if input.is_empty() {
            return Ok(default);
        }
        match input.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Invalid value. Try again."),
        }
    }
}

fn prompt_numbers() -> Result<[u8; PICK_COUNT]> {
    loop {
        let input = prompt("6 numbers (1-49, separated by spaces or commas): ")?;
        let parsed: Result<Vec<u8>, _> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<u8>())
            .collect();
        match parsed {
            Ok(numbers) => match validate_numbers(&numbers) {
                Ok(numbers) => return Ok(numbers),
                Err(e) => println!("{}. Try again.", e),
            },
            Err(_) => println!("Numbers only, please. Try again."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let base = AnalysisConfig { start_year: 2000, top: 5, ..Default::default() };
        let config = analysis_config(&base, Some("2015"), None, Some(7)).unwrap();
        assert_eq!(config.start_year, 2015);
        assert_eq!(config.top, 5);
        assert_eq!(config.seed, Some(7));

        let config = analysis_config(&base, Some("all"), Some(3), None).unwrap();
        assert_eq!(config.start_year, 1958);
        assert_eq!(config.top, 3);
        assert_eq!(config.seed, None);

        assert!(analysis_config(&base, None, Some(0), None).is_err());
        assert!(analysis_config(&base, Some("soon"), None, None).is_err());
    }

    #[test]
    fn test_load_config_file() {
        assert_eq!(load_config(None).unwrap(), AnalysisConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("toto.json");
        std::fs::write(&file, r#"{"high_low_midpoint": 24, "seed": 11}"#).unwrap();
        let config = load_config(Some(file.as_path())).unwrap();
        assert_eq!(config.high_low_midpoint, 24);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.start_year, 1958);

        std::fs::write(&file, "{not json").unwrap();
        assert!(load_config(Some(file.as_path())).is_err());
    }

    #[test]
    fn test_date_seed_shape() {
        let seed = date_seed();
        assert!(seed > 2000_01_01 && seed < 3000_01_01);
        assert!((1..=12).contains(&(seed / 100 % 100)));
    }

    #[test]
    fn test_parse_rank_command() {
        let cli = Cli::try_parse_from([
            "toto", "rank", "--candidates", "c.txt", "--by", "pairs", "--filter", "--since", "2010",
        ])
        .unwrap();
        match cli.command {
            Command::Rank { by, filter, product, since, .. } => {
                assert!(matches!(by, RankBy::Pairs));
                assert!(filter);
                assert!(!product);
                assert_eq!(since.as_deref(), Some("2010"));
            }
            _ => panic!("expected rank"),
        }
    }

    #[test]
    fn test_parse_chain_kinds() {
        let cli = Cli::try_parse_from(["toto", "chains", "--kind", "same-drawing", "--from", "7"]).unwrap();
        assert!(matches!(cli.command, Command::Chains { kind: ChainKind::SameDrawing, .. }));
        let cli = Cli::try_parse_from(["toto", "stats", "--class", "high-low"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { class: StatsClass::HighLow, .. }));
        let cli = Cli::try_parse_from(["toto", "stats", "--class", "color", "--all"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { class: StatsClass::Color, all: true, .. }));
    }
}
