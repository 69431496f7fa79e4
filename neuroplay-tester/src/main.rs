mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use neuroplay_game::{Difficulty, GameKind};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use common::split_csv;
use logic::{
    LogicTester, PlayerStrategy, ScenarioResult, SeedInfo, TestScenario, get_scenario,
    list_scenarios, resolve_seed_inputs, scenario_keys,
};

#[derive(Debug, Parser)]
#[command(name = "neuroplay-tester", version = "0.1.0")]
#[command(about = "Automated QA for the Neuroplay engine - simulated play on virtual time")]
struct Args {
    /// Games to simulate (comma-separated names or replay prefixes, or `all`)
    #[arg(long, default_value = "all")]
    games: String,

    /// List the game catalog and exit
    #[arg(long)]
    list_games: bool,

    /// Named edge-case scenarios to run as well (comma-separated, or `all`)
    #[arg(long, default_value = "")]
    scenarios: String,

    /// List all named scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Difficulty for game runs
    #[arg(long, default_value = "medium", value_parser = parse_difficulty)]
    difficulty: Difficulty,

    /// Simulated player for game runs
    #[arg(long, value_enum, default_value_t = PlayerStrategy::Perfect)]
    player: PlayerStrategy,

    /// Seeds to run (comma-separated integers or replay codes, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(value)
        .map_err(|()| format!("unknown difficulty `{value}` (easy, medium, hard)"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_catalog(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let games = expand_games(&args.games)?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let scenarios = build_scenarios(&args, &games);

    let results = run_logic_scenarios(&args, &scenarios, &seed_infos);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_catalog(args: &Args) -> Result<bool> {
    if !args.list_games && !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    if args.list_games {
        writeln!(output_target.writer(), "Available games:")?;
        for game in GameKind::ALL {
            writeln!(
                output_target.writer(),
                "  {:17} {} - {}",
                game.as_str(),
                game.code_prefix(),
                game.description()
            )?;
        }
    }
    if args.list_scenarios {
        writeln!(output_target.writer(), "Available scenarios:")?;
        for (key, description) in list_scenarios() {
            writeln!(output_target.writer(), "  {key:25} - {description}")?;
        }
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🧠 Neuroplay Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_games(games_arg: &str) -> Result<Vec<GameKind>> {
    let mut games = Vec::new();
    for token in split_csv(games_arg) {
        if token.eq_ignore_ascii_case("all") {
            games.extend(GameKind::ALL);
            continue;
        }
        let Some(game) = GameKind::from_str(&token)
            .ok()
            .or_else(|| GameKind::from_code_prefix(&token))
        else {
            bail!("Unknown game: {token}");
        };
        games.push(game);
    }
    let mut seen = Vec::new();
    games.retain(|game| {
        let fresh = !seen.contains(game);
        seen.push(*game);
        fresh
    });
    Ok(games)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        scenarios.extend(scenario_keys());
    }
    scenarios
}

fn build_scenarios(args: &Args, games: &[GameKind]) -> Vec<TestScenario> {
    let mut scenarios: Vec<TestScenario> = games
        .iter()
        .map(|game| TestScenario::matrix(*game, args.difficulty, args.player))
        .collect();

    for key in expand_scenarios(&args.scenarios) {
        if let Some(scenario) = get_scenario(&key) {
            scenarios.push(scenario);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", key.yellow());
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[TestScenario],
    seed_infos: &[SeedInfo],
) -> Vec<ScenarioResult> {
    println!("{}", "🎮 Running Simulations".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();
    for scenario in scenarios {
        results.extend(logic_tester.run_scenario(scenario, seed_infos, args.iterations));
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Neuroplay Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, results)?,
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.report == "console" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            games: "sequence_recall".to_string(),
            list_games: false,
            scenarios: String::new(),
            list_scenarios: false,
            difficulty: Difficulty::Easy,
            player: PlayerStrategy::Perfect,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("neuroplay-main-{label}-{}", std::process::id()))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            game: GameKind::FaceName,
            difficulty: Difficulty::Medium,
            strategy: PlayerStrategy::Perfect,
            seed: 1337,
            replay_code: "FN-WILLOW88".to_string(),
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            mean_score: Some(40.0),
            mean_accuracy: Some(100.0),
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from(["neuroplay-tester"]).unwrap();
        assert_eq!(args.games, "all");
        assert_eq!(args.difficulty, Difficulty::Medium);
        assert_eq!(args.player, PlayerStrategy::Perfect);
        assert_eq!(args.iterations, 10);
    }

    #[test]
    fn args_reject_unknown_difficulty_and_report() {
        assert!(Args::try_parse_from(["neuroplay-tester", "--difficulty", "brutal"]).is_err());
        assert!(Args::try_parse_from(["neuroplay-tester", "--report", "yaml"]).is_err());
        let args =
            Args::try_parse_from(["neuroplay-tester", "--player", "sloppy", "--difficulty", "HARD"])
                .unwrap();
        assert_eq!(args.player, PlayerStrategy::Sloppy);
        assert_eq!(args.difficulty, Difficulty::Hard);
    }

    #[test]
    fn expands_games_by_name_prefix_and_all() {
        assert_eq!(
            expand_games("map-navigation,FN").unwrap(),
            vec![GameKind::MapNavigation, GameKind::FaceName]
        );
        assert_eq!(expand_games("all,sq").unwrap(), GameKind::ALL.to_vec());
        assert!(expand_games("").unwrap().is_empty());
        assert!(expand_games("chess").is_err());
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("all,timeouts");
        assert!(expanded.contains(&"cancellation".to_string()));
        assert!(expanded.contains(&"timeouts".to_string()));
        assert!(!expanded.contains(&"all".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("screening,tapping");
        assert_eq!(expanded, vec!["screening".to_string(), "tapping".to_string()]);
    }

    #[test]
    fn build_scenarios_combines_games_and_named_scenarios() {
        let args = Args {
            games: "all".to_string(),
            scenarios: "timeouts,unknown".to_string(),
            ..base_args()
        };
        let games = expand_games(&args.games).unwrap();
        let scenarios = build_scenarios(&args, &games);
        assert_eq!(scenarios.len(), GameKind::ALL.len() + 1);
        assert_eq!(scenarios.last().map(|s| s.key.as_str()), Some("timeouts"));
    }

    #[test]
    fn run_logic_scenarios_covers_each_seed() {
        let args = base_args();
        let scenarios = build_scenarios(&args, &[GameKind::SequenceRecall]);
        let seeds = vec![SeedInfo::from_numeric(1), SeedInfo::from_numeric(2)];
        let results = run_logic_scenarios(&args, &scenarios, &seeds);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn maybe_list_catalog_writes_games_and_scenarios() {
        let temp = temp_path("list.txt");
        let args = Args {
            list_games: true,
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_catalog(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available games"));
        assert!(content.contains("SQ"));
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("cancellation"));
    }

    #[test]
    fn maybe_list_catalog_returns_false_when_disabled() {
        assert!(!maybe_list_catalog(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_empty_json_array() {
        let temp = temp_path("empty.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("empty.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_path("full.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("scenario_name"));
        assert!(content.contains("FN-WILLOW88"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_path("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.starts_with("scenario,game,difficulty"));
        assert!(content.contains("Smoke,face_name,medium,Perfect"));
    }

    #[test]
    fn write_reports_console_includes_total_time() {
        let temp = temp_path("console.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Logic Test Results Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
