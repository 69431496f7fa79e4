use anyhow::{Context, Result, ensure};
use neuroplay_game::{
    Difficulty, DirectionPrompt, DirectionQuestion, GameConfig, GameKind, PuzzleSpec, Severity,
    decode_replay_code,
};

use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::players::PlayerStrategy;
use crate::logic::seeds::looks_like_replay_code;

/// A named simulation with its expectations.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: String,
    pub name: String,
    pub description: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            plan,
        }
    }

    /// Plain run of one game; only the per-session invariants apply.
    #[must_use]
    pub fn matrix(game: GameKind, difficulty: Difficulty, strategy: PlayerStrategy) -> Self {
        Self::new(
            game.as_str(),
            format!("{game} ({difficulty}, {strategy})"),
            game.description(),
            SimulationPlan::new(game, difficulty, strategy),
        )
    }
}

const CATALOG_KEYS: [&str; 9] = [
    "tapping",
    "timeouts",
    "cancellation",
    "determinism",
    "replay-codes",
    "screening",
    "sloppy-screening",
    "adaptive-length",
    "step-recall",
];

/// Every named scenario, in listing order.
#[must_use]
pub fn catalog() -> Vec<TestScenario> {
    CATALOG_KEYS.iter().filter_map(|key| get_scenario(key)).collect()
}

#[must_use]
pub fn list_scenarios() -> Vec<(String, String)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn scenario_keys() -> Vec<String> {
    CATALOG_KEYS.iter().map(ToString::to_string).collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let scenario = match key.trim().to_lowercase().as_str() {
        "tapping" => TestScenario::new(
            "tapping",
            "Tap-by-tap sequence entry",
            "Sequence answers entered one cell at a time",
            SimulationPlan::new(
                GameKind::SequenceRecall,
                Difficulty::Easy,
                PlayerStrategy::Tapping,
            )
            .with_expectation(tapping_expectation),
        ),
        "timeouts" => TestScenario::new(
            "timeouts",
            "Response limit expiry",
            "Idle player on hard; every round closes at the response limit",
            SimulationPlan::new(
                GameKind::SequenceRecall,
                Difficulty::Hard,
                PlayerStrategy::Idle,
            )
            .with_expectation(timeout_expectation),
        ),
        "cancellation" => TestScenario::new(
            "cancellation",
            "Cancel mid-session",
            "Cancelling after two rounds reports nothing and fires no timers",
            SimulationPlan::new(GameKind::FaceName, Difficulty::Medium, PlayerStrategy::Perfect)
                .with_cancel_after(2)
                .with_expectation(cancellation_expectation),
        ),
        "determinism" => {
            let base = SimulationPlan::new(
                GameKind::MapNavigation,
                Difficulty::Hard,
                PlayerStrategy::Random,
            );
            TestScenario::new(
                "determinism",
                "Deterministic replays",
                "Re-running a seed reproduces rounds and result exactly",
                base.clone()
                    .with_expectation(move |summary: &SimulationSummary| {
                        determinism_expectation(&base, summary)
                    }),
            )
        }
        "replay-codes" => {
            let base = SimulationPlan::new(
                GameKind::DirectionPath,
                Difficulty::Medium,
                PlayerStrategy::Perfect,
            );
            TestScenario::new(
                "replay-codes",
                "Replay code round trip",
                "A session's replay code decodes to a seed that replays the same rounds",
                base.clone()
                    .with_expectation(move |summary: &SimulationSummary| {
                        replay_code_expectation(&base, summary)
                    }),
            )
        }
        "screening" => TestScenario::new(
            "screening",
            "Screening battery",
            "Perfect answers score 100 in every domain",
            SimulationPlan::new(GameKind::Screening, Difficulty::Medium, PlayerStrategy::Perfect)
                .with_expectation(screening_expectation),
        ),
        "sloppy-screening" => TestScenario::new(
            "sloppy-screening",
            "Screening severity bands",
            "Severity always matches the overall screening score",
            SimulationPlan::new(GameKind::Screening, Difficulty::Medium, PlayerStrategy::Sloppy)
                .with_expectation(severity_expectation),
        ),
        "adaptive-length" => TestScenario::new(
            "adaptive-length",
            "Adaptive sequence length",
            "Correct rounds lengthen the next sequence up to the cap",
            SimulationPlan::new(
                GameKind::SequenceRecall,
                Difficulty::Medium,
                PlayerStrategy::Perfect,
            )
            .with_expectation(adaptive_length_expectation),
        ),
        "step-recall" => TestScenario::new(
            "step-recall",
            "Direction step recall",
            "Step-recall prompts offer four directions including the asked move",
            SimulationPlan::new(GameKind::DirectionPath, Difficulty::Easy, PlayerStrategy::Random)
                .with_config(GameConfig {
                    direction_prompt: Some(DirectionPrompt::StepRecall),
                    ..GameConfig::default()
                })
                .with_expectation(step_recall_expectation),
        ),
        _ => return None,
    };
    Some(scenario)
}

fn tapping_expectation(summary: &SimulationSummary) -> Result<()> {
    let expected: usize = summary.lengths().iter().sum();
    ensure!(
        summary.taps == expected,
        "expected {expected} taps, saw {}",
        summary.taps
    );
    let result = summary.result.as_ref().context("tapping run did not finish")?;
    ensure!(result.accuracy == 100, "taps lost accuracy: {}", result.accuracy);
    Ok(())
}

fn timeout_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = summary.result.as_ref().context("idle run did not finish")?;
    ensure!(result.score == 0, "idle player scored {}", result.score);
    ensure!(
        summary.rounds.iter().all(|round| round.timed_out),
        "a round closed without timing out"
    );
    let limit = summary
        .rounds
        .first()
        .and_then(|round| round.latency_ms())
        .context("no latency recorded")?;
    ensure!(
        summary
            .rounds
            .iter()
            .all(|round| round.latency_ms() == Some(limit)),
        "timed out rounds disagree on the limit"
    );
    Ok(())
}

fn cancellation_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.cancelled, "session was not cancelled");
    ensure!(summary.reports == 0, "cancelled session reported a result");
    ensure!(summary.result.is_none(), "cancelled session kept a result");
    Ok(())
}

fn determinism_expectation(base: &SimulationPlan, summary: &SimulationSummary) -> Result<()> {
    let again = GameTester::new(false).run_plan(base, summary.seed)?;
    ensure!(
        again.rounds == summary.rounds,
        "seed {} produced different rounds on replay",
        summary.seed
    );
    ensure!(
        again.result == summary.result,
        "seed {} produced a different result on replay",
        summary.seed
    );
    Ok(())
}

fn replay_code_expectation(base: &SimulationPlan, summary: &SimulationSummary) -> Result<()> {
    ensure!(
        looks_like_replay_code(&summary.replay_code),
        "malformed replay code {}",
        summary.replay_code
    );
    let (game, seed) = decode_replay_code(&summary.replay_code)
        .with_context(|| format!("{} does not decode", summary.replay_code))?;
    ensure!(game == summary.game, "replay code names {game}");

    let first = GameTester::new(false).run_plan(base, seed)?;
    ensure!(
        first.replay_code == summary.replay_code,
        "decoded seed renders as {}",
        first.replay_code
    );
    ensure!(
        first.rounds == summary.rounds,
        "replaying {} does not reproduce seed {}",
        summary.replay_code,
        summary.seed
    );
    ensure!(
        first.result == summary.result,
        "replaying {} changed the result",
        summary.replay_code
    );
    Ok(())
}

fn screening_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = summary.result.as_ref().context("screening did not finish")?;
    let screening = result
        .screening
        .as_ref()
        .context("screening result lacks domain scores")?;
    ensure!(result.score == 100, "perfect screening scored {}", result.score);
    ensure!(
        screening.severity == Severity::Normal,
        "perfect screening rated {}",
        screening.severity
    );
    ensure!(
        screening.responses.len() == summary.rounds.len(),
        "{} responses for {} questions",
        screening.responses.len(),
        summary.rounds.len()
    );
    Ok(())
}

fn severity_expectation(summary: &SimulationSummary) -> Result<()> {
    let result = summary.result.as_ref().context("screening did not finish")?;
    let screening = result
        .screening
        .as_ref()
        .context("screening result lacks domain scores")?;
    let score = u8::try_from(result.score).context("screening score above 255")?;
    ensure!(
        screening.severity == Severity::from_score(score),
        "score {score} rated {}",
        screening.severity
    );
    ensure!(
        screening.domain_scores().overall().map_or(0, u32::from) == result.score,
        "overall domain mean differs from score {}",
        result.score
    );
    Ok(())
}

fn adaptive_length_expectation(summary: &SimulationSummary) -> Result<()> {
    let lengths = summary.lengths();
    ensure!(!lengths.is_empty(), "no sequence rounds played");
    ensure!(
        lengths.windows(2).all(|pair| pair[1] == pair[0] + 1 || pair[1] == pair[0]),
        "lengths did not grow one step at a time: {lengths:?}"
    );
    ensure!(
        lengths.windows(2).any(|pair| pair[1] > pair[0]),
        "length never adapted: {lengths:?}"
    );
    Ok(())
}

fn step_recall_expectation(summary: &SimulationSummary) -> Result<()> {
    for round in &summary.rounds {
        let PuzzleSpec::Direction(spec) = &round.spec else {
            anyhow::bail!("round {} is not a direction walk", round.index);
        };
        let DirectionQuestion::StepRecall {
            index,
            options,
            answer,
        } = &spec.question
        else {
            anyhow::bail!("round {} asked for a replay", round.index);
        };
        ensure!(options.len() == 4, "round {} offered {options:?}", round.index);
        ensure!(
            spec.steps.get(*index) == Some(answer),
            "round {} asks about the wrong move",
            round.index
        );
    }
    Ok(())
}
