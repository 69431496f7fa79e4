use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use neuroplay_game::numbers::percent;
use neuroplay_game::{
    Clock, Difficulty, GameConfig, GameEngine, GameKind, GameResult, ManualClock, Phase,
    RecordingReporter, RoundRecord, SessionMachine, SubmitOutcome,
};

use crate::logic::players::{PlayerStrategy, split_taps};

/// Upper bound on driver iterations for a single session.
const MAX_SIMULATION_STEPS: usize = 2_000;
/// Virtual time skipped after a cancel to flush any surviving timer.
const CANCEL_SETTLE_MS: u64 = 3_600_000;
const POINTS_PER_ROUND: u32 = 10;

type Machine = SessionMachine<ManualClock, RecordingReporter>;

/// Orientation answers depend on the date, so runs pin it unless a plan
/// overrides it.
fn default_today() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 3, 14)
}

/// Declarative plan for one simulated session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub game: GameKind,
    pub difficulty: Difficulty,
    pub strategy: PlayerStrategy,
    pub config: GameConfig,
    /// Cancel once this many rounds have been resolved.
    pub cancel_after: Option<usize>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(game: GameKind, difficulty: Difficulty, strategy: PlayerStrategy) -> Self {
        Self {
            game,
            difficulty,
            strategy,
            config: GameConfig::default(),
            cancel_after: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn with_cancel_after(mut self, rounds: usize) -> Self {
        self.cancel_after = Some(rounds);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulated session.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub game: GameKind,
    pub difficulty: Difficulty,
    pub strategy: PlayerStrategy,
    pub replay_code: String,
    pub result: Option<GameResult>,
    /// Results the reporter received.
    pub reports: usize,
    pub rounds: Vec<RoundRecord>,
    pub total_rounds: u32,
    pub final_phase: Phase,
    pub ignored_submissions: usize,
    pub taps: usize,
    pub virtual_ms: u64,
    pub cancelled: bool,
    /// Problems spotted while driving the session.
    pub violations: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn correct_rounds(&self) -> usize {
        self.rounds.iter().filter(|round| round.is_correct()).count()
    }

    #[must_use]
    pub fn lengths(&self) -> Vec<usize> {
        self.rounds
            .iter()
            .filter_map(|round| round.spec.step_count())
            .collect()
    }
}

/// Headless runner that drives sessions on virtual time.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Play `plan` once with `seed`.
    ///
    /// # Errors
    ///
    /// Fails if content cannot be loaded or the session stalls.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let clock = ManualClock::new();
        let reporter = RecordingReporter::new();
        let mut machine = GameEngine::default()
            .create_session(plan.game, seed, clock.clone(), reporter.clone())
            .context("failed to load bundled content")?;

        let config = GameConfig {
            today: plan.config.today.or_else(default_today),
            ..plan.config.clone()
        };
        machine.start(plan.difficulty, &config);
        let total_rounds = machine.total_rounds();
        if self.verbose {
            println!(
                "🎮 Starting simulation | {} {} seed:{seed} replay:{} player:{}",
                plan.game,
                plan.difficulty,
                machine.replay_code(),
                plan.strategy
            );
        }

        let mut policy = plan.strategy.create_policy(seed);
        log::debug!("{} player driving {}", policy.name(), machine.replay_code());
        let mut run = RunState::default();
        let mut rounds = Vec::new();
        let mut steps = 0;

        while machine.phase() != Phase::Complete {
            steps += 1;
            if steps > MAX_SIMULATION_STEPS {
                bail!(
                    "session stalled in {} after {MAX_SIMULATION_STEPS} steps",
                    machine.phase()
                );
            }

            if let Some(limit) = plan.cancel_after {
                let resolved = machine.rounds().iter().filter(|r| r.is_resolved()).count();
                if resolved >= limit {
                    rounds = machine.rounds().to_vec();
                    run.cancelled = machine.cancel();
                    clock.advance(CANCEL_SETTLE_MS);
                    let fired = machine.poll();
                    if fired > 0 {
                        run.violations
                            .push(format!("{fired} timer(s) fired after cancel"));
                    }
                    break;
                }
            }

            match machine.phase() {
                Phase::Presenting => {
                    if let Some(probe) = machine.current_spec().map(|s| s.expected_answer()) {
                        match machine.submit_answer(probe) {
                            SubmitOutcome::Ignored => run.ignored += 1,
                            other => run.violations.push(format!(
                                "answer accepted during presentation of round {}: {other:?}",
                                machine.round_index() + 1
                            )),
                        }
                    }
                    advance(&mut machine, &clock)?;
                }
                Phase::Responding => {
                    let spec = machine
                        .current_spec()
                        .cloned()
                        .context("responding without a puzzle")?;
                    match policy.answer(&spec) {
                        None => advance(&mut machine, &clock)?,
                        Some(answer) => {
                            let taps = if policy.taps() {
                                split_taps(&answer)
                            } else {
                                None
                            };
                            let submissions = taps.unwrap_or_else(|| vec![answer]);
                            for submission in submissions {
                                if submission.is_step() {
                                    run.taps += 1;
                                }
                                if machine.submit_answer(submission) == SubmitOutcome::Ignored {
                                    run.ignored += 1;
                                }
                            }
                        }
                    }
                }
                Phase::RoundFeedback => advance(&mut machine, &clock)?,
                Phase::Ready => bail!("session fell back to ready without a cancel"),
                Phase::Complete => break,
            }
        }

        if !run.cancelled {
            rounds = machine.rounds().to_vec();
        }
        let summary = SimulationSummary {
            seed,
            game: plan.game,
            difficulty: plan.difficulty,
            strategy: plan.strategy,
            replay_code: machine.replay_code(),
            result: machine.result().cloned(),
            reports: reporter.count(),
            total_rounds,
            rounds,
            final_phase: machine.phase(),
            ignored_submissions: run.ignored,
            taps: run.taps,
            virtual_ms: clock.now_ms(),
            cancelled: run.cancelled,
            violations: run.violations,
        };

        if self.verbose {
            log_summary(&summary);
        }
        Ok(summary)
    }
}

#[derive(Debug, Default)]
struct RunState {
    ignored: usize,
    taps: usize,
    cancelled: bool,
    violations: Vec<String>,
}

/// Jump to the next pending timer and fire it.
fn advance(machine: &mut Machine, clock: &ManualClock) -> Result<()> {
    let deadline = machine
        .next_deadline()
        .with_context(|| format!("waiting in {} with no pending timer", machine.phase()))?;
    clock.set(deadline);
    machine.poll();
    Ok(())
}

fn log_summary(summary: &SimulationSummary) {
    match &summary.result {
        Some(result) => println!(
            "🏁 {} finished | score {}/{} accuracy {}% in {}s ({} rounds, {} taps)",
            summary.replay_code,
            result.score,
            result.max_score,
            result.accuracy,
            result.duration,
            summary.rounds.len(),
            summary.taps
        ),
        None => println!(
            "🛑 {} stopped in {} after {} rounds",
            summary.replay_code,
            summary.final_phase,
            summary.rounds.len()
        ),
    }
}

/// Checks every run must pass regardless of the scenario.
#[must_use]
pub fn invariant_violations(summary: &SimulationSummary) -> Vec<String> {
    let mut violations = summary.violations.clone();

    let expected_reports = usize::from(summary.final_phase == Phase::Complete);
    if summary.reports != expected_reports {
        violations.push(format!(
            "reporter called {} time(s) for a {} session",
            summary.reports, summary.final_phase
        ));
    }
    if summary.rounds.len() > usize::try_from(summary.total_rounds).unwrap_or(usize::MAX) {
        violations.push(format!(
            "{} rounds played out of {} configured",
            summary.rounds.len(),
            summary.total_rounds
        ));
    }
    if summary.cancelled && summary.result.is_some() {
        violations.push("cancelled session produced a result".to_string());
    }

    let Some(result) = &summary.result else {
        return violations;
    };
    if result.score > result.max_score {
        violations.push(format!(
            "score {} exceeds max {}",
            result.score, result.max_score
        ));
    }
    if summary.rounds.iter().any(|round| !round.is_resolved()) {
        violations.push("completed session has unresolved rounds".to_string());
    }

    if summary.strategy.always_correct() && result.score != result.max_score {
        violations.push(format!(
            "{} player scored {} of {}",
            summary.strategy, result.score, result.max_score
        ));
    }

    let correct = summary.correct_rounds();
    if !summary.game.is_screening() {
        let expected = u32::try_from(correct)
            .unwrap_or(u32::MAX)
            .saturating_mul(POINTS_PER_ROUND);
        if result.score != expected {
            violations.push(format!(
                "score {} does not match {correct} correct round(s)",
                result.score
            ));
        }
    }
    let accuracy = percent(correct, summary.rounds.len());
    if result.accuracy != accuracy {
        violations.push(format!(
            "accuracy {} should be {accuracy}",
            result.accuracy
        ));
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        GameTester::new(false).run_plan(plan, seed).unwrap()
    }

    #[test]
    fn perfect_sequence_session_is_clean() {
        let plan = SimulationPlan::new(
            GameKind::SequenceRecall,
            Difficulty::Medium,
            PlayerStrategy::Perfect,
        );
        let summary = run(&plan, 7);
        assert_eq!(summary.final_phase, Phase::Complete);
        assert_eq!(summary.reports, 1);
        assert_eq!(summary.result.as_ref().unwrap().score, 50);
        assert_eq!(summary.ignored_submissions, 5);
        assert!(invariant_violations(&summary).is_empty());
    }

    #[test]
    fn tapping_counts_every_step() {
        let plan = SimulationPlan::new(
            GameKind::SequenceRecall,
            Difficulty::Easy,
            PlayerStrategy::Tapping,
        );
        let summary = run(&plan, 3);
        let expected: usize = summary.lengths().iter().sum();
        assert_eq!(summary.taps, expected);
        assert_eq!(summary.result.unwrap().accuracy, 100);
    }

    #[test]
    fn cancelled_sessions_never_report() {
        let plan = SimulationPlan::new(
            GameKind::FaceName,
            Difficulty::Easy,
            PlayerStrategy::Perfect,
        )
        .with_cancel_after(2);
        let summary = run(&plan, 12);
        assert!(summary.cancelled);
        assert_eq!(summary.final_phase, Phase::Ready);
        assert_eq!(summary.reports, 0);
        assert_eq!(summary.rounds.len(), 2);
        assert!(invariant_violations(&summary).is_empty());
    }

    #[test]
    fn idle_hard_sessions_time_out() {
        let plan = SimulationPlan::new(
            GameKind::DirectionPath,
            Difficulty::Hard,
            PlayerStrategy::Idle,
        );
        let summary = run(&plan, 5);
        assert!(summary.rounds.iter().all(|round| round.timed_out));
        assert_eq!(summary.result.unwrap().score, 0);
    }

    #[test]
    fn idle_player_without_limit_is_reported_as_stall() {
        let plan = SimulationPlan::new(
            GameKind::MapNavigation,
            Difficulty::Easy,
            PlayerStrategy::Idle,
        );
        let err = GameTester::new(false).run_plan(&plan, 1).unwrap_err();
        assert!(err.to_string().contains("no pending timer"));
    }

    #[test]
    fn invariant_check_flags_inflated_scores() {
        let plan = SimulationPlan::new(
            GameKind::SequenceRecall,
            Difficulty::Easy,
            PlayerStrategy::Perfect,
        );
        let mut summary = run(&plan, 9);
        if let Some(result) = summary.result.as_mut() {
            result.score += 10;
        }
        let violations = invariant_violations(&summary);
        assert!(violations.iter().any(|v| v.contains("exceeds max")));
    }

    #[test]
    fn expectations_are_shared_closures() {
        let plan = SimulationPlan::new(
            GameKind::Screening,
            Difficulty::Medium,
            PlayerStrategy::Perfect,
        )
        .with_expectation(|summary: &SimulationSummary| {
            anyhow::ensure!(summary.reports == 1, "no report");
            Ok(())
        });
        let summary = run(&plan, 17);
        for expectation in &plan.expectations {
            expectation.evaluate(&summary).unwrap();
        }
    }
}
