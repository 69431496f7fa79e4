use colored::Colorize;
use neuroplay_game::numbers::{mean_f64, usize_to_f64};
use neuroplay_game::{Difficulty, GameKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::game_tester::{
    GameTester, SimulationPlan, SimulationSummary, invariant_violations,
};
use crate::logic::players::PlayerStrategy;
use crate::logic::scenarios::TestScenario;
use crate::logic::seeds::SeedInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub game: GameKind,
    pub difficulty: Difficulty,
    pub strategy: PlayerStrategy,
    pub seed: u64,
    pub replay_code: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Mean reported score over finished iterations.
    pub mean_score: Option<f64>,
    pub mean_accuracy: Option<f64>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
    verbose: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self {
            tester: GameTester::new(verbose),
            verbose,
        }
    }

    /// One result per applicable seed. Replay-code seeds issued for another
    /// game are skipped.
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let game = scenario.plan.game;
        let mut results = Vec::new();

        for seed in seeds.iter().filter(|seed| seed.matches_game(game)) {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (game: {game} seed: {} code: {})",
                    scenario.name.bright_white(),
                    seed.seed,
                    seed.replay_code_for(game)
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        if results.is_empty() {
            log::warn!("no seed applies to {} ({game})", scenario.key);
        }
        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let outcome = self.run_simulation_iterations(&scenario.plan, seed.seed, iterations);

        let average_duration = if outcome.performance_data.is_empty() {
            Duration::ZERO
        } else {
            outcome.performance_data.iter().sum::<Duration>()
                / u32::try_from(outcome.performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            game: scenario.plan.game,
            difficulty: scenario.plan.difficulty,
            strategy: scenario.plan.strategy,
            seed: seed.seed,
            replay_code: seed.replay_code_for(scenario.plan.game),
            passed: outcome.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: outcome.successes,
            failures: outcome.failures,
            mean_score: mean_f64(&outcome.scores),
            mean_accuracy: mean_f64(&outcome.accuracies),
            average_duration,
            performance_data: outcome.performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> IterationOutcome {
        let mut outcome = IterationOutcome::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.tester.run_plan(plan, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    outcome.failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): simulation error: {err:#}",
                        i + 1
                    ));
                    if self.verbose {
                        println!("  ❌ Iteration {}/{iterations} errored: {err:#}", i + 1);
                    }
                    continue;
                }
            };

            if let Some(result) = &summary.result {
                outcome.scores.push(f64::from(result.score));
                outcome.accuracies.push(f64::from(result.accuracy));
            }

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_rounds(&summary);
                outcome.failures.push(format!(
                    "Iteration {} ({}, {}, player {}, replay {}, rounds {}, phase {}): {} | {}",
                    i + 1,
                    summary.game,
                    summary.difficulty,
                    summary.strategy,
                    summary.replay_code,
                    summary.rounds.len(),
                    summary.final_phase,
                    err,
                    context
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{iterations} failed: {}",
                        i + 1,
                        err.red()
                    );
                    println!("     ↳ Replay {} | {context}", summary.replay_code);
                }
            } else {
                outcome.successes += 1;
                let duration = start_time.elapsed();
                outcome.performance_data.push(duration);

                if self.verbose {
                    let score = summary
                        .result
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |r| format!("{}/{}", r.score, r.max_score));
                    println!(
                        "  ✅ Iteration {}/{iterations} passed ({duration:?}) score:{score} replay:{}",
                        i + 1,
                        summary.replay_code
                    );
                }
            }
        }

        outcome
    }
}

#[derive(Debug, Default)]
struct IterationOutcome {
    successes: usize,
    failures: Vec<String>,
    performance_data: Vec<Duration>,
    scores: Vec<f64>,
    accuracies: Vec<f64>,
}

/// Invariants first, then the scenario's own expectations.
fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    let violations = invariant_violations(summary);
    if !violations.is_empty() {
        return Some(violations.join("; "));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(format!("{err:#}"));
        }
    }
    None
}

fn summarize_rounds(summary: &SimulationSummary) -> String {
    if summary.rounds.is_empty() {
        return "no rounds recorded".to_string();
    }

    let correct = summary.correct_rounds();
    let timed_out = summary.rounds.iter().filter(|round| round.timed_out).count();
    let tail = summary
        .rounds
        .iter()
        .rev()
        .take(3)
        .map(|round| {
            let verdict = match round.evaluation {
                Some(evaluation) if evaluation.correct => "correct".to_string(),
                Some(evaluation) => format!("wrong ({})", evaluation.score),
                None => "open".to_string(),
            };
            format!("round {} {verdict}", round.index + 1)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{correct}/{} correct ({:.0}% timed out), last: {tail}",
        summary.rounds.len(),
        100.0 * usize_to_f64(timed_out) / usize_to_f64(summary.rounds.len())
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
