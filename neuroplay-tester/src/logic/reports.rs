use anyhow::Result;
use colored::Colorize;
use neuroplay_game::numbers::usize_to_f64;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    usize_to_f64(passed) / usize_to_f64(results.len()) * 100.0
}

fn format_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "Total scenarios: {total_tests}")?;
    writeln!(writer, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(writer, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(writer, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            writer,
            "{} {} [{}]",
            status,
            result.scenario_name.bold(),
            result.replay_code
        )?;
        writeln!(
            writer,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            writer,
            "   Mean score: {} | Mean accuracy: {}%",
            format_mean(result.mean_score),
            format_mean(result.mean_accuracy)
        )?;
        writeln!(writer, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(writer, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(writer, "{}", "=====================".yellow())?;
        writeln!(
            writer,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            writer,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(writer, "# Neuroplay Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total scenarios**: {total_tests}")?;
    writeln!(writer, "- **Passed**: {passed_tests}")?;
    writeln!(writer, "- **Failed**: {failed_tests}")?;
    writeln!(writer, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(writer, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(writer, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            writer,
            "- **Game**: {} ({}, {} player)",
            result.game, result.difficulty, result.strategy
        )?;
        writeln!(
            writer,
            "- **Seed**: {} (`{}`)",
            result.seed, result.replay_code
        )?;
        writeln!(
            writer,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            writer,
            "- **Mean score**: {}",
            format_mean(result.mean_score)
        )?;
        writeln!(writer, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(writer, "  - {failure}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn generate_csv_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(
        writer,
        "scenario,game,difficulty,player,seed,replay_code,passed,iterations,successful,mean_score,mean_accuracy,avg_ms"
    )?;
    for result in results {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&result.scenario_name),
            result.game,
            result.difficulty,
            result.strategy,
            result.seed,
            result.replay_code,
            result.passed,
            result.iterations_run,
            result.successful_iterations,
            result.mean_score.map_or_else(String::new, |v| format!("{v:.2}")),
            result
                .mean_accuracy
                .map_or_else(String::new, |v| format!("{v:.2}")),
            result.average_duration.as_millis()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::PlayerStrategy;
    use neuroplay_game::{Difficulty, GameKind};

    fn sample(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "sequence_recall (easy, Perfect)".to_string(),
            game: GameKind::SequenceRecall,
            difficulty: Difficulty::Easy,
            strategy: PlayerStrategy::Perfect,
            seed: 1337,
            replay_code: "SQ-MAPLE42".to_string(),
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["score 50 exceeds max 40".to_string()]
            },
            mean_score: Some(40.0),
            mean_accuracy: Some(100.0),
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_report_lists_failures() {
        let out = render(|w| {
            generate_console_report(w, &[sample(true), sample(false)], Duration::from_secs(1))
        });
        assert!(out.contains("Total scenarios: 2"));
        assert!(out.contains("Success rate: 50.0%"));
        assert!(out.contains("score 50 exceeds max 40"));
        assert!(out.contains("Performance Summary"));
    }

    #[test]
    fn markdown_report_has_sections() {
        let out = render(|w| generate_markdown_report(w, &[sample(true)]));
        assert!(out.starts_with("# Neuroplay Logic Test Results"));
        assert!(out.contains("`SQ-MAPLE42`"));
        assert!(out.contains("- **Passed**: 1"));
    }

    #[test]
    fn json_report_round_trips() {
        let out = render(|w| generate_json_report(w, &[sample(false)]));
        let parsed: Vec<ScenarioResult> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(!parsed[0].passed);
    }

    #[test]
    fn csv_report_quotes_names_with_commas() {
        let out = render(|w| generate_csv_report(w, &[sample(true)]));
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("scenario,game,difficulty"));
        assert_eq!(
            lines.next().unwrap(),
            "\"sequence_recall (easy, Perfect)\",sequence_recall,easy,Perfect,1337,SQ-MAPLE42,true,2,2,40.00,100.00,3"
        );
    }
}
