use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Life Simulation Test Results".bright_cyan().bold())?;
    writeln!(writer, "{}", "===============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "Total scenario runs: {total_tests}")?;
    writeln!(writer, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(writer, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(writer, "Success rate: {:.1}%", success_rate(passed_tests, total_tests))?;
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
            "{status} {} (seed {})",
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            writer,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(writer, "   Average time: {:?}", result.average_duration)?;
        if let Some(summary) = &result.last_summary {
            writeln!(
                writer,
                "   Last run: {} days, {}/{} activities, {} random events, family of {}, fortune {:.0}",
                summary.days_played,
                summary.activities_succeeded,
                summary.activities_attempted,
                summary.random_events,
                summary.family_size,
                summary.family_fortune
            )?;
            if let Some(fingerprint) = summary.fingerprint {
                writeln!(writer, "   Fingerprint: {fingerprint:016x}")?;
            }
        }

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
    writeln!(writer, "# Kinfolk Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total scenario runs**: {total_tests}")?;
    writeln!(writer, "- **Passed**: {passed_tests}")?;
    writeln!(writer, "- **Failed**: {failed_tests}")?;
    writeln!(
        writer,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(writer, "## Detailed Results\n")?;
    writeln!(writer, "| Scenario | Seed | Result | Iterations | Average time |")?;
    writeln!(writer, "|---|---|---|---|---|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            writer,
            "| {} | {} | {status} | {}/{} | {:?} |",
            result.scenario_name,
            result.seed,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration
        )?;
    }

    let failed: Vec<&ScenarioResult> = results.iter().filter(|r| !r.passed).collect();
    if !failed.is_empty() {
        writeln!(writer, "\n## Failures\n")?;
        for result in failed {
            writeln!(writer, "### {} (seed {})\n", result.scenario_name, result.seed)?;
            for failure in &result.failures {
                writeln!(writer, "- {failure}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}
