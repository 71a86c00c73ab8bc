use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::NarratorMode;
use super::scenarios::{RunSummary, ScenarioCtx, TestScenario};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
    pub last_summary: Option<RunSummary>,
}

#[derive(Debug, Clone)]
pub struct TesterConfig {
    pub days: u32,
    pub narrator: NarratorMode,
    pub save_dir: PathBuf,
    pub verbose: bool,
}

pub struct LogicTester {
    config: TesterConfig,
}

impl LogicTester {
    pub const fn new(config: TesterConfig) -> Self {
        Self { config }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.config.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {seed}, narrator: {:?})",
                    scenario.name.bright_white(),
                    self.config.narrator
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut last_summary = None;

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let ctx = ScenarioCtx {
                seed: iteration_seed,
                days: self.config.days,
                narrator: self.config.narrator,
                save_dir: self.config.save_dir.clone(),
                verbose: self.config.verbose,
            };
            let start_time = Instant::now();

            match scenario.run(&ctx) {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.config.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) days:{} activities:{}/{} family:{} fortune:{:.0}",
                            i + 1,
                            iterations,
                            summary.days_played,
                            summary.activities_succeeded,
                            summary.activities_attempted,
                            summary.family_size,
                            summary.family_fortune
                        );
                    }
                    if summary.narrator_failures > 0 {
                        log::warn!(
                            "{} seed {iteration_seed}: narrator fell back {} times",
                            scenario.name,
                            summary.narrator_failures
                        );
                    }
                    last_summary = Some(summary);
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.config.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
            last_summary,
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::find_scenario;

    fn tester() -> LogicTester {
        LogicTester::new(TesterConfig {
            days: 14,
            narrator: NarratorMode::Offline,
            save_dir: std::env::temp_dir().join(format!("kinfolk-tester-{}", std::process::id())),
            verbose: false,
        })
    }

    #[test]
    fn one_result_per_seed() {
        let scenario = find_scenario("smoke").unwrap();
        let results = tester().run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
            assert!(result.last_summary.is_some());
        }
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".into(),
            seed: 9,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(1500),
            performance_data: vec![Duration::from_millis(1500)],
            last_summary: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 1500);
        assert_eq!(json["performance_data"][0], 1500);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(1500));
    }
}
