mod llm;
mod logic;
mod storage;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::scenarios::all_scenario_names;
use logic::{
    LogicTester, NarratorMode, ScenarioResult, TesterConfig, find_scenario, list_scenarios,
    parse_seeds, split_csv,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "kinfolk-tester", version)]
#[command(about = "Automated QA runs for the Kinfolk family life simulation")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Days to simulate in long-running scenarios
    #[arg(long, default_value_t = 365)]
    days: u32,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Narration source for scenario runs
    #[arg(long, value_enum, default_value_t = NarratorMode::Offline)]
    narrator: NarratorMode,

    /// Directory used by the persistence scenario
    #[arg(long, default_value = "target/kinfolk-saves")]
    save_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&args.seeds)?;
    let results = run_scenarios(&args, &scenarios, &seeds);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:18} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "👪 Kinfolk Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for name in all_scenario_names() {
            if !scenarios.contains(&name) {
                scenarios.push(name);
            }
        }
    }
    scenarios
}

fn tester_config(args: &Args) -> TesterConfig {
    TesterConfig {
        days: args.days,
        narrator: args.narrator,
        save_dir: args.save_dir.clone(),
        verbose: args.verbose,
    }
}

fn run_scenarios(args: &Args, scenarios: &[String], seeds: &[u64]) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Life Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(tester_config(args));
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = find_scenario(scenario_name) {
            log::info!("running {} over {} seeds", scenario.name, seeds.len());
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        ReportFormat::Markdown => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Kinfolk Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
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
