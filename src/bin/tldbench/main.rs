//! Binary entry point for the benchmark harness.
#![forbid(unsafe_code)]

mod ui;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tldbench::{
    parse_pool, save_summary, summarize, AvailabilityDiff, BenchError, BenchmarkOutcome,
    HarnessConfig, Implementation, ProcessOutcome, Scenario, ScenarioPlanner, Session,
    SessionObserver, SessionSummary, SummaryDocument,
};
use tracing_subscriber::EnvFilter;
use ui::{format_duration, ColorChoice, Task, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "tldbench",
    version,
    about = "Run controlled benchmark passes across baseline and optimized lookup implementations"
)]
struct Cli {
    #[arg(long, default_value_t = 3, help = "Number of benchmark scenarios to execute")]
    runs: usize,

    #[arg(
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of letters per domain combination"
    )]
    letters: u32,

    #[arg(
        long,
        default_value_t = 500,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Maximum domains per run"
    )]
    limit: u32,

    #[arg(
        long,
        default_value = ".com,.io,.dev,.app,.ai,.xyz",
        help = "Comma-separated pool of TLDs to sample from"
    )]
    tlds: String,

    #[arg(
        long,
        default_value_t = 2,
        allow_negative_numbers = true,
        help = "How many TLDs to include per run (clamped to the pool size)"
    )]
    tlds_per_run: i64,

    #[arg(
        long,
        default_value_t = 200,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Concurrency limit passed to the optimized implementation"
    )]
    concurrency: u32,

    #[arg(long, default_value_t = 13, help = "Random seed for reproducible sampling")]
    seed: u64,

    #[arg(long, value_name = "FILE", help = "Write the aggregated summary JSON here")]
    summary_out: Option<PathBuf>,

    #[arg(long, help = "Print planned scenarios without executing anything")]
    dry_run: bool,

    #[arg(
        long,
        value_name = "FILE",
        env = "TLDBENCH_CONFIG",
        help = "Harness config file (defaults to ./tldbench.toml when present)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SECS",
        help = "Kill an implementation that runs longer than this"
    )]
    timeout_secs: Option<u64>,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Format of the aggregate summary"
    )]
    format: OutputFormat,

    #[arg(long, value_enum, default_value_t = ColorArg::Auto, help = "When to colour output")]
    color: ColorArg,

    #[arg(long, short, help = "Plain output without icons or spinners")]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(color: ColorArg) -> Self {
        match color {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

fn main() {
    init_tracing();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Returns `Ok(false)` when the session stopped on a failing scenario.
fn run() -> Result<bool, Box<dyn Error>> {
    let cli = Cli::parse();
    let ui = Ui::new(cli.color.into(), cli.quiet);

    let pool = parse_pool(&cli.tlds)?;
    let planner = ScenarioPlanner {
        letters: cli.letters,
        limit: cli.limit,
        concurrency: cli.concurrency,
    };
    let scenarios = planner.plan(&pool, cli.tlds_per_run, cli.runs, cli.seed)?;

    if cli.dry_run {
        ui.list(
            "Planned scenarios (dry-run):",
            scenarios
                .iter()
                .enumerate()
                .map(|(idx, scenario)| format!("Run {}: {scenario}", idx + 1)),
        );
        return Ok(true);
    }

    let mut config = HarnessConfig::load(cli.config.as_deref())?;
    if cli.timeout_secs.is_some() {
        config.timeout_secs = cli.timeout_secs;
    }

    let mut session = Session::new(&config, ConsoleObserver::new(&ui));
    let report = session.run(&scenarios)?;

    let summary = summarize(&report.outcomes);
    ui.spacer();
    print_summary(&ui, cli.format, &summary)?;

    let complete = report.is_complete();
    if let Some(path) = &cli.summary_out {
        let mut document = SummaryDocument::new(report.outcomes, summary);
        if let Some((index, err)) = &report.failure {
            document = document.with_failure(format!("benchmark {index} failed: {err}"));
        }
        save_summary(path, &document)?;
        ui.success(&format!("Summary written to {}", path.display()));
    }
    Ok(complete)
}

fn print_summary(
    ui: &Ui,
    format: OutputFormat,
    summary: &SessionSummary,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            ui.heading("Aggregate Summary");
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => ui.section(
            "Aggregate Summary",
            [
                ("runs", summary.run_count.to_string()),
                ("avg speedup", format!("{:.1}%", summary.avg_speedup_pct)),
                (
                    "avg baseline",
                    format!("{:.1} ms", summary.avg_baseline_duration_ms),
                ),
                (
                    "avg optimized",
                    format!("{:.1} ms", summary.avg_optimized_duration_ms),
                ),
                ("mismatched tlds", summary.total_mismatched_tlds.to_string()),
                (
                    "mismatched domains",
                    summary.total_mismatched_domains.to_string(),
                ),
            ],
        ),
    }
    Ok(())
}

struct ConsoleObserver<'a> {
    ui: &'a Ui,
    task: Option<Task>,
}

impl<'a> ConsoleObserver<'a> {
    fn new(ui: &'a Ui) -> Self {
        Self { ui, task: None }
    }

    fn finish_task(&mut self) -> Option<std::time::Duration> {
        self.task.take().map(Task::finish)
    }
}

impl<'a> SessionObserver for ConsoleObserver<'a> {
    fn scenario_started(&mut self, index: usize, total: usize, _scenario: &Scenario) {
        self.ui.spacer();
        self.ui.heading(&format!("Benchmark {index}/{total}"));
    }

    fn run_started(&mut self, implementation: Implementation, scenario: &Scenario) {
        let label = match implementation {
            Implementation::Baseline => format!("Baseline run: {scenario}"),
            Implementation::Optimized => format!(
                "Optimized run: {scenario}, concurrency={}",
                scenario.concurrency
            ),
        };
        self.ui.info(&label);
        self.task = Some(self.ui.task(format!("{implementation} running")));
    }

    fn run_finished(&mut self, implementation: Implementation, outcome: &ProcessOutcome) {
        let waited = self.finish_task().unwrap_or(outcome.elapsed);
        print!("{}", outcome.output);
        if !outcome.output.is_empty() && !outcome.output.ends_with('\n') {
            println!();
        }
        self.ui.info(&format!(
            "{implementation} finished in {}",
            format_duration(waited)
        ));
    }

    fn scenario_completed(
        &mut self,
        _index: usize,
        outcome: &BenchmarkOutcome,
        diff: &AvailabilityDiff,
    ) {
        self.ui.success(&format!(
            "Speedup: {:.1}% (baseline {}, optimized {})",
            outcome.speedup_pct,
            outcome.baseline.summary_text(),
            outcome.optimized.summary_text()
        ));
        if outcome.mismatched_domains > 0 {
            self.ui.warn(&format!(
                "Availability mismatch detected: {} domains across {} TLDs",
                outcome.mismatched_domains, outcome.mismatched_tlds
            ));
            if !self.ui.is_quiet() {
                self.ui.list(
                    "Mismatched TLDs",
                    diff.categories.iter().map(|mismatch| {
                        format!(
                            "{}: only baseline [{}], only optimized [{}]",
                            mismatch.category,
                            mismatch.only_baseline.join(", "),
                            mismatch.only_optimized.join(", ")
                        )
                    }),
                );
            }
        }
    }

    fn scenario_failed(&mut self, index: usize, error: &BenchError) {
        let _ = self.finish_task();
        self.ui.error(&format!("Benchmark {index} failed: {error}"));
    }
}
