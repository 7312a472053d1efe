use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tourpool::data::integrity;
use tourpool::report::{self, Report, ReportOptions};
use tourpool::{format, Dataset};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tourpool")]
#[command(
    author,
    version,
    about = "Ranking heatmaps and rider contribution charts for a stage-race pool"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Directory holding ranking.csv and analysis.csv
    data_dir: PathBuf,

    /// Ranking table (default: <DATA_DIR>/ranking.csv)
    #[arg(long)]
    ranking: Option<PathBuf>,

    /// Analysis table (default: <DATA_DIR>/analysis.csv)
    #[arg(long)]
    analysis: Option<PathBuf>,

    /// Participant shown on the analysis tab at start (repeatable)
    #[arg(long = "select", value_name = "PARTICIPANT")]
    selected: Vec<String>,
}

impl DataArgs {
    fn load(&self) -> Result<Dataset> {
        let ranking = self
            .ranking
            .clone()
            .unwrap_or_else(|| self.data_dir.join(tourpool::data::RANKING_FILE));
        let analysis = self
            .analysis
            .clone()
            .unwrap_or_else(|| self.data_dir.join(tourpool::data::ANALYSIS_FILE));

        Dataset::load(&ranking, &analysis)
            .with_context(|| format!("loading tables from {}", self.data_dir.display()))
    }

    fn options(&self) -> ReportOptions {
        ReportOptions {
            selected: self.selected.clone(),
            narrow: false,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an HTML (or JSON) report
    Render {
        #[command(flatten)]
        data: DataArgs,

        /// Output report file (.html, .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for auto-named reports
        #[arg(long, default_value = "tourpool-reports")]
        report_dir: PathBuf,

        /// Always use the narrow ranking layout (last stages only)
        #[arg(long)]
        narrow: bool,

        /// Don't open the report afterwards
        #[arg(long)]
        no_open: bool,
    },

    /// Print the standings at the current stage
    Summary {
        #[command(flatten)]
        data: DataArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let result = match cli.command {
        Command::Render {
            data,
            output,
            report_dir,
            narrow,
            no_open,
        } => handle_render(&data, output, report_dir, narrow, no_open, cli.quiet),
        Command::Summary { data } => handle_summary(&data),
    };

    if let Err(e) = result {
        eprintln!("\x1b[31mError:\x1b[0m {:#}", e);
        std::process::exit(1);
    }
}

fn handle_render(
    data: &DataArgs,
    output: Option<PathBuf>,
    report_dir: PathBuf,
    narrow: bool,
    no_open: bool,
    quiet: bool,
) -> Result<()> {
    let dataset = data.load()?;
    let options = ReportOptions {
        narrow,
        ..data.options()
    };
    let report = Report::build(&dataset, &options);

    let output_path = match output {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&report_dir)
                .with_context(|| format!("creating {}", report_dir.display()))?;
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            report_dir.join(format!("tourpool_report_{}.html", timestamp))
        }
    };

    report::generate(&output_path, &report)
        .with_context(|| format!("writing {}", output_path.display()))?;

    if !quiet {
        eprintln!("\x1b[32mReport saved: {}\x1b[0m", output_path.display());
    }

    if !no_open {
        if let Err(e) = open::that(&output_path) {
            eprintln!("Failed to open report: {}", e);
        }
    }

    Ok(())
}

fn handle_summary(data: &DataArgs) -> Result<()> {
    let dataset = data.load()?;
    let rows = report::standings(&dataset);
    let issues = integrity::check(&dataset);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "\x1b[1mStandings after stage {}\x1b[0m", dataset.last_stage())?;
    writeln!(out, "{}", "─".repeat(78))?;
    writeln!(
        out,
        "{:<5} {:<24} {:>10}  {:<16}  {:<16}",
        "RANK", "PARTICIPANT", "POINTS", "BEST WEEK", "WORST WEEK"
    )?;

    for row in &rows {
        let week = |w: &Option<tourpool::analysis::WeekTotal>| match w {
            Some(w) => format!("{} ({})", w.week, format::integer(w.points)),
            None => "-".to_string(),
        };
        writeln!(
            out,
            "{:<5} {:<24} {:>10}  {:<16}  {:<16}",
            row.rank,
            truncate(&row.participant, 24),
            format::integer(row.total_points),
            week(&row.best_week),
            week(&row.worst_week)
        )?;
    }

    if rows.is_empty() {
        writeln!(out, "No ranking rows.")?;
    }

    if !issues.is_empty() {
        writeln!(out, "\n\x1b[33m{} inconsistencies in the export:\x1b[0m", issues.len())?;
        for issue in &issues {
            writeln!(out, "  {}", issue)?;
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
