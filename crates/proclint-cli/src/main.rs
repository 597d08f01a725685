//! Proclint CLI
//!
//! Lints a packaged process plugin artifact or project: resolves the input,
//! prepares the project, discovers plugin descriptors, and runs the BPMN,
//! FHIR, and plugin-definition rule sets.

mod console;
mod report;

use clap::Parser;
use proclint_core::{MavenBuildRunner, StaticDescriptorSource};
use proclint_rules::Orchestrator;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "proclint")]
#[command(version = proclint_core::VERSION)]
#[command(about = "Static linter for healthcare process plugins (BPMN 2.0 + FHIR)")]
#[command(
    long_about = "Lints a process plugin project or packaged artifact: BPMN models with their\n\
Camunda extensions, FHIR resources (ActivityDefinition, Task, CodeSystem,\n\
ValueSet, Questionnaire, StructureDefinition), and the plugin declaration\n\
itself.\n\
\n\
Examples:\n  \
proclint .                          # Lint the project in the current directory\n  \
proclint target/plugin.jar --html   # Lint an artifact, render an HTML report\n  \
proclint . --mvn -DskipTests=false  # Override a default build goal"
)]
struct Cli {
    /// Directory, packaged artifact, archive URL, or Git URL to lint
    path: String,

    /// Append build goals; KEY=VALUE entries override matching defaults
    #[arg(long = "mvn", value_name = "GOAL", num_args = 1..)]
    mvn: Vec<String>,

    /// Remove goals from the default build vector
    #[arg(long = "skip", value_name = "GOAL", num_args = 1..)]
    skip: Vec<String>,

    /// Render HTML reports
    #[arg(long)]
    html: bool,

    /// Render per-plugin JSON reports
    #[arg(long)]
    json: bool,

    /// Report output directory
    #[arg(long = "report-path", value_name = "DIR", default_value = "proclint-report")]
    report_path: PathBuf,

    /// Include SUCCESS findings in console output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Force colored output
    #[arg(long)]
    color: bool,

    /// Return a zero exit code even when ERROR findings exist
    #[arg(long = "no-fail")]
    no_fail: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    configure_colors(cli.color);
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(has_errors) => {
            if has_errors && !cli.no_fail {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("proclint: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Lint the input; returns whether any ERROR finding exists
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let input = proclint_core::resolve_input(&cli.path)?;
    let setup = proclint_core::prepare(
        input.working_path(),
        &cli.mvn,
        &cli.skip,
        &MavenBuildRunner,
    )?;

    let orchestrator = Orchestrator::new()?;
    let report = orchestrator.lint(&setup, &StaticDescriptorSource)?;

    console::print_report(&report, cli.verbose > 0);

    if cli.html || cli.json {
        let written = report::write_reports(&report, &cli.report_path, cli.html, cli.json)?;
        for path in written {
            println!("Report written to {}", path.display());
        }
    }

    Ok(report.has_errors())
}

/// `--color` and `FORCE_COLOR` force colors on, `NO_COLOR` forces them off
fn configure_colors(force: bool) {
    if force || std::env::var_os("FORCE_COLOR").is_some() {
        colored::control::set_override(true);
    } else if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => "proclint=error",
        1 => "proclint=warn",
        2 => "proclint=info",
        3 => "proclint=debug",
        _ => "proclint=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
