//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::{Path, PathBuf};

use mutcheck_core::vocab;
use mutcheck_core::{VersionTriple, check_minimum};

use crate::harness::install::Manifest;
use crate::harness::project::ProjectSynthesizer;
use crate::harness::{
    CaseReporter, CompatHarness, ConsoleReporter, HarnessConfig, HarnessError, JsonReporter, OutputMode, Workspace,
};

use super::{CliError, CliResult, ExitCode, ReportFormat, RunArgs};

/// Turn a harness error into a CLI error rendered with its diagnostic code and help.
fn harness_failure(err: HarnessError) -> CliError {
    CliError::failure(format!("{:?}", miette::Report::new(err)))
}

/// Build the harness configuration from `run` flags.
pub fn config_from_args(args: &RunArgs) -> HarnessConfig {
    let mut config = HarnessConfig::new()
        .with_provisioner(&args.provisioner)
        .with_minimum(args.minimum)
        .with_output(if args.stream {
            OutputMode::Inherit
        } else {
            OutputMode::Capture
        });
    if let Some(root) = &args.source_root {
        config = config.with_source_root(root);
    }
    for (key, value) in &args.env {
        config = config.with_env(key, value);
    }
    config
}

/// Specifiers to run: the ones given on the command line, else the supported table.
pub fn requested_specs(args: &RunArgs) -> Vec<String> {
    if args.python.is_empty() {
        vocab::SUPPORTED_SPECS.iter().map(|s| s.spec.to_string()).collect()
    } else {
        args.python.clone()
    }
}

/// `mutcheck run`
pub fn run_cases(args: &RunArgs) -> CliResult<ExitCode> {
    let harness = CompatHarness::new(config_from_args(args));
    let specs = requested_specs(args);
    let workspace = match &args.workdir {
        Some(dir) => Workspace::Dir(dir.clone()),
        None => Workspace::Temp { keep: args.keep },
    };
    let mut reporter: Box<dyn CaseReporter> = match args.format {
        ReportFormat::Console => Box::new(ConsoleReporter::new(args.verbose)),
        ReportFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let summary = match harness.run_all(&specs, &workspace, reporter.as_mut(), args.stop_on_fail) {
        Ok(summary) => summary,
        Err(err) if err.is_skip() => {
            tracing::warn!(error = %err, "skipping compatibility run");
            eprintln!("skipped: {}", err);
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(harness_failure(err)),
    };

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        // The reporter has already printed every failure.
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

/// `mutcheck synthesize`
pub fn synthesize_project(dir: &Path, spec: &str, source_root: Option<PathBuf>) -> CliResult<ExitCode> {
    let mut config = HarnessConfig::new();
    if let Some(root) = source_root {
        config = config.with_source_root(root);
    }
    let project = ProjectSynthesizer::new(dir, spec)
        .with_tool_module(&config.tool_module)
        .with_test_runner(&config.test_runner, &config.runner_command)
        .synthesize(&Manifest::for_config(&config))
        .map_err(harness_failure)?;

    for file in &project.files {
        println!("{}", project.root.join(file).display());
    }
    Ok(ExitCode::SUCCESS)
}

/// `mutcheck gate`
pub fn gate_check(version: &str, minimum: VersionTriple) -> CliResult<ExitCode> {
    let installed = check_minimum(vocab::GATED_DEPENDENCY, version, minimum)
        .map_err(|violation| harness_failure(HarnessError::from(violation)))?;
    println!(
        "{} {} (parsed as {}) satisfies >= {}",
        vocab::GATED_DEPENDENCY,
        version.trim(),
        installed,
        minimum
    );
    Ok(ExitCode::SUCCESS)
}

/// `mutcheck specs`
pub fn list_specs() -> CliResult<ExitCode> {
    for supported in vocab::SUPPORTED_SPECS {
        println!("{:<6} {:<10} {}", supported.spec, supported.id, supported.channel);
    }
    Ok(ExitCode::SUCCESS)
}
