//! lectern - Deterministic quality gate for lesson-production pipelines
//!
//! CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lectern::config::Config;
use lectern::error::exit_codes;
use lectern::storage::FileStateStore;

/// lectern - Deterministic quality gate for lesson-production pipelines
#[derive(Parser)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an item batch into the category catalog
    Classify {
        /// Input JSON file ("-" or absent for stdin)
        input: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate content units against limits and quotas
    Validate {
        /// Input JSON file ("-" or absent for stdin)
        input: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Evaluate the quality gate over scores or violations
    Score {
        /// Input JSON file ("-" or absent for stdin)
        input: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Build a prioritized action-item report from violations
    Report {
        /// Input JSON file ("-" or absent for stdin)
        input: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Run the full pipeline over a sections file
    Run {
        /// Input JSON file ("-" or absent for stdin)
        input: Option<PathBuf>,
        /// Run identifier (overrides the input's run_id field)
        #[arg(long)]
        run_id: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Take a named checkpoint of a run
    Checkpoint {
        /// Run identifier
        run_id: String,
        /// Checkpoint name
        name: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Restore a run from a named checkpoint
    Recover {
        /// Run identifier
        run_id: String,
        /// Checkpoint name
        name: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List persisted runs
    Runs {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Maximum number of runs to show
        #[arg(long, short, default_value = "20")]
        limit: usize,
    },

    /// Delete old run records
    Clean {
        /// Remove runs last updated before this duration ago (e.g. "7d")
        #[arg(long)]
        before: Option<String>,
        /// Show what would be cleaned without removing
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Write a starter .lectern/config.toml
    Init {
        /// Overwrite an existing config
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("lectern error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Convert a command's success flag to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::OK as u8)
    } else {
        ExitCode::from(exit_codes::FAIL as u8)
    }
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { input, json, quiet } => run_classify(input, json, quiet),
        Commands::Validate { input, json, quiet } => run_validate(input, json, quiet),
        Commands::Score { input, json, quiet } => run_score(input, json, quiet),
        Commands::Report { input, json, quiet } => run_report(input, json, quiet),
        Commands::Run {
            input,
            run_id,
            json,
            quiet,
        } => run_run(input, run_id, json, quiet),
        Commands::Checkpoint {
            run_id,
            name,
            json,
            quiet,
        } => run_checkpoint(&run_id, &name, json, quiet),
        Commands::Recover {
            run_id,
            name,
            json,
            quiet,
        } => run_recover(&run_id, &name, json, quiet),
        Commands::Runs { json, quiet, limit } => run_runs(json, quiet, limit),
        Commands::Clean {
            before,
            dry_run,
            json,
            quiet,
        } => run_clean(before, dry_run, json, quiet),
        Commands::Init { force, json, quiet } => run_init(force, json, quiet),
    }
}

fn run_classify(
    input: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::classify::{ClassifyCommand, ClassifyOptions};

    let config = Config::load();
    let input_json = lectern::cli::read_input(input.as_deref())?;

    let cmd = ClassifyCommand::new(config);
    let options = ClassifyOptions { json, quiet };

    let output = cmd.run(&input_json, &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_validate(
    input: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::validate::{ValidateCommand, ValidateOptions};

    let config = Config::load();
    let input_json = lectern::cli::read_input(input.as_deref())?;

    let cmd = ValidateCommand::new(config);
    let options = ValidateOptions { json, quiet };

    let output = cmd.run(&input_json, &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_score(
    input: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::score::{ScoreCommand, ScoreOptions};

    let config = Config::load();
    let input_json = lectern::cli::read_input(input.as_deref())?;

    let cmd = ScoreCommand::new(config);
    let options = ScoreOptions { json, quiet };

    let output = cmd.run(&input_json, &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_report(
    input: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::report_cmd::{ReportCommand, ReportOptions};

    let input_json = lectern::cli::read_input(input.as_deref())?;

    let cmd = ReportCommand::new();
    let options = ReportOptions { json, quiet };

    let output = cmd.run(&input_json, &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_run(
    input: Option<PathBuf>,
    run_id: Option<String>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::run_cmd::{RunCommand, RunOptions};

    let config = Config::load();
    let store = FileStateStore::new()?;
    let input_json = lectern::cli::read_input(input.as_deref())?;

    let cmd = RunCommand::new(store, config);
    let options = RunOptions { json, quiet };

    let output = cmd.run(&input_json, run_id.as_deref(), &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_checkpoint(
    run_id: &str,
    name: &str,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::checkpoint::{CheckpointCommand, CheckpointOptions};

    let store = FileStateStore::new()?;

    let cmd = CheckpointCommand::new(store);
    let options = CheckpointOptions { json, quiet };

    let output = cmd.run(run_id, name, &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_recover(
    run_id: &str,
    name: &str,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::recover::{RecoverCommand, RecoverOptions};

    let store = FileStateStore::new()?;

    let cmd = RecoverCommand::new(store);
    let options = RecoverOptions { json, quiet };

    let output = cmd.run(run_id, name, &options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_runs(
    json: bool,
    quiet: bool,
    limit: usize,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::runs_cmd::{RunsCommand, RunsOptions};

    let store = FileStateStore::new()?;

    let cmd = RunsCommand::new(store);
    let options = RunsOptions { json, quiet, limit };

    let output = cmd.run(&options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_clean(
    before: Option<String>,
    dry_run: bool,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::clean::{CleanCommand, CleanOptions};

    let store = FileStateStore::new()?;

    let cmd = CleanCommand::new(store);
    let options = CleanOptions {
        json,
        quiet,
        before,
        dry_run,
    };

    let output = cmd.run(&options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_init(force: bool, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use lectern::cli::init::{InitCommand, InitOptions};

    let cwd = std::env::current_dir()?;

    let cmd = InitCommand::new(cwd);
    let options = InitOptions { json, quiet, force };

    let output = cmd.run(&options);
    let formatted = cmd.format_output(&output, &options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}
