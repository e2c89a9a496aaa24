use forge_cli::batch::{
    process_directory_parallel, process_directory_sequential, process_record_file, BatchConfig,
};
use forge_engine::{logging, RuntimeConfig};
use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <records.json|directory> [options]", args[0]);
        eprintln!("       {} --help", args[0]);
        return ExitCode::FAILURE;
    }

    if args[1] == "--help" {
        print_help(&args[0]);
        return ExitCode::SUCCESS;
    }

    let options = match parse_options(&args[2..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match load_runtime_config(options.config_path.as_deref()) {
        Ok(runtime) => runtime,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    if let Err(message) = logging::init_global_logging(&runtime.logging) {
        eprintln!("Error: {}", message);
        return ExitCode::FAILURE;
    }

    let input_path = Path::new(&args[1]);
    if input_path.is_file() {
        run_single_file(input_path, &runtime)
    } else if input_path.is_dir() {
        run_directory(input_path, &options, &runtime)
    } else {
        eprintln!("Error: Input must be a record file (.json) or directory");
        eprintln!("  Path: {}", input_path.display());
        ExitCode::FAILURE
    }
}

struct CliOptions {
    batch: BatchConfig,
    sequential: bool,
    config_path: Option<String>,
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut batch = BatchConfig::default();
    let mut sequential = false;
    let mut config_path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--sequential" => sequential = true,
            "--parallel" => sequential = false,
            "--threads" => {
                let value = iter.next().ok_or("--threads requires a number")?;
                batch.max_threads = value
                    .parse()
                    .map_err(|_| format!("Invalid thread count: {}", value))?;
            }
            "--no-recursive" => batch.recursive = false,
            "--max-files" => {
                let value = iter.next().ok_or("--max-files requires a number")?;
                batch.max_files = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid file count: {}", value))?,
                );
            }
            "--fail-fast" => batch.fail_fast = true,
            "--quiet" => batch.progress_reporting = false,
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                config_path = Some(value.clone());
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(CliOptions {
        batch,
        sequential,
        config_path,
    })
}

/// Load runtime configuration: an explicit --config path, a forge.toml in
/// the working directory, or the defaults.
fn load_runtime_config(explicit: Option<&str>) -> Result<RuntimeConfig, String> {
    let path = match explicit {
        Some(path) => Path::new(path).to_path_buf(),
        None => {
            let default = Path::new("forge.toml");
            if !default.exists() {
                return Ok(RuntimeConfig::default());
            }
            default.to_path_buf()
        }
    };

    let text = fs::read_to_string(&path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    RuntimeConfig::from_toml_str(&text).map_err(|e| e.to_string())
}

fn run_single_file(path: &Path, runtime: &RuntimeConfig) -> ExitCode {
    match process_record_file(path, runtime) {
        Ok(outcome) => {
            println!(
                "Conditioned {} record(s) from {} -> {}",
                outcome.records,
                outcome.path.display(),
                outcome.output.display()
            );
            if outcome.rejected_expressions > 0 {
                println!(
                    "  {} expression(s) rejected by the safety gate",
                    outcome.rejected_expressions
                );
            }
            ExitCode::SUCCESS
        }
        Err(reason) => {
            eprintln!("Error: {}", reason);
            ExitCode::FAILURE
        }
    }
}

fn run_directory(path: &Path, options: &CliOptions, runtime: &RuntimeConfig) -> ExitCode {
    let result = if options.sequential {
        process_directory_sequential(path, &options.batch, runtime)
    } else {
        process_directory_parallel(path, &options.batch, runtime)
    };

    match result {
        Ok(results) => {
            println!("{}", results.summary());
            for (file, reason) in &results.failed_files {
                eprintln!("  failed: {}: {}", file.display(), reason);
            }
            if results.failure_count() > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn print_help(program_name: &str) {
    println!("forge v{}", env!("CARGO_PKG_VERSION"));
    println!("Expression conditioning batch driver");
    println!();
    println!("USAGE:");
    println!(
        "    {} <records.json>                 # Process single document",
        program_name
    );
    println!(
        "    {} <directory> [options]          # Process directory",
        program_name
    );
    println!();
    println!("ARGUMENTS:");
    println!("    <records.json>  Record document (one record or an array)");
    println!("    <directory>     Directory containing record documents");
    println!();
    println!("OPTIONS:");
    println!("    --help              Show this help message");
    println!("    --sequential        Force sequential processing");
    println!("    --parallel          Force parallel processing (default)");
    println!("    --threads N         Set maximum number of worker threads");
    println!("    --no-recursive      Don't search subdirectories");
    println!("    --max-files N       Limit maximum files to process");
    println!("    --fail-fast         Stop on first error (sequential mode)");
    println!("    --quiet             Suppress progress reporting");
    println!("    --config PATH       Runtime configuration (TOML)");
    println!();
    println!("OUTPUT:");
    println!("    Each <name>.json produces <name>.artifact.json alongside it,");
    println!("    holding the conditioned expressions and rendered tables.");
}
