use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::executor::{run_to_completion, Bytecode, Stdlib, Val, VM};

/// Exit status when at least one result was an error value
pub const EXIT_DATA_ERROR: i32 = 5;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry - run compiled filter bytecode against JSON input", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "quarry_core=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a program and print every result
    Run {
        /// Bytecode file (JSON)
        program: PathBuf,

        /// Input value as a JSON string
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,

        /// Read a stream of JSON inputs from a file (default: stdin)
        #[arg(long)]
        input_file: Option<PathBuf>,

        /// Pretty-print results
        #[arg(long)]
        pretty: bool,

        /// Abort when more than this many choice points are pending
        #[arg(long)]
        max_forks: Option<usize>,
    },

    /// Print a numbered instruction listing
    Disasm {
        /// Bytecode file (JSON)
        program: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Run a program repeatedly on one reused VM
    Bench {
        /// Bytecode file (JSON)
        program: PathBuf,

        /// Input value as a JSON string
        #[arg(long, default_value = "null")]
        input: String,

        /// Number of evaluations
        #[arg(long, default_value = "1000")]
        iterations: usize,
    },
}

/// Run the CLI by parsing process arguments; returns the exit status
pub fn run_cli() -> Result<i32> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<i32> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<i32> {
    let (pretty, max_forks) = match &cli.command {
        Commands::Run {
            pretty, max_forks, ..
        } => (pretty.then_some(true), *max_forks),
        _ => (None, None),
    };

    // Eagerly load and validate configuration before executing any command
    let config = Config::builder()
        .config_path(cli.config.clone())
        .log_level(cli.log_level.clone())
        .pretty(pretty)
        .max_forks(max_forks)
        .build()?;

    init_tracing(&config.log.level);
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Run {
            program,
            input,
            input_file,
            ..
        } => {
            let bytecode = Arc::new(load_program(&program)?);
            let inputs = input_stream(input, input_file)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run(&config, bytecode, inputs, &mut out)
        }

        Commands::Disasm { program } => {
            let bytecode = load_program(&program)?;
            print!("{}", bytecode.disassemble());
            Ok(0)
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(0)
        }

        Commands::Bench {
            program,
            input,
            iterations,
        } => {
            let bytecode = Arc::new(load_program(&program)?);
            let input: JsonValue =
                serde_json::from_str(&input).context("Failed to parse --input as JSON")?;
            bench(&config, bytecode, Val::from(input), iterations)
        }
    }
}

/// Set up logging to stderr
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Ignore a subscriber that is already installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_program(path: &Path) -> Result<Bytecode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read program {}", path.display()))?;
    Bytecode::from_json(&source)
        .with_context(|| format!("Failed to load program {}", path.display()))
}

type InputStream = Box<dyn Iterator<Item = serde_json::Result<JsonValue>>>;

fn input_stream(input: Option<String>, input_file: Option<PathBuf>) -> Result<InputStream> {
    if let Some(text) = input {
        return Ok(Box::new(std::iter::once(serde_json::from_str::<JsonValue>(
            &text,
        ))));
    }

    let reader: Box<dyn Read> = match input_file {
        Some(path) => Box::new(
            File::open(&path)
                .with_context(|| format!("Failed to open input {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };
    Ok(Box::new(
        serde_json::Deserializer::from_reader(BufReader::new(reader)).into_iter::<JsonValue>(),
    ))
}

/// Evaluate the program once per input, writing each result as a JSON line
///
/// Error values are reported on stderr and turn the exit status into
/// [`EXIT_DATA_ERROR`]; a fatal error aborts the run.
pub fn run(
    config: &Config,
    bytecode: Arc<Bytecode>,
    inputs: impl Iterator<Item = serde_json::Result<JsonValue>>,
    out: &mut impl Write,
) -> Result<i32> {
    let mut vm = VM::with_config(Arc::new(Stdlib), config.vm.clone());
    let mut status = 0;

    for input in inputs {
        let input = input.context("Failed to parse input")?;
        vm.execute(Arc::clone(&bytecode), Val::from(input));

        for result in vm.by_ref() {
            match result.context("Evaluation aborted")? {
                Val::Error(err) => {
                    eprintln!("quarry: error: {}", err.message);
                    status = EXIT_DATA_ERROR;
                }
                value => write_value(out, value, config.output.pretty)?,
            }
        }
    }

    Ok(status)
}

fn write_value(out: &mut impl Write, value: Val, pretty: bool) -> Result<()> {
    let json = JsonValue::from(value);
    if pretty {
        serde_json::to_writer_pretty(&mut *out, &json)?;
    } else {
        serde_json::to_writer(&mut *out, &json)?;
    }
    writeln!(out)?;
    Ok(())
}

fn bench(config: &Config, bytecode: Arc<Bytecode>, input: Val, iterations: usize) -> Result<i32> {
    let mut vm = VM::with_config(Arc::new(Stdlib), config.vm.clone());
    let mut results = 0;

    let start = Instant::now();
    for _ in 0..iterations {
        vm.execute(Arc::clone(&bytecode), input.clone());
        results += run_to_completion(&mut vm)
            .context("Evaluation aborted")?
            .len();
    }
    let elapsed = start.elapsed();

    let per_iteration = elapsed.as_secs_f64() * 1e6 / iterations.max(1) as f64;
    info!(iterations, results, ?elapsed, "benchmark complete");
    println!(
        "{} iterations, {} results, {:.2?} total, {:.2} us/iteration",
        iterations, results, elapsed, per_iteration
    );
    Ok(0)
}
