use std::env;
use std::fs;
use std::path;
use std::process::ExitCode;

use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

pub mod catalog;
pub mod common;
pub mod config;
pub mod plan;

use catalog::{PgCatalog, RelationCatalog, enrich_from};
use common::{PlanError, PlanResult};
use plan::{ParseMode, parse, parse_strict, render, tokenize};

pub const USAGE: &str = "usage: pgplan [--strict] [--json] [--offline] <PLAN>";

/// Logs go to stderr and a daily rolling file; stdout only carries the plan.
/// Keep the returned guard alive until the process ends so the file layer flushes.
pub fn init_log() -> PlanResult<WorkerGuard> {
    let log_path = path::Path::new(config::LOG_PATH);
    let log_dir = log_path.parent().unwrap_or_else(|| path::Path::new("."));
    let log_filename = log_path.file_name().unwrap_or_else(|| config::NAME.as_ref());
    fs::create_dir_all(log_dir)?;

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_level(true);

    let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config::log_filter()))
        .with(stderr_log)
        .with(file_log)
        .init();

    Ok(guard)
}

/// Command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub plan: String,
    pub mode: ParseMode,
    pub json: bool,
    pub offline: bool,
    pub help: bool,
}

impl Options {
    /// Parses arguments, not including the program name.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> PlanResult<Self> {
        let mut opts = Options::default();
        let mut plan = None;
        for arg in args {
            match arg.as_str() {
                "--strict" => opts.mode = ParseMode::Strict,
                "--json" => opts.json = true,
                "--offline" => opts.offline = true,
                "-h" | "--help" => opts.help = true,
                flag if flag.starts_with("--") => {
                    return Err(PlanError::Usage(format!("unknown option '{}'", flag)));
                }
                _ if plan.is_some() => {
                    return Err(PlanError::Usage("expected a single plan argument".to_string()));
                }
                _ => plan = Some(arg),
            }
        }
        match plan {
            Some(plan) => opts.plan = plan,
            None if opts.help => {}
            None => return Err(PlanError::Usage("missing plan argument".to_string())),
        }
        Ok(opts)
    }
}

/// Parses the plan in `opts`, names its relations through `catalog` when
/// given, and returns the text to print.
pub fn describe(opts: &Options, catalog: Option<&dyn RelationCatalog>) -> PlanResult<String> {
    let tokens = tokenize(&opts.plan);
    let mut stmt = match opts.mode {
        ParseMode::Lenient => parse(&tokens),
        ParseMode::Strict => parse_strict(&tokens)?,
    };
    if let Some(catalog) = catalog {
        enrich_from(&mut stmt, catalog)?;
    }
    debug!("plan: {}", stmt);
    if opts.json {
        Ok(serde_json::to_string_pretty(&stmt)? + "\n")
    } else {
        Ok(render(&stmt))
    }
}

fn execute(opts: &Options) -> PlanResult<String> {
    if opts.help {
        return Ok(format!("{} {}\n{}\n", config::NAME, config::VERSION, USAGE));
    }
    if opts.offline {
        return describe(opts, None);
    }
    let catalog = PgCatalog::connect(&config::database_url())?;
    describe(opts, Some(&catalog))
}

pub fn run() -> ExitCode {
    let _guard = match init_log() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("pgplan: logging disabled: {}", e);
            None
        }
    };

    let result = Options::from_args(env::args().skip(1)).and_then(|opts| execute(&opts));
    match result {
        Ok(output) => {
            print!("{}", output);
            info!("{} finished", config::NAME);
            ExitCode::SUCCESS
        }
        Err(e @ PlanError::Usage(_)) => {
            error!("{}", e);
            eprintln!("pgplan: {}\n{}", e, USAGE);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("pgplan: {}", e);
            ExitCode::FAILURE
        }
    }
}
