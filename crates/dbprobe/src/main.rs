//! dbprobe - run an agent check once per configured instance and print what it emits.
//!
//! This is a debugging aid; in production the agent runtime schedules the checks.

use clap::{Parser, ValueEnum};
use dbprobe_core::{load_instances, tracing_setup, Check, CheckError, Collector};
use dbprobe_mysql_sys::{MySqlSysCheck, MySqlSysInstance};
use dbprobe_tcp_latency::{TcpLatencyCheck, TcpLatencyInstance};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

const CONFIG_DIR: &str = "/etc/dd-agent/conf.d";

#[derive(Parser)]
#[command(name = "dbprobe")]
#[command(version)]
#[command(about = "Run dbprobe agent checks once and print their output", long_about = None)]
struct Cli {
    /// Check to run
    #[arg(long, value_enum, default_value_t = CheckKind::TcpRtLatency)]
    check: CheckKind,

    /// Instance file to read. Can also be set via DBPROBE_CONFIG env var (flag takes precedence).
    /// Defaults to /etc/dd-agent/conf.d/<check name>.yaml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CheckKind {
    TcpRtLatency,
    MysqlSys,
}

/// Host label printed before each instance runs.
trait Target {
    fn target(&self) -> &str;
}

impl Target for TcpLatencyInstance {
    fn target(&self) -> &str {
        &self.host
    }
}

impl Target for MySqlSysInstance {
    fn target(&self) -> &str {
        if self.server.is_empty() {
            &self.defaults_file
        } else {
            &self.server
        }
    }
}

fn default_config<C: Check>() -> PathBuf {
    Path::new(CONFIG_DIR).join(format!("{}.yaml", C::NAME))
}

fn print_json<T: Serialize>(label: &str, items: &[T]) -> Result<(), CheckError> {
    println!("{}: {}", label, serde_json::to_string(items)?);
    Ok(())
}

/// Returns false if any instance failed.
fn run_instances<C>(check: &C, path: Option<PathBuf>) -> Result<bool, CheckError>
where
    C: Check,
    C::Instance: Target,
{
    let path = path.unwrap_or_else(default_config::<C>);
    let instances: Vec<C::Instance> = load_instances(&path)?;
    info!("Running {} against {} instance(s) from {}", C::NAME, instances.len(), path.display());

    let mut all_ok = true;
    for instance in &instances {
        println!("\nRunning the check against host: {}", instance.target());

        let mut collector = Collector::new();
        if let Err(e) = check.check(instance, &mut collector) {
            error!("{} failed for {}: {}", C::NAME, instance.target(), e);
            println!("Error: {}", e);
            all_ok = false;
        }

        if collector.has_events() {
            print_json("Events", &collector.take_events())?;
        }
        let warnings = collector.take_warnings();
        if !warnings.is_empty() {
            print_json("Warnings", &warnings)?;
        }
        print_json("Metrics", &collector.take_metrics())?;
    }

    Ok(all_ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_setup::init_with_level(tracing::Level::DEBUG);
    } else {
        tracing_setup::init();
    }

    // Resolve config: CLI flag > env var > per-check default
    let config = cli
        .config
        .or_else(|| env::var_os("DBPROBE_CONFIG").map(PathBuf::from));

    let result = match cli.check {
        CheckKind::TcpRtLatency => run_instances(&TcpLatencyCheck::new(), config),
        CheckKind::MysqlSys => run_instances(&MySqlSysCheck::new(), config),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Failed to run check: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
