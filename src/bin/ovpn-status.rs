//! ovpn-status command-line tool
//!
//! Reads an OpenVPN server config, parses the status file it points at and
//! prints the result as JSON or OpenMetrics on stdout.
//!
//! Exit codes: 0 clean, 1 fatal error, 2 output written but some status
//! lines failed to decode.

use clap::Parser;
use log::{debug, error, info, warn};
use ovpn_status::{
    config::ServerConfig,
    error::{Result, StatusError},
    format::{Formatter as _, OutputFormat},
    status::parse_file,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

mod exit_code {
    pub const CLEAN: i32 = 0;
    pub const FATAL: i32 = 1;
    pub const PARTIAL: i32 = 2;
}

#[derive(Parser, Debug)]
#[command(name = "ovpn-status")]
#[command(about = "OpenVPN status parser - converts OpenVPN status files to JSON or OpenMetrics")]
#[command(version = ovpn_status::VERSION)]
#[command(after_help = "Examples:\n  ovpn-status --file /etc/openvpn/server.conf\n  ovpn-status --file /etc/openvpn/server.conf --format openmetrics")]
struct Args {
    /// Path to OpenVPN server config file
    #[arg(short, long, value_name = "CONFIG")]
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Pretty-print JSON output (only for json format)
    #[arg(long)]
    indent: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Re-read and print the status every SECONDS until interrupted
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
}

impl Args {
    /// Initialize logging based on verbosity level
    fn init_logging(&self) {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        if self.verbose {
            builder.filter_level(log::LevelFilter::Debug);
        }
        builder.init();
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // help and version go to stdout and are not failures
            process::exit(if e.use_stderr() {
                exit_code::FATAL
            } else {
                exit_code::CLEAN
            });
        }
    };
    args.init_logging();
    debug!("{args:?}");

    process::exit(dispatch(&args));
}

#[cfg(feature = "tokio-runtime")]
fn dispatch(args: &Args) -> i32 {
    match args.interval {
        Some(seconds) => watch::run(args, seconds),
        None => run_once(args),
    }
}

#[cfg(not(feature = "tokio-runtime"))]
fn dispatch(args: &Args) -> i32 {
    if args.interval.is_some() {
        warn!("--interval needs the tokio-runtime feature, running once");
    }
    run_once(args)
}

/// One config -> parse -> format -> print cycle; returns the exit code
fn run_once(args: &Args) -> i32 {
    let (output, errors) = match render(args) {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            return exit_code::FATAL;
        }
    };

    if !errors.is_empty() {
        report(&errors);
    }

    if let Err(e) = write_output(&output) {
        eprintln!("Error: failed to write output: {e}");
        return exit_code::FATAL;
    }

    if errors.is_empty() {
        exit_code::CLEAN
    } else {
        exit_code::PARTIAL
    }
}

fn render(args: &Args) -> Result<(String, Vec<StatusError>)> {
    let config = ServerConfig::from_file(&args.file)?;
    info!(
        "Config file parsed: server_id={}, status={}, version={}",
        config.id,
        config.status_file.display(),
        config.status_version
    );
    debug!("Resolved config: {}", serde_json::to_string(&config)?);

    let (status, errors) = parse_file(&config.status_file, config.status_version)?.into_parts();
    let status = status.with_server(config.server_info());

    let output = args.format.formatter(args.indent).format(&status)?;
    Ok((output, errors))
}

/// Recoverable errors go to stderr, never into the document
fn report(errors: &[StatusError]) {
    warn!("{} status line(s) failed to decode", errors.len());
    eprintln!(
        "Warning: encountered {} error(s) during parsing:",
        errors.len()
    );
    for err in errors {
        eprintln!("  {err}");
    }
}

fn write_output(output: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

#[cfg(feature = "tokio-runtime")]
mod watch {
    use super::{exit_code, run_once, Args};
    use log::{debug, error, info, warn};
    use std::time::Duration;
    use tokio::signal;
    use tokio::time::MissedTickBehavior;

    /// Run one cycle per tick until Ctrl+C or SIGTERM. Cycles never overlap.
    pub fn run(args: &Args, seconds: u64) -> i32 {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to start runtime: {e}");
                eprintln!("Error: failed to start runtime: {e}");
                return exit_code::FATAL;
            }
        };

        runtime.block_on(async {
            let mut ticker = tokio::time::interval(Duration::from_secs(seconds));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let shutdown = shutdown_signal();
            tokio::pin!(shutdown);

            info!("Refreshing every {seconds}s. Press Ctrl+C to stop.");
            loop {
                // shutdown first so the signal handlers exist before any output
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        info!("Shutdown signal received");
                        break;
                    }
                    _ = ticker.tick() => {
                        let code = run_once(args);
                        if code != exit_code::CLEAN {
                            warn!("Refresh finished with exit code {code}");
                        }
                    }
                }
            }
            exit_code::CLEAN
        })
    }

    async fn shutdown_signal() {
        tokio::select! {
            _ = signal::ctrl_c() => {
                debug!("Received Ctrl+C");
            }
            _ = terminate() => {
                debug!("Received SIGTERM");
            }
        }
    }

    #[cfg(unix)]
    async fn terminate() {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn terminate() {
        std::future::pending::<()>().await;
    }
}
