/*!
 * boxpub CLI - Command Line Interface
 *
 * Version: 0.1.0
 * Author: Shane Wall <shaneawall@gmail.com>
 */

use boxpub::{
    artifact::{Artifact, BoxArtifact, VAGRANT_BUILDER_ID},
    config::{LogLevel, PublishConfig},
    destination,
    error::{Result, EXIT_SUCCESS},
    logging,
    output::{OperationResult, OutputWriter},
    Publisher,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boxpub")]
#[command(version, long_about = None)]
#[command(about = "Publish Vagrant boxes and maintain their version manifest")]
struct Cli {
    /// Box file produced by the vagrant post-processor
    #[arg(value_name = "BOX", required = true)]
    files: Vec<PathBuf>,

    /// Destination root directory or object store URL
    #[arg(long, value_name = "PATH")]
    path: Option<String>,

    /// Manifest location relative to the destination root
    #[arg(long, value_name = "FILE")]
    manifest: Option<String>,

    /// Box name recorded in a new manifest
    #[arg(long = "box-name", value_name = "NAME")]
    box_name: Option<String>,

    /// Directory under the root for this box's files
    #[arg(long = "box-dir", value_name = "DIR")]
    box_dir: Option<String>,

    /// Version to publish the box under
    #[arg(long = "box-version", value_name = "VERSION")]
    box_version: Option<String>,

    /// Builder that produced the box (selects the provider name)
    #[arg(long, default_value = "virtualbox")]
    builder: String,

    /// Builder id of the step that produced the box
    #[arg(long, default_value = VAGRANT_BUILDER_ID)]
    origin: String,

    /// Streaming buffer size in KB
    #[arg(long = "chunk-size", value_name = "KB")]
    chunk_size: Option<usize>,

    /// Log level
    #[arg(long = "log-level", value_enum)]
    log_level: Option<LogLevelArg>,

    /// Path to log file (default: stderr)
    #[arg(long = "log", value_name = "FILE")]
    log: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Output the result as JSON
    #[arg(long)]
    json: bool,

    /// Path to a TOML config file; command line options override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    let code = match run(cli, &output) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            output.error(&e.to_string(), Some(&e.category().to_string()));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, output: &OutputWriter) -> Result<()> {
    let config = build_config(&cli)?;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let artifact = BoxArtifact::new(cli.origin, cli.builder, cli.files);
    let source = artifact
        .files()
        .first()
        .map(|path| path.display().to_string());

    // Reject missing options before touching the destination
    config.validate()?;
    let destination = destination::open(&config.path)?;
    let publisher = Publisher::new(config, destination)?;
    let published = publisher.publish(&artifact)?;

    output.operation_result(&OperationResult {
        operation: "publish".to_string(),
        success: true,
        source,
        manifest: Some(published.location().to_string()),
        error: None,
        category: None,
    });
    Ok(())
}

/// Merge the optional config file with command line options
fn build_config(cli: &Cli) -> Result<PublishConfig> {
    let mut config = match cli.config {
        Some(ref path) => PublishConfig::from_file(path)?,
        None => PublishConfig::new("", "", "", "", ""),
    };

    let overrides = [
        (&cli.path, &mut config.path),
        (&cli.manifest, &mut config.manifest),
        (&cli.box_name, &mut config.box_name),
        (&cli.box_dir, &mut config.box_dir),
        (&cli.box_version, &mut config.version),
    ];
    for (value, field) in overrides {
        if let Some(value) = value {
            *field = value.clone();
        }
    }

    if let Some(kb) = cli.chunk_size {
        config.chunk_size = kb.saturating_mul(1024);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    Ok(config)
}
