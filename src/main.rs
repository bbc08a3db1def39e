use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use trash_sight::{
    KeyboardInputHandler, MockCamera, Session, ShutdownReason, TerminalRenderer, TrashSightConfig,
    ViewMode,
};

/// Frames to try before giving up on a camera that is not ready yet
const SNAPSHOT_ATTEMPTS: u32 = 20;

#[derive(Parser, Debug)]
#[command(name = "trash-sight")]
#[command(about = "Photograph or pick an item and find out which bin it belongs in")]
#[command(version)]
#[command(long_about = "Trash Sight acquires a single still image, either from a file or from \
a live camera, uploads it to the Trash Sight classification service and shows the detected \
object and the disposal bin it belongs in. Without --image or --camera-snapshot it runs an \
interactive terminal session.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "trash-sight.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH", help = "Write logs to this file")]
    log_file: Option<PathBuf>,

    /// Classify one image file and exit
    #[arg(long, value_name = "PATH", help = "Classify this image file and exit")]
    image: Option<PathBuf>,

    /// Capture one camera frame, classify it and exit
    #[arg(long, conflicts_with = "image", help = "Capture a camera frame, classify it and exit")]
    camera_snapshot: bool,

    /// Use the synthetic camera instead of the platform device
    #[arg(long, help = "Use a synthetic test-pattern camera")]
    mock_camera: bool,
}

impl Args {
    fn interactive(&self) -> bool {
        self.image.is_none() && !self.camera_snapshot && !self.validate_config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let guard = init_logging(&args)?;

    info!("Starting Trash Sight v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match TrashSightConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let exit_code = run(&args, config).await.map_err(|e| {
        error!("Trash Sight failed: {}", e);
        e
    })?;

    info!("Trash Sight exited with code: {}", exit_code);

    // process::exit skips destructors; flush the log writer first
    drop(guard);
    std::process::exit(exit_code);
}

async fn run(args: &Args, config: TrashSightConfig) -> Result<i32> {
    let mut builder = Session::builder().config(config);
    if args.mock_camera {
        builder = builder.device(Arc::new(MockCamera::healthy()));
    }
    let mut session = builder.build()?;

    if let Some(path) = &args.image {
        return classify_file(&mut session, path).await;
    }
    if args.camera_snapshot {
        return camera_snapshot(&mut session).await;
    }

    run_interactive(&mut session).await
}

async fn classify_file(session: &mut Session, path: &Path) -> Result<i32> {
    if let Err(e) = session.open_file(path).await {
        eprintln!("{}", e);
        return Ok(1);
    }

    // Failures land in the view as error text
    let _ = session.submit_and_wait().await;
    Ok(print_outcome(session))
}

async fn camera_snapshot(session: &mut Session) -> Result<i32> {
    if let Err(e) = session.start_camera().await {
        eprintln!("Camera unavailable: {}", e);
        return Ok(1);
    }

    for _ in 0..SNAPSHOT_ATTEMPTS {
        if session.capture_frame().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if session.images().current().is_none() {
        session.stop_camera();
        eprintln!("No frame could be captured from the camera");
        return Ok(1);
    }

    let _ = session.submit_and_wait().await;
    Ok(print_outcome(session))
}

fn print_outcome(session: &Session) -> i32 {
    let view = session.view();
    for line in TerminalRenderer::new().render(&view) {
        println!("{}", line);
    }
    if let Some(path) = session.last_labeled_export() {
        println!("Labeled image saved to {}", path.display());
    }

    if view.mode == ViewMode::ResultReady {
        0
    } else {
        1
    }
}

async fn run_interactive(session: &mut Session) -> Result<i32> {
    // Subscribe first so keys pressed during startup are not dropped
    let events = session.events().subscribe();
    let keyboard = KeyboardInputHandler::new(session.events());
    keyboard.start().await?;

    let mut renderer = TerminalRenderer::new();
    let outcome = session.run(events, &mut renderer).await;

    keyboard.stop().await?;
    println!();

    match outcome? {
        ShutdownReason::Error(message) => {
            eprintln!("Session ended: {}", message);
            Ok(1)
        }
        _ => Ok(0),
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Interactive mode owns the terminal; logs only go to a file
    if args.interactive() && args.log_file.is_none() {
        return Ok(None);
    }

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trash_sight={}", log_level)));

    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };
    let to_file = args.log_file.is_some();

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(!to_file)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(!to_file)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(!to_file)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(Some(guard))
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Trash Sight Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Any key can be overridden from the environment, e.g. TRASHSIGHT_SERVICE__URL");
    println!();
    println!("{}", toml::to_string_pretty(&TrashSightConfig::default())?);
    Ok(())
}
