//! `qbank-dl` command line: fetch an input list, list input lists, or serve the
//! downloaded question library over HTTP.

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use qbank_dl::api::start_api_server;
use qbank_dl::source::discover_input_files;
use qbank_dl::{
    ConcurrencyPolicy, Config, Event, QuestionLibrary, Result, RunController, cancel_on_signal,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "qbank-dl")]
#[command(version, about = "Download question-bank records and serve them locally")]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append logs to this file as well as the console
    #[arg(long, global = true, default_value = "api_calls.log")]
    log_file: PathBuf,

    /// Log to the console only
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every question of an input list that has no record yet
    Fetch(FetchArgs),
    /// List the input lists found in the search directories
    List,
    /// Serve the downloaded questions over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Input list (JSON array of {questionId, external_id} records)
    input: PathBuf,

    /// Parallel requests in bounded mode (1-200)
    #[arg(long, conflicts_with = "sequential")]
    concurrency: Option<usize>,

    /// One request at a time with a delay in between
    #[arg(long)]
    sequential: bool,

    /// Seconds between sequential requests (1, 2 or 3)
    #[arg(long, requires = "sequential")]
    delay: Option<f64>,

    /// Base directory for output folders
    #[arg(long)]
    output: Option<PathBuf>,

    /// Question endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Library root holding the question folders
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory with the browser front-end, served at /
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Do not serve Swagger UI
    #[arg(long)]
    no_swagger: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    if let Err(e) = init_tracing(log_file) {
        eprintln!("Cannot open log file {}: {e}", cli.log_file.display());
        return ExitCode::FAILURE;
    }

    let config = match load_config(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Fetch(args) => fetch(config, args).await,
        Command::List => list(&config).await,
        Command::Serve(args) => serve(config, args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

/// Console output plus an optional append-mode log file, filtered by `RUST_LOG`
fn init_tracing(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let console = fmt::layer().with_target(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path).await,
        None => Ok(Config::default()),
    }
}

async fn fetch(mut config: Config, args: FetchArgs) -> Result<ExitCode> {
    if let Some(output) = args.output {
        config.output.base_dir = output;
    }
    if let Some(endpoint) = args.endpoint {
        config.fetch.endpoint = endpoint;
    }
    if args.sequential {
        let delay = args.delay.unwrap_or(match config.policy {
            ConcurrencyPolicy::Sequential { delay } => delay.as_secs_f64(),
            ConcurrencyPolicy::Bounded { .. } => 2.0,
        });
        let delay = Duration::try_from_secs_f64(delay)
            .map_err(|e| qbank_dl::Error::config("policy.delay", e.to_string()))?;
        // Range checks happen in Config::validate
        config.policy = ConcurrencyPolicy::sequential(delay);
    } else if let Some(max_in_flight) = args.concurrency {
        config.policy = ConcurrencyPolicy::bounded(max_in_flight);
    }

    let controller = RunController::new(config)?;
    let plan = controller.prepare(&args.input).await?;

    println!();
    println!(
        "Ready to process {} questions into folder '{}'",
        plan.len(),
        plan.output_dir().display()
    );
    println!("Mode: {}", plan.policy);
    if !args.yes && !confirm("Continue? (y/N): ").await? {
        println!("Processing cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let token = CancellationToken::new();
    let signal_watcher = tokio::spawn(cancel_on_signal(token.clone()));
    let printer = tokio::spawn(print_progress(controller.subscribe()));

    let summary = controller.execute(plan, token.clone()).await;

    // Stop the watcher; the printer ends on RunFinished
    token.cancel();
    signal_watcher.await.ok();
    printer.await.ok();

    println!();
    println!("{summary}");

    Ok(if summary.cancelled {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    })
}

/// Ask on stdin; only `y`/`yes` proceed
async fn confirm(prompt: &'static str) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line)
    })
    .await
    .map_err(|e| qbank_dl::Error::Other(e.to_string()))??;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn print_progress(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(Event::Progress {
                completed,
                total,
                percent,
                rate,
            }) => {
                println!("Progress: {completed}/{total} ({percent:.1}%) - Rate: {rate:.1} req/sec");
            }
            Ok(Event::RunFinished { .. }) | Err(broadcast::error::RecvError::Closed) => break,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        }
    }
}

async fn list(config: &Config) -> Result<ExitCode> {
    let groups = discover_input_files(&config.input.search_dirs).await?;

    let rule = "=".repeat(50);
    println!("{rule}");
    println!("Available JSON Files:");
    println!("{rule}");

    let mut counter = 0;
    for group in groups.iter().filter(|g| !g.files.is_empty()) {
        println!();
        println!("{}:", group.dir.display());
        println!("{}", "-".repeat(20));
        for file in &group.files {
            counter += 1;
            println!("{counter}. {}", file.display());
        }
    }

    if counter == 0 {
        let dirs: Vec<String> = config
            .input
            .search_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        println!("No JSON files found in {}", dirs.join(" or "));
    }
    Ok(ExitCode::SUCCESS)
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<ExitCode> {
    if let Some(bind) = args.bind {
        config.api.bind_address = bind;
    }
    if let Some(root) = args.root {
        config.library.root = root;
    }
    if args.static_dir.is_some() {
        config.api.static_dir = args.static_dir;
    }
    if args.no_swagger {
        config.api.swagger_ui = false;
    }

    let library = Arc::new(QuestionLibrary::open(config.library.clone()).await?);
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    start_api_server(library, Arc::new(config.api), shutdown).await?;
    Ok(ExitCode::SUCCESS)
}
