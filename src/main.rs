use anyhow::Result;
use clap::Parser;
use envclone::cli::{App, Args};
use envclone::platform::{HostFacts, Platform};
use envclone::runner::{HostRunner, ProcessRunner};
use envclone::settings::Settings;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::discover()?;
    init_logging(&settings, args.verbose);

    let project_dir = match args.project_dir {
        Some(dir) => std::path::absolute(dir)?,
        None => std::env::current_dir()?,
    };
    debug!("Project directory: {}", project_dir.display());

    let platform = Platform::detect(&HostFacts::gather(), &settings)?;
    let runner: Arc<dyn ProcessRunner> = if args.dry_run {
        Arc::new(HostRunner::dry_run())
    } else {
        Arc::new(HostRunner::new())
    };
    let store = settings.descriptor_store()?;

    let app = App::new(settings, platform, runner, store, project_dir).with_dry_run(args.dry_run);

    // Dropping the in-flight command kills its child process.
    let output = tokio::select! {
        result = app.execute(&args.command) => Some(result?),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(output) = output else {
        warn!("Interrupted");
        std::process::exit(130);
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn init_logging(settings: &Settings, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(format!("{}=debug", envclone::env::APP_NAME))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
