//! Command line entry point.

use clap::Parser;
use paper_app::{App, AppResult, Script, load_config};
use paper_core::FileStorage;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Replay a recorded gesture script onto a whiteboard.
#[derive(Parser, Debug)]
#[command(name = "paper", version, about)]
struct Cli {
    /// JSON file with the view size and the gesture sequence
    script: PathBuf,

    /// Editor config file (JSON)
    #[arg(long, env = "PAPER_CONFIG")]
    config: Option<PathBuf>,

    /// Open this whiteboard instead of the last one
    #[arg(long)]
    open: Option<String>,

    /// Directory whiteboards are stored in
    #[arg(long, env = "PAPER_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let script = Script::from_path(&cli.script)?;
    let storage = match cli.data_dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    };
    log::info!("Storing whiteboards in {}", storage.base_path().display());

    let mut app = App::open(Arc::new(storage), cli.open.as_deref(), config, script.view_size).await?;
    let stats = app.replay(&script.gestures).await?;
    log::info!(
        "Replayed {} gestures ({} rejected), {} commands, {} render events, {} saves",
        stats.gestures,
        stats.rejected,
        stats.commands,
        stats.render_events,
        stats.saves
    );
    println!("{}", app.canvas().board().uuid());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Starting Paper");

    match pollster::block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
