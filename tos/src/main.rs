use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tos::cli::{Cli, Command};
use tos::report::{ChangesReport, FilesReport, HistoryReport, SnapshotReport};
use tos::{AppContext, Settings};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate().map_err(anyhow::Error::msg)?;

    let data_dir = settings.storage.data_dir().map_err(anyhow::Error::msg)?;
    let (log_path, _guard) = tos::logging::init_logging(&data_dir.join("logs"), cli.verbose)?;
    info!("Logging to {}", log_path.display());

    let mut ctx = AppContext::new(settings)?;
    run(&mut ctx, cli.command.unwrap_or_default())
        .await
        .inspect_err(|e| error!("{:#}", e))
}

async fn run(ctx: &mut AppContext, command: Command) -> Result<()> {
    match command {
        Command::Login => {
            ctx.login().await?;
        }
        Command::Logout => {
            ctx.logout()?;
            println!("Signed out.");
        }
        Command::Refresh { force, view } => {
            ctx.authenticate().await?;
            println!("Retrieving order information, please be patient...");

            let outcome = ctx.refresh(force).await?;
            print!(
                "{}",
                SnapshotReport::new(&outcome.snapshot, ctx.catalog(), view.into())
            );
            if outcome.had_previous {
                print!("\n{}", ChangesReport(&outcome.changes));
            } else {
                println!("\nFirst check, nothing to compare against yet.");
            }
            print_history(ctx).await;
        }
        Command::Status => println!("{}", status(ctx).await),
        Command::Cached { view } => match ctx.cached_snapshot().await? {
            Some(snapshot) => {
                print!("{}", SnapshotReport::new(&snapshot, ctx.catalog(), view.into()));
                print_history(ctx).await;
            }
            None => println!(
                "No cached orders found in {}",
                ctx.repository().snapshot_path().display()
            ),
        },
        Command::History => print_history(ctx).await,
        Command::Files => {
            println!("Data directory: {}", ctx.data_dir().display());
            print!("{}", FilesReport(&ctx.file_statuses().await));
        }
        Command::Decode { codes } => {
            for (code, description) in ctx.decode(&codes) {
                println!("{code}: {description}");
            }
        }
    }
    Ok(())
}

async fn print_history(ctx: &AppContext) {
    let entries = ctx.history().await;
    let today = Local::now().date_naive();
    print!("\n{}", HistoryReport { entries: &entries, today });
}

/// Never prompts; anything that prevents a comparison reports `-1`.
async fn status(ctx: &mut AppContext) -> i8 {
    match ctx.refresh(true).await {
        Ok(outcome) => outcome.status_code(),
        Err(e) => {
            warn!("Status check failed: {:#}", e);
            -1
        }
    }
}
