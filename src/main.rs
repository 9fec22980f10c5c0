use anyhow::Result;
use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;
use log::error;
use options_feed::config::Args;
use options_feed::extractor::Extractor;
use options_feed::scheduler::Scheduler;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let extractor = Extractor::new(args.extractor())
        .unwrap_or_else(|error| Args::command().error(ErrorKind::ValueValidation, error).exit());

    if args.once {
        let report = tokio::task::spawn_blocking(move || extractor.extract()).await??;
        println!(
            "Published {} rows x {} columns to '{}'.",
            report.rows,
            report.columns,
            report.output.display()
        );
        return Ok(());
    }

    let schedule = args
        .schedule()
        .unwrap_or_else(|error| Args::command().error(ErrorKind::MissingRequiredArgument, error).exit());
    let scheduler = Scheduler::new(schedule);
    println!(
        "Scheduler started: '{}' -> '{}' every {:?}. Press Ctrl+C to stop.",
        extractor.workbook().display(),
        extractor.output().display(),
        scheduler.interval()
    );

    let summary = scheduler.run_until(Arc::new(extractor), shutdown_signal()).await;
    let reason = if summary.stopped_by_job { "on request of the job" } else { "by user" };
    println!(
        "\nScheduler stopped {} after {} runs ({} failed).",
        reason, summary.runs, summary.failures
    );
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed the process runs until killed.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
}
