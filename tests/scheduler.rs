mod common;

use common::options_workbook;
use options_feed::Extractor;
use options_feed::ExtractorConfig;
use options_feed::ScheduleConfig;
use options_feed::Scheduler;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

fn extractor(directory: &TempDir, workbook: &str) -> Arc<Extractor> {
    let extractor = Extractor::new(ExtractorConfig {
        workbook: directory.path().join(workbook),
        output: directory.path().join("static").join("data.csv"),
        sheet: Some("Sheet1".to_owned()),
        range: Some("A1:C18".to_owned()),
        snapshot: true,
    })
    .unwrap();
    Arc::new(extractor)
}

#[tokio::test]
async fn publishes_on_every_tick() {
    let directory = TempDir::new().unwrap();
    options_workbook(&directory.path().join("options.xlsx"));
    let scheduler = Scheduler::new(ScheduleConfig {
        interval: Duration::from_millis(100),
        run_on_start: true,
    });

    let summary = scheduler
        .run_until(extractor(&directory, "options.xlsx"), sleep(Duration::from_millis(250)))
        .await;

    assert!(summary.runs >= 2, "runs = {}", summary.runs);
    assert_eq!(summary.failures, 0);
    assert_eq!(
        fs::read_to_string(directory.path().join("static").join("data.csv")).unwrap(),
        "Symbol,Strike,Price\nAAPL,150,2.35\nMSFT,300,4.1\n"
    );
}

#[tokio::test]
async fn missing_workbook_does_not_stop_the_loop() {
    let directory = TempDir::new().unwrap();
    let scheduler = Scheduler::new(ScheduleConfig {
        interval: Duration::from_millis(50),
        run_on_start: true,
    });

    let summary = scheduler
        .run_until(extractor(&directory, "missing.xlsx"), sleep(Duration::from_millis(180)))
        .await;

    assert!(summary.runs >= 2, "runs = {}", summary.runs);
    assert_eq!(summary.failures, summary.runs);
    assert!(!directory.path().join("static").exists());
}

#[tokio::test]
async fn picks_up_workbook_changes_between_ticks() {
    let directory = TempDir::new().unwrap();
    let workbook = directory.path().join("options.xlsx");
    let output = directory.path().join("static").join("data.csv");
    let job = extractor(&directory, "options.xlsx");
    let scheduler = Scheduler::new(ScheduleConfig {
        interval: Duration::from_millis(100),
        run_on_start: false,
    });

    // The first tick finds no workbook; it appears before the second tick
    let writer = tokio::spawn(async move {
        sleep(Duration::from_millis(150)).await;
        options_workbook(&workbook);
    });
    let summary = scheduler.run_until(job, sleep(Duration::from_millis(280))).await;
    writer.await.unwrap();

    assert!(summary.runs >= 2, "runs = {}", summary.runs);
    assert_eq!(summary.failures, 1);
    assert!(fs::read_to_string(output).unwrap().starts_with("Symbol,Strike,Price\n"));
}
