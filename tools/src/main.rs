//! churn-runner: headless batch runner for the churn monitoring pipeline.
//!
//! Usage:
//!   churn-runner seed-demo --db churn.db --month 2026-01 --customers 200
//!   churn-runner train     --db churn.db --models models --month 2026-01
//!   churn-runner simulate  --db churn.db
//!   churn-runner score     --db churn.db --models models --month 2026-02
//!   churn-runner evaluate  --db churn.db --month 2026-02
//!   churn-runner run-month --db churn.db --models models
//!
//! `run-month` chains simulate → score → evaluate for the next month.

use anyhow::Result;
use churnwatch_core::{
    config::PipelineConfig,
    metrics,
    model::ModelArtifacts,
    rng::{PipelineRng, StreamSlot},
    scorer, seed, simulator,
    snapshot::SnapshotMonth,
    store::ChurnStore,
    trainer,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => PipelineConfig::load(Path::new(path))?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = flag_value(&args, "--db") {
        config.db_path = db.to_string();
    }
    if let Some(models) = flag_value(&args, "--models") {
        config.model_dir = models.to_string();
    }
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.demo_customers = parse_arg(&args, "--customers", config.demo_customers);

    if command == "help" || command == "--help" {
        print_help();
        return Ok(());
    }

    log::debug!("command={command} db={} models={}", config.db_path, config.model_dir);

    let store = ChurnStore::open(&config.db_path)?;
    store.migrate()?;

    match command {
        "seed-demo" => {
            let month = month_arg(&args)?.unwrap_or_else(default_first_month);
            let mut rng = PipelineRng::for_stream(config.seed, StreamSlot::Seed);
            let n = seed::generate_demo_snapshot(&store, &config, month, &mut rng)?;
            println!("Seeded {n} demo customers for {month}");
        }
        "train" => {
            let month = resolve_month(&args, &store)?;
            let report = trainer::train(&store, &config, month)?;
            println!("=== TRAINING SUMMARY ===");
            println!("  month:        {}", report.month);
            println!("  labeled rows: {}", report.labeled_rows);
            println!("  train/test:   {}/{}", report.train_rows, report.test_rows);
            println!("  logreg acc:   {:.3}", report.logreg_accuracy);
            println!("  forest acc:   {:.3}", report.forest_accuracy);
            println!("  artifacts:    {}", config.model_dir);
        }
        "simulate" => {
            let mut rng = PipelineRng::for_stream(config.seed, StreamSlot::Simulate);
            let month = simulator::simulate_next_month(&store, &config, &mut rng)?;
            println!(
                "Simulated {} rows for {month}",
                store.snapshot_count(month)?
            );
        }
        "score" => {
            let month = resolve_month(&args, &store)?;
            let artifacts = ModelArtifacts::load(Path::new(&config.model_dir))?;
            let written = scorer::score_month(&store, &artifacts, month)?;
            println!("Wrote {written} predictions for {month}");
        }
        "evaluate" => {
            let month = resolve_month(&args, &store)?;
            metrics::evaluate_month(&store, &config, month)?;
            // Read back what was persisted, including rows from earlier runs.
            print_metrics(&store.metrics_for_month(month)?);
        }
        "run-month" => {
            let mut rng = PipelineRng::for_stream(config.seed, StreamSlot::Simulate);
            let month = simulator::simulate_next_month(&store, &config, &mut rng)?;
            let artifacts = ModelArtifacts::load(Path::new(&config.model_dir))?;
            let written = scorer::score_month(&store, &artifacts, month)?;
            let rows = metrics::evaluate_month(&store, &config, month)?;

            println!("=== MONTH SUMMARY ({month}) ===");
            println!("  snapshot rows: {}", store.snapshot_count(month)?);
            println!("  predictions:   {written}");
            print_metrics(&rows);
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_metrics(rows: &[churnwatch_core::metrics::MetricsRow]) {
    println!("  model   | avg_p  | high_risk | revenue_at_risk | stability");
    for row in rows {
        let stability = row
            .rank_stability
            .map(|s| format!("{s:.4}"))
            .unwrap_or_else(|| "null".to_string());
        println!(
            "  {:<7} | {:.4} | {:>8.3}% | {:>15.2} | {stability}",
            row.model_name,
            row.avg_churn_probability,
            row.high_risk_pct * 100.0,
            row.revenue_at_risk,
        );
    }
}

/// --month YYYY-MM, falling back to the latest snapshot month in the store.
fn resolve_month(args: &[String], store: &ChurnStore) -> Result<SnapshotMonth> {
    if let Some(month) = month_arg(args)? {
        return Ok(month);
    }
    store
        .latest_snapshot_month()?
        .ok_or_else(|| anyhow::anyhow!("No snapshots in the database; pass --month or seed first"))
}

fn month_arg(args: &[String]) -> Result<Option<SnapshotMonth>> {
    match flag_value(args, "--month") {
        None => Ok(None),
        Some(raw) => SnapshotMonth::parse(raw)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("Invalid --month '{raw}', expected YYYY-MM")),
    }
}

fn default_first_month() -> SnapshotMonth {
    SnapshotMonth::from_date(chrono::Local::now().date_naive())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn print_help() {
    println!("churn-runner — churn monitoring pipeline");
    println!();
    println!("Commands:");
    println!("  seed-demo   generate a synthetic labeled month-1 snapshot");
    println!("  train       fit scaler + classifiers on a labeled month");
    println!("  simulate    advance the latest snapshot by one month");
    println!("  score       score a month with the fitted models");
    println!("  evaluate    compute drift/stability metrics for a month");
    println!("  run-month   simulate + score + evaluate the next month");
    println!();
    println!("Flags: --db PATH --models DIR --config FILE --seed N --month YYYY-MM --customers N");
}
