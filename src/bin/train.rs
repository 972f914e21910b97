// src/bin/train.rs
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{error, info};

use bdg_predict::cli::TrainArgs;
use bdg_predict::{log, model, report};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = TrainArgs::parse();
    let cfg = args.config().wrap_err("loading configuration")?;
    let ledger = args.ledger(&cfg);

    cfg.paths.ensure_dirs().map_err(|e| eyre!("creating data directories: {e}"))?;
    let _guard = log::init(&cfg.paths.logs_dir, None).map_err(|e| eyre!("starting logging: {e}"))?;

    info!(ledger = %ledger.display(), "Starting training for BDG prediction models");
    match model::train_ledger(&ledger, &cfg.paths, &cfg.train) {
        Ok(r) => {
            println!("All models trained and saved successfully.");
            println!("  records      {}", r.records);
            println!("  train/test   {}/{}", r.train_size, r.test_size);
            println!("  accuracy     {:.2}%", r.accuracy * 100.0);
            println!("  number MSE   {:.4}", r.mse);
            println!("  artifacts    {}, {}", r.color_size_model.display(), r.number_model.display());
            Ok(())
        }
        Err(e) => {
            error!("Model training failed: {e}");
            report::log_error(&cfg.paths.error_log(), "Model training failed", &e);
            eprintln!("Model training failed: {e}");
            std::process::exit(1);
        }
    }
}
