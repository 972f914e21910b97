// src/bin/predict_next.rs
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::error;

use bdg_predict::cli::{PredictNextArgs, print_prediction};
use bdg_predict::predict::{self, Predictor};
use bdg_predict::{log, report};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = PredictNextArgs::parse();
    let cfg = args.config().wrap_err("loading configuration")?;

    cfg.paths.ensure_dirs().map_err(|e| eyre!("creating data directories: {e}"))?;
    let _guard = log::init(&cfg.paths.logs_dir, None).map_err(|e| eyre!("starting logging: {e}"))?;

    let res = if args.last {
        Predictor::load(&cfg.paths).and_then(|p| p.last_prediction())
    } else {
        predict::predict_next(&cfg.paths).map(Some)
    };

    match res {
        Ok(Some(p)) => {
            print_prediction(&p);
            Ok(())
        }
        Ok(None) => {
            println!("No prediction logged yet.");
            Ok(())
        }
        Err(e) => {
            error!("Prediction failed: {e}");
            report::log_error(&cfg.paths.error_log(), "Prediction failed", &e);
            eprintln!("Prediction failed: {e}");
            std::process::exit(1);
        }
    }
}
