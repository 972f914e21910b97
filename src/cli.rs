// src/cli.rs
// Flags > JSON config > defaults.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;
use crate::data::{OutcomeRecord, Prediction, VerificationRecord};
use crate::error::ConfigError;
use crate::monitor::Summary;
use crate::progress::Progress;

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(p) => AppConfig::load(p),
        None => Ok(AppConfig::default()),
    }
}

/// Scrape the game history, train, then monitor / predict / verify.
#[derive(Parser, Debug, Default)]
#[command(name = "bdg_predict", version, about)]
pub struct PredictArgs {
    /// JSON config file; missing keys keep their defaults
    #[arg(long, env = "BDG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Page serving the rendered game history
    #[arg(long, env = "BDG_URL")]
    pub url: Option<String>,

    /// Replay a saved HTML page instead of fetching
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Seconds between polls
    #[arg(long)]
    pub interval: Option<u64>,

    /// Force a page reload every N cycles (0 = never)
    #[arg(long)]
    pub refresh_every: Option<u32>,

    /// Empty cycles in a row before a forced reload
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Retrain after N new records (0 = never)
    #[arg(long)]
    pub retrain_every: Option<usize>,

    /// Records needed before initial collection stops early
    #[arg(long)]
    pub min_initial: Option<usize>,

    /// Start monitoring without waiting for ENTER
    #[arg(long)]
    pub no_wait: bool,

    /// Stop after N cycles (0 = run until Ctrl-C)
    #[arg(long)]
    pub cycles: Option<u64>,
}

impl PredictArgs {
    pub fn config(&self) -> Result<AppConfig, ConfigError> {
        let mut cfg = load_config(self.config.as_ref())?;
        self.apply(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(u) = &self.url { cfg.session.url = u.clone(); }
        if let Some(p) = &self.snapshot { cfg.session.snapshot = Some(p.clone()); }

        let m = &mut cfg.monitor;
        if let Some(v) = self.interval { m.interval_secs = v; }
        if let Some(v) = self.refresh_every { m.refresh_every = v; }
        if let Some(v) = self.max_retries { m.max_retries = v; }
        if let Some(v) = self.retrain_every { m.retrain_every = v; }
        if let Some(v) = self.min_initial { m.min_initial_records = v; }
        if let Some(v) = self.cycles { m.max_cycles = v; }
    }
}

/// Train both models from an existing ledger.
#[derive(Parser, Debug, Default)]
#[command(name = "bdg_train", version, about)]
pub struct TrainArgs {
    /// JSON config file
    #[arg(long, env = "BDG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ledger to train from (default: data/bdg_data.csv)
    #[arg(long)]
    pub data: Option<PathBuf>,
}

impl TrainArgs {
    pub fn config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = load_config(self.config.as_ref())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn ledger(&self, cfg: &AppConfig) -> PathBuf {
        self.data.clone().unwrap_or_else(|| cfg.paths.ledger())
    }
}

/// Predict the next outcome from the saved ledger and models.
#[derive(Parser, Debug, Default)]
#[command(name = "bdg_predict_next", version, about)]
pub struct PredictNextArgs {
    /// JSON config file
    #[arg(long, env = "BDG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the newest logged prediction instead of making a new one
    #[arg(long)]
    pub last: bool,
}

impl PredictNextArgs {
    pub fn config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = load_config(self.config.as_ref())?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn print_prediction(p: &Prediction) {
    let cs = p.color_size.as_deref().unwrap_or("-");
    let n = p.number.map(|n| n.to_string()).unwrap_or_else(|| s!("-"));
    println!("[{}] Next: {cs}, number {n}", crate::data::format_ts(&p.timestamp));
}

/// Block until the user presses ENTER. EOF counts as yes.
pub fn wait_for_enter(prompt: &str) -> bool {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).is_ok()
}

/* ---------------- Console progress ---------------- */

/// Prints monitor events as plain lines on stdout.
#[derive(Default)]
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn new_records(&mut self, records: &[OutcomeRecord]) {
        if records.is_empty() {
            return;
        }
        println!("New results:");
        for r in records {
            println!("  {:<16} {:>2}  {:<5}  {}", r.period_id, r.number, r.size, r.color);
        }
    }

    fn verified(&mut self, rec: &VerificationRecord) {
        let mark = if rec.is_correct { "Prediction verified" } else { "Prediction failed" };
        println!("{mark}! Period {} (predicted {}, actual {})", rec.period_id, rec.prediction, rec.actual);
    }

    fn predicted(&mut self, p: &Prediction) {
        let cs = p.color_size.as_deref().unwrap_or("-");
        let n = p.number.map(|n| n.to_string()).unwrap_or_else(|| s!("-"));
        println!("Next: {cs}, number {n}");
    }

    fn trained(&mut self, accuracy: f64, mse: f64) {
        println!("Models trained: accuracy {:.2}%, number MSE {mse:.4}", accuracy * 100.0);
    }

    fn retry(&mut self, attempt: u32, max: u32) {
        println!("No data scraped ({attempt}/{max}), retrying...");
    }

    fn finish(&mut self) {
        println!("Monitoring stopped");
    }
}

pub fn print_summary(s: &Summary) {
    println!(
        "{} cycles, {} new records, {}/{} predictions correct, {} retrainings, {} reloads",
        s.cycles, s.new_records, s.correct, s.verified, s.trainings, s.reloads
    );
    if let Some(acc) = s.all_time.accuracy() {
        println!(
            "All-time: {}/{} correct ({:.2}%)",
            s.all_time.correct, s.all_time.checked, acc * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = PredictArgs::parse_from([
            "bdg_predict", "--interval", "5", "--cycles", "3", "--snapshot", "page.html", "--no-wait",
        ]);
        let cfg = args.config().unwrap();
        assert_eq!(cfg.monitor.interval_secs, 5);
        assert_eq!(cfg.monitor.max_cycles, 3);
        assert_eq!(cfg.session.snapshot, Some(PathBuf::from("page.html")));
        assert!(args.no_wait);
        assert_eq!(cfg.monitor.refresh_every, AppConfig::default().monitor.refresh_every);
    }

    #[test]
    fn config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("cfg.json");
        std::fs::write(&p, r#"{ "monitor": { "interval_secs": 30, "max_retries": 7 } }"#).unwrap();
        let args = PredictArgs::parse_from(["bdg_predict", "--config", p.to_str().unwrap(), "--max-retries", "2"]);
        let cfg = args.config().unwrap();
        assert_eq!(cfg.monitor.interval_secs, 30);
        assert_eq!(cfg.monitor.max_retries, 2);
    }

    #[test]
    fn train_ledger_defaults_to_config_path() {
        let args = TrainArgs::parse_from(["bdg_train"]);
        let cfg = args.config().unwrap();
        assert_eq!(args.ledger(&cfg), cfg.paths.ledger());
        let args = TrainArgs::parse_from(["bdg_train", "--data", "x.csv"]);
        assert_eq!(args.ledger(&cfg), PathBuf::from("x.csv"));
    }

    #[test]
    fn predict_next_flags() {
        assert!(!PredictNextArgs::parse_from(["bdg_predict_next"]).last);
        let args = PredictNextArgs::parse_from(["bdg_predict_next", "--last"]);
        assert!(args.last);
        assert_eq!(args.config().unwrap(), AppConfig::default());
    }
}
