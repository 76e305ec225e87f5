use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use match_predictor::machine::Report;
use match_predictor::render::report_plain_text;
use match_predictor::scoring::{self, MatchRecord};

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let as_json = args.iter().any(|a| a == "--json");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/match_record.json"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let record: MatchRecord = serde_json::from_str(&raw).context("invalid match record json")?;
    record
        .validate()
        .with_context(|| format!("match record in {} failed validation", path.display()))?;

    // Offline counterpart of the bot: one record in, the same verdict out.
    let prediction = scoring::predict(&record);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!("{}", report_plain_text(&Report { record, prediction }));
    }
    Ok(())
}
