use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use match_predictor::config;
use match_predictor::logging;
use match_predictor::machine::Predictor;
use match_predictor::render::render_reply;

const SESSION_ID: &str = "console";

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();

    let predictor = Predictor::in_memory();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    writeln!(stdout, "Type /start to predict a match, /help for help. Ctrl-D quits.")?;
    for line in stdin.lock().lines() {
        let line = line.context("failed reading stdin")?;
        for reply in predictor.handle_text(SESSION_ID, &line) {
            writeln!(stdout, "{}", render_reply(&reply).text)?;
        }
        stdout.flush()?;
    }
    Ok(())
}
