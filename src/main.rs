use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use match_predictor::config::{self, BotConfig};
use match_predictor::dispatch;
use match_predictor::health;
use match_predictor::logging;
use match_predictor::machine::{Predictor, Reply};
use match_predictor::render::render_reply;
use match_predictor::session::SessionStore;
use match_predictor::telegram::{OutboundMessage, TelegramClient};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();

    let config = BotConfig::from_env().context("invalid bot configuration")?;
    let (health_addr, _health) = health::spawn_health_server(config.health_addr)?;
    info!(addr = %health_addr, "health server started");

    let client = TelegramClient::new(&config)?;
    let predictor = Predictor::in_memory().with_idle_timeout(config.idle_timeout);
    let pool = dispatch::build_dispatch_pool(config.dispatch_parallelism);

    info!(
        poll_timeout_secs = config.poll_timeout_secs,
        idle_expiry = config.idle_timeout.is_some(),
        "polling for updates"
    );
    run_bot(&client, &predictor, pool.as_ref())
}

fn run_bot<S: SessionStore>(
    client: &TelegramClient,
    predictor: &Predictor<S>,
    pool: Option<&rayon::ThreadPool>,
) -> Result<()> {
    let mut offset: Option<i64> = None;
    loop {
        notify_expired(client, predictor);

        let batch = match client.get_updates(offset) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "poll failed");
                thread::sleep(POLL_ERROR_BACKOFF);
                continue;
            }
        };
        if let Some(next) = batch.next_offset {
            offset = Some(next);
        }
        if batch.events.is_empty() {
            continue;
        }

        debug!(events = batch.events.len(), "dispatching batch");
        for message in dispatch::dispatch_batch(predictor, batch.events, pool) {
            deliver(client, &message);
        }
    }
}

fn notify_expired<S: SessionStore>(client: &TelegramClient, predictor: &Predictor<S>) {
    for session_id in predictor.expire_idle(Utc::now()) {
        let Ok(chat_id) = session_id.parse::<i64>() else {
            continue;
        };
        deliver(
            client,
            &OutboundMessage {
                chat_id,
                outbound: render_reply(&Reply::Expired),
            },
        );
    }
}

fn deliver(client: &TelegramClient, message: &OutboundMessage) {
    if let Err(err) = client.send(message) {
        warn!(chat_id = message.chat_id, error = %format!("{err:#}"), "failed to deliver reply");
    }
}
