use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::scoring::{self, MatchRecord, Prediction};
use crate::session::{MemorySessionStore, Session, SessionId, SessionStore};
use crate::steps::{Step, ValidationError};

const LOCK_STRIPES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Help,
}

impl Command {
    /// Recognises `/start`, `/cancel` and `/help`, including the
    /// `/cmd@BotName` form and trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let head = text.split_whitespace().next()?;
        let name = head.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "cancel" => Some(Command::Cancel),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub step: Step,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
}

impl Prompt {
    fn for_session(session: &Session) -> Self {
        Self {
            step: session.step,
            team_a: session.team_a().map(str::to_string),
            team_b: session.team_b().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub record: MatchRecord,
    pub prediction: Prediction,
}

/// What the conversation wants said back; wording is up to the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Welcome,
    Prompt(Prompt),
    Retry { prompt: Prompt, error: ValidationError },
    Report(Report),
    Cancelled,
    NothingToCancel,
    NotStarted,
    Expired,
    Help,
}

/// The guided collection state machine. Every entry point is one synchronous
/// step; events for the same session id are serialised on a lock stripe.
pub struct Predictor<S: SessionStore = MemorySessionStore> {
    store: S,
    stripes: Vec<Mutex<()>>,
    idle_timeout: Option<Duration>,
}

impl Predictor<MemorySessionStore> {
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }
}

impl<S: SessionStore> Predictor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout.filter(|d| *d > Duration::zero());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self, id: &str) -> Option<Session> {
        let _guard = self.lock(id);
        self.store.load(id)
    }

    pub fn handle_start(&self, id: &str) -> Vec<Reply> {
        let _guard = self.lock(id);
        let session = Session::new(id, Utc::now());
        let prompt = Prompt::for_session(&session);
        if self.store.load(id).is_some() {
            info!(session_id = id, "restarting prediction session");
        } else {
            info!(session_id = id, "starting prediction session");
        }
        self.store.save(session);
        vec![Reply::Welcome, Reply::Prompt(prompt)]
    }

    pub fn handle_cancel(&self, id: &str) -> Vec<Reply> {
        let _guard = self.lock(id);
        match self.store.remove(id) {
            Some(session) => {
                info!(session_id = id, step = ?session.step, "prediction cancelled");
                vec![Reply::Cancelled]
            }
            None => vec![Reply::NothingToCancel],
        }
    }

    pub fn handle_text(&self, id: &str, text: &str) -> Vec<Reply> {
        if let Some(cmd) = Command::parse(text) {
            return match cmd {
                Command::Start => self.handle_start(id),
                Command::Cancel => self.handle_cancel(id),
                Command::Help => vec![Reply::Help],
            };
        }

        let _guard = self.lock(id);
        let now = Utc::now();
        let Some(mut session) = self.store.load(id) else {
            debug!(session_id = id, "text without an active session");
            return vec![Reply::NotStarted];
        };
        if self.is_idle(&session, now) {
            self.store.remove(id);
            info!(session_id = id, "idle session expired on input");
            return vec![Reply::Expired];
        }

        let step = session.step;
        let value = match step.parse(text) {
            Ok(value) => value,
            Err(error) => {
                debug!(session_id = id, ?step, %error, "rejected input");
                return vec![Reply::Retry {
                    prompt: Prompt::for_session(&session),
                    error,
                }];
            }
        };

        if session.advance(value, now).is_some() {
            let prompt = Prompt::for_session(&session);
            self.store.save(session);
            return vec![Reply::Prompt(prompt)];
        }

        self.store.remove(id);
        let Some(record) = session.to_record() else {
            warn!(
                session_id = id,
                fields = ?session.field_names(),
                "completed session is missing fields"
            );
            return vec![Reply::NotStarted];
        };
        let prediction = scoring::predict(&record);
        info!(
            session_id = id,
            difference = prediction.difference,
            winner = ?prediction.winner,
            "prediction complete"
        );
        vec![Reply::Report(Report { record, prediction })]
    }

    /// Drops sessions untouched for longer than the idle timeout and returns
    /// their ids. Does nothing when no timeout is configured.
    pub fn expire_idle(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        if self.idle_timeout.is_none() {
            return Vec::new();
        }
        let mut expired = Vec::new();
        for id in self.store.ids() {
            let _guard = self.lock(&id);
            let Some(session) = self.store.load(&id) else {
                continue;
            };
            if self.is_idle(&session, now) {
                self.store.remove(&id);
                info!(session_id = %id, "idle session expired");
                expired.push(id);
            }
        }
        expired
    }

    fn is_idle(&self, session: &Session, now: DateTime<Utc>) -> bool {
        match self.idle_timeout {
            Some(limit) => now - session.touched_at > limit,
            None => false,
        }
    }

    fn lock(&self, id: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.stripes.len();
        self.stripes[idx].lock().expect("session lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::Command;

    #[test]
    fn commands_tolerate_bot_suffix_and_args() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /Cancel@PredictorBot now"), Some(Command::Cancel));
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/stats"), None);
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse(""), None);
    }
}
