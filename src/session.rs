use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::scoring::MatchRecord;
use crate::steps::{FieldValue, STEPS, Step};

pub type SessionId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

/// One guided conversation. `fields` always holds exactly one entry per step
/// before `step`, in collection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub step: Step,
    pub fields: Vec<Field>,
    pub started_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<SessionId>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            step: Step::first(),
            fields: Vec::new(),
            started_at: now,
            touched_at: now,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn team_a(&self) -> Option<&str> {
        self.text(Step::TeamAName.field())
    }

    pub fn team_b(&self) -> Option<&str> {
        self.text(Step::TeamBName.field())
    }

    /// Stores the value for the current step and moves on. Returns the next
    /// step, or `None` when the record is complete.
    pub fn advance(&mut self, value: FieldValue, now: DateTime<Utc>) -> Option<Step> {
        self.fields.push(Field {
            name: self.step.field(),
            value,
        });
        self.touched_at = now;
        let next = self.step.next();
        if let Some(next) = next {
            self.step = next;
        }
        next
    }

    pub fn is_complete(&self) -> bool {
        self.fields.len() == Step::ALL.len()
    }

    /// Checks that the collected keys are exactly the steps before `step`.
    /// A completed session never rests in the store, so this only holds for
    /// sessions still collecting.
    pub fn fields_match_step(&self) -> bool {
        let expected = STEPS[..self.step.index()].iter().map(|s| s.field);
        self.fields.iter().map(|f| f.name).eq(expected)
    }

    pub fn to_record(&self) -> Option<MatchRecord> {
        let h2h = match self.get(Step::H2h.field())? {
            FieldValue::HeadToHead { a, b } => (*a, *b),
            _ => return None,
        };
        Some(MatchRecord {
            team_a_name: self.team_a()?.to_string(),
            team_b_name: self.team_b()?.to_string(),
            avg_goals_scored_a: self.average(Step::AvgGoalA)?,
            avg_goals_conceded_a: self.average(Step::AvgConcedeA)?,
            avg_goals_scored_b: self.average(Step::AvgGoalB)?,
            avg_goals_conceded_b: self.average(Step::AvgConcedeB)?,
            recent_wins_a: self.wins(Step::FormA)?,
            recent_wins_b: self.wins(Step::FormB)?,
            h2h_wins_a: h2h.0,
            h2h_wins_b: h2h.1,
        })
    }

    fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn average(&self, step: Step) -> Option<f64> {
        match self.get(step.field())? {
            FieldValue::Average(v) => Some(*v),
            _ => None,
        }
    }

    fn wins(&self, step: Step) -> Option<u8> {
        match self.get(step.field())? {
            FieldValue::Wins(v) => Some(*v),
            _ => None,
        }
    }
}

/// Where sessions live between events. Only `Predictor` writes to it.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Option<Session>;
    fn save(&self, session: Session);
    fn remove(&self, id: &str) -> Option<Session>;
    fn ids(&self) -> Vec<SessionId>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("session store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Option<Session> {
        let guard = self.sessions.lock().expect("session store lock poisoned");
        guard.get(id).cloned()
    }

    fn save(&self, session: Session) {
        let mut guard = self.sessions.lock().expect("session store lock poisoned");
        guard.insert(session.id.clone(), session);
    }

    fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.sessions.lock().expect("session store lock poisoned");
        guard.remove(id)
    }

    fn ids(&self) -> Vec<SessionId> {
        let guard = self.sessions.lock().expect("session store lock poisoned");
        let mut ids = guard.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }
}
