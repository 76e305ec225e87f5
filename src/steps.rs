use thiserror::Error;

pub const FORM_MIN: i64 = 0;
pub const FORM_MAX: i64 = 5;

/// One resting state of the guided conversation, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    TeamAName,
    TeamBName,
    AvgGoalA,
    AvgConcedeA,
    FormA,
    AvgGoalB,
    AvgConcedeB,
    FormB,
    H2h,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::TeamAName,
        Step::TeamBName,
        Step::AvgGoalA,
        Step::AvgConcedeA,
        Step::FormA,
        Step::AvgGoalB,
        Step::AvgConcedeB,
        Step::FormB,
        Step::H2h,
    ];

    pub fn first() -> Self {
        Step::TeamAName
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// `None` once the last field is collected, i.e. the record is complete.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn spec(self) -> &'static StepSpec {
        &STEPS[self.index()]
    }

    pub fn field(self) -> &'static str {
        self.spec().field
    }

    pub fn parse(self, raw: &str) -> Result<FieldValue, ValidationError> {
        (self.spec().parse)(raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Average(f64),
    Wins(u8),
    HeadToHead { a: u32, b: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("the answer cannot be empty")]
    Empty,
    #[error("commands are not accepted as an answer")]
    Command,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("the number must be finite")]
    NotFinite,
    #[error("the number cannot be negative")]
    Negative,
    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),
    #[error("{value} is outside the range {min}-{max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("'{input}' is not in the form A-B ({reason})")]
    MalformedComposite { input: String, reason: &'static str },
}

/// Data description of a step: which field it fills, how raw text becomes a
/// value, and the prompt template (`{team_a}` / `{team_b}` are substituted).
pub struct StepSpec {
    pub step: Step,
    pub field: &'static str,
    pub parse: fn(&str) -> Result<FieldValue, ValidationError>,
    pub prompt: &'static str,
}

pub static STEPS: [StepSpec; 9] = [
    StepSpec {
        step: Step::TeamAName,
        field: "team_a_name",
        parse: parse_name,
        prompt: "Enter the name of team A (e.g. Arsenal):",
    },
    StepSpec {
        step: Step::TeamBName,
        field: "team_b_name",
        parse: parse_name,
        prompt: "Enter the name of team B, the opponent of {team_a}:",
    },
    StepSpec {
        step: Step::AvgGoalA,
        field: "avg_goal_a",
        parse: parse_average,
        prompt: "Average goals scored per match by {team_a} (e.g. 1.8):",
    },
    StepSpec {
        step: Step::AvgConcedeA,
        field: "avg_concede_a",
        parse: parse_average,
        prompt: "Average goals conceded per match by {team_a} (e.g. 1.0):",
    },
    StepSpec {
        step: Step::FormA,
        field: "form_a",
        parse: parse_form,
        prompt: "Wins for {team_a} in their last 5 matches (0-5):",
    },
    StepSpec {
        step: Step::AvgGoalB,
        field: "avg_goal_b",
        parse: parse_average,
        prompt: "Average goals scored per match by {team_b} (e.g. 1.2):",
    },
    StepSpec {
        step: Step::AvgConcedeB,
        field: "avg_concede_b",
        parse: parse_average,
        prompt: "Average goals conceded per match by {team_b} (e.g. 1.5):",
    },
    StepSpec {
        step: Step::FormB,
        field: "form_b",
        parse: parse_form,
        prompt: "Wins for {team_b} in their last 5 matches (0-5):",
    },
    StepSpec {
        step: Step::H2h,
        field: "h2h",
        parse: parse_head_to_head,
        prompt: "Head-to-head wins in recent meetings as {team_a}-{team_b} (e.g. 3-2):",
    },
];

pub fn parse_name(raw: &str) -> Result<FieldValue, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    if name.starts_with('/') {
        return Err(ValidationError::Command);
    }
    Ok(FieldValue::Text(name.to_string()))
}

pub fn parse_average(raw: &str) -> Result<FieldValue, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty);
    }
    let v = s
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber(s.to_string()))?;
    check_average(v).map(FieldValue::Average)
}

/// Range rule shared by typed input and deserialized records.
pub fn check_average(v: f64) -> Result<f64, ValidationError> {
    if !v.is_finite() {
        return Err(ValidationError::NotFinite);
    }
    if v < 0.0 {
        return Err(ValidationError::Negative);
    }
    // Normalise "-0" so it never renders with a sign.
    Ok(if v == 0.0 { 0.0 } else { v })
}

pub fn parse_form(raw: &str) -> Result<FieldValue, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty);
    }
    let v = s
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger(s.to_string()))?;
    check_form(v).map(FieldValue::Wins)
}

pub fn check_form(v: i64) -> Result<u8, ValidationError> {
    if !(FORM_MIN..=FORM_MAX).contains(&v) {
        return Err(ValidationError::OutOfRange {
            value: v,
            min: FORM_MIN,
            max: FORM_MAX,
        });
    }
    Ok(v as u8)
}

pub fn parse_head_to_head(raw: &str) -> Result<FieldValue, ValidationError> {
    let s = raw.trim();
    let malformed = |reason: &'static str| ValidationError::MalformedComposite {
        input: s.to_string(),
        reason,
    };

    let parts = s.split('-').collect::<Vec<_>>();
    if parts.len() != 2 {
        return Err(malformed("expected exactly one '-'"));
    }
    let a = parse_count(parts[0]).ok_or_else(|| malformed("left side is not a count"))?;
    let b = parse_count(parts[1]).ok_or_else(|| malformed("right side is not a count"))?;
    Ok(FieldValue::HeadToHead { a, b })
}

fn parse_count(part: &str) -> Option<u32> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u32>().ok()
}
