use crate::machine::{Prompt, Reply, Report};
use crate::scoring::{BttsCall, GoalsCall, WinnerCall};

pub const WELCOME_TEXT: &str =
    "Welcome! Let's predict a football match result.\nSend /cancel at any time to stop.";
pub const CANCELLED_TEXT: &str = "Prediction cancelled.";
pub const NOTHING_TO_CANCEL_TEXT: &str = "Nothing to cancel. Send /start to begin a prediction.";
pub const NOT_STARTED_TEXT: &str = "No prediction in progress. Send /start to begin.";
pub const EXPIRED_TEXT: &str =
    "Your prediction was dropped after being idle for too long. Send /start to begin again.";
pub const HELP_TEXT: &str = "I predict a football match from a few numbers.\n\
/start - begin (or restart) a prediction\n\
/cancel - stop the current prediction\n\n\
You will be asked for both team names, each team's average goals scored and conceded, \
their wins in the last 5 matches, and head-to-head wins written like 3-2.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub markdown: bool,
    // Unformatted variant of a Markdown message, sent if the markup is refused.
    pub fallback: Option<String>,
}

impl Outbound {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
            fallback: None,
        }
    }

    pub fn plain_text(&self) -> &str {
        self.fallback.as_deref().unwrap_or(&self.text)
    }
}

pub fn render_reply(reply: &Reply) -> Outbound {
    match reply {
        Reply::Welcome => Outbound::plain(WELCOME_TEXT),
        Reply::Prompt(prompt) => Outbound::plain(prompt_text(prompt)),
        Reply::Retry { prompt, error } => {
            Outbound::plain(format!("That didn't work: {error}.\n{}", prompt_text(prompt)))
        }
        Reply::Report(report) => Outbound {
            text: report_text(report),
            markdown: true,
            fallback: Some(report_plain_text(report)),
        },
        Reply::Cancelled => Outbound::plain(CANCELLED_TEXT),
        Reply::NothingToCancel => Outbound::plain(NOTHING_TO_CANCEL_TEXT),
        Reply::NotStarted => Outbound::plain(NOT_STARTED_TEXT),
        Reply::Expired => Outbound::plain(EXPIRED_TEXT),
        Reply::Help => Outbound::plain(HELP_TEXT),
    }
}

pub fn prompt_text(prompt: &Prompt) -> String {
    let team_a = prompt.team_a.as_deref().unwrap_or("team A");
    let team_b = prompt.team_b.as_deref().unwrap_or("team B");
    fill_template(prompt.step.spec().prompt, team_a, team_b)
}

// One pass over the template, so a name that looks like a placeholder stays literal.
fn fill_template(template: &str, team_a: &str, team_b: &str) -> String {
    let mut out = String::with_capacity(template.len() + team_a.len() + team_b.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{team_a}") {
            out.push_str(team_a);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{team_b}") {
            out.push_str(team_b);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

pub fn report_text(report: &Report) -> String {
    report_body(report, true)
}

pub fn report_plain_text(report: &Report) -> String {
    report_body(report, false)
}

fn report_body(report: &Report, markdown: bool) -> String {
    let (a, b, bold) = if markdown {
        (
            escape_markdown(&report.record.team_a_name),
            escape_markdown(&report.record.team_b_name),
            "*",
        )
    } else {
        (
            report.record.team_a_name.clone(),
            report.record.team_b_name.clone(),
            "",
        )
    };
    let p = &report.prediction;

    let winner = match p.winner {
        WinnerCall::StrongA => format!("Strong win for {a}"),
        WinnerCall::SlightA => format!("Slight edge to {a}"),
        WinnerCall::Draw => "Draw".to_string(),
        WinnerCall::SlightB => format!("Slight edge to {b}"),
        WinnerCall::StrongB => format!("Strong win for {b}"),
    };
    let goals = match p.goals {
        GoalsCall::Over => "Likely over 2.5 goals",
        GoalsCall::Under => "Likely under 2.5 goals",
        GoalsCall::Unclear => "Unclear",
    };
    let btts = match p.btts {
        BttsCall::Yes => "Yes",
        BttsCall::No => "No",
    };

    format!(
        "{bold}Match Prediction Results{bold}\n{a} vs {b}\n\n\
{bold}Winner:{bold} {winner}\n\
{bold}Goals:{bold} {goals}\n\
{bold}Both teams to score:{bold} {btts}\n\n\
Scores: {a} {:.2} | {b} {:.2} (difference {:+.2})",
        p.score_a, p.score_b, p.difference
    )
}

/// Escapes the characters Telegram's legacy Markdown treats as markup.
pub fn escape_markdown(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{MatchRecord, predict};
    use crate::steps::Step;

    #[test]
    fn prompts_fill_in_team_names() {
        let prompt = Prompt {
            step: Step::H2h,
            team_a: Some("Arsenal".to_string()),
            team_b: Some("Chelsea".to_string()),
        };
        assert_eq!(
            prompt_text(&prompt),
            "Head-to-head wins in recent meetings as Arsenal-Chelsea (e.g. 3-2):"
        );
    }

    #[test]
    fn prompts_fall_back_before_names_are_known() {
        let prompt = Prompt {
            step: Step::TeamBName,
            team_a: None,
            team_b: None,
        };
        assert!(prompt_text(&prompt).contains("team A"));
    }

    #[test]
    fn placeholder_like_names_are_not_expanded() {
        let prompt = Prompt {
            step: Step::H2h,
            team_a: Some("{team_b} United".to_string()),
            team_b: Some("Rovers {x".to_string()),
        };
        assert_eq!(
            prompt_text(&prompt),
            "Head-to-head wins in recent meetings as {team_b} United-Rovers {x (e.g. 3-2):"
        );
    }

    #[test]
    fn report_fallback_is_free_of_markup() {
        let record = MatchRecord {
            team_a_name: "Inter_Milan".to_string(),
            team_b_name: "*Stars*".to_string(),
            avg_goals_scored_a: 1.8,
            avg_goals_conceded_a: 0.9,
            avg_goals_scored_b: 1.0,
            avg_goals_conceded_b: 1.4,
            recent_wins_a: 3,
            recent_wins_b: 1,
            h2h_wins_a: 2,
            h2h_wins_b: 1,
        };
        let prediction = predict(&record);
        let out = render_reply(&Reply::Report(Report { record, prediction }));

        assert!(out.markdown);
        assert!(out.text.contains("Inter\\_Milan vs \\*Stars\\*"));
        assert!(out.text.contains("*Winner:*"));

        let plain = out.plain_text();
        assert!(plain.starts_with("Match Prediction Results\nInter_Milan vs *Stars*"));
        assert!(plain.contains("Winner: Strong win for Inter_Milan"));
        assert!(!plain.contains('\\'));
    }

    #[test]
    fn plain_messages_have_no_fallback() {
        let out = render_reply(&Reply::Cancelled);
        assert_eq!(out.fallback, None);
        assert_eq!(out.plain_text(), CANCELLED_TEXT);
    }

    #[test]
    fn markdown_markup_is_escaped() {
        assert_eq!(escape_markdown("Inter_Milan *FC*"), "Inter\\_Milan \\*FC\\*");
        assert_eq!(escape_markdown("Arsenal"), "Arsenal");
    }
}
