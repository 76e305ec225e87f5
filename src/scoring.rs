use serde::{Deserialize, Serialize};

use crate::steps::{ValidationError, check_average, check_form, parse_name};

pub const W_GOAL: f64 = 1.5;
// Conceding lowers a team's projected strength.
pub const W_CONCEDE: f64 = -1.3;
pub const W_FORM: f64 = 2.0;
pub const W_H2H: f64 = 1.2;

const STRONG_EDGE: f64 = 2.5;
const SLIGHT_EDGE: f64 = 0.5;

const OVER_LINE: f64 = 3.0;
const UNDER_LINE: f64 = 2.2;

const BTTS_MIN_SCORED: f64 = 1.0;
const BTTS_MIN_CONCEDED: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub team_a_name: String,
    pub team_b_name: String,
    pub avg_goals_scored_a: f64,
    pub avg_goals_conceded_a: f64,
    pub avg_goals_scored_b: f64,
    pub avg_goals_conceded_b: f64,
    // Wins in the last five matches.
    pub recent_wins_a: u8,
    pub recent_wins_b: u8,
    pub h2h_wins_a: u32,
    pub h2h_wins_b: u32,
}

impl MatchRecord {
    /// Applies the same per-field rules the guided conversation enforces, for
    /// records that arrive from elsewhere (e.g. a JSON file).
    pub fn validate(&self) -> Result<(), ValidationError> {
        parse_name(&self.team_a_name)?;
        parse_name(&self.team_b_name)?;
        for v in [
            self.avg_goals_scored_a,
            self.avg_goals_conceded_a,
            self.avg_goals_scored_b,
            self.avg_goals_conceded_b,
        ] {
            check_average(v)?;
        }
        check_form(i64::from(self.recent_wins_a))?;
        check_form(i64::from(self.recent_wins_b))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinnerCall {
    StrongA,
    SlightA,
    Draw,
    SlightB,
    StrongB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalsCall {
    Over,
    Under,
    Unclear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BttsCall {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub score_a: f64,
    pub score_b: f64,
    pub difference: f64,
    pub winner: WinnerCall,
    pub goals: GoalsCall,
    pub btts: BttsCall,
}

pub fn team_score(scored: f64, conceded: f64, recent_wins: u8, h2h_wins: u32) -> f64 {
    scored * W_GOAL
        + conceded * W_CONCEDE
        + f64::from(recent_wins) * W_FORM
        + f64::from(h2h_wins) * W_H2H
}

/// Maps the score difference (A minus B) onto the winner market.
///
/// Both `0.5` and `-0.5` are still a draw; the strong bands start strictly
/// beyond `2.5`.
pub fn winner_call(difference: f64) -> WinnerCall {
    if difference > STRONG_EDGE {
        WinnerCall::StrongA
    } else if difference > SLIGHT_EDGE {
        WinnerCall::SlightA
    } else if difference < -STRONG_EDGE {
        WinnerCall::StrongB
    } else if difference < -SLIGHT_EDGE {
        WinnerCall::SlightB
    } else {
        WinnerCall::Draw
    }
}

pub fn goals_call(total_scored: f64, total_conceded: f64) -> GoalsCall {
    if total_scored > OVER_LINE || total_conceded > OVER_LINE {
        GoalsCall::Over
    } else if total_scored < UNDER_LINE && total_conceded < UNDER_LINE {
        GoalsCall::Under
    } else {
        GoalsCall::Unclear
    }
}

pub fn btts_call(record: &MatchRecord) -> BttsCall {
    let both_score = record.avg_goals_scored_a > BTTS_MIN_SCORED
        && record.avg_goals_scored_b > BTTS_MIN_SCORED;
    let both_leak = record.avg_goals_conceded_a > BTTS_MIN_CONCEDED
        && record.avg_goals_conceded_b > BTTS_MIN_CONCEDED;
    if both_score && both_leak {
        BttsCall::Yes
    } else {
        BttsCall::No
    }
}

pub fn predict(record: &MatchRecord) -> Prediction {
    let score_a = team_score(
        record.avg_goals_scored_a,
        record.avg_goals_conceded_a,
        record.recent_wins_a,
        record.h2h_wins_a,
    );
    let score_b = team_score(
        record.avg_goals_scored_b,
        record.avg_goals_conceded_b,
        record.recent_wins_b,
        record.h2h_wins_b,
    );
    let difference = score_a - score_b;

    let total_scored = record.avg_goals_scored_a + record.avg_goals_scored_b;
    let total_conceded = record.avg_goals_conceded_a + record.avg_goals_conceded_b;

    Prediction {
        score_a,
        score_b,
        difference,
        winner: winner_call(difference),
        goals: goals_call(total_scored, total_conceded),
        btts: btts_call(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_band_is_inclusive() {
        assert_eq!(winner_call(0.5), WinnerCall::Draw);
        assert_eq!(winner_call(-0.5), WinnerCall::Draw);
        assert_eq!(winner_call(0.0), WinnerCall::Draw);
    }

    #[test]
    fn strong_band_starts_past_two_and_a_half() {
        assert_eq!(winner_call(2.5), WinnerCall::SlightA);
        assert_eq!(winner_call(2.50001), WinnerCall::StrongA);
        assert_eq!(winner_call(-2.5), WinnerCall::SlightB);
        assert_eq!(winner_call(-2.50001), WinnerCall::StrongB);
        assert_eq!(winner_call(0.50001), WinnerCall::SlightA);
        assert_eq!(winner_call(-0.50001), WinnerCall::SlightB);
    }

    #[test]
    fn goals_over_wins_when_either_total_is_high() {
        assert_eq!(goals_call(3.1, 0.5), GoalsCall::Over);
        assert_eq!(goals_call(1.0, 3.2), GoalsCall::Over);
        assert_eq!(goals_call(2.1, 2.1), GoalsCall::Under);
        assert_eq!(goals_call(2.1, 2.2), GoalsCall::Unclear);
        assert_eq!(goals_call(3.0, 3.0), GoalsCall::Unclear);
    }

    #[test]
    fn team_score_uses_fixed_weights() {
        let s = team_score(2.0, 1.0, 4, 3);
        assert!((s - (3.0 - 1.3 + 8.0 + 3.6)).abs() < 1e-9);
    }
}
