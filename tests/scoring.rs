use match_predictor::scoring::{
    BttsCall, GoalsCall, MatchRecord, WinnerCall, predict, team_score, winner_call,
};
use match_predictor::steps::ValidationError;

fn record(
    scored_a: f64,
    conceded_a: f64,
    wins_a: u8,
    scored_b: f64,
    conceded_b: f64,
    wins_b: u8,
    h2h: (u32, u32),
) -> MatchRecord {
    MatchRecord {
        team_a_name: "Alpha".to_string(),
        team_b_name: "Omega".to_string(),
        avg_goals_scored_a: scored_a,
        avg_goals_conceded_a: conceded_a,
        avg_goals_scored_b: scored_b,
        avg_goals_conceded_b: conceded_b,
        recent_wins_a: wins_a,
        recent_wins_b: wins_b,
        h2h_wins_a: h2h.0,
        h2h_wins_b: h2h.1,
    }
}

#[test]
fn reference_match_is_a_strong_home_call() {
    let r = record(1.8, 0.9, 3, 1.0, 1.4, 1, (2, 1));
    let p = predict(&r);
    assert!((p.score_a - 9.93).abs() < 1e-9);
    assert!((p.score_b - 2.88).abs() < 1e-9);
    assert!((p.difference - 7.05).abs() < 1e-9);
    assert_eq!(p.winner, WinnerCall::StrongA);
    assert_eq!(p.goals, GoalsCall::Unclear);
    assert_eq!(p.btts, BttsCall::No);
}

#[test]
fn prediction_is_deterministic() {
    let r = record(1.3, 1.1, 2, 1.6, 0.7, 4, (1, 3));
    let first = predict(&r);
    for _ in 0..50 {
        assert_eq!(predict(&r), first);
    }
}

#[test]
fn mirrored_record_flips_the_winner() {
    let a = record(2.1, 0.6, 5, 0.8, 1.9, 0, (4, 0));
    let b = record(0.8, 1.9, 0, 2.1, 0.6, 5, (0, 4));
    assert_eq!(predict(&a).winner, WinnerCall::StrongA);
    assert_eq!(predict(&b).winner, WinnerCall::StrongB);
    assert!((predict(&a).difference + predict(&b).difference).abs() < 1e-9);
}

#[test]
fn identical_teams_draw() {
    let r = record(1.4, 1.2, 2, 1.4, 1.2, 2, (1, 1));
    let p = predict(&r);
    assert_eq!(p.difference, 0.0);
    assert_eq!(p.winner, WinnerCall::Draw);
}

#[test]
fn slight_edges_sit_between_half_and_two_and_a_half() {
    // One extra recent win is worth exactly 2.0.
    let a = record(1.0, 1.0, 3, 1.0, 1.0, 2, (0, 0));
    assert_eq!(predict(&a).winner, WinnerCall::SlightA);
    let b = record(1.0, 1.0, 2, 1.0, 1.0, 3, (0, 0));
    assert_eq!(predict(&b).winner, WinnerCall::SlightB);
}

#[test]
fn boundaries_of_the_winner_market() {
    assert_eq!(winner_call(0.5), WinnerCall::Draw);
    assert_eq!(winner_call(-0.5), WinnerCall::Draw);
    assert_eq!(winner_call(2.50001), WinnerCall::StrongA);
    assert_eq!(winner_call(-2.50001), WinnerCall::StrongB);
}

#[test]
fn goal_markets_follow_combined_averages() {
    let over = record(2.0, 0.5, 1, 1.5, 0.5, 1, (0, 0));
    assert_eq!(predict(&over).goals, GoalsCall::Over);

    let leaky = record(0.5, 1.8, 1, 0.5, 1.5, 1, (0, 0));
    assert_eq!(predict(&leaky).goals, GoalsCall::Over);

    let tight = record(1.0, 1.0, 1, 1.0, 1.0, 1, (0, 0));
    assert_eq!(predict(&tight).goals, GoalsCall::Under);
}

#[test]
fn both_teams_score_needs_all_four_conditions() {
    let yes = record(1.5, 1.0, 2, 1.2, 0.9, 2, (1, 1));
    assert_eq!(predict(&yes).btts, BttsCall::Yes);

    let tight_defence = record(1.5, 0.8, 2, 1.2, 0.9, 2, (1, 1));
    assert_eq!(predict(&tight_defence).btts, BttsCall::No);

    let blunt = record(1.0, 1.0, 2, 1.2, 0.9, 2, (1, 1));
    assert_eq!(predict(&blunt).btts, BttsCall::No);
}

#[test]
fn conceding_lowers_team_score() {
    assert!(team_score(1.0, 2.0, 0, 0) < team_score(1.0, 1.0, 0, 0));
}

#[test]
fn valid_record_passes_field_rules() {
    let r = record(1.8, 0.9, 3, 1.0, 1.4, 1, (2, 1));
    assert_eq!(r.validate(), Ok(()));
}

#[test]
fn deserialized_record_with_bad_fields_is_rejected() {
    let raw = r#"{
        "team_a_name": "",
        "team_b_name": "Omega",
        "avg_goals_scored_a": -4.0,
        "avg_goals_conceded_a": 1.0,
        "avg_goals_scored_b": 1.0,
        "avg_goals_conceded_b": 1.0,
        "recent_wins_a": 200,
        "recent_wins_b": 1,
        "h2h_wins_a": 0,
        "h2h_wins_b": 0
    }"#;
    let mut r: MatchRecord = serde_json::from_str(raw).expect("shape is valid json");
    assert_eq!(r.validate(), Err(ValidationError::Empty));

    r.team_a_name = "Alpha".to_string();
    assert_eq!(r.validate(), Err(ValidationError::Negative));

    r.avg_goals_scored_a = f64::NAN;
    assert_eq!(r.validate(), Err(ValidationError::NotFinite));

    r.avg_goals_scored_a = 1.2;
    assert!(matches!(
        r.validate(),
        Err(ValidationError::OutOfRange { value: 200, .. })
    ));

    r.recent_wins_a = 5;
    assert_eq!(r.validate(), Ok(()));
}
