use farkle_autoplay::{
    best_selection, choose_action, legal_actions, run_autoplay, write_json, write_text,
    AutoAction, AutoplayConfig, AutoplayError, AutoplayResult, RunStatus, Simulator,
};
use farkle_core::{Content, EventBus, GameConfig, RunState, ScriptedRng};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_root(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "farkle_autoplay_{}_{}_{}",
        std::process::id(),
        name,
        nanos
    ))
}

fn seeded(win_condition: i64, seed: u64) -> impl Fn() -> Result<Simulator, AutoplayError> {
    move || {
        let mut config = GameConfig::default();
        config.game.win_condition = win_condition;
        let run = RunState::new(config, Content::default(), seed)
            .map_err(|err| AutoplayError::Factory(err.to_string()))?;
        Ok(Simulator::new(run))
    }
}

fn scripted(faces: &[i32]) -> RunState {
    let mut run = RunState::with_rng(
        GameConfig::default(),
        Content::default(),
        Box::new(ScriptedRng::faces(faces)),
    )
    .expect("run");
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");
    run.roll(&mut events).expect("roll");
    run
}

#[test]
fn setup_only_allows_starting_a_round() {
    let run = RunState::new(GameConfig::default(), Content::default(), 1).expect("run");
    assert_eq!(legal_actions(&run), vec![AutoAction::NextRound]);
    assert_eq!(
        choose_action(&run, &AutoplayConfig::default()),
        Some(AutoAction::NextRound)
    );
}

#[test]
fn best_selection_takes_every_scoring_die() {
    let run = scripted(&[1, 1, 1, 5, 2, 3]);
    let best = best_selection(&run).expect("scoring hand");
    assert_eq!(best.indices, vec![0, 1, 2, 3]);
    assert_eq!(best.points, 1050);
    assert!(legal_actions(&run).contains(&best.action()));
}

#[test]
fn banks_at_threshold_or_when_few_dice_remain() {
    let mut run = scripted(&[1, 1, 1, 5, 2, 3]);
    let mut events = EventBus::default();
    run.score_selection(
        &farkle_core::SelectionInput::new(vec![0, 1, 2, 3]),
        &mut events,
    )
    .expect("score");

    let config = AutoplayConfig::default();
    assert_eq!(choose_action(&run, &config), Some(AutoAction::Bank));

    let greedy = AutoplayConfig {
        bank_threshold: 5_000,
        ..AutoplayConfig::default()
    };
    assert_eq!(choose_action(&run, &greedy), Some(AutoAction::Bank));

    let reckless = AutoplayConfig {
        bank_threshold: 5_000,
        min_dice_to_reroll: 1,
        ..AutoplayConfig::default()
    };
    assert_eq!(choose_action(&run, &reckless), Some(AutoAction::Reroll));
}

#[test]
fn low_target_game_is_won() {
    let config = AutoplayConfig {
        max_rounds: 500,
        ..AutoplayConfig::default()
    };
    let result = run_autoplay(&seeded(1_500, 7), &config).expect("autoplay");
    assert_eq!(result.status, RunStatus::Won);
    assert!(result.final_metrics.game_score >= 1_500);
    assert_eq!(result.steps.last().map(|step| &step.action), Some(&AutoAction::Bank));
    assert_eq!(result.summary.steps as usize, result.steps.len());
    assert!(result.summary.banks >= 1);
}

#[test]
fn same_seed_replays_the_same_game() {
    let config = AutoplayConfig {
        max_rounds: 20,
        ..AutoplayConfig::default()
    };
    let first = run_autoplay(&seeded(3_000, 42), &config).expect("first");
    let second = run_autoplay(&seeded(3_000, 42), &config).expect("second");
    assert_eq!(first.status, second.status);
    assert_eq!(
        serde_json::to_value(&first.steps).expect("json"),
        serde_json::to_value(&second.steps).expect("json")
    );
}

#[test]
fn round_limit_stops_between_rounds() {
    let config = AutoplayConfig {
        max_rounds: 3,
        ..AutoplayConfig::default()
    };
    let result = run_autoplay(&seeded(1_000_000, 5), &config).expect("autoplay");
    assert_eq!(result.status, RunStatus::MaxRounds);
    assert_eq!(result.summary.rounds, 3);
    assert_eq!(result.summary.banks + result.summary.flops, 3);
}

#[test]
fn step_limit_is_reported() {
    let config = AutoplayConfig {
        max_steps: 2,
        ..AutoplayConfig::default()
    };
    let result = run_autoplay(&seeded(10_000, 5), &config).expect("autoplay");
    assert_eq!(result.status, RunStatus::MaxSteps);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].action, AutoAction::NextRound);
    assert_eq!(result.steps[1].action, AutoAction::Roll);
}

#[test]
fn factory_errors_propagate() {
    let factory = || -> Result<Simulator, AutoplayError> {
        Err(AutoplayError::Factory("no content".to_string()))
    };
    let err = run_autoplay(&factory, &AutoplayConfig::default()).expect_err("factory");
    assert!(matches!(err, AutoplayError::Factory(_)));
}

#[test]
fn reports_are_written_and_readable() {
    let config = AutoplayConfig {
        max_rounds: 2,
        ..AutoplayConfig::default()
    };
    let result = run_autoplay(&seeded(1_000_000, 9), &config).expect("autoplay");
    let root = temp_root("reports");
    let json_path = root.join("nested").join("run.json");
    let text_path = root.join("run.txt");
    write_json(&json_path, &result).expect("json");
    write_text(&text_path, &result).expect("text");

    let raw = fs::read_to_string(&json_path).expect("read json");
    let parsed: AutoplayResult = serde_json::from_str(&raw).expect("parse json");
    assert_eq!(parsed.status, result.status);
    assert_eq!(parsed.steps.len(), result.steps.len());

    let text = fs::read_to_string(&text_path).expect("read text");
    assert!(text.starts_with("status: MaxRounds"));
    assert!(text.contains("next_round"));
}
