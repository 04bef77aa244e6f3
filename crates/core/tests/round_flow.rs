use farkle_core::*;
use std::collections::HashMap;

const FLOP: [i32; 6] = [2, 3, 4, 6, 2, 3];

fn run_with(config: GameConfig, content: Content, faces: &[i32]) -> RunState {
    RunState::with_dice_set(
        config,
        content,
        Hand::standard(6),
        Box::new(ScriptedRng::faces(faces)),
    )
    .expect("run")
}

fn standard_run(faces: &[i32]) -> RunState {
    run_with(GameConfig::default(), Content::default(), faces)
}

fn started(faces: &[i32]) -> (RunState, EventBus) {
    let mut run = standard_run(faces);
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");
    (run, events)
}

fn charm_def(id: &str, uses: Option<u32>) -> CharmDef {
    CharmDef {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        behavior: None,
        uses,
        params: HashMap::new(),
    }
}

fn consumable_def(id: &str, effect: ConsumableEffect) -> ConsumableDef {
    ConsumableDef {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        uses: 1,
        effect,
    }
}

fn phase(run: &RunState) -> RoundPhase {
    run.phase().expect("active round")
}

#[test]
fn roll_then_score_then_bank() {
    let (mut run, mut events) = started(&[1, 2, 3, 4, 6, 6]);
    assert_eq!(phase(&run), RoundPhase::RollPending);
    let rolled = run.roll(&mut events).expect("roll");
    assert_eq!(rolled.values(), &[1, 2, 3, 4, 6, 6]);
    assert_eq!(phase(&run), RoundPhase::AwaitingSelection);

    let report = run
        .score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    assert_eq!(report.points, 100);
    assert!(!report.hot_dice);
    let round = run.round().expect("round");
    assert_eq!(round.dice_hand.len(), 5);
    assert_eq!(round.scored_dice.len(), 1);
    assert!(round.scored_dice[0].scored);
    assert_eq!(round.phase, RoundPhase::BankOrRerollPending);

    let banked = run.bank(&mut events).expect("bank");
    assert_eq!(banked, 100);
    assert_eq!(run.state.game_score, 100);
    assert_eq!(phase(&run), RoundPhase::Banked);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::Banked { banked: 100, .. })));
}

#[test]
fn actions_out_of_phase_are_rejected() {
    let (mut run, mut events) = started(&[1, 2, 3, 4, 6, 6]);
    assert!(matches!(
        run.bank(&mut events),
        Err(RunError::InvalidPhase(RoundPhase::RollPending))
    ));
    assert!(matches!(
        run.score_selection(&SelectionInput::new(vec![0]), &mut events),
        Err(RunError::InvalidPhase(_))
    ));
    run.roll(&mut events).expect("roll");
    assert!(matches!(
        run.reroll(&mut events),
        Err(RunError::InvalidPhase(RoundPhase::AwaitingSelection))
    ));
    assert!(matches!(
        run.start_round(&mut events),
        Err(RunError::RoundInProgress(1))
    ));
}

#[test]
fn invalid_selection_leaves_state_untouched() {
    let (mut run, mut events) = started(&[1, 2, 3, 4, 6, 6]);
    run.roll(&mut events).expect("roll");
    let before = run.round.clone();
    let err = run
        .score_selection(&SelectionInput::new(vec![1]), &mut events)
        .expect_err("stray two");
    assert!(matches!(
        err,
        RunError::Selection(SelectionError::NoPartitioning)
    ));
    assert_eq!(run.round, before);
}

#[test]
fn reroll_uses_only_dice_left_in_hand() {
    let (mut run, mut events) = started(&[1, 2, 3, 4, 6, 6, 5, 5, 5, 2, 3]);
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    let rerolled = run.reroll(&mut events).expect("reroll");
    assert_eq!(rerolled.values(), &[5, 5, 5, 2, 3]);
    let round = run.round().expect("round");
    assert_eq!(round.roll_number, 2);
    assert_eq!(round.round_points, 100);
}

#[test]
fn hot_dice_refills_the_full_set() {
    let (mut run, mut events) = started(&[1, 1, 1, 5, 5, 5]);
    run.roll(&mut events).expect("roll");
    let report = run
        .score_selection(&SelectionInput::new(vec![0, 1, 2, 3, 4, 5]), &mut events)
        .expect("score");
    assert_eq!(report.points, 2500);
    assert!(report.hot_dice);
    let round = run.round().expect("round");
    assert_eq!(round.hot_dice_counter, 1);
    assert_eq!(round.dice_hand.len(), 6);
    assert!(round.dice_hand.iter().all(|die| die.rolled_value.is_none() && !die.scored));
    assert!(round.scored_dice.is_empty());
    assert_eq!(run.state.history.total_hot_dice, 1);
    assert_eq!(phase(&run), RoundPhase::BankOrRerollPending);

    let rerolled = run.reroll(&mut events).expect("reroll");
    assert_eq!(rerolled.values().len(), 6);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::HotDice { round_count: 1, game_count: 1 })));
}

#[test]
fn flop_forfeits_round_points() {
    let mut faces = vec![1, 2, 3, 4, 6, 6];
    faces.extend([2, 3, 4, 6, 2]);
    let (mut run, mut events) = started(&faces);
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    let outcome = run.reroll(&mut events).expect("reroll");
    assert_eq!(
        outcome,
        RollOutcome::Flopped {
            forfeited: 100,
            values: vec![2, 3, 4, 6, 2]
        }
    );
    let round = run.round().expect("round");
    assert_eq!(round.phase, RoundPhase::Flopped);
    assert_eq!(round.round_points, 0);
    assert_eq!(round.forfeited_points, 100);
    assert_eq!(run.state.consecutive_flops, 1);
    assert_eq!(run.state.game_score, 0);
    assert_eq!(run.state.history.total_forfeited, 100);
}

#[test]
fn flop_penalty_repeats_until_a_bank() {
    let mut faces = Vec::new();
    for _ in 0..4 {
        faces.extend(FLOP);
    }
    faces.extend([1, 2, 3, 4, 6, 6]);
    faces.extend(FLOP);
    let (mut run, mut events) = started(&faces);

    let mut scores = Vec::new();
    for round in 0..4 {
        if round > 0 {
            run.start_round(&mut events).expect("next round");
        }
        assert!(run.roll(&mut events).expect("roll").is_flop());
        scores.push(run.state.game_score);
    }
    assert_eq!(scores, vec![0, 0, -1000, -2000]);
    assert_eq!(run.state.consecutive_flops, 4);
    assert_eq!(run.state.history.penalties_applied, 2);

    run.start_round(&mut events).expect("round 5");
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    run.bank(&mut events).expect("bank");
    assert_eq!(run.state.consecutive_flops, 0);
    assert_eq!(run.state.game_score, -1900);

    run.start_round(&mut events).expect("round 6");
    run.roll(&mut events).expect("roll");
    assert_eq!(run.state.consecutive_flops, 1);
    assert_eq!(run.state.game_score, -1900);
    assert_eq!(run.state.round_number, 6);
}

#[test]
fn flop_shield_absorbs_one_flop() {
    let content = Content {
        charms: vec![charm_def("flop_shield", Some(1))],
        ..Content::default()
    };
    let mut config = GameConfig::default();
    config.game.starting_charms = vec!["flop_shield".to_string()];
    let mut run = run_with(config, content, &FLOP);
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");

    let outcome = run.roll(&mut events).expect("roll");
    assert!(matches!(outcome, RollOutcome::FlopPrevented { .. }));
    assert_eq!(run.state.inventory.charms[0].uses, Some(0));
    assert_eq!(run.state.consecutive_flops, 0);
    let round = run.round().expect("round");
    assert_eq!(round.phase, RoundPhase::AwaitingSelection);
    assert!(round.flop_prevented);
    assert!(round.can_bank());

    let outcome = run.reroll(&mut events).expect("reroll");
    assert!(outcome.is_flop());
    assert_eq!(run.state.consecutive_flops, 1);
}

#[test]
fn purist_turns_a_singles_only_roll_into_a_flop() {
    let content = Content {
        charms: vec![charm_def("purist", None)],
        ..Content::default()
    };
    let mut config = GameConfig::default();
    config.game.starting_charms = vec!["purist".to_string()];
    let mut run = run_with(config, content, &[1, 2, 3, 4, 6, 6, 2, 2, 2, 3, 4, 6]);
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");

    let outcome = run.roll(&mut events).expect("roll");
    assert!(outcome.is_flop());
    assert_eq!(phase(&run), RoundPhase::Flopped);
    assert_eq!(run.state.consecutive_flops, 1);
    assert!(run.round().expect("round").roll_history[0].flopped);

    run.start_round(&mut events).expect("next round");
    let outcome = run.roll(&mut events).expect("roll");
    assert_eq!(outcome.values(), &[2, 2, 2, 3, 4, 6]);
    assert_eq!(phase(&run), RoundPhase::AwaitingSelection);
    run.score_selection(&SelectionInput::new(vec![0, 1, 2]), &mut events)
        .expect("triple is allowed");
    run.bank(&mut events).expect("bank");
    assert_eq!(run.state.consecutive_flops, 0);
}

#[test]
fn zero_faces_never_hold_a_round_open() {
    let dice = (1..=6)
        .map(|id| Die::with_faces(id, vec![0, 2, 3, 4, 6, 6], Material::Plastic).expect("die"))
        .collect();
    let mut run = RunState::with_dice_set(
        GameConfig::default(),
        Content::default(),
        Hand::new(dice),
        Box::new(ScriptedRng::new(vec![0, 0, 0, 1, 2, 3])),
    )
    .expect("run");
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");

    let outcome = run.roll(&mut events).expect("roll");
    assert_eq!(outcome.values(), &[0, 0, 0, 2, 3, 4]);
    assert!(outcome.is_flop());
    assert_eq!(phase(&run), RoundPhase::Flopped);
    run.start_round(&mut events).expect("next round");
}

struct Receipt;

impl CharmBehavior for Receipt {
    fn id(&self) -> &'static str {
        "receipt"
    }

    fn on_bank(
        &self,
        charm: &CharmInstance,
        _ctx: &BankContext<'_>,
        banked: f64,
    ) -> Result<Option<BankTrigger>, EffectError> {
        Ok(Some(BankTrigger {
            banked: banked + 50.0,
            money: 0,
            line: format!("{}: +50", charm.name),
            consume_use: true,
        }))
    }
}

#[test]
fn bank_charm_uses_are_spent_once() {
    let content = Content {
        charms: vec![charm_def("receipt", Some(2))],
        ..Content::default()
    };
    let mut run = run_with(GameConfig::default(), content, &[1, 2, 3, 4, 6, 6]);
    run.registry.register(Box::new(Receipt));
    run.grant_charm("receipt").expect("grant");
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");

    let before = run.state.clone();
    assert!(matches!(
        run.bank(&mut events),
        Err(RunError::InvalidPhase(RoundPhase::RollPending))
    ));
    assert_eq!(run.state, before);

    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    let banked = run.bank(&mut events).expect("bank");
    assert_eq!(banked, 150);
    assert_eq!(run.state.inventory.charms[0].uses, Some(1));
    assert_eq!(run.state.game_score, 150);
}

#[test]
fn winning_bank_ends_the_game() {
    let mut config = GameConfig::default();
    config.game.win_condition = 100;
    let mut run = run_with(config, Content::default(), &[1, 2, 3, 4, 6, 6]);
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");
    run.advance_round(RoundAction::Roll, &mut events).expect("roll");
    run.advance_round(RoundAction::Score(SelectionInput::new(vec![0])), &mut events)
        .expect("score");
    let step = run
        .advance_round(RoundAction::Bank, &mut events)
        .expect("bank");
    assert_eq!(step, RoundStep::Banked { points: 100 });
    assert_eq!(run.state.status, GameStatus::Won);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::GameEnded {
            status: GameStatus::Won,
            ..
        }
    )));
    assert!(matches!(
        run.start_round(&mut events),
        Err(RunError::GameOver(GameStatus::Won))
    ));
}

#[test]
fn quit_only_between_rounds() {
    let (mut run, mut events) = started(&[1, 2, 3, 4, 6, 6]);
    assert!(matches!(
        run.quit(&mut events),
        Err(RunError::RoundInProgress(1))
    ));
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    run.bank(&mut events).expect("bank");
    run.quit(&mut events).expect("quit");
    assert_eq!(run.state.status, GameStatus::Quit);
    assert_eq!(run.state.game_score, 100);
}

#[test]
fn round_and_bank_charms_apply() {
    let mut head_start = charm_def("head_start", None);
    head_start.params.insert("points".to_string(), 200.0);
    let mut interest = charm_def("compound_interest", None);
    interest.params.insert("mult".to_string(), 1.5);
    let content = Content {
        charms: vec![head_start, interest],
        ..Content::default()
    };
    let mut config = GameConfig::default();
    config.game.starting_charms = vec!["head_start".to_string(), "compound_interest".to_string()];
    let mut run = run_with(config, content, &[1, 2, 3, 4, 6, 6]);
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");
    assert_eq!(run.round().expect("round").round_points, 200);
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    let banked = run.bank(&mut events).expect("bank");
    assert_eq!(banked, 450);
    assert_eq!(run.state.game_score, 450);
}

#[test]
fn unknown_starting_content_is_skipped() {
    let content = Content {
        charms: vec![charm_def("flop_shield", Some(1)), charm_def("mystery", None)],
        ..Content::default()
    };
    let mut config = GameConfig::default();
    config.game.starting_charms = vec![
        "nope".to_string(),
        "mystery".to_string(),
        "flop_shield".to_string(),
    ];
    config.game.starting_consumables = vec!["nothing".to_string()];
    let mut run = run_with(config, content, &FLOP);
    assert_eq!(run.state.inventory.charms.len(), 1);
    assert!(run.state.inventory.consumables.is_empty());
    assert!(matches!(
        run.grant_charm("nope"),
        Err(RunError::UnknownContentId { kind: "charm", .. })
    ));
}

#[test]
fn consumables_apply_and_spend() {
    let content = Content {
        consumables: vec![
            consumable_def("coin", ConsumableEffect::AddMoney { amount: 5 }),
            consumable_def(
                "gild",
                ConsumableEffect::SetMaterial {
                    material: Material::Golden,
                },
            ),
            consumable_def("chisel", ConsumableEffect::SetFace { value: 7 }),
        ],
        ..Content::default()
    };
    let mut run = run_with(GameConfig::default(), content, &FLOP);
    let mut events = EventBus::default();
    for id in ["coin", "gild", "chisel"] {
        run.grant_consumable(id).expect("grant");
    }

    run.use_consumable(0, ConsumableTarget::default(), &mut events)
        .expect("coin");
    assert_eq!(run.state.money, 5);
    assert_eq!(run.state.inventory.consumables.len(), 2);

    let before = run.state.clone();
    assert!(matches!(
        run.use_consumable(0, ConsumableTarget::default(), &mut events),
        Err(RunError::InvalidTarget(reason)) if reason.contains("needs a die")
    ));
    assert_eq!(run.state, before);

    run.use_consumable(0, ConsumableTarget::die(2), &mut events)
        .expect("gild");
    assert_eq!(run.state.dice_set.dice[2].material, Material::Golden);

    run.use_consumable(0, ConsumableTarget::face(1, 0), &mut events)
        .expect("chisel");
    assert_eq!(run.state.dice_set.dice[1].allowed_values[0], 7);
    assert!(run.state.inventory.consumables.is_empty());
    assert!(matches!(
        run.use_consumable(0, ConsumableTarget::default(), &mut events),
        Err(RunError::InvalidConsumableIndex(0))
    ));
}

#[test]
fn round_points_consumable_needs_a_round() {
    let content = Content {
        consumables: vec![consumable_def(
            "boost",
            ConsumableEffect::AddRoundPoints { amount: 250 },
        )],
        ..Content::default()
    };
    let mut run = run_with(GameConfig::default(), content, &[1, 2, 3, 4, 6, 6]);
    let mut events = EventBus::default();
    run.grant_consumable("boost").expect("grant");
    assert!(matches!(
        run.use_consumable(0, ConsumableTarget::default(), &mut events),
        Err(RunError::NoActiveRound)
    ));
    run.start_game(&mut events).expect("start");
    run.use_consumable(0, ConsumableTarget::default(), &mut events)
        .expect("boost");
    assert_eq!(run.round().expect("round").round_points, 250);

    run.grant_consumable("boost").expect("grant");
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0]), &mut events)
        .expect("score");
    run.bank(&mut events).expect("bank");
    let before = run.state.clone();
    assert!(matches!(
        run.use_consumable(0, ConsumableTarget::default(), &mut events),
        Err(RunError::InvalidPhase(RoundPhase::Banked))
    ));
    assert_eq!(run.state, before);
}

#[test]
fn invalid_dice_set_is_rejected() {
    let err = RunState::with_dice_set(
        GameConfig::default(),
        Content::default(),
        Hand::new(Vec::new()),
        Box::new(ScriptedRng::default()),
    )
    .expect_err("empty set");
    assert!(matches!(err, RunError::Configuration(DiceError::EmptySet)));

    let mut broken = Die::standard(1);
    broken.allowed_values.pop();
    let err = RunState::with_dice_set(
        GameConfig::default(),
        Content::default(),
        Hand::new(vec![broken]),
        Box::new(ScriptedRng::default()),
    )
    .expect_err("short die");
    assert!(matches!(
        err,
        RunError::Configuration(DiceError::FaceCountMismatch { .. })
    ));
}

#[test]
fn state_survives_json_round_trip() {
    let mut dice = Hand::standard(5);
    dice.dice.push(Die::standard(6).with_material(Material::Crystal));
    let mut run = RunState::with_dice_set(
        GameConfig::default(),
        Content::default(),
        dice,
        Box::new(ScriptedRng::faces(&[1, 2, 3, 4, 6, 5])),
    )
    .expect("run");
    let mut events = EventBus::default();
    run.start_game(&mut events).expect("start");
    run.roll(&mut events).expect("roll");
    run.score_selection(&SelectionInput::new(vec![0, 5]), &mut events)
        .expect("score");

    let game_json = serde_json::to_string(&run.state).expect("game json");
    let game: GameState = serde_json::from_str(&game_json).expect("game back");
    assert_eq!(game, run.state);
    assert_eq!(game.dice_set.dice[5].material, Material::Crystal);

    let round = run.round().expect("round");
    let round_json = serde_json::to_string(round).expect("round json");
    let back: RoundState = serde_json::from_str(&round_json).expect("round back");
    assert_eq!(&back, round);
    assert_eq!(back.round_points, 225);
    assert_eq!(back.material_counters.crystals_scored, 1);
}
