use farkle_core::*;

struct Broken;

impl CharmBehavior for Broken {
    fn id(&self) -> &'static str {
        "broken"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        _ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        Err(EffectError::InvalidRule {
            source_id: charm.id.clone(),
            reason: "always fails".to_string(),
        })
    }
}

struct Fixture {
    hand: Hand,
    game: GameState,
    round: RoundState,
    registry: CharmRegistry,
    rules: MaterialRules,
}

impl Fixture {
    fn new(dice: Vec<Die>) -> Self {
        let config = GameConfig::default();
        let hand = Hand::new(dice);
        let round = RoundState::new(1, &hand);
        Self {
            game: GameState::new(&config, Hand::standard(6)),
            round,
            hand,
            registry: CharmRegistry::with_defaults(),
            rules: config.materials,
        }
    }

    fn charm(mut self, charm: CharmInstance) -> Self {
        self.game.inventory.charms.push(charm);
        self
    }

    fn partitioning(&self) -> Partitioning {
        let input = SelectionInput::new((0..self.hand.len()).collect());
        let resolution =
            resolve_selection(&input, &self.hand, &NoFilter, &ScoreTables::standard());
        resolution.chosen_partitioning().cloned().expect("scoring selection")
    }

    fn apply(&self, rng: &mut dyn RandomSource) -> ModifierOutcome {
        apply_modifiers(
            &self.partitioning(),
            &self.hand,
            &self.game,
            &self.round,
            &self.registry,
            &self.rules,
            rng,
        )
    }
}

fn die(id: u32, value: i32, material: Material) -> Die {
    Die::showing(id, value).with_material(material)
}

#[test]
fn plain_dice_score_their_base() {
    let fixture = Fixture::new(vec![die(1, 1, Material::Plastic), die(2, 5, Material::Plastic)]);
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.base_points, 150);
    assert_eq!(outcome.final_points, 150);
    assert!(outcome.logs.is_empty());
    assert!(outcome.trace.is_empty());
}

#[test]
fn fractional_totals_round_up() {
    let fixture = Fixture::new(vec![die(1, 5, Material::Wooden)]);
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.raw_points, 62.5);
    assert_eq!(outcome.final_points, 63);
    assert_eq!(outcome.logs.len(), 1);
    assert_eq!(outcome.logs[0].source, EffectSource::Material);
}

#[test]
fn charms_run_before_materials() {
    let fixture = Fixture::new(vec![die(1, 5, Material::Wooden)])
        .charm(CharmInstance::new("bonus_pip", "Bonus Pip", None));
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.raw_points, 187.5);
    assert_eq!(outcome.final_points, 188);
    let sources: Vec<&str> = outcome.logs.iter().map(|log| log.id.as_str()).collect();
    assert_eq!(sources, vec!["bonus_pip", "wooden"]);
}

#[test]
fn charms_chain_in_registration_order() {
    let fixture = Fixture::new(vec![die(1, 1, Material::Plastic)])
        .charm(CharmInstance::new("bonus_pip", "Bonus Pip", None))
        .charm(CharmInstance::new("magnifier", "Magnifier", None));
    assert_eq!(fixture.apply(&mut ScriptedRng::default()).final_points, 300);

    let reversed = Fixture::new(vec![die(1, 1, Material::Plastic)])
        .charm(CharmInstance::new("magnifier", "Magnifier", None))
        .charm(CharmInstance::new("bonus_pip", "Bonus Pip", None));
    assert_eq!(reversed.apply(&mut ScriptedRng::default()).final_points, 250);
}

#[test]
fn unusable_charms_are_skipped_without_spending() {
    let mut spent = CharmInstance::new("bonus_pip", "Bonus Pip", Some(0));
    spent.params.insert("points".to_string(), 1000.0);
    let mut inactive = CharmInstance::new("magnifier", "Magnifier", None);
    inactive.active = false;
    let fixture = Fixture::new(vec![die(1, 1, Material::Plastic)])
        .charm(spent)
        .charm(inactive);
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.final_points, 100);
    assert!(outcome.charm_uses.is_empty());
}

#[test]
fn crystal_multiplier_grows_with_earlier_crystals() {
    let mut fixture = Fixture::new(vec![
        die(1, 1, Material::Crystal),
        die(2, 5, Material::Crystal),
    ]);
    let first = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(first.final_points, 338);
    assert_eq!(first.crystals_scored, 2);

    fixture.round.material_counters.crystals_scored = 2;
    let later = fixture.apply(&mut ScriptedRng::default());
    assert!((later.raw_points - 150.0 * 1.7 * 1.7).abs() < 1e-6);
}

#[test]
fn golden_pays_money_and_leaves_points() {
    let fixture = Fixture::new(vec![die(1, 1, Material::Golden), die(2, 1, Material::Golden)]);
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.final_points, 200);
    assert_eq!(outcome.money_delta, 10);
}

#[test]
fn volcano_scales_with_hot_dice() {
    let mut fixture = Fixture::new(vec![die(1, 5, Material::Volcano)]);
    fixture.round.hot_dice_counter = 2;
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.final_points, 50 + 50 + 200);
}

#[test]
fn rerunning_with_the_same_state_is_idempotent() {
    let fixture = Fixture::new(vec![
        die(1, 1, Material::Rainbow),
        die(2, 5, Material::Mirror),
        die(3, 5, Material::Wooden),
    ])
    .charm(CharmInstance::new("magnifier", "Magnifier", None));
    let rng = ScriptedRng::new(vec![0, 3, 1]);
    let first = fixture.apply(&mut rng.clone());
    let second = fixture.apply(&mut rng.clone());
    assert_eq!(first, second);
    assert_eq!(first.final_points, first.raw_points.ceil() as i64);
}

#[test]
fn failing_handler_does_not_stop_the_rest() {
    let mut fixture = Fixture::new(vec![die(1, 5, Material::Wooden)])
        .charm(CharmInstance::new("broken", "Broken", None))
        .charm(CharmInstance::new("bonus_pip", "Bonus Pip", None))
        .charm(
            CharmInstance::new("magnifier", "Magnifier", None).with_param("mult", f64::INFINITY),
        );
    fixture.registry.register(Box::new(Broken));
    let outcome = fixture.apply(&mut ScriptedRng::default());
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.final_points, 188);
}

#[test]
fn bank_charms_transform_in_order() {
    let mut fixture = Fixture::new(vec![die(1, 1, Material::Plastic)])
        .charm(CharmInstance::new("compound_interest", "Interest", None).with_param("mult", 2.0))
        .charm(CharmInstance::new("piggy_bank", "Piggy Bank", None));
    fixture.round.round_points = 600;
    let outcome = apply_bank_charms(&fixture.game, &fixture.round, &fixture.registry);
    assert_eq!(outcome.banked, 1200);
    assert_eq!(outcome.money_delta, 1);
}

#[test]
fn first_flop_charm_wins() {
    let fixture = Fixture::new(vec![die(1, 2, Material::Plastic)])
        .charm(CharmInstance::new("flop_shield", "Spent Shield", Some(0)))
        .charm(CharmInstance::new("flop_shield", "Shield A", Some(2)))
        .charm(CharmInstance::new("flop_shield", "Shield B", Some(2)));
    let (idx, line) =
        intercept_flop(&fixture.hand, &fixture.game, &fixture.round, &fixture.registry)
            .expect("prevented");
    assert_eq!(idx, 1);
    assert!(line.contains("Shield A"));
}
