//! Charm and material pipelines.
//!
//! Every function here is pure over its inputs apart from the injected random
//! source: the caller commits the returned outcome to game/round state once.

use crate::charm::{BankContext, FlopContext, RoundStartContext, ScoringContext};
use crate::materials::{apply_material, MaterialContext};
use crate::{
    CharmRegistry, EffectError, EffectLog, GameState, Hand, Material, MaterialRules, Partitioning,
    PointEffect, RandomSource, RoundState, Score, ScoreTraceStep,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierOutcome {
    pub base_points: i64,
    /// Running total before ceiling.
    pub raw_points: f64,
    pub final_points: i64,
    pub money_delta: i64,
    pub logs: Vec<EffectLog>,
    pub trace: Vec<ScoreTraceStep>,
    /// Inventory indices of charms that spent a use.
    pub charm_uses: Vec<usize>,
    pub crystals_scored: u32,
    pub errors: Vec<EffectError>,
}

pub fn apply_modifiers(
    partitioning: &Partitioning,
    hand: &Hand,
    game: &GameState,
    round: &RoundState,
    registry: &CharmRegistry,
    rules: &MaterialRules,
    rng: &mut dyn RandomSource,
) -> ModifierOutcome {
    let selected = partitioning.dice_indices();
    let base_points = partitioning.total_points();
    let mut outcome = ModifierOutcome {
        base_points,
        ..ModifierOutcome::default()
    };
    let mut score = Score::new(base_points as f64);

    for (idx, charm) in game.inventory.charms.iter().enumerate() {
        let Some(behavior) = registry.usable(charm) else {
            continue;
        };
        let ctx = ScoringContext {
            base_points,
            running: score.points,
            combinations: &partitioning.combinations,
            selected: &selected,
            hand,
            game,
            round,
        };
        match behavior.on_scoring(charm, &ctx) {
            Ok(Some(trigger)) => {
                let effect = PointEffect::Add(trigger.delta);
                let after = score.applied(&effect);
                if !after.points.is_finite() {
                    record_error(
                        &mut outcome,
                        EffectError::NonFinite {
                            source_id: charm.id.clone(),
                        },
                    );
                    continue;
                }
                if !effect.is_noop() {
                    outcome.trace.push(ScoreTraceStep {
                        source: charm.id.clone(),
                        effect,
                        before: score,
                        after,
                    });
                }
                score = after;
                outcome.money_delta += trigger.money;
                outcome.logs.push(EffectLog::charm(&charm.id, trigger.line));
                if trigger.consume_use {
                    outcome.charm_uses.push(idx);
                }
            }
            Ok(None) => {}
            Err(err) => record_error(&mut outcome, err),
        }
    }

    let mut counts: BTreeMap<Material, usize> = BTreeMap::new();
    for &idx in &selected {
        match hand.get(idx) {
            Some(die) => *counts.entry(die.material).or_default() += 1,
            None => record_error(
                &mut outcome,
                EffectError::InvalidDie {
                    source_id: "materials".to_string(),
                    index: idx,
                },
            ),
        }
    }

    for material in Material::PIPELINE_ORDER {
        let count = counts.get(&material).copied().unwrap_or(0);
        let ctx = MaterialContext {
            count,
            selected_count: selected.len(),
            base_points,
            running: score,
            crystals_before: round.material_counters.crystals_scored,
            round_hot_dice: round.hot_dice_counter,
            rules,
        };
        match apply_material(material, &ctx, rng) {
            Ok(Some(effect)) => {
                for point in &effect.points {
                    let after = score.applied(point);
                    outcome.trace.push(ScoreTraceStep {
                        source: material.id().to_string(),
                        effect: *point,
                        before: score,
                        after,
                    });
                    score = after;
                }
                outcome.money_delta += effect.money;
                outcome.logs.push(EffectLog::material(material.id(), effect.line));
                if material == Material::Crystal {
                    outcome.crystals_scored = count as u32;
                }
            }
            Ok(None) => {}
            Err(err) => record_error(&mut outcome, err),
        }
    }

    outcome.raw_points = score.points;
    outcome.final_points = score.total();
    outcome
}

fn record_error(outcome: &mut ModifierOutcome, err: EffectError) {
    tracing::warn!(error = %err, "effect handler failed; skipping");
    outcome.errors.push(err);
}

/// First usable charm that prevents the flop, with its log line.
pub fn intercept_flop(
    hand: &Hand,
    game: &GameState,
    round: &RoundState,
    registry: &CharmRegistry,
) -> Option<(usize, String)> {
    let ctx = FlopContext { hand, game, round };
    game.inventory
        .charms
        .iter()
        .enumerate()
        .find_map(|(idx, charm)| {
            let behavior = registry.usable(charm)?;
            behavior.on_flop(charm, &ctx).map(|line| (idx, line))
        })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankOutcome {
    pub banked: i64,
    pub money_delta: i64,
    pub logs: Vec<EffectLog>,
    pub charm_uses: Vec<usize>,
    pub errors: Vec<EffectError>,
}

/// Passes the round total through every `on_bank` charm in order.
pub fn apply_bank_charms(
    game: &GameState,
    round: &RoundState,
    registry: &CharmRegistry,
) -> BankOutcome {
    let mut outcome = BankOutcome::default();
    let mut banked = round.round_points as f64;
    let ctx = BankContext {
        round_points: round.round_points,
        game,
        round,
    };
    for (idx, charm) in game.inventory.charms.iter().enumerate() {
        let Some(behavior) = registry.usable(charm) else {
            continue;
        };
        match behavior.on_bank(charm, &ctx, banked) {
            Ok(Some(trigger)) if trigger.banked.is_finite() => {
                banked = trigger.banked;
                outcome.money_delta += trigger.money;
                outcome.logs.push(EffectLog::charm(&charm.id, trigger.line));
                if trigger.consume_use {
                    outcome.charm_uses.push(idx);
                }
            }
            Ok(Some(_)) => {
                let err = EffectError::NonFinite {
                    source_id: charm.id.clone(),
                };
                tracing::warn!(error = %err, "bank charm failed; skipping");
                outcome.errors.push(err);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "bank charm failed; skipping");
                outcome.errors.push(err);
            }
        }
    }
    outcome.banked = Score::new(banked).total();
    outcome
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundStartOutcome {
    pub points: i64,
    pub money_delta: i64,
    pub logs: Vec<EffectLog>,
    pub charm_uses: Vec<usize>,
}

pub fn apply_round_start_charms(
    round_number: u32,
    game: &GameState,
    registry: &CharmRegistry,
) -> RoundStartOutcome {
    let mut outcome = RoundStartOutcome::default();
    let ctx = RoundStartContext { round_number, game };
    for (idx, charm) in game.inventory.charms.iter().enumerate() {
        let Some(behavior) = registry.usable(charm) else {
            continue;
        };
        if let Some(trigger) = behavior.on_round_start(charm, &ctx) {
            outcome.points += trigger.points;
            outcome.money_delta += trigger.money;
            outcome.logs.push(EffectLog::charm(&charm.id, trigger.line));
            if trigger.consume_use {
                outcome.charm_uses.push(idx);
            }
        }
    }
    outcome
}
