use super::*;
use crate::*;

/// Die in the persistent dice set and, for face edits, which face slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumableTarget {
    pub die: Option<usize>,
    pub face: Option<usize>,
}

impl ConsumableTarget {
    pub fn die(index: usize) -> Self {
        Self {
            die: Some(index),
            face: None,
        }
    }

    pub fn face(die: usize, face: usize) -> Self {
        Self {
            die: Some(die),
            face: Some(face),
        }
    }
}

impl RunState {
    /// Uses one charge of the consumable in slot `index`. Nothing changes
    /// when the effect cannot be applied.
    pub fn use_consumable(
        &mut self,
        index: usize,
        target: ConsumableTarget,
        events: &mut EventBus,
    ) -> Result<(), RunError> {
        self.ensure_running()?;
        let item = self
            .state
            .inventory
            .consumables
            .get(index)
            .ok_or(RunError::InvalidConsumableIndex(index))?;
        let Some(def) = self.content.consumable_by_id(&item.id) else {
            tracing::warn!(id = %item.id, "consumable has no definition");
            return Err(RunError::UnknownContentId {
                kind: "consumable",
                id: item.id.clone(),
            });
        };
        if def.effect.needs_die_target() && target.die.is_none() {
            return Err(RunError::InvalidTarget(format!("{} needs a die", def.id)));
        }
        let effect = def.effect.clone();
        let id = def.id.clone();

        let mut game = self.state.clone();
        let mut round = self.round.clone();
        let mut reroll = false;
        let line = match &effect {
            ConsumableEffect::AddMoney { amount } => {
                game.money += amount;
                format!("+${amount}")
            }
            ConsumableEffect::AddRoundPoints { amount } => {
                let round = active_round(&mut round)?;
                round.round_points += amount;
                format!("+{amount} round points")
            }
            ConsumableEffect::RerollHand => {
                let round = active_round(&mut round)?;
                if !matches!(
                    round.phase,
                    RoundPhase::AwaitingSelection | RoundPhase::BankOrRerollPending
                ) {
                    return Err(RunError::InvalidPhase(round.phase));
                }
                round.phase = RoundPhase::RollPending;
                round.flop_prevented = false;
                reroll = true;
                format!("reroll {} dice", round.dice_hand.len())
            }
            ConsumableEffect::SetMaterial { material } => {
                let die = target_die(&mut game, target)?;
                die.material = *material;
                format!("die {} is now {}", die.id, material.id())
            }
            ConsumableEffect::SetFace { value } => {
                let face = target
                    .face
                    .ok_or_else(|| RunError::InvalidTarget("face slot required".to_string()))?;
                let die = target_die(&mut game, target)?;
                let slot = die
                    .allowed_values
                    .get_mut(face)
                    .ok_or_else(|| RunError::InvalidTarget(format!("face {face} out of range")))?;
                *slot = *value;
                format!("die {} face {} is now {}", die.id, face, value)
            }
            ConsumableEffect::AddDie { material } => {
                let next_id = game.dice_set.iter().map(|die| die.id).max().unwrap_or(0) + 1;
                game.dice_set
                    .dice
                    .push(Die::standard(next_id).with_material(*material));
                format!("added {} die {}", material.id(), next_id)
            }
            ConsumableEffect::RechargeCharms { amount } => {
                let mut recharged = 0;
                for charm in &mut game.inventory.charms {
                    if let Some(uses) = charm.uses.as_mut() {
                        *uses += amount;
                        recharged += 1;
                    }
                }
                format!("{recharged} charms recharged by {amount}")
            }
        };
        validate_dice_set(&game.dice_set.dice)?;

        let spent = game
            .inventory
            .spend_consumable(index)
            .ok_or(RunError::InvalidConsumableIndex(index))?;
        tracing::debug!(consumable = %id, uses_left = spent.uses, "consumable used");
        self.state = game;
        self.round = round;
        events.push(Event::ConsumableUsed {
            id: id.clone(),
            uses_left: spent.uses,
        });
        events.push(super::round::effect_event(EffectLog::consumable(&id, line)));
        if reroll {
            self.roll(events)?;
        }
        Ok(())
    }
}

fn active_round(round: &mut Option<RoundState>) -> Result<&mut RoundState, RunError> {
    let round = round.as_mut().ok_or(RunError::NoActiveRound)?;
    if !round.is_active() {
        return Err(RunError::InvalidPhase(round.phase));
    }
    Ok(round)
}

fn target_die(game: &mut GameState, target: ConsumableTarget) -> Result<&mut Die, RunError> {
    let index = target
        .die
        .ok_or_else(|| RunError::InvalidTarget("die required".to_string()))?;
    game.dice_set
        .dice
        .get_mut(index)
        .ok_or_else(|| RunError::InvalidTarget(format!("die {index} out of range")))
}
