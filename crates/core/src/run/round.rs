use super::*;
use crate::*;

#[derive(Debug, Clone, PartialEq)]
pub enum RoundAction {
    Roll,
    Score(SelectionInput),
    Bank,
    Reroll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    Rolled { values: Vec<i32> },
    FlopPrevented { charm: String, values: Vec<i32> },
    Flopped { forfeited: i64, values: Vec<i32> },
}

impl RollOutcome {
    pub fn values(&self) -> &[i32] {
        match self {
            RollOutcome::Rolled { values }
            | RollOutcome::FlopPrevented { values, .. }
            | RollOutcome::Flopped { values, .. } => values,
        }
    }

    pub fn is_flop(&self) -> bool {
        matches!(self, RollOutcome::Flopped { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub resolution: ScoringResolution,
    pub modifiers: ModifierOutcome,
    pub points: i64,
    pub round_points: i64,
    pub hot_dice: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundStep {
    Rolled(RollOutcome),
    Scored(ScoreReport),
    Banked { points: i64 },
}

impl RunState {
    pub fn start_round(&mut self, events: &mut EventBus) -> Result<(), RunError> {
        self.ensure_running()?;
        if let Some(round) = &self.round {
            if round.is_active() {
                return Err(RunError::RoundInProgress(round.round_number));
            }
        }
        let mut game = self.state.clone();
        game.round_number += 1;
        let mut round = RoundState::new(game.round_number, &game.dice_set);
        let mut local = Vec::new();
        local.push(Event::RoundStarted {
            round: round.round_number,
            dice: round.dice_hand.len(),
        });

        let start = apply_round_start_charms(round.round_number, &game, &self.registry);
        round.round_points += start.points;
        game.money += start.money_delta;
        for idx in &start.charm_uses {
            if let Some(charm) = game.inventory.charms.get_mut(*idx) {
                charm.consume_use();
            }
        }
        local.extend(start.logs.into_iter().map(effect_event));

        tracing::debug!(round = round.round_number, points = round.round_points, "round started");
        self.state = game;
        self.round = Some(round);
        events.extend(local);
        Ok(())
    }

    /// Rolls every die in the current hand and checks for a flop.
    pub fn roll(&mut self, events: &mut EventBus) -> Result<RollOutcome, RunError> {
        let mut round = self.round_draft()?;
        if round.phase != RoundPhase::RollPending {
            return Err(RunError::InvalidPhase(round.phase));
        }
        let mut game = self.state.clone();
        let mut local = Vec::new();

        round.roll_number += 1;
        roll(&mut round.dice_hand, self.rng.as_mut());
        let values = round.dice_hand.rolled_values();
        local.push(Event::DiceRolled {
            roll: round.roll_number,
            values: values.clone(),
        });
        let lineup = CharmLineup::new(&game.inventory.charms, &self.registry);
        let flopped = detect_flop_filtered(&round.dice_hand, &lineup, &self.tables);
        round.roll_history.push(RollRecord {
            roll: round.roll_number,
            values: values.clone(),
            flopped,
        });
        tracing::debug!(round = round.round_number, roll = round.roll_number, ?values, flopped, "rolled");

        if !flopped {
            round.phase = RoundPhase::AwaitingSelection;
            round.flop_prevented = false;
            self.state = game;
            self.round = Some(round);
            events.extend(local);
            return Ok(RollOutcome::Rolled { values });
        }

        if let Some((idx, line)) =
            intercept_flop(&round.dice_hand, &game, &round, &self.registry)
        {
            let mut charm_id = String::new();
            if let Some(charm) = game.inventory.charms.get_mut(idx) {
                charm.consume_use();
                charm_id = charm.id.clone();
            }
            round.phase = RoundPhase::AwaitingSelection;
            round.flop_prevented = true;
            local.push(Event::FlopPrevented {
                charm: charm_id.clone(),
            });
            local.push(effect_event(EffectLog::charm(&charm_id, line)));
            tracing::debug!(charm = %charm_id, "flop prevented");
            self.state = game;
            self.round = Some(round);
            events.extend(local);
            return Ok(RollOutcome::FlopPrevented {
                charm: charm_id,
                values,
            });
        }

        let forfeited = round.round_points;
        round.forfeited_points += forfeited;
        round.round_points = 0;
        round.phase = RoundPhase::Flopped;
        round.flop_prevented = false;
        tracing::debug!(round = round.round_number, forfeited, "flopped");
        self.round = Some(round);
        events.extend(local);
        self.advance_game(RoundOutcome::Flopped { forfeited }, events)?;
        Ok(RollOutcome::Flopped { forfeited, values })
    }

    /// Resolves a selection without touching state.
    pub fn preview_selection(&self, input: &SelectionInput) -> Result<ScoringResolution, RunError> {
        let round = self.round()?;
        let lineup = CharmLineup::new(&self.state.inventory.charms, &self.registry);
        Ok(resolve_selection(
            input,
            &round.dice_hand,
            &lineup,
            &self.tables,
        ))
    }

    pub fn score_selection(
        &mut self,
        input: &SelectionInput,
        events: &mut EventBus,
    ) -> Result<ScoreReport, RunError> {
        let mut round = self.round_draft()?;
        if round.phase != RoundPhase::AwaitingSelection {
            return Err(RunError::InvalidPhase(round.phase));
        }
        let lineup = CharmLineup::new(&self.state.inventory.charms, &self.registry);
        let resolution =
            resolve_selection(input, &round.dice_hand, &lineup, &self.tables).into_result()?;
        let Some(partitioning) = resolution.chosen_partitioning() else {
            return Err(SelectionError::NoPartitioning.into());
        };
        let modifiers = apply_modifiers(
            partitioning,
            &round.dice_hand,
            &self.state,
            &round,
            &self.registry,
            &self.config.materials,
            self.rng.as_mut(),
        );
        let selected = partitioning.dice_indices();

        let mut game = self.state.clone();
        let mut local = Vec::new();
        local.extend(modifiers.logs.iter().cloned().map(effect_event));
        game.money += modifiers.money_delta;
        for idx in &modifiers.charm_uses {
            if let Some(charm) = game.inventory.charms.get_mut(*idx) {
                charm.consume_use();
            }
        }

        let points = ceil_points(modifiers.final_points as f64);
        round.round_points += points;
        let mut scored = round.dice_hand.take(&selected)?;
        for die in &mut scored {
            die.scored = true;
            round.material_counters.dice_scored += 1;
            match die.material {
                Material::Golden => round.material_counters.golden_scored += 1,
                Material::Rainbow => round.material_counters.rainbow_scored += 1,
                _ => {}
            }
        }
        round.material_counters.crystals_scored += modifiers.crystals_scored;
        round.scored_dice.extend(scored);
        local.push(Event::Scored {
            combinations: partitioning.combinations.iter().map(|c| c.kind).collect(),
            base: modifiers.base_points,
            total: points,
            round_points: round.round_points,
        });

        let hot_dice = round.dice_hand.is_empty();
        if hot_dice {
            round.hot_dice_counter += 1;
            game.history.total_hot_dice += 1;
            round.dice_hand = game.dice_set.fresh();
            round.scored_dice.clear();
            local.push(Event::HotDice {
                round_count: round.hot_dice_counter,
                game_count: game.history.total_hot_dice,
            });
            tracing::debug!(round = round.round_number, count = round.hot_dice_counter, "hot dice");
        }
        round.phase = RoundPhase::BankOrRerollPending;
        round.flop_prevented = false;
        tracing::debug!(
            base = modifiers.base_points,
            points,
            round_points = round.round_points,
            "scored"
        );

        let round_points = round.round_points;
        self.state = game;
        self.round = Some(round);
        events.extend(local);
        Ok(ScoreReport {
            resolution,
            modifiers,
            points,
            round_points,
            hot_dice,
        })
    }

    /// Banks the round total after every `on_bank` charm.
    pub fn bank(&mut self, events: &mut EventBus) -> Result<i64, RunError> {
        let mut round = self.round_draft()?;
        if !round.can_bank() {
            return Err(RunError::InvalidPhase(round.phase));
        }
        let outcome = apply_bank_charms(&self.state, &round, &self.registry);
        let mut game = self.state.clone();
        for idx in &outcome.charm_uses {
            if let Some(charm) = game.inventory.charms.get_mut(*idx) {
                charm.consume_use();
            }
        }
        round.phase = RoundPhase::Banked;
        round.flop_prevented = false;
        self.state = game;
        self.round = Some(round);
        events.extend(outcome.logs.into_iter().map(effect_event));
        self.advance_game(
            RoundOutcome::Banked {
                points: outcome.banked,
                money: outcome.money_delta,
            },
            events,
        )?;
        Ok(outcome.banked)
    }

    /// Rolls again with the dice still in hand (the full set after hot dice).
    pub fn reroll(&mut self, events: &mut EventBus) -> Result<RollOutcome, RunError> {
        let mut round = self.round_draft()?;
        if !round.can_reroll() {
            return Err(RunError::InvalidPhase(round.phase));
        }
        round.phase = RoundPhase::RollPending;
        round.flop_prevented = false;
        self.round = Some(round);
        self.roll(events)
    }

    pub fn advance_round(
        &mut self,
        action: RoundAction,
        events: &mut EventBus,
    ) -> Result<RoundStep, RunError> {
        match action {
            RoundAction::Roll => self.roll(events).map(RoundStep::Rolled),
            RoundAction::Score(input) => self.score_selection(&input, events).map(RoundStep::Scored),
            RoundAction::Bank => self.bank(events).map(|points| RoundStep::Banked { points }),
            RoundAction::Reroll => self.reroll(events).map(RoundStep::Rolled),
        }
    }
}

pub(super) fn effect_event(log: EffectLog) -> Event {
    Event::EffectApplied {
        source: log.id,
        line: log.line,
    }
}
