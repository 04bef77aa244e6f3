use crate::{AutoAction, AutoplayError};
use farkle_core::{Event, EventBus, RoundPhase, RunState, SelectionInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameMetrics {
    pub round: u32,
    pub game_score: i64,
    pub round_points: i64,
    pub money: i64,
    pub consecutive_flops: u32,
    pub dice_in_hand: usize,
}

#[derive(Debug)]
pub struct Simulator {
    pub run: RunState,
    pub events: EventBus,
}

impl Simulator {
    pub fn new(run: RunState) -> Self {
        Self {
            run,
            events: EventBus::default(),
        }
    }

    pub fn metrics(&self) -> GameMetrics {
        let round = self.run.round.as_ref();
        GameMetrics {
            round: self.run.state.round_number,
            game_score: self.run.state.game_score,
            round_points: round.map(|round| round.round_points).unwrap_or(0),
            money: self.run.state.money,
            consecutive_flops: self.run.state.consecutive_flops,
            dice_in_hand: round.map(|round| round.dice_hand.len()).unwrap_or(0),
        }
    }

    pub fn phase_name(&self) -> String {
        match self.run.phase() {
            None => "Setup".to_string(),
            Some(phase) => phase_label(phase).to_string(),
        }
    }

    pub fn hand_values(&self) -> Vec<i32> {
        self.run
            .round
            .as_ref()
            .map(|round| round.dice_hand.rolled_values())
            .unwrap_or_default()
    }

    pub fn describe_action(&self, action: &AutoAction) -> Option<String> {
        let AutoAction::Score {
            indices,
            partitioning,
        } = action
        else {
            return None;
        };
        let mut input = SelectionInput::new(indices.clone());
        input.partitioning = *partitioning;
        let resolution = self.run.preview_selection(&input).ok()?;
        let chosen = resolution.chosen_partitioning()?;
        Some(format!(
            "hand {:?} -> {} = {}",
            self.hand_values(),
            chosen.summary(),
            resolution.points
        ))
    }

    /// Applies one action and returns how many events it produced.
    pub fn apply_action(&mut self, action: &AutoAction) -> Result<usize, AutoplayError> {
        let before = self.events.len();
        match action {
            AutoAction::NextRound => {
                if self.run.state.round_number == 0 {
                    self.run.start_game(&mut self.events)?;
                } else {
                    self.run.start_round(&mut self.events)?;
                }
            }
            AutoAction::Roll => {
                self.run.roll(&mut self.events)?;
            }
            AutoAction::Score {
                indices,
                partitioning,
            } => {
                let mut input = SelectionInput::new(indices.clone());
                input.partitioning = *partitioning;
                self.run.score_selection(&input, &mut self.events)?;
            }
            AutoAction::Bank => {
                self.run.bank(&mut self.events)?;
            }
            AutoAction::Reroll => {
                self.run.reroll(&mut self.events)?;
            }
        }
        Ok(self.events.len().saturating_sub(before))
    }

    /// Short description of the events added since `from`.
    pub fn describe_events(&self, from: usize) -> Option<String> {
        let lines: Vec<String> = self
            .events
            .iter()
            .skip(from)
            .filter_map(event_line)
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

fn event_line(event: &Event) -> Option<String> {
    match event {
        Event::DiceRolled { roll, values } => Some(format!("roll {roll}: {values:?}")),
        Event::Flopped { forfeited, .. } => Some(format!("flop, forfeited {forfeited}")),
        Event::FlopPrevented { charm } => Some(format!("flop prevented by {charm}")),
        Event::PenaltyApplied { penalty, .. } => Some(format!("penalty -{penalty}")),
        Event::HotDice { round_count, .. } => Some(format!("hot dice x{round_count}")),
        Event::EffectApplied { line, .. } => Some(line.clone()),
        Event::Banked { banked, game_score } => {
            Some(format!("banked {banked}, game score {game_score}"))
        }
        _ => None,
    }
}

pub fn phase_label(phase: RoundPhase) -> &'static str {
    match phase {
        RoundPhase::RollPending => "RollPending",
        RoundPhase::AwaitingSelection => "AwaitingSelection",
        RoundPhase::BankOrRerollPending => "BankOrReroll",
        RoundPhase::Banked => "Banked",
        RoundPhase::Flopped => "Flopped",
    }
}
