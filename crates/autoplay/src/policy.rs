use crate::{AutoAction, AutoplayConfig};
use farkle_core::{RoundPhase, RunState, SelectionInput};

/// A scoring selection the engine accepted in preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringOption {
    pub indices: Vec<usize>,
    pub partitioning: Option<usize>,
    pub points: i64,
}

impl ScoringOption {
    pub fn action(&self) -> AutoAction {
        AutoAction::Score {
            indices: self.indices.clone(),
            partitioning: self.partitioning,
        }
    }
}

/// Every subset of the hand that scores, with its default partitioning.
pub fn scoring_options(run: &RunState) -> Vec<ScoringOption> {
    let Some(round) = run.round.as_ref() else {
        return Vec::new();
    };
    let len = round.dice_hand.len();
    if len == 0 || len >= usize::BITS as usize {
        return Vec::new();
    }
    let mut out = Vec::new();
    for mask in 1usize..(1 << len) {
        let indices: Vec<usize> = (0..len).filter(|idx| mask & (1 << idx) != 0).collect();
        let Ok(resolution) = run.preview_selection(&SelectionInput::new(indices.clone())) else {
            continue;
        };
        if resolution.valid {
            out.push(ScoringOption {
                indices,
                partitioning: resolution.chosen,
                points: resolution.points,
            });
        }
    }
    out
}

/// Highest base points; ties keep more dice out of the hand.
pub fn best_selection(run: &RunState) -> Option<ScoringOption> {
    let mut best: Option<ScoringOption> = None;
    for option in scoring_options(run) {
        let better = match &best {
            None => true,
            Some(current) => {
                (option.points, option.indices.len()) > (current.points, current.indices.len())
            }
        };
        if better {
            best = Some(option);
        }
    }
    best
}

/// Bank once the threshold is met, the round would win the game, or too few
/// dice remain to risk another roll.
pub fn should_bank(run: &RunState, config: &AutoplayConfig) -> bool {
    let Some(round) = run.round.as_ref() else {
        return false;
    };
    if !round.can_bank() || round.round_points <= 0 {
        return false;
    }
    round.round_points >= config.bank_threshold
        || run.state.game_score + round.round_points >= run.state.win_condition
        || round.dice_hand.len() < config.min_dice_to_reroll
}

pub fn legal_actions(run: &RunState) -> Vec<AutoAction> {
    if run.is_over() {
        return Vec::new();
    }
    let Some(round) = run.round.as_ref() else {
        return vec![AutoAction::NextRound];
    };
    match round.phase {
        RoundPhase::Banked | RoundPhase::Flopped => vec![AutoAction::NextRound],
        RoundPhase::RollPending => vec![AutoAction::Roll],
        RoundPhase::AwaitingSelection => {
            let mut out: Vec<AutoAction> =
                scoring_options(run).iter().map(ScoringOption::action).collect();
            if round.can_bank() {
                out.push(AutoAction::Bank);
                out.push(AutoAction::Reroll);
            }
            out
        }
        RoundPhase::BankOrRerollPending => vec![AutoAction::Bank, AutoAction::Reroll],
    }
}

pub fn choose_action(run: &RunState, config: &AutoplayConfig) -> Option<AutoAction> {
    if run.is_over() {
        return None;
    }
    let Some(round) = run.round.as_ref() else {
        return Some(AutoAction::NextRound);
    };
    match round.phase {
        RoundPhase::Banked | RoundPhase::Flopped => Some(AutoAction::NextRound),
        RoundPhase::RollPending => Some(AutoAction::Roll),
        RoundPhase::AwaitingSelection if round.flop_prevented => {
            if should_bank(run, config) {
                Some(AutoAction::Bank)
            } else {
                Some(AutoAction::Reroll)
            }
        }
        RoundPhase::AwaitingSelection => best_selection(run).map(|option| option.action()),
        RoundPhase::BankOrRerollPending => {
            if should_bank(run, config) {
                Some(AutoAction::Bank)
            } else {
                Some(AutoAction::Reroll)
            }
        }
    }
}
