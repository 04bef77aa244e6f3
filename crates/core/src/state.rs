use crate::{Die, GameConfig, Hand, Inventory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoundPhase {
    RollPending,
    AwaitingSelection,
    BankOrRerollPending,
    Banked,
    Flopped,
}

impl RoundPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundPhase::Banked | RoundPhase::Flopped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollRecord {
    pub roll: u32,
    pub values: Vec<i32>,
    #[serde(default)]
    pub flopped: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialCounters {
    pub crystals_scored: u32,
    pub golden_scored: u32,
    pub rainbow_scored: u32,
    pub dice_scored: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundState {
    pub round_number: u32,
    pub roll_number: u32,
    pub round_points: i64,
    pub dice_hand: Hand,
    /// Dice set aside since the last hot-dice refill.
    #[serde(default)]
    pub scored_dice: Vec<Die>,
    pub hot_dice_counter: u32,
    pub forfeited_points: i64,
    pub roll_history: Vec<RollRecord>,
    pub phase: RoundPhase,
    /// A charm absorbed the last flop; bank or reroll without selecting.
    #[serde(default)]
    pub flop_prevented: bool,
    #[serde(default)]
    pub material_counters: MaterialCounters,
}

impl RoundState {
    pub fn new(round_number: u32, dice_set: &Hand) -> Self {
        Self {
            round_number,
            roll_number: 0,
            round_points: 0,
            dice_hand: dice_set.fresh(),
            scored_dice: Vec::new(),
            hot_dice_counter: 0,
            forfeited_points: 0,
            roll_history: Vec::new(),
            phase: RoundPhase::RollPending,
            flop_prevented: false,
            material_counters: MaterialCounters::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.phase.is_terminal()
    }

    pub fn can_bank(&self) -> bool {
        self.phase == RoundPhase::BankOrRerollPending
            || (self.phase == RoundPhase::AwaitingSelection && self.flop_prevented)
    }

    pub fn can_reroll(&self) -> bool {
        self.can_bank()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
    Quit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlopPenalty {
    pub limit: u32,
    pub penalty: i64,
}

impl Default for FlopPenalty {
    fn default() -> Self {
        Self {
            limit: 3,
            penalty: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoundOutcome {
    Banked { points: i64, money: i64 },
    Flopped { forfeited: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub outcome: RoundOutcome,
    pub rolls: u32,
    pub hot_dice: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameHistory {
    pub rounds_banked: u32,
    pub rounds_flopped: u32,
    pub total_hot_dice: u32,
    pub penalties_applied: u32,
    pub total_forfeited: i64,
    pub highest_bank: i64,
    pub rounds: Vec<RoundSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub game_score: i64,
    pub money: i64,
    pub round_number: u32,
    pub consecutive_flops: u32,
    /// Persistent dice configuration; rounds copy it fresh.
    pub dice_set: Hand,
    pub inventory: Inventory,
    pub win_condition: i64,
    pub flop_penalty: FlopPenalty,
    #[serde(default)]
    pub history: GameHistory,
    pub status: GameStatus,
}

impl GameState {
    pub fn new(config: &GameConfig, dice_set: Hand) -> Self {
        Self {
            game_score: 0,
            money: config.game.starting_money,
            round_number: 0,
            consecutive_flops: 0,
            dice_set,
            inventory: Inventory::with_slots(
                config.game.charm_slots,
                config.game.consumable_slots,
            ),
            win_condition: config.game.win_condition,
            flop_penalty: FlopPenalty {
                limit: config.game.flop_limit,
                penalty: config.game.flop_penalty,
            },
            history: GameHistory::default(),
            status: GameStatus::InProgress,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    pub fn has_won(&self) -> bool {
        self.game_score >= self.win_condition
    }
}
