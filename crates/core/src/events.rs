use crate::{CombinationKind, GameStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    GameStarted {
        dice: usize,
        win_condition: i64,
    },
    RoundStarted {
        round: u32,
        dice: usize,
    },
    DiceRolled {
        roll: u32,
        values: Vec<i32>,
    },
    Flopped {
        forfeited: i64,
        consecutive_flops: u32,
    },
    FlopPrevented {
        charm: String,
    },
    PenaltyApplied {
        penalty: i64,
        game_score: i64,
    },
    Scored {
        combinations: Vec<CombinationKind>,
        base: i64,
        total: i64,
        round_points: i64,
    },
    EffectApplied {
        source: String,
        line: String,
    },
    HotDice {
        round_count: u32,
        game_count: u32,
    },
    Banked {
        banked: i64,
        game_score: i64,
    },
    ConsumableUsed {
        id: String,
        uses_left: u32,
    },
    GameEnded {
        status: GameStatus,
        game_score: i64,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.queue.extend(events);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.queue.iter()
    }
}
