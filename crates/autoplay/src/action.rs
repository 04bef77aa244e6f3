use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AutoAction {
    /// Starts the game on the first call, the next round afterwards.
    NextRound,
    Roll,
    Score {
        indices: Vec<usize>,
        partitioning: Option<usize>,
    },
    Bank,
    Reroll,
}

impl AutoAction {
    pub fn stable_key(&self) -> String {
        match self {
            Self::NextRound => "next_round".to_string(),
            Self::Roll => "roll".to_string(),
            Self::Score {
                indices,
                partitioning,
            } => format!("score:{indices:?}:{partitioning:?}"),
            Self::Bank => "bank".to_string(),
            Self::Reroll => "reroll".to_string(),
        }
    }

    pub fn short_label(&self) -> String {
        match self {
            Self::NextRound => "next_round".to_string(),
            Self::Roll => "roll".to_string(),
            Self::Score {
                indices,
                partitioning: Some(choice),
            } => format!("score {indices:?} #{choice}"),
            Self::Score { indices, .. } => format!("score {indices:?}"),
            Self::Bank => "bank".to_string(),
            Self::Reroll => "reroll".to_string(),
        }
    }
}
