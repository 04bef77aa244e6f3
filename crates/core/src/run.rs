use crate::{
    CharmRegistry, Content, DiceError, GameConfig, GameState, GameStatus, InventoryError,
    RandomSource, RoundPhase, RoundState, ScoreTables, SelectionError,
};
use std::fmt;
use thiserror::Error;

mod consumable;
mod game;
mod round;
mod setup;

pub use consumable::ConsumableTarget;
pub use round::{RollOutcome, RoundAction, RoundStep, ScoreReport};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid phase: {0:?}")]
    InvalidPhase(RoundPhase),
    #[error("no active round")]
    NoActiveRound,
    #[error("round {0} is still in progress")]
    RoundInProgress(u32),
    #[error("game is over: {0:?}")]
    GameOver(GameStatus),
    #[error("unknown {kind} id: {id}")]
    UnknownContentId { kind: &'static str, id: String },
    #[error("invalid consumable index {0}")]
    InvalidConsumableIndex(usize),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("invalid dice set: {0}")]
    Configuration(#[from] DiceError),
    #[error("invalid selection: {0}")]
    Selection(#[from] SelectionError),
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// One player's game: configuration, content, randomness and live state.
///
/// Every action works on copies of the game and round state and writes them
/// back only when the whole action succeeded.
pub struct RunState {
    pub config: GameConfig,
    pub tables: ScoreTables,
    pub content: Content,
    pub registry: CharmRegistry,
    pub rng: Box<dyn RandomSource>,
    pub state: GameState,
    pub round: Option<RoundState>,
}

impl fmt::Debug for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunState")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("state", &self.state)
            .field("round", &self.round)
            .finish_non_exhaustive()
    }
}

impl RunState {
    pub fn round(&self) -> Result<&RoundState, RunError> {
        self.round.as_ref().ok_or(RunError::NoActiveRound)
    }

    pub fn phase(&self) -> Option<RoundPhase> {
        self.round.as_ref().map(|round| round.phase)
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    fn ensure_running(&self) -> Result<(), RunError> {
        if self.state.is_over() {
            return Err(RunError::GameOver(self.state.status));
        }
        Ok(())
    }

    /// Copy of the active round for a transition to work on.
    fn round_draft(&self) -> Result<RoundState, RunError> {
        self.ensure_running()?;
        let round = self.round.as_ref().ok_or(RunError::NoActiveRound)?;
        if !round.is_active() {
            return Err(RunError::InvalidPhase(round.phase));
        }
        Ok(round.clone())
    }
}
