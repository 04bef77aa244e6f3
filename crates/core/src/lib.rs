//! Dice scoring engine. Keep this crate free of IO and platform concerns.

pub mod charm;
pub mod combination;
pub mod config;
pub mod content;
pub mod dice;
pub mod effects;
pub mod events;
pub mod inventory;
pub mod materials;
pub mod modifiers;
pub mod rng;
pub mod rules;
pub mod run;
pub mod scoring;
pub mod state;

pub use charm::*;
pub use combination::*;
pub use config::*;
pub use content::*;
pub use dice::*;
pub use effects::*;
pub use events::*;
pub use inventory::*;
pub use materials::*;
pub use modifiers::*;
pub use rng::*;
pub use rules::*;
pub use run::*;
pub use scoring::*;
pub use state::*;
