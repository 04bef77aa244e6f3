//! Seeded autoplay for the dice engine: a threshold policy driven through the
//! same run API a player uses, with a replayable step trace.

mod action;
mod config;
mod error;
mod policy;
mod runner;
mod simulator;
mod trace;

pub use action::*;
pub use config::*;
pub use error::*;
pub use policy::*;
pub use runner::*;
pub use simulator::*;
pub use trace::*;
