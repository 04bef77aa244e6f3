use serde::{Deserialize, Serialize};

/// Running point total through the modifier pipelines. Kept as a real
/// number until the pipeline ends.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Score {
    pub points: f64,
}

impl Score {
    pub fn new(points: f64) -> Self {
        Self { points }
    }

    /// Ceiling, never nearest. Players always get the favourable rounding.
    pub fn total(&self) -> i64 {
        self.points.ceil() as i64
    }

    pub fn apply(&mut self, effect: &PointEffect) {
        match effect {
            PointEffect::Add(value) => self.points += value,
            PointEffect::Multiply(value) => self.points *= value,
        }
    }

    pub fn applied(&self, effect: &PointEffect) -> Self {
        let mut next = *self;
        next.apply(effect);
        next
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PointEffect {
    Add(f64),
    Multiply(f64),
}

impl PointEffect {
    pub fn is_noop(&self) -> bool {
        match self {
            PointEffect::Add(value) => *value == 0.0,
            PointEffect::Multiply(value) => *value == 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreTraceStep {
    pub source: String,
    pub effect: PointEffect,
    pub before: Score,
    pub after: Score,
}

pub fn ceil_points(points: f64) -> i64 {
    Score::new(points).total()
}
