use crate::{
    detect_flop, enumerate_partitionings, scoring_candidates, CombinationKind, GameConfig, Hand,
    Partitioning, ScoringCombination,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ScoreTables {
    singles: BTreeMap<i32, i64>,
    triple_one_points: i64,
    triple_multiplier: i64,
    kind_factors: [i64; 3],
    straight_points: i64,
    straight_values: Vec<i32>,
    three_pairs_points: i64,
    two_triplets_points: i64,
}

impl ScoreTables {
    pub fn from_config(config: &GameConfig) -> Self {
        let rules = &config.scoring;
        let singles = rules
            .singles
            .iter()
            .map(|rule| (rule.value, rule.points))
            .collect();
        let mut straight_values = rules.straight_values.clone();
        straight_values.sort_unstable();
        straight_values.dedup();
        Self {
            singles,
            triple_one_points: rules.triple_one_points,
            triple_multiplier: rules.triple_multiplier,
            kind_factors: [
                rules.four_kind_factor,
                rules.five_kind_factor,
                rules.six_kind_factor,
            ],
            straight_points: rules.straight_points,
            straight_values,
            three_pairs_points: rules.three_pairs_points,
            two_triplets_points: rules.two_triplets_points,
        }
    }

    pub fn standard() -> Self {
        Self::from_config(&GameConfig::default())
    }

    pub fn single_points(&self, value: i32) -> Option<i64> {
        self.singles.get(&value).copied()
    }

    pub fn straight_values(&self) -> &[i32] {
        &self.straight_values
    }

    /// Three-of-a-kind points for `value`. Faces at or below zero score nothing.
    pub fn triple_base(&self, value: i32) -> i64 {
        if value == 1 {
            self.triple_one_points
        } else {
            (value as i64).max(0).saturating_mul(self.triple_multiplier)
        }
    }

    pub fn of_a_kind_points(&self, value: i32, count: usize) -> Option<i64> {
        let base = self.triple_base(value);
        let factor = match count {
            3 => 1,
            4..=6 => self.kind_factors[count - 4],
            _ => return None,
        };
        Some(base.saturating_mul(factor))
    }

    pub fn pattern_points(&self, kind: CombinationKind) -> i64 {
        match kind {
            CombinationKind::Straight => self.straight_points,
            CombinationKind::ThreePairs => self.three_pairs_points,
            CombinationKind::TwoTriplets => self.two_triplets_points,
            _ => 0,
        }
    }
}

impl Default for ScoreTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionError {
    #[error("no dice selected")]
    Empty,
    #[error("die index {0} out of range")]
    OutOfRange(usize),
    #[error("die index {0} selected twice")]
    Duplicate(usize),
    #[error("die {0} has not been rolled")]
    NotRolled(usize),
    #[error("selection does not form a scoring combination")]
    NoPartitioning,
    #[error("partitioning {index} not available ({available} options)")]
    PartitionOutOfRange { index: usize, available: usize },
    #[error("an active charm forbids every way to score this selection")]
    FilteredByCharm,
}

/// Player selection already mapped to hand indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionInput {
    pub indices: Vec<usize>,
    /// Explicit choice among the surviving partitionings.
    #[serde(default)]
    pub partitioning: Option<usize>,
}

impl SelectionInput {
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            partitioning: None,
        }
    }

    pub fn with_partitioning(mut self, index: usize) -> Self {
        self.partitioning = Some(index);
        self
    }
}

/// Restriction on which combinations may score. Charms implement this.
pub trait CombinationFilter {
    fn allows(&self, combination: &ScoringCombination) -> bool;
}

/// Filter that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl CombinationFilter for NoFilter {
    fn allows(&self, _combination: &ScoringCombination) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringResolution {
    pub valid: bool,
    pub points: i64,
    pub combinations: Vec<ScoringCombination>,
    /// Partitionings that survived charm filtering, in discovery order.
    pub all_partitionings: Vec<Partitioning>,
    pub chosen: Option<usize>,
    pub error: Option<SelectionError>,
}

impl ScoringResolution {
    fn invalid(error: SelectionError, all_partitionings: Vec<Partitioning>) -> Self {
        Self {
            valid: false,
            points: 0,
            combinations: Vec::new(),
            all_partitionings,
            chosen: None,
            error: Some(error),
        }
    }

    pub fn chosen_partitioning(&self) -> Option<&Partitioning> {
        self.chosen.and_then(|idx| self.all_partitionings.get(idx))
    }

    pub fn is_ambiguous(&self) -> bool {
        self.all_partitionings.len() > 1
    }

    pub fn into_result(self) -> Result<Self, SelectionError> {
        match (&self.error, self.valid) {
            (Some(err), _) => Err(err.clone()),
            (None, false) => Err(SelectionError::NoPartitioning),
            (None, true) => Ok(self),
        }
    }
}

pub fn check_selection(hand: &Hand, indices: &[usize]) -> Result<(), SelectionError> {
    if indices.is_empty() {
        return Err(SelectionError::Empty);
    }
    let mut seen = Vec::with_capacity(indices.len());
    for &idx in indices {
        let Some(die) = hand.get(idx) else {
            return Err(SelectionError::OutOfRange(idx));
        };
        if seen.contains(&idx) {
            return Err(SelectionError::Duplicate(idx));
        }
        if die.value().is_none() {
            return Err(SelectionError::NotRolled(idx));
        }
        seen.push(idx);
    }
    Ok(())
}

/// Index of the highest-scoring partitioning; ties keep the earliest.
pub fn best_partitioning(partitionings: &[Partitioning]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, partitioning) in partitionings.iter().enumerate() {
        let total = partitioning.total_points();
        if best.map(|(_, points)| total > points).unwrap_or(true) {
            best = Some((idx, total));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Flop check under a combination filter: the roll flops when nothing the
/// filter allows scores, even if a blocked combination would.
pub fn detect_flop_filtered(
    hand: &Hand,
    filter: &dyn CombinationFilter,
    tables: &ScoreTables,
) -> bool {
    detect_flop(hand, tables)
        || !scoring_candidates(hand, tables)
            .iter()
            .any(|combo| combo.points > 0 && filter.allows(combo))
}

/// Resolves a selection against the hand. Pure; never mutates its inputs.
pub fn resolve_selection(
    input: &SelectionInput,
    hand: &Hand,
    filter: &dyn CombinationFilter,
    tables: &ScoreTables,
) -> ScoringResolution {
    if let Err(err) = check_selection(hand, &input.indices) {
        return ScoringResolution::invalid(err, Vec::new());
    }
    let candidates: Vec<Partitioning> = enumerate_partitionings(hand, &input.indices, tables)
        .into_iter()
        .filter(|partitioning| partitioning.covers(&input.indices))
        .collect();
    let scoring_before_filter = candidates.iter().any(|p| p.total_points() > 0);
    let survivors: Vec<Partitioning> = candidates
        .into_iter()
        .filter(|partitioning| partitioning.combinations.iter().all(|c| filter.allows(c)))
        .filter(|partitioning| partitioning.total_points() > 0)
        .collect();
    if survivors.is_empty() {
        let err = if scoring_before_filter {
            SelectionError::FilteredByCharm
        } else {
            SelectionError::NoPartitioning
        };
        return ScoringResolution::invalid(err, survivors);
    }
    let chosen = match input.partitioning {
        Some(index) if index < survivors.len() => index,
        Some(index) => {
            let available = survivors.len();
            return ScoringResolution::invalid(
                SelectionError::PartitionOutOfRange { index, available },
                survivors,
            );
        }
        None => best_partitioning(&survivors).unwrap_or(0),
    };
    let points = survivors[chosen].total_points();
    let combinations = survivors[chosen].combinations.clone();
    ScoringResolution {
        valid: true,
        points,
        combinations,
        chosen: Some(chosen),
        error: None,
        all_partitionings: survivors,
    }
}
