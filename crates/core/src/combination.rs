use crate::{Hand, ScoreTables};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on partitionings returned for one selection. Only reachable
/// with very large hands of a single value.
pub const MAX_PARTITIONINGS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationKind {
    Single,
    ThreeOfAKind,
    FourOfAKind,
    FiveOfAKind,
    SixOfAKind,
    Straight,
    ThreePairs,
    TwoTriplets,
}

impl CombinationKind {
    pub fn id(self) -> &'static str {
        match self {
            CombinationKind::Single => "single",
            CombinationKind::ThreeOfAKind => "three_kind",
            CombinationKind::FourOfAKind => "four_kind",
            CombinationKind::FiveOfAKind => "five_kind",
            CombinationKind::SixOfAKind => "six_kind",
            CombinationKind::Straight => "straight",
            CombinationKind::ThreePairs => "three_pairs",
            CombinationKind::TwoTriplets => "two_triplets",
        }
    }

    pub fn of_a_kind(count: usize) -> Option<Self> {
        match count {
            3 => Some(CombinationKind::ThreeOfAKind),
            4 => Some(CombinationKind::FourOfAKind),
            5 => Some(CombinationKind::FiveOfAKind),
            6 => Some(CombinationKind::SixOfAKind),
            _ => None,
        }
    }

    pub fn is_of_a_kind(self) -> bool {
        matches!(
            self,
            CombinationKind::ThreeOfAKind
                | CombinationKind::FourOfAKind
                | CombinationKind::FiveOfAKind
                | CombinationKind::SixOfAKind
        )
    }

    /// Patterns that must consume the whole selection.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            CombinationKind::Straight | CombinationKind::ThreePairs | CombinationKind::TwoTriplets
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringCombination {
    pub kind: CombinationKind,
    /// Face value for singles and of-a-kind runs.
    #[serde(default)]
    pub value: Option<i32>,
    pub dice_indices: Vec<usize>,
    pub points: i64,
}

impl ScoringCombination {
    pub fn label(&self) -> String {
        match self.value {
            Some(value) => format!("{}({})", self.kind.id(), value),
            None => self.kind.id().to_string(),
        }
    }
}

/// One complete, disjoint decomposition of a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partitioning {
    pub combinations: Vec<ScoringCombination>,
}

impl Partitioning {
    pub fn new(combinations: Vec<ScoringCombination>) -> Self {
        Self { combinations }
    }

    pub fn total_points(&self) -> i64 {
        self.combinations.iter().map(|combo| combo.points).sum()
    }

    /// Every index used, sorted. Duplicates are kept so overlap is visible.
    pub fn dice_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .combinations
            .iter()
            .flat_map(|combo| combo.dice_indices.iter().copied())
            .collect();
        indices.sort_unstable();
        indices
    }

    pub fn covers(&self, selected: &[usize]) -> bool {
        let mut expected = selected.to_vec();
        expected.sort_unstable();
        !expected.is_empty() && self.dice_indices() == expected
    }

    pub fn contains(&self, kind: CombinationKind) -> bool {
        self.combinations.iter().any(|combo| combo.kind == kind)
    }

    pub fn summary(&self) -> String {
        let labels: Vec<String> = self.combinations.iter().map(|c| c.label()).collect();
        format!("{} = {}", labels.join(" + "), self.total_points())
    }
}

/// Selected indices grouped by rolled value. `None` when an index is out of
/// range, repeated, or points at a die that has not been rolled.
fn value_groups(hand: &Hand, selected: &[usize]) -> Option<BTreeMap<i32, Vec<usize>>> {
    if selected.is_empty() {
        return None;
    }
    let mut sorted = selected.to_vec();
    sorted.sort_unstable();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for idx in sorted {
        let value = hand.get(idx)?.value()?;
        groups.entry(value).or_default().push(idx);
    }
    Some(groups)
}

fn all_indices(groups: &BTreeMap<i32, Vec<usize>>) -> Vec<usize> {
    let mut indices: Vec<usize> = groups.values().flatten().copied().collect();
    indices.sort_unstable();
    indices
}

/// Whole-selection patterns in priority order: straight, three pairs, two triplets.
fn matching_patterns(
    groups: &BTreeMap<i32, Vec<usize>>,
    tables: &ScoreTables,
) -> Vec<ScoringCombination> {
    let total: usize = groups.values().map(Vec::len).sum();
    let mut patterns = Vec::new();
    let straight = tables.straight_values();
    if !straight.is_empty()
        && total == straight.len()
        && groups.len() == straight.len()
        && straight.iter().all(|value| groups.contains_key(value))
    {
        patterns.push(pattern(CombinationKind::Straight, groups, tables));
    }
    if total == 6 && groups.len() == 3 && groups.values().all(|idx| idx.len() == 2) {
        patterns.push(pattern(CombinationKind::ThreePairs, groups, tables));
    }
    if total == 6 && groups.len() == 2 && groups.values().all(|idx| idx.len() == 3) {
        patterns.push(pattern(CombinationKind::TwoTriplets, groups, tables));
    }
    patterns
}

fn pattern(
    kind: CombinationKind,
    groups: &BTreeMap<i32, Vec<usize>>,
    tables: &ScoreTables,
) -> ScoringCombination {
    ScoringCombination {
        kind,
        value: None,
        dice_indices: all_indices(groups),
        points: tables.pattern_points(kind),
    }
}

fn of_a_kind(value: i32, indices: &[usize], tables: &ScoreTables) -> Option<ScoringCombination> {
    let kind = CombinationKind::of_a_kind(indices.len())?;
    Some(ScoringCombination {
        kind,
        value: Some(value),
        dice_indices: indices.to_vec(),
        points: tables.of_a_kind_points(value, indices.len())?,
    })
}

fn single(value: i32, idx: usize, points: i64) -> ScoringCombination {
    ScoringCombination {
        kind: CombinationKind::Single,
        value: Some(value),
        dice_indices: vec![idx],
        points,
    }
}

/// Greedy decomposition of the selection. The result may leave dice
/// uncovered; check with [`Partitioning::covers`].
pub fn detect(hand: &Hand, selected: &[usize], tables: &ScoreTables) -> Vec<ScoringCombination> {
    let Some(groups) = value_groups(hand, selected) else {
        return Vec::new();
    };
    if let Some(first) = matching_patterns(&groups, tables).into_iter().next() {
        return vec![first];
    }
    let mut combos = Vec::new();
    for (&value, indices) in &groups {
        let mut remaining: &[usize] = indices;
        while remaining.len() >= 3 {
            let take = remaining.len().min(6);
            if let Some(combo) = of_a_kind(value, &remaining[..take], tables) {
                combos.push(combo);
            }
            remaining = &remaining[take..];
        }
        if let Some(points) = tables.single_points(value) {
            combos.extend(remaining.iter().map(|&idx| single(value, idx, points)));
        }
    }
    combos
}

/// Part sizes summing to `count`, largest first, each sequence non-increasing.
fn compositions(
    count: usize,
    max_part: usize,
    allow_single: bool,
    out: &mut Vec<Vec<usize>>,
    current: &mut Vec<usize>,
) {
    if count == 0 {
        out.push(current.clone());
        return;
    }
    for part in (1..=max_part.min(count)).rev() {
        if part == 2 || (part == 1 && !allow_single) {
            continue;
        }
        current.push(part);
        compositions(count - part, part, allow_single, out, current);
        current.pop();
    }
}

fn decompose_group(
    value: i32,
    indices: &[usize],
    tables: &ScoreTables,
) -> Vec<Vec<ScoringCombination>> {
    let single_points = tables.single_points(value);
    let mut shapes = Vec::new();
    compositions(
        indices.len(),
        6,
        single_points.is_some(),
        &mut shapes,
        &mut Vec::new(),
    );
    let mut options = Vec::with_capacity(shapes.len());
    'shapes: for shape in shapes {
        let mut combos = Vec::with_capacity(shape.len());
        let mut cursor = 0;
        for part in shape {
            let slice = &indices[cursor..cursor + part];
            cursor += part;
            if part == 1 {
                let Some(points) = single_points else {
                    continue 'shapes;
                };
                combos.push(single(value, slice[0], points));
            } else {
                let Some(combo) = of_a_kind(value, slice, tables) else {
                    continue 'shapes;
                };
                combos.push(combo);
            }
        }
        options.push(combos);
    }
    options
}

/// Every valid partitioning of the selection. Whole-selection patterns come
/// first, then per-value decompositions with the greedy shape leading.
pub fn enumerate_partitionings(
    hand: &Hand,
    selected: &[usize],
    tables: &ScoreTables,
) -> Vec<Partitioning> {
    let Some(groups) = value_groups(hand, selected) else {
        return Vec::new();
    };
    let mut out: Vec<Partitioning> = matching_patterns(&groups, tables)
        .into_iter()
        .map(|combo| Partitioning::new(vec![combo]))
        .collect();

    let mut partials: Vec<Vec<ScoringCombination>> = vec![Vec::new()];
    for (&value, indices) in &groups {
        let options = decompose_group(value, indices, tables);
        if options.is_empty() {
            return out;
        }
        let mut next = Vec::with_capacity(partials.len().saturating_mul(options.len()));
        'outer: for partial in &partials {
            for option in &options {
                if next.len() >= MAX_PARTITIONINGS {
                    break 'outer;
                }
                let mut combined = partial.clone();
                combined.extend(option.iter().cloned());
                next.push(combined);
            }
        }
        partials = next;
    }
    out.extend(partials.into_iter().map(Partitioning::new));
    out.truncate(MAX_PARTITIONINGS);
    out
}

/// True when no subset of the rolled dice scores points. Unrolled dice are
/// ignored, and combinations worth zero or less do not count.
pub fn detect_flop(hand: &Hand, tables: &ScoreTables) -> bool {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for value in hand.rolled_values() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let scores = |points: Option<i64>| points.map_or(false, |points| points > 0);
    if counts.keys().any(|value| scores(tables.single_points(*value))) {
        return false;
    }
    let kind_scores = counts.iter().any(|(value, count)| {
        (3..=(*count).min(6)).any(|take| scores(tables.of_a_kind_points(*value, take)))
    });
    if kind_scores {
        return false;
    }
    let straight = tables.straight_values();
    if !straight.is_empty()
        && tables.pattern_points(CombinationKind::Straight) > 0
        && straight.iter().all(|value| counts.contains_key(value))
    {
        return false;
    }
    let pairs = counts.values().filter(|count| **count >= 2).count();
    if pairs >= 3 && tables.pattern_points(CombinationKind::ThreePairs) > 0 {
        return false;
    }
    let triples = counts.values().filter(|count| **count >= 3).count();
    !(triples >= 2 && tables.pattern_points(CombinationKind::TwoTriplets) > 0)
}

/// Every combination a subset of the rolled dice can form on its own, one
/// representative per kind and value.
pub fn scoring_candidates(hand: &Hand, tables: &ScoreTables) -> Vec<ScoringCombination> {
    let rolled: Vec<usize> = hand
        .iter()
        .enumerate()
        .filter(|(_, die)| die.value().is_some())
        .map(|(idx, _)| idx)
        .collect();
    let Some(groups) = value_groups(hand, &rolled) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (&value, indices) in &groups {
        if let Some(points) = tables.single_points(value) {
            out.push(single(value, indices[0], points));
        }
        for take in 3..=indices.len().min(6) {
            out.extend(of_a_kind(value, &indices[..take], tables));
        }
    }
    let straight = tables.straight_values();
    if !straight.is_empty() && straight.iter().all(|value| groups.contains_key(value)) {
        let picked: BTreeMap<i32, Vec<usize>> = straight
            .iter()
            .filter_map(|value| groups.get(value).map(|idx| (*value, vec![idx[0]])))
            .collect();
        out.push(pattern(CombinationKind::Straight, &picked, tables));
    }
    out.extend(grouped_patterns(&groups, 2, 3, CombinationKind::ThreePairs, tables));
    out.extend(grouped_patterns(&groups, 3, 2, CombinationKind::TwoTriplets, tables));
    out
}

/// `needed` distinct values, `size` dice each, for every choice of values.
fn grouped_patterns(
    groups: &BTreeMap<i32, Vec<usize>>,
    size: usize,
    needed: usize,
    kind: CombinationKind,
    tables: &ScoreTables,
) -> Vec<ScoringCombination> {
    let eligible: Vec<(i32, &[usize])> = groups
        .iter()
        .filter(|(_, indices)| indices.len() >= size)
        .map(|(value, indices)| (*value, &indices[..size]))
        .collect();
    let mut choices = Vec::new();
    choose(eligible.len(), needed, 0, &mut Vec::new(), &mut choices);
    choices
        .into_iter()
        .map(|choice| {
            let picked: BTreeMap<i32, Vec<usize>> = choice
                .into_iter()
                .map(|slot| (eligible[slot].0, eligible[slot].1.to_vec()))
                .collect();
            pattern(kind, &picked, tables)
        })
        .collect()
}

fn choose(
    len: usize,
    needed: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == needed {
        out.push(current.clone());
        return;
    }
    for slot in start..len {
        current.push(slot);
        choose(len, needed, slot + 1, current, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compositions_skip_pairs_and_lead_with_largest() {
        let mut out = Vec::new();
        compositions(4, 6, true, &mut out, &mut Vec::new());
        assert_eq!(out, vec![vec![4], vec![3, 1], vec![1, 1, 1, 1]]);
        let mut out = Vec::new();
        compositions(4, 6, false, &mut out, &mut Vec::new());
        assert_eq!(out, vec![vec![4]]);
        let mut out = Vec::new();
        compositions(8, 6, false, &mut out, &mut Vec::new());
        assert_eq!(out, vec![vec![5, 3], vec![4, 4]]);
    }

    #[test]
    fn value_groups_rejects_bad_indices() {
        let hand = Hand::showing(&[1, 2, 3]);
        assert!(value_groups(&hand, &[]).is_none());
        assert!(value_groups(&hand, &[0, 0]).is_none());
        assert!(value_groups(&hand, &[3]).is_none());
        let mut unrolled = hand.clone();
        unrolled.dice[1].rolled_value = None;
        assert!(value_groups(&unrolled, &[1]).is_none());
    }

    #[test]
    fn candidates_cover_every_pattern_choice() {
        let tables = ScoreTables::standard();
        let hand = Hand::showing(&[2, 2, 3, 3, 4, 4, 6, 6]);
        let pairs = scoring_candidates(&hand, &tables)
            .into_iter()
            .filter(|combo| combo.kind == CombinationKind::ThreePairs)
            .count();
        assert_eq!(pairs, 4);
        let kinds: Vec<CombinationKind> = scoring_candidates(&Hand::showing(&[5, 5, 5, 5]), &tables)
            .into_iter()
            .map(|combo| combo.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                CombinationKind::Single,
                CombinationKind::ThreeOfAKind,
                CombinationKind::FourOfAKind
            ]
        );
    }
}
