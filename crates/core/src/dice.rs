use crate::RandomSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Plastic,
    Crystal,
    Wooden,
    Golden,
    Volcano,
    Mirror,
    Rainbow,
}

impl Material {
    pub const ALL: [Material; 7] = [
        Material::Plastic,
        Material::Crystal,
        Material::Wooden,
        Material::Golden,
        Material::Volcano,
        Material::Mirror,
        Material::Rainbow,
    ];

    /// Order in which material handlers run. Flat additions come before the
    /// multipliers so they get scaled; golden only touches money and rainbow
    /// rolls last so its doubling sees every other change.
    pub const PIPELINE_ORDER: [Material; 7] = [
        Material::Plastic,
        Material::Volcano,
        Material::Mirror,
        Material::Wooden,
        Material::Crystal,
        Material::Golden,
        Material::Rainbow,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Material::Plastic => "plastic",
            Material::Crystal => "crystal",
            Material::Wooden => "wooden",
            Material::Golden => "golden",
            Material::Volcano => "volcano",
            Material::Mirror => "mirror",
            Material::Rainbow => "rainbow",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|material| material.id() == value)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiceError {
    #[error("dice set is empty")]
    EmptySet,
    #[error("die {id} has non-positive side count {sides}")]
    NonPositiveSides { id: u32, sides: i64 },
    #[error("die {id} declares {sides} sides but lists {faces} faces")]
    FaceCountMismatch { id: u32, sides: u32, faces: usize },
    #[error("die {id} shows {value}, which is not one of its faces")]
    RolledValueNotAllowed { id: u32, value: i32 },
    #[error("die index {0} out of range")]
    IndexOutOfRange(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Die {
    pub id: u32,
    pub sides: u32,
    pub allowed_values: Vec<i32>,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub rolled_value: Option<i32>,
    #[serde(default)]
    pub scored: bool,
}

impl Die {
    pub fn standard(id: u32) -> Self {
        Self {
            id,
            sides: 6,
            allowed_values: (1..=6).collect(),
            material: Material::Plastic,
            rolled_value: None,
            scored: false,
        }
    }

    pub fn with_faces(id: u32, faces: Vec<i32>, material: Material) -> Result<Self, DiceError> {
        let die = Self {
            id,
            sides: faces.len() as u32,
            allowed_values: faces,
            material,
            rolled_value: None,
            scored: false,
        };
        die.validate()?;
        Ok(die)
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// A die fixed on `value`, for building hands directly.
    pub fn showing(id: u32, value: i32) -> Self {
        let mut die = Self::standard(id);
        if !die.allowed_values.contains(&value) {
            die.allowed_values[0] = value;
        }
        die.rolled_value = Some(value);
        die
    }

    pub fn validate(&self) -> Result<(), DiceError> {
        if self.sides == 0 {
            return Err(DiceError::NonPositiveSides {
                id: self.id,
                sides: 0,
            });
        }
        if self.allowed_values.len() != self.sides as usize {
            return Err(DiceError::FaceCountMismatch {
                id: self.id,
                sides: self.sides,
                faces: self.allowed_values.len(),
            });
        }
        if let Some(value) = self.rolled_value {
            if !self.allowed_values.contains(&value) {
                return Err(DiceError::RolledValueNotAllowed { id: self.id, value });
            }
        }
        Ok(())
    }

    pub fn value(&self) -> Option<i32> {
        self.rolled_value
    }

    pub fn roll(&mut self, rng: &mut dyn RandomSource) -> i32 {
        let idx = rng.pick_index(self.allowed_values.len());
        let value = self.allowed_values.get(idx).copied().unwrap_or_default();
        self.rolled_value = Some(value);
        value
    }

    /// Same configuration with roll state cleared.
    pub fn fresh(&self) -> Self {
        Self {
            rolled_value: None,
            scored: false,
            ..self.clone()
        }
    }
}

pub fn validate_dice_set(dice: &[Die]) -> Result<(), DiceError> {
    if dice.is_empty() {
        return Err(DiceError::EmptySet);
    }
    for die in dice {
        die.validate()?;
    }
    Ok(())
}

/// Ordered dice with stable positional indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hand {
    pub dice: Vec<Die>,
}

impl Hand {
    pub fn new(dice: Vec<Die>) -> Self {
        Self { dice }
    }

    pub fn standard(count: usize) -> Self {
        Self::new((0..count).map(|idx| Die::standard(idx as u32 + 1)).collect())
    }

    /// Hand of standard dice already showing `values`.
    pub fn showing(values: &[i32]) -> Self {
        Self::new(
            values
                .iter()
                .enumerate()
                .map(|(idx, value)| Die::showing(idx as u32 + 1, *value))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Die> {
        self.dice.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Die> {
        self.dice.iter()
    }

    pub fn values(&self) -> Vec<Option<i32>> {
        self.dice.iter().map(Die::value).collect()
    }

    pub fn rolled_values(&self) -> Vec<i32> {
        self.dice.iter().filter_map(Die::value).collect()
    }

    pub fn validate(&self) -> Result<(), DiceError> {
        validate_dice_set(&self.dice)
    }

    /// Fresh copy of every die, as used when a round starts or hot dice refill.
    pub fn fresh(&self) -> Self {
        Self::new(self.dice.iter().map(Die::fresh).collect())
    }

    /// Removes the dice at `indices` and returns them in index order.
    pub fn take(&mut self, indices: &[usize]) -> Result<Vec<Die>, DiceError> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&idx) = sorted.iter().find(|&&idx| idx >= self.dice.len()) {
            return Err(DiceError::IndexOutOfRange(idx));
        }
        let mut taken = Vec::with_capacity(sorted.len());
        for idx in sorted.into_iter().rev() {
            taken.push(self.dice.remove(idx));
        }
        taken.reverse();
        Ok(taken)
    }
}

/// Rolls every die in the hand.
pub fn roll(hand: &mut Hand, rng: &mut dyn RandomSource) {
    for die in &mut hand.dice {
        die.roll(rng);
    }
}
