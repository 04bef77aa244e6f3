use crate::{DiceError, Die, Hand, Material, RandomSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharmDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Behaviour key in the charm registry. Defaults to `id`.
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub uses: Option<u32>,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

impl CharmDef {
    pub fn behavior_id(&self) -> &str {
        self.behavior.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsumableEffect {
    AddMoney { amount: i64 },
    AddRoundPoints { amount: i64 },
    RerollHand,
    SetMaterial { material: Material },
    SetFace { value: i32 },
    AddDie {
        #[serde(default)]
        material: Material,
    },
    RechargeCharms { amount: u32 },
}

impl ConsumableEffect {
    pub fn needs_die_target(&self) -> bool {
        matches!(
            self,
            ConsumableEffect::SetMaterial { .. } | ConsumableEffect::SetFace { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumableDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_uses")]
    pub uses: u32,
    pub effect: ConsumableEffect,
}

fn default_uses() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DieDef {
    #[serde(default)]
    pub sides: Option<i64>,
    #[serde(default)]
    pub faces: Option<Vec<i32>>,
    #[serde(default)]
    pub material: Material,
}

impl DieDef {
    pub fn build(&self, id: u32) -> Result<Die, DiceError> {
        let faces = match (&self.faces, self.sides) {
            (Some(faces), _) => faces.clone(),
            (None, Some(sides)) if sides > 0 => (1..=sides as i32).collect(),
            (None, Some(sides)) => return Err(DiceError::NonPositiveSides { id, sides }),
            (None, None) => (1..=6).collect(),
        };
        let sides = match self.sides {
            Some(sides) if sides <= 0 => return Err(DiceError::NonPositiveSides { id, sides }),
            Some(sides) => sides as u32,
            None => faces.len() as u32,
        };
        let die = Die {
            id,
            sides,
            allowed_values: faces,
            material: self.material,
            rolled_value: None,
            scored: false,
        };
        die.validate()?;
        Ok(die)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiceSetLayout {
    Standard {
        count: usize,
        #[serde(default)]
        material: Material,
    },
    Custom {
        dice: Vec<DieDef>,
    },
    /// Faces drawn at random when the game starts.
    Chaotic {
        count: usize,
        sides: u32,
        min_value: i32,
        max_value: i32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiceSetDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub layout: DiceSetLayout,
}

impl DiceSetDef {
    pub fn build(&self, rng: &mut dyn RandomSource) -> Result<Hand, DiceError> {
        let dice = match &self.layout {
            DiceSetLayout::Standard { count, material } => (0..*count)
                .map(|idx| Die::standard(idx as u32 + 1).with_material(*material))
                .collect(),
            DiceSetLayout::Custom { dice } => dice
                .iter()
                .enumerate()
                .map(|(idx, def)| def.build(idx as u32 + 1))
                .collect::<Result<Vec<_>, _>>()?,
            DiceSetLayout::Chaotic {
                count,
                sides,
                min_value,
                max_value,
            } => {
                let low = i64::from((*min_value).min(*max_value));
                let span = (i64::from((*max_value).max(*min_value)) - low + 1) as usize;
                (0..*count)
                    .map(|idx| Die {
                        id: idx as u32 + 1,
                        sides: *sides,
                        allowed_values: (0..*sides)
                            .map(|_| (low + rng.pick_index(span) as i64) as i32)
                            .collect(),
                        material: Material::Plastic,
                        rolled_value: None,
                        scored: false,
                    })
                    .collect()
            }
        };
        let hand = Hand::new(dice);
        hand.validate()?;
        Ok(hand)
    }
}

/// Registry of static content, injected at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub charms: Vec<CharmDef>,
    #[serde(default)]
    pub consumables: Vec<ConsumableDef>,
    #[serde(default)]
    pub dice_sets: Vec<DiceSetDef>,
}

impl Content {
    pub fn charm_by_id(&self, id: &str) -> Option<&CharmDef> {
        self.charms.iter().find(|charm| charm.id == id)
    }

    pub fn consumable_by_id(&self, id: &str) -> Option<&ConsumableDef> {
        self.consumables.iter().find(|item| item.id == id)
    }

    pub fn dice_set_by_id(&self, id: &str) -> Option<&DiceSetDef> {
        self.dice_sets.iter().find(|set| set.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedRng;

    fn chaotic(min_value: i32, max_value: i32) -> DiceSetDef {
        DiceSetDef {
            id: "chaos".to_string(),
            name: "Chaos".to_string(),
            description: String::new(),
            layout: DiceSetLayout::Chaotic {
                count: 2,
                sides: 3,
                min_value,
                max_value,
            },
        }
    }

    #[test]
    fn chaotic_faces_span_the_full_range() {
        let def = chaotic(i32::MAX, i32::MIN);
        let low = def.build(&mut ScriptedRng::new(vec![0])).expect("low");
        assert!(low.iter().all(|die| die.allowed_values == vec![i32::MIN; 3]));
        let high = def.build(&mut ScriptedRng::new(vec![u64::MAX])).expect("high");
        assert!(high.iter().all(|die| die.allowed_values == vec![i32::MAX; 3]));
    }

    #[test]
    fn chaotic_faces_stay_in_bounds() {
        let def = chaotic(-2, 2);
        let hand = def
            .build(&mut ScriptedRng::new(vec![0, 1, 2, 3, 4, 5, 6]))
            .expect("build");
        assert_eq!(hand.len(), 2);
        assert!(hand
            .iter()
            .flat_map(|die| die.allowed_values.iter())
            .all(|value| (-2..=2).contains(value)));
    }
}
