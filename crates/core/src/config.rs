use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SingleRule {
    pub value: i32,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringRules {
    /// Face values that score on their own.
    pub singles: Vec<SingleRule>,
    /// Three of a kind of `1` scores this; any other value scores `value * triple_multiplier`.
    pub triple_one_points: i64,
    pub triple_multiplier: i64,
    /// Multipliers applied to the three-of-a-kind base.
    pub four_kind_factor: i64,
    pub five_kind_factor: i64,
    pub six_kind_factor: i64,
    pub straight_points: i64,
    pub straight_values: Vec<i32>,
    pub three_pairs_points: i64,
    pub two_triplets_points: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            singles: vec![
                SingleRule {
                    value: 1,
                    points: 100,
                },
                SingleRule {
                    value: 5,
                    points: 50,
                },
            ],
            triple_one_points: 1000,
            triple_multiplier: 100,
            four_kind_factor: 2,
            five_kind_factor: 4,
            six_kind_factor: 8,
            straight_points: 2000,
            straight_values: (1..=6).collect(),
            three_pairs_points: 1500,
            two_triplets_points: 2500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameRules {
    pub win_condition: i64,
    pub flop_limit: u32,
    pub flop_penalty: i64,
    pub starting_money: i64,
    pub charm_slots: usize,
    pub consumable_slots: usize,
    pub dice_set: String,
    /// Content ids granted when the game starts. Unknown ids are skipped.
    pub starting_charms: Vec<String>,
    pub starting_consumables: Vec<String>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            win_condition: 10_000,
            flop_limit: 3,
            flop_penalty: 1000,
            starting_money: 0,
            charm_slots: 5,
            consumable_slots: 3,
            dice_set: "standard".to_string(),
            starting_charms: Vec::new(),
            starting_consumables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialRules {
    /// Per wooden die.
    pub wooden_mult: f64,
    /// Crystal multiplier is `crystal_base + crystal_step * crystals scored earlier this round`.
    pub crystal_base: f64,
    pub crystal_step: f64,
    /// Money per golden die.
    pub golden_money: i64,
    /// Points per volcano die for each hot dice this round.
    pub volcano_points_per_hot_dice: i64,
    pub volcano_base_points: i64,
    /// Each mirror die adds this share of the average base points per selected die.
    pub mirror_share: f64,
    /// One in `rainbow_odds` for each rainbow outcome.
    pub rainbow_odds: u64,
    pub rainbow_mult: f64,
    pub rainbow_money: i64,
    pub rainbow_points: i64,
}

impl Default for MaterialRules {
    fn default() -> Self {
        Self {
            wooden_mult: 1.25,
            crystal_base: 1.5,
            crystal_step: 0.1,
            golden_money: 5,
            volcano_points_per_hot_dice: 100,
            volcano_base_points: 50,
            mirror_share: 1.0,
            rainbow_odds: 4,
            rainbow_mult: 2.0,
            rainbow_money: 10,
            rainbow_points: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub scoring: ScoringRules,
    pub game: GameRules,
    pub materials: MaterialRules,
}

impl GameConfig {
    pub fn single_points(&self, value: i32) -> Option<i64> {
        self.scoring
            .singles
            .iter()
            .find(|rule| rule.value == value)
            .map(|rule| rule.points)
    }
}
