#[derive(Debug, Clone)]
pub struct AutoplayConfig {
    pub seed: u64,
    pub max_steps: u32,
    /// Stop once this many rounds have finished without a win.
    pub max_rounds: u32,
    /// Bank as soon as the round total reaches this.
    pub bank_threshold: i64,
    /// Bank instead of rerolling fewer dice than this.
    pub min_dice_to_reroll: usize,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            seed: 0xD1CE,
            max_steps: 5_000,
            max_rounds: 200,
            bank_threshold: 350,
            min_dice_to_reroll: 3,
        }
    }
}
