use super::*;
use crate::*;

impl RunState {
    pub fn new(config: GameConfig, content: Content, seed: u64) -> Result<Self, RunError> {
        Self::with_rng(config, content, Box::new(RngState::from_seed(seed)))
    }

    /// Builds the configured dice set from content, falling back to six
    /// standard dice when the id is unknown.
    pub fn with_rng(
        config: GameConfig,
        content: Content,
        mut rng: Box<dyn RandomSource>,
    ) -> Result<Self, RunError> {
        let dice_set = match content.dice_set_by_id(&config.game.dice_set) {
            Some(def) => def.build(rng.as_mut())?,
            None => {
                if config.game.dice_set != "standard" {
                    tracing::warn!(id = %config.game.dice_set, "unknown dice set; using standard");
                }
                Hand::standard(6)
            }
        };
        Self::with_dice_set(config, content, dice_set, rng)
    }

    pub fn with_dice_set(
        config: GameConfig,
        content: Content,
        dice_set: Hand,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, RunError> {
        validate_dice_set(&dice_set.dice)?;
        let tables = ScoreTables::from_config(&config);
        let state = GameState::new(&config, dice_set);
        let mut run = Self {
            config,
            tables,
            content,
            registry: CharmRegistry::with_defaults(),
            rng,
            state,
            round: None,
        };
        for id in run.config.game.starting_charms.clone() {
            if let Err(err) = run.grant_charm(&id) {
                tracing::warn!(error = %err, "skipping starting charm");
            }
        }
        for id in run.config.game.starting_consumables.clone() {
            if let Err(err) = run.grant_consumable(&id) {
                tracing::warn!(error = %err, "skipping starting consumable");
            }
        }
        Ok(run)
    }

    pub fn set_registry(&mut self, registry: CharmRegistry) {
        self.registry = registry;
    }

    /// Adds a charm from content. Charms whose behaviour is not registered
    /// are rejected the same way as unknown ids.
    pub fn grant_charm(&mut self, id: &str) -> Result<(), RunError> {
        let def = self
            .content
            .charm_by_id(id)
            .ok_or_else(|| RunError::UnknownContentId {
                kind: "charm",
                id: id.to_string(),
            })?;
        if !self.registry.contains(def.behavior_id()) {
            return Err(RunError::UnknownContentId {
                kind: "charm behavior",
                id: def.behavior_id().to_string(),
            });
        }
        self.state.inventory.add_charm(CharmInstance::from_def(def))?;
        tracing::debug!(charm = id, "charm added");
        Ok(())
    }

    pub fn grant_consumable(&mut self, id: &str) -> Result<(), RunError> {
        let def = self
            .content
            .consumable_by_id(id)
            .ok_or_else(|| RunError::UnknownContentId {
                kind: "consumable",
                id: id.to_string(),
            })?;
        self.state
            .inventory
            .add_consumable(ConsumableInstance::from_def(def))?;
        tracing::debug!(consumable = id, "consumable added");
        Ok(())
    }

    /// Announces the game and opens round one.
    pub fn start_game(&mut self, events: &mut EventBus) -> Result<(), RunError> {
        self.ensure_running()?;
        if self.state.round_number != 0 {
            return Err(RunError::RoundInProgress(self.state.round_number));
        }
        events.push(Event::GameStarted {
            dice: self.state.dice_set.len(),
            win_condition: self.state.win_condition,
        });
        self.start_round(events)
    }
}
