use anyhow::{bail, Context};
use farkle_core::{
    CharmDef, CharmRegistry, ConsumableDef, Content, DiceSetDef, GameConfig, RngState,
};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "config.json";
const CHARMS_FILE: &str = "charms.json";
const CONSUMABLES_FILE: &str = "consumables.json";
const DICE_SETS_FILE: &str = "dice_sets.json";

/// Config, content and any non-fatal problems found while checking them.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub config: GameConfig,
    pub content: Content,
    pub warnings: Vec<String>,
}

/// `dir/config.json`. A missing file means every default.
pub fn load_game_config(dir: &Path) -> anyhow::Result<GameConfig> {
    let config: GameConfig = load_json_optional(dir.join(CONFIG_FILE))?.unwrap_or_default();
    if config.game.win_condition <= 0 {
        bail!(
            "{}: win_condition must be positive, got {}",
            CONFIG_FILE,
            config.game.win_condition
        );
    }
    if config.game.charm_slots == 0 && !config.game.starting_charms.is_empty() {
        bail!("{CONFIG_FILE}: starting charms configured with zero charm slots");
    }
    Ok(config)
}

/// Content tables under `dir/content`. Charms are required, the rest optional.
pub fn load_content(dir: &Path) -> anyhow::Result<Content> {
    let base = dir.join("content");
    let charms: Vec<CharmDef> = load_json(base.join(CHARMS_FILE))?;
    let consumables: Vec<ConsumableDef> =
        load_json_optional(base.join(CONSUMABLES_FILE))?.unwrap_or_default();
    let dice_sets: Vec<DiceSetDef> =
        load_json_optional(base.join(DICE_SETS_FILE))?.unwrap_or_default();

    ensure_unique("charm", charms.iter().map(|def| def.id.as_str()))?;
    ensure_unique("consumable", consumables.iter().map(|def| def.id.as_str()))?;
    ensure_unique("dice set", dice_sets.iter().map(|def| def.id.as_str()))?;

    // Chaotic sets draw faces at game start; any seed is enough to validate shape.
    let mut rng = RngState::from_seed(0);
    for set in &dice_sets {
        set.build(&mut rng)
            .with_context(|| format!("dice set {}", set.id))?;
    }

    Ok(Content {
        charms,
        consumables,
        dice_sets,
    })
}

/// Loads config and content, then cross-checks them. Problems that only
/// cost a player an item are reported as warnings, not errors.
pub fn load_assets(dir: &Path) -> anyhow::Result<LoadReport> {
    let config = load_game_config(dir)?;
    let content = load_content(dir)?;
    let warnings = validate(&config, &content);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    Ok(LoadReport {
        config,
        content,
        warnings,
    })
}

pub fn validate(config: &GameConfig, content: &Content) -> Vec<String> {
    let registry = CharmRegistry::with_defaults();
    let mut warnings = Vec::new();
    for charm in &content.charms {
        if !registry.contains(charm.behavior_id()) {
            warnings.push(format!(
                "charm {} uses unknown behavior {}",
                charm.id,
                charm.behavior_id()
            ));
        }
    }
    for id in &config.game.starting_charms {
        if content.charm_by_id(id).is_none() {
            warnings.push(format!("starting charm {id} is not defined"));
        }
    }
    for id in &config.game.starting_consumables {
        if content.consumable_by_id(id).is_none() {
            warnings.push(format!("starting consumable {id} is not defined"));
        }
    }
    if config.game.starting_charms.len() > config.game.charm_slots {
        warnings.push(format!(
            "{} starting charms but only {} slots",
            config.game.starting_charms.len(),
            config.game.charm_slots
        ));
    }
    if config.game.dice_set != "standard" && content.dice_set_by_id(&config.game.dice_set).is_none()
    {
        warnings.push(format!(
            "dice set {} is not defined; standard dice will be used",
            config.game.dice_set
        ));
    }
    if config.materials.rainbow_odds == 0 {
        warnings.push("rainbow_odds is 0; rainbow dice will do nothing".to_string());
    }
    if config.scoring.singles.is_empty() {
        warnings.push("no single-scoring values; most rolls will flop".to_string());
    }
    warnings
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            bail!("{kind} with empty id");
        }
        if !seen.insert(id) {
            bail!("duplicate {kind} id {id}");
        }
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

fn load_json_optional<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<Option<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    load_json(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = ensure_unique("charm", ["a", "b", "a"].into_iter()).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate charm id a"));
        assert!(ensure_unique("charm", [" "].into_iter()).is_err());
        assert!(ensure_unique("charm", ["a", "b"].into_iter()).is_ok());
    }

    #[test]
    fn validate_flags_unknown_references() {
        let mut config = GameConfig::default();
        config.game.starting_charms = vec!["ghost".to_string()];
        config.game.dice_set = "loaded".to_string();
        let content = Content {
            charms: vec![CharmDef {
                id: "odd".to_string(),
                name: "Odd".to_string(),
                description: String::new(),
                behavior: Some("does_not_exist".to_string()),
                uses: None,
                params: Default::default(),
            }],
            ..Content::default()
        };
        let warnings = validate(&config, &content);
        assert_eq!(warnings.len(), 3, "{warnings:?}");
    }
}
