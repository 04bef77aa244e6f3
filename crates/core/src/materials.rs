use crate::effects::ensure_finite;
use crate::{EffectError, Material, MaterialRules, PointEffect, RandomSource, Score};

/// What one material handler wants to do to the running score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialEffect {
    pub points: Vec<PointEffect>,
    pub money: i64,
    pub line: String,
}

pub struct MaterialContext<'a> {
    /// Dice of this material in the selection.
    pub count: usize,
    pub selected_count: usize,
    pub base_points: i64,
    pub running: Score,
    /// Crystals scored earlier this round, before the current action.
    pub crystals_before: u32,
    pub round_hot_dice: u32,
    pub rules: &'a MaterialRules,
}

/// Runs the handler for one material. `Ok(None)` means the material has no
/// effect (plastic, or no dice of that material selected).
pub fn apply_material(
    material: Material,
    ctx: &MaterialContext<'_>,
    rng: &mut dyn RandomSource,
) -> Result<Option<MaterialEffect>, EffectError> {
    if ctx.count == 0 {
        return Ok(None);
    }
    let rules = ctx.rules;
    let n = ctx.count;
    let effect = match material {
        Material::Plastic => return Ok(None),
        Material::Wooden => {
            let mult = ensure_finite(material.id(), rules.wooden_mult)?;
            MaterialEffect {
                points: vec![PointEffect::Multiply(mult); n],
                money: 0,
                line: format!("{n} wooden x{mult}"),
            }
        }
        Material::Crystal => {
            let mult = rules.crystal_base + rules.crystal_step * ctx.crystals_before as f64;
            let mult = ensure_finite(material.id(), mult)?;
            MaterialEffect {
                points: vec![PointEffect::Multiply(mult); n],
                money: 0,
                line: format!("{n} crystal x{mult:.2} ({} earlier)", ctx.crystals_before),
            }
        }
        Material::Golden => MaterialEffect {
            points: Vec::new(),
            money: rules.golden_money * n as i64,
            line: format!("{n} golden +${}", rules.golden_money * n as i64),
        },
        Material::Volcano => {
            let per_die = rules.volcano_base_points
                + rules.volcano_points_per_hot_dice * ctx.round_hot_dice as i64;
            MaterialEffect {
                points: vec![PointEffect::Add(per_die as f64); n],
                money: 0,
                line: format!("{n} volcano +{per_die} each ({} hot dice)", ctx.round_hot_dice),
            }
        }
        Material::Mirror => {
            if ctx.selected_count == 0 {
                return Err(EffectError::InvalidRule {
                    source_id: material.id().to_string(),
                    reason: "mirror scored with an empty selection".to_string(),
                });
            }
            let share = ctx.base_points as f64 * rules.mirror_share / ctx.selected_count as f64;
            let share = ensure_finite(material.id(), share)?;
            MaterialEffect {
                points: vec![PointEffect::Add(share); n],
                money: 0,
                line: format!("{n} mirror +{share:.1} each"),
            }
        }
        Material::Rainbow => {
            if rules.rainbow_odds == 0 {
                return Err(EffectError::InvalidRule {
                    source_id: material.id().to_string(),
                    reason: "rainbow_odds must be positive".to_string(),
                });
            }
            let mut effect = MaterialEffect::default();
            let mut parts = Vec::new();
            for _ in 0..n {
                match rng.pick_index(rules.rainbow_odds as usize) {
                    0 => {
                        effect.points.push(PointEffect::Multiply(rules.rainbow_mult));
                        parts.push(format!("x{}", rules.rainbow_mult));
                    }
                    1 => {
                        effect.money += rules.rainbow_money;
                        parts.push(format!("+${}", rules.rainbow_money));
                    }
                    2 => {
                        effect.points.push(PointEffect::Add(rules.rainbow_points as f64));
                        parts.push(format!("+{}", rules.rainbow_points));
                    }
                    _ => parts.push("nothing".to_string()),
                }
            }
            effect.line = format!("{n} rainbow: {}", parts.join(", "));
            effect
        }
    };
    let after = effect
        .points
        .iter()
        .fold(ctx.running, |score, point| score.applied(point));
    ensure_finite(material.id(), after.points)?;
    Ok(Some(effect))
}
