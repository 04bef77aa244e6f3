use crate::effects::ensure_finite;
use crate::{
    CharmInstance, CombinationFilter, CombinationKind, EffectError, GameState, Hand, RoundState,
    ScoringCombination,
};
use std::collections::HashMap;
use std::fmt;

pub struct ScoringContext<'a> {
    pub base_points: i64,
    /// Total after the charms that ran before this one.
    pub running: f64,
    pub combinations: &'a [ScoringCombination],
    pub selected: &'a [usize],
    pub hand: &'a Hand,
    pub game: &'a GameState,
    pub round: &'a RoundState,
}

impl ScoringContext<'_> {
    fn has_kind(&self, kinds: &[CombinationKind]) -> bool {
        self.combinations
            .iter()
            .any(|combo| kinds.contains(&combo.kind))
    }
}

pub struct FlopContext<'a> {
    pub hand: &'a Hand,
    pub game: &'a GameState,
    pub round: &'a RoundState,
}

pub struct BankContext<'a> {
    pub round_points: i64,
    pub game: &'a GameState,
    pub round: &'a RoundState,
}

pub struct RoundStartContext<'a> {
    pub round_number: u32,
    pub game: &'a GameState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharmTrigger {
    pub delta: f64,
    pub money: i64,
    pub line: String,
    pub consume_use: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankTrigger {
    pub banked: f64,
    pub money: i64,
    pub line: String,
    pub consume_use: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundStartTrigger {
    pub points: i64,
    pub money: i64,
    pub line: String,
    pub consume_use: bool,
}

/// Behaviour shared by every instance of a charm id. Instances carry the
/// mutable parts (uses, params); behaviours are stateless.
pub trait CharmBehavior: Send + Sync {
    fn id(&self) -> &'static str;

    fn on_scoring(
        &self,
        _charm: &CharmInstance,
        _ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        Ok(None)
    }

    /// Returns a log line when the flop is prevented. Prevention always costs a use.
    fn on_flop(&self, _charm: &CharmInstance, _ctx: &FlopContext<'_>) -> Option<String> {
        None
    }

    fn on_bank(
        &self,
        _charm: &CharmInstance,
        _ctx: &BankContext<'_>,
        _banked: f64,
    ) -> Result<Option<BankTrigger>, EffectError> {
        Ok(None)
    }

    fn on_round_start(
        &self,
        _charm: &CharmInstance,
        _ctx: &RoundStartContext<'_>,
    ) -> Option<RoundStartTrigger> {
        None
    }

    fn allows(&self, _charm: &CharmInstance, _combination: &ScoringCombination) -> bool {
        true
    }
}

pub struct CharmRegistry {
    behaviors: HashMap<&'static str, Box<dyn CharmBehavior>>,
    order: Vec<&'static str>,
}

impl Default for CharmRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CharmRegistry {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FlopShield));
        registry.register(Box::new(BonusPip));
        registry.register(Box::new(Magnifier));
        registry.register(Box::new(StraightShooter));
        registry.register(Box::new(TripleThreat));
        registry.register(Box::new(HotStreak));
        registry.register(Box::new(Purist));
        registry.register(Box::new(PiggyBank));
        registry.register(Box::new(CompoundInterest));
        registry.register(Box::new(HeadStart));
        registry.register(Box::new(Allowance));
        registry
    }

    /// Registers a behaviour, replacing any earlier one with the same id.
    pub fn register(&mut self, behavior: Box<dyn CharmBehavior>) {
        let id = behavior.id();
        if self.behaviors.insert(id, behavior).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn CharmBehavior> {
        self.behaviors.get(id).map(|behavior| behavior.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.behaviors.contains_key(id)
    }

    pub fn ids(&self) -> &[&'static str] {
        &self.order
    }

    /// Behaviour for an instance, if the instance is usable and known.
    pub fn usable<'a>(&'a self, charm: &CharmInstance) -> Option<&'a dyn CharmBehavior> {
        if !charm.is_usable() {
            return None;
        }
        self.get(charm.behavior_id())
    }
}

impl fmt::Debug for CharmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharmRegistry")
            .field("behaviors", &self.order)
            .finish()
    }
}

/// The charms a player owns, viewed through the registry.
#[derive(Clone, Copy)]
pub struct CharmLineup<'a> {
    pub charms: &'a [CharmInstance],
    pub registry: &'a CharmRegistry,
}

impl<'a> CharmLineup<'a> {
    pub fn new(charms: &'a [CharmInstance], registry: &'a CharmRegistry) -> Self {
        Self { charms, registry }
    }
}

impl CombinationFilter for CharmLineup<'_> {
    fn allows(&self, combination: &ScoringCombination) -> bool {
        self.charms.iter().all(|charm| {
            self.registry
                .usable(charm)
                .map_or(true, |behavior| behavior.allows(charm, combination))
        })
    }
}

fn trigger(delta: f64, line: String) -> CharmTrigger {
    CharmTrigger {
        delta,
        money: 0,
        line,
        consume_use: false,
    }
}

struct FlopShield;

impl CharmBehavior for FlopShield {
    fn id(&self) -> &'static str {
        "flop_shield"
    }

    fn on_flop(&self, charm: &CharmInstance, _ctx: &FlopContext<'_>) -> Option<String> {
        Some(format!("{} absorbs the flop", charm.name))
    }
}

struct BonusPip;

impl CharmBehavior for BonusPip {
    fn id(&self) -> &'static str {
        "bonus_pip"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        _ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        let points = ensure_finite(charm.behavior_id(), charm.param_or("points", 100.0))?;
        Ok(Some(trigger(
            points,
            format!("{}: +{} points", charm.name, points),
        )))
    }
}

struct Magnifier;

impl CharmBehavior for Magnifier {
    fn id(&self) -> &'static str {
        "magnifier"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        let mult = charm.param_or("mult", 1.5);
        let delta = ensure_finite(charm.behavior_id(), ctx.running * (mult - 1.0))?;
        Ok(Some(trigger(
            delta,
            format!("{}: x{} ({:+.1})", charm.name, mult, delta),
        )))
    }
}

struct StraightShooter;

impl CharmBehavior for StraightShooter {
    fn id(&self) -> &'static str {
        "straight_shooter"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        if !ctx.has_kind(&[
            CombinationKind::Straight,
            CombinationKind::ThreePairs,
            CombinationKind::TwoTriplets,
        ]) {
            return Ok(None);
        }
        let bonus = charm.param_or("bonus", 500.0);
        Ok(Some(trigger(
            bonus,
            format!("{}: pattern bonus +{}", charm.name, bonus),
        )))
    }
}

struct TripleThreat;

impl CharmBehavior for TripleThreat {
    fn id(&self) -> &'static str {
        "triple_threat"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        let kind_points: i64 = ctx
            .combinations
            .iter()
            .filter(|combo| combo.kind.is_of_a_kind())
            .map(|combo| combo.points)
            .sum();
        if kind_points == 0 {
            return Ok(None);
        }
        let percent = charm.param_or("percent", 0.5);
        let delta = ensure_finite(charm.behavior_id(), kind_points as f64 * percent)?;
        Ok(Some(trigger(
            delta,
            format!("{}: +{:.0}% of {} ({:+.1})", charm.name, percent * 100.0, kind_points, delta),
        )))
    }
}

struct HotStreak;

impl CharmBehavior for HotStreak {
    fn id(&self) -> &'static str {
        "hot_streak"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        let streak = ctx.round.hot_dice_counter;
        if streak == 0 {
            return Ok(None);
        }
        let delta = charm.param_or("points", 100.0) * streak as f64;
        Ok(Some(trigger(
            delta,
            format!("{}: {} hot dice, +{}", charm.name, streak, delta),
        )))
    }
}

/// Singles never score, everything else earns a bonus.
struct Purist;

impl CharmBehavior for Purist {
    fn id(&self) -> &'static str {
        "purist"
    }

    fn on_scoring(
        &self,
        charm: &CharmInstance,
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<CharmTrigger>, EffectError> {
        let bonus = charm.param_or("bonus", 0.25);
        let delta = ensure_finite(charm.behavior_id(), ctx.base_points as f64 * bonus)?;
        Ok(Some(trigger(
            delta,
            format!("{}: +{:.0}% ({:+.1})", charm.name, bonus * 100.0, delta),
        )))
    }

    fn allows(&self, _charm: &CharmInstance, combination: &ScoringCombination) -> bool {
        combination.kind != CombinationKind::Single
    }
}

struct PiggyBank;

impl CharmBehavior for PiggyBank {
    fn id(&self) -> &'static str {
        "piggy_bank"
    }

    fn on_bank(
        &self,
        charm: &CharmInstance,
        _ctx: &BankContext<'_>,
        banked: f64,
    ) -> Result<Option<BankTrigger>, EffectError> {
        let per = charm.param_or("per", 1000.0);
        if per <= 0.0 {
            return Err(EffectError::InvalidRule {
                source_id: charm.behavior_id().to_string(),
                reason: format!("per must be positive, got {per}"),
            });
        }
        let money = (banked / per).floor() as i64 * charm.param_or("money", 1.0) as i64;
        if money <= 0 {
            return Ok(None);
        }
        Ok(Some(BankTrigger {
            banked,
            money,
            line: format!("{}: +${}", charm.name, money),
            consume_use: false,
        }))
    }
}

struct CompoundInterest;

impl CharmBehavior for CompoundInterest {
    fn id(&self) -> &'static str {
        "compound_interest"
    }

    fn on_bank(
        &self,
        charm: &CharmInstance,
        _ctx: &BankContext<'_>,
        banked: f64,
    ) -> Result<Option<BankTrigger>, EffectError> {
        let mult = charm.param_or("mult", 1.1);
        let next = ensure_finite(charm.behavior_id(), banked * mult)?;
        Ok(Some(BankTrigger {
            banked: next,
            money: 0,
            line: format!("{}: banked x{} ({:.1} -> {:.1})", charm.name, mult, banked, next),
            consume_use: false,
        }))
    }
}

struct HeadStart;

impl CharmBehavior for HeadStart {
    fn id(&self) -> &'static str {
        "head_start"
    }

    fn on_round_start(
        &self,
        charm: &CharmInstance,
        _ctx: &RoundStartContext<'_>,
    ) -> Option<RoundStartTrigger> {
        let points = charm.param_or("points", 200.0) as i64;
        Some(RoundStartTrigger {
            points,
            money: 0,
            line: format!("{}: round starts at {}", charm.name, points),
            consume_use: charm.uses.is_some(),
        })
    }
}

struct Allowance;

impl CharmBehavior for Allowance {
    fn id(&self) -> &'static str {
        "allowance"
    }

    fn on_round_start(
        &self,
        charm: &CharmInstance,
        ctx: &RoundStartContext<'_>,
    ) -> Option<RoundStartTrigger> {
        let every = charm.param_or("every", 1.0).max(1.0) as u32;
        if ctx.round_number % every != 0 {
            return None;
        }
        let money = charm.param_or("money", 2.0) as i64;
        Some(RoundStartTrigger {
            points: 0,
            money,
            line: format!("{}: +${}", charm.name, money),
            consume_use: false,
        })
    }
}
