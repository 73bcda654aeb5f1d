//! Drink catalog and effect engine
//!
//! Each consumption registers a [`DrinkEffect`] whose boost follows the
//! drink's release profile, then a crash tail. The engine reports per-tick
//! deltas of every effect's boost curve, so overlapping drinks sum without
//! double counting.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{CRASH_DEPTH_PER_SEVERITY, CRASH_MS_PER_SEVERITY, INSTANT_RELEASE_MS};
use crate::error::CoreError;

/// Shape of a drink's caffeine delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseProfile {
    /// Full boost within the first ~100 ms
    Instant,
    /// Linear ramp over the release window
    Slow,
    /// Bell curve: rises, then settles back toward zero
    Moderate,
}

/// Drink archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrinkKind {
    Espresso,
    Coffee,
    GreenTea,
    EnergyDrink,
    ColdBrew,
    Soda,
    Water,
}

/// Static drink definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Drink {
    pub kind: DrinkKind,
    pub name: &'static str,
    pub caffeine_boost: f64,
    pub release_profile: ReleaseProfile,
    /// Release window (ms)
    pub release_speed: f64,
    /// 0-10
    pub crash_severity: u8,
    /// ms
    pub cooldown: f64,
}

impl DrinkKind {
    pub const ALL: [DrinkKind; 7] = [
        DrinkKind::Espresso,
        DrinkKind::Coffee,
        DrinkKind::GreenTea,
        DrinkKind::EnergyDrink,
        DrinkKind::ColdBrew,
        DrinkKind::Soda,
        DrinkKind::Water,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index for per-kind tables
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrinkKind::Espresso => "espresso",
            DrinkKind::Coffee => "coffee",
            DrinkKind::GreenTea => "greenTea",
            DrinkKind::EnergyDrink => "energyDrink",
            DrinkKind::ColdBrew => "coldBrew",
            DrinkKind::Soda => "soda",
            DrinkKind::Water => "water",
        }
    }

    pub fn definition(self) -> Drink {
        use ReleaseProfile::*;
        let (name, caffeine_boost, release_profile, release_speed, crash_severity, cooldown) =
            match self {
                DrinkKind::Espresso => ("Espresso", 25.0, Instant, 3_000.0, 6, 15_000.0),
                DrinkKind::Coffee => ("Coffee", 20.0, Moderate, 8_000.0, 3, 10_000.0),
                DrinkKind::GreenTea => ("Green Tea", 10.0, Slow, 15_000.0, 1, 8_000.0),
                DrinkKind::EnergyDrink => ("Energy Drink", 40.0, Instant, 4_000.0, 9, 25_000.0),
                DrinkKind::ColdBrew => ("Cold Brew", 30.0, Slow, 20_000.0, 4, 20_000.0),
                DrinkKind::Soda => ("Soda", 12.0, Instant, 2_000.0, 5, 6_000.0),
                DrinkKind::Water => ("Water", -10.0, Instant, 1_000.0, 0, 5_000.0),
            };
        Drink {
            kind: self,
            name,
            caffeine_boost,
            release_profile,
            release_speed,
            crash_severity,
            cooldown,
        }
    }
}

impl fmt::Display for DrinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for DrinkKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrinkKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownDrink(s.to_string()))
    }
}

/// One in-flight consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkEffect {
    pub kind: DrinkKind,
    pub start_time: f64,
    pub peak_time: f64,
    /// Release window ends and the crash begins
    pub crash_time: f64,
    pub end_time: f64,
    /// Boost curve value as of the last update
    pub current_boost: f64,
    pub is_active: bool,
}

impl DrinkEffect {
    fn new(drink: &Drink, start_time: f64) -> Self {
        let crash_time = start_time + drink.release_speed;
        let peak_offset = match drink.release_profile {
            ReleaseProfile::Instant => INSTANT_RELEASE_MS.min(drink.release_speed),
            ReleaseProfile::Slow => drink.release_speed,
            ReleaseProfile::Moderate => drink.release_speed / 2.0,
        };
        Self {
            kind: drink.kind,
            start_time,
            peak_time: start_time + peak_offset,
            crash_time,
            end_time: crash_time + drink.crash_severity as f64 * CRASH_MS_PER_SEVERITY,
            current_boost: 0.0,
            is_active: true,
        }
    }
}

/// Boost curve value `elapsed` ms into the release window
fn release_value(drink: &Drink, elapsed: f64) -> f64 {
    let window = drink.release_speed.max(f64::EPSILON);
    let t = elapsed.clamp(0.0, window);
    match drink.release_profile {
        ReleaseProfile::Instant => {
            let ramp = INSTANT_RELEASE_MS.min(window);
            drink.caffeine_boost * (t / ramp).min(1.0)
        }
        ReleaseProfile::Slow => drink.caffeine_boost * (t / window),
        ReleaseProfile::Moderate => drink.caffeine_boost * (PI * t / window).sin(),
    }
}

/// Full curve value: release, then a crash dip that recovers linearly
pub fn boost_at(drink: &Drink, elapsed: f64, crash_scale: f64) -> f64 {
    let released = release_value(drink, elapsed);
    let crash_window = drink.crash_severity as f64 * CRASH_MS_PER_SEVERITY;
    if elapsed < drink.release_speed || crash_window <= 0.0 {
        return released;
    }
    let progress = ((elapsed - drink.release_speed) / crash_window).min(1.0);
    let depth = drink.crash_severity as f64 * CRASH_DEPTH_PER_SEVERITY * crash_scale;
    released - depth * (1.0 - progress)
}

/// Successful consumption
#[derive(Debug, Clone, PartialEq)]
pub struct DrinkReceipt {
    pub drink: DrinkKind,
    pub caffeine_boost: f64,
    pub message: String,
}

/// Why a drink was refused. `Display` is the player-facing reason.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrinkRefusal {
    #[error("you can only drink during the workday")]
    NotPlaying,
    #[error("no drinks allowed during {event}")]
    Restricted { event: String },
    #[error("{drink} is on cooldown for {:.1}s", .remaining_ms / 1000.0)]
    OnCooldown { drink: DrinkKind, remaining_ms: f64 },
    #[error("unknown drink: {0}")]
    Unknown(String),
}

/// Tracks cooldowns and in-flight effects for every drink
#[derive(Debug, Clone, PartialEq)]
pub struct DrinkEngine {
    /// Ready time per kind, indexed by `DrinkKind::index`
    cooldowns: [Option<f64>; DrinkKind::COUNT],
    effects: Vec<DrinkEffect>,
    crashes_enabled: bool,
}

impl Default for DrinkEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DrinkEngine {
    pub fn new(crashes_enabled: bool) -> Self {
        Self {
            cooldowns: [None; DrinkKind::COUNT],
            effects: Vec::new(),
            crashes_enabled,
        }
    }

    pub fn set_crashes_enabled(&mut self, enabled: bool) {
        self.crashes_enabled = enabled;
    }

    /// Remaining cooldown for `kind` at `now` (ms, 0 when ready)
    pub fn cooldown_remaining(&self, kind: DrinkKind, now: f64) -> f64 {
        self.cooldowns[kind.index()]
            .map(|ready_at| (ready_at - now).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn is_on_cooldown(&self, kind: DrinkKind, now: f64) -> bool {
        self.cooldown_remaining(kind, now) > 0.0
    }

    /// Consume a drink at `timestamp`, starting its cooldown and effect
    pub fn consume_drink(
        &mut self,
        kind: DrinkKind,
        timestamp: f64,
    ) -> Result<DrinkReceipt, DrinkRefusal> {
        let remaining_ms = self.cooldown_remaining(kind, timestamp);
        if remaining_ms > 0.0 {
            return Err(DrinkRefusal::OnCooldown { drink: kind, remaining_ms });
        }

        let drink = kind.definition();
        self.cooldowns[kind.index()] = Some(timestamp + drink.cooldown);
        self.effects.push(DrinkEffect::new(&drink, timestamp));

        log::debug!("{} consumed at {:.0}ms", drink.name, timestamp);
        Ok(DrinkReceipt {
            drink: kind,
            caffeine_boost: drink.caffeine_boost,
            message: format!("{} ({:+.0} caffeine)", drink.name, drink.caffeine_boost),
        })
    }

    /// Net caffeine delta since the previous update, summed over all effects.
    /// `crash_reduction` in `[0, 1]` softens crash tails.
    pub fn update(&mut self, now: f64, crash_reduction: f64) -> f64 {
        let crash_scale = if self.crashes_enabled {
            (1.0 - crash_reduction).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut delta = 0.0;
        for effect in &mut self.effects {
            let drink = effect.kind.definition();
            let elapsed = now.min(effect.end_time) - effect.start_time;
            let value = boost_at(&drink, elapsed, crash_scale);
            delta += value - effect.current_boost;
            effect.current_boost = value;
            effect.is_active = now <= effect.end_time;
        }
        self.effects.retain(|e| e.is_active);
        delta
    }

    pub fn active_effects(&self) -> &[DrinkEffect] {
        &self.effects
    }

    /// Drop all effects and cooldowns
    pub fn reset(&mut self) {
        self.cooldowns = [None; DrinkKind::COUNT];
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the engine from `start` to `end` in `step` ms ticks
    fn run(engine: &mut DrinkEngine, start: f64, end: f64, step: f64) -> f64 {
        let mut total = 0.0;
        let mut t = start;
        while t <= end {
            total += engine.update(t, 0.0);
            t += step;
        }
        total
    }

    #[test]
    fn instant_delivers_within_first_100ms() {
        let mut engine = DrinkEngine::new(false);
        engine.consume_drink(DrinkKind::Espresso, 0.0).unwrap();
        let early = engine.update(100.0, 0.0);
        assert!((early - 25.0).abs() < 1e-9);
        assert_eq!(engine.update(500.0, 0.0), 0.0);
    }

    #[test]
    fn slow_ramps_linearly() {
        let mut engine = DrinkEngine::new(false);
        engine.consume_drink(DrinkKind::GreenTea, 0.0).unwrap();
        let half = engine.update(7_500.0, 0.0);
        assert!((half - 5.0).abs() < 1e-9);
        let rest = engine.update(15_000.0, 0.0);
        assert!((rest - 5.0).abs() < 1e-9);
    }

    #[test]
    fn moderate_rises_then_settles() {
        let mut engine = DrinkEngine::new(false);
        engine.consume_drink(DrinkKind::Coffee, 0.0).unwrap();
        let rise = engine.update(4_000.0, 0.0);
        assert!((rise - 20.0).abs() < 1e-9);
        let fall = engine.update(8_000.0, 0.0);
        assert!((fall + 20.0).abs() < 1e-9);
    }

    #[test]
    fn crash_dips_then_recovers_and_effect_expires() {
        let mut engine = DrinkEngine::new(true);
        engine.consume_drink(DrinkKind::Espresso, 0.0).unwrap();
        engine.update(2_999.0, 0.0);
        // First frame inside the crash window: depth nearly fully applied
        let dip = engine.update(3_001.0, 0.0);
        assert!(dip < -11.0, "expected crash dip, got {dip}");
        // Crash window is 600ms; past the end the penalty is fully recovered
        engine.update(3_700.0, 0.0);
        assert!(engine.active_effects().is_empty());
    }

    #[test]
    fn crash_reduction_scales_depth() {
        let drink = DrinkKind::EnergyDrink.definition();
        let full = boost_at(&drink, drink.release_speed, 1.0);
        let halved = boost_at(&drink, drink.release_speed, 0.5);
        assert!((drink.caffeine_boost - full - 18.0).abs() < 1e-9);
        assert!((drink.caffeine_boost - halved - 9.0).abs() < 1e-9);
    }

    #[test]
    fn total_delivery_matches_profile_net() {
        let mut engine = DrinkEngine::new(true);
        engine.consume_drink(DrinkKind::ColdBrew, 0.0).unwrap();
        let total = run(&mut engine, 0.0, 25_000.0, 16.0);
        assert!((total - 30.0).abs() < 1e-6, "got {total}");
    }

    #[test]
    fn concurrent_effects_sum() {
        let mut engine = DrinkEngine::new(false);
        engine.consume_drink(DrinkKind::Espresso, 0.0).unwrap();
        engine.consume_drink(DrinkKind::Soda, 0.0).unwrap();
        let delta = engine.update(200.0, 0.0);
        assert!((delta - 37.0).abs() < 1e-9);
    }

    #[test]
    fn cooldown_refuses_with_remaining_time() {
        let mut engine = DrinkEngine::default();
        engine.consume_drink(DrinkKind::Coffee, 1_000.0).unwrap();
        let err = engine.consume_drink(DrinkKind::Coffee, 5_000.0).unwrap_err();
        match &err {
            DrinkRefusal::OnCooldown { remaining_ms, .. } => assert_eq!(*remaining_ms, 6_000.0),
            other => panic!("unexpected refusal {other:?}"),
        }
        assert_eq!(err.to_string(), "Coffee is on cooldown for 6.0s");
        assert!(engine.consume_drink(DrinkKind::Coffee, 11_000.0).is_ok());
    }

    #[test]
    fn cooldown_ends_exactly_at_ready_time() {
        let mut engine = DrinkEngine::default();
        assert!(!engine.is_on_cooldown(DrinkKind::Soda, 0.0));
        engine.consume_drink(DrinkKind::Soda, 2_000.0).unwrap();
        assert!(engine.is_on_cooldown(DrinkKind::Soda, 7_999.0));
        assert!(!engine.is_on_cooldown(DrinkKind::Soda, 8_000.0));
        assert!(!engine.is_on_cooldown(DrinkKind::Water, 2_000.0));
    }

    #[test]
    fn unknown_drink_id_is_reported() {
        assert_eq!("coldbrew".parse::<DrinkKind>(), Ok(DrinkKind::ColdBrew));
        assert_eq!(
            "mate".parse::<DrinkKind>(),
            Err(CoreError::UnknownDrink("mate".to_string()))
        );
    }

    #[test]
    fn reset_matches_fresh_engine() {
        let mut engine = DrinkEngine::default();
        engine.consume_drink(DrinkKind::Soda, 0.0).unwrap();
        engine.update(50.0, 0.0);
        engine.reset();
        assert_eq!(engine, DrinkEngine::default());
    }
}
