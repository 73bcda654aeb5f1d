//! Power-up activation, stacking and cooldowns
//!
//! Cooldowns start the moment a power-up is activated. Instant power-ups
//! hand their one-shot boost back to the caller on activation and then sit
//! in an active slot for their nominal duration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_ACTIVE_POWER_UPS;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    ProteinBar,
    Snack,
    PowerNap,
    Vitamins,
    Meditation,
    FlowState,
    DeepFocus,
    ZenMode,
}

/// What a power-up does while it holds a slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PowerUpEffect {
    /// Applied once on activation
    Instant { caffeine: f64, health: f64 },
    /// Multiplicative modifiers for the duration
    Duration(EffectModifiers),
}

/// Modifiers contributed by duration power-ups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectModifiers {
    /// Fraction of crash depth removed, saturating across stacks
    pub crash_reduction: f64,
    /// Fraction of caffeine depletion removed, saturating across stacks
    pub caffeine_depletion_reduction: f64,
    pub productivity_multiplier: f64,
    pub score_multiplier: f64,
    /// Health cannot drop while set
    pub damage_immunity: bool,
}

impl EffectModifiers {
    pub const IDENTITY: EffectModifiers = EffectModifiers {
        crash_reduction: 0.0,
        caffeine_depletion_reduction: 0.0,
        productivity_multiplier: 1.0,
        score_multiplier: 1.0,
        damage_immunity: false,
    };

    /// Stack `other` on top of `self`
    pub fn combine(self, other: EffectModifiers) -> EffectModifiers {
        EffectModifiers {
            crash_reduction: self.crash_reduction.max(other.crash_reduction),
            caffeine_depletion_reduction: self
                .caffeine_depletion_reduction
                .max(other.caffeine_depletion_reduction),
            productivity_multiplier: self.productivity_multiplier * other.productivity_multiplier,
            score_multiplier: self.score_multiplier * other.score_multiplier,
            damage_immunity: self.damage_immunity || other.damage_immunity,
        }
    }

    /// Combined score factor from productivity and score multipliers
    pub fn total_score_multiplier(&self) -> f64 {
        self.productivity_multiplier * self.score_multiplier
    }
}

impl Default for EffectModifiers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Static power-up definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub name: &'static str,
    /// Slot occupancy (ms)
    pub duration: f64,
    /// Before the global multiplier (ms)
    pub cooldown: f64,
    pub effect: PowerUpEffect,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::ProteinBar,
        PowerUpKind::Snack,
        PowerUpKind::PowerNap,
        PowerUpKind::Vitamins,
        PowerUpKind::Meditation,
        PowerUpKind::FlowState,
        PowerUpKind::DeepFocus,
        PowerUpKind::ZenMode,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::ProteinBar => "proteinBar",
            PowerUpKind::Snack => "snack",
            PowerUpKind::PowerNap => "powerNap",
            PowerUpKind::Vitamins => "vitamins",
            PowerUpKind::Meditation => "meditation",
            PowerUpKind::FlowState => "flowState",
            PowerUpKind::DeepFocus => "deepFocus",
            PowerUpKind::ZenMode => "zenMode",
        }
    }

    pub fn definition(self) -> PowerUp {
        let m = EffectModifiers::IDENTITY;
        let (name, duration, cooldown, effect) = match self {
            PowerUpKind::ProteinBar => (
                "Protein Bar",
                5_000.0,
                45_000.0,
                PowerUpEffect::Instant { caffeine: 0.0, health: 15.0 },
            ),
            PowerUpKind::Snack => (
                "Snack",
                3_000.0,
                30_000.0,
                PowerUpEffect::Instant { caffeine: 10.0, health: 0.0 },
            ),
            // The nap costs caffeine
            PowerUpKind::PowerNap => (
                "Power Nap",
                8_000.0,
                90_000.0,
                PowerUpEffect::Instant { caffeine: -15.0, health: 25.0 },
            ),
            PowerUpKind::Vitamins => (
                "Vitamins",
                20_000.0,
                60_000.0,
                PowerUpEffect::Duration(EffectModifiers { crash_reduction: 0.5, ..m }),
            ),
            PowerUpKind::Meditation => (
                "Meditation",
                20_000.0,
                60_000.0,
                PowerUpEffect::Duration(EffectModifiers {
                    caffeine_depletion_reduction: 0.4,
                    ..m
                }),
            ),
            PowerUpKind::FlowState => (
                "Flow State",
                15_000.0,
                75_000.0,
                PowerUpEffect::Duration(EffectModifiers {
                    productivity_multiplier: 1.5,
                    ..m
                }),
            ),
            PowerUpKind::DeepFocus => (
                "Deep Focus",
                15_000.0,
                90_000.0,
                PowerUpEffect::Duration(EffectModifiers { score_multiplier: 2.0, ..m }),
            ),
            PowerUpKind::ZenMode => (
                "Zen Mode",
                10_000.0,
                120_000.0,
                PowerUpEffect::Duration(EffectModifiers { damage_immunity: true, ..m }),
            ),
        };
        PowerUp {
            kind: self,
            name,
            duration,
            cooldown,
            effect,
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for PowerUpKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PowerUpKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownPowerUp(s.to_string()))
    }
}

/// A power-up holding a slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub start_time: f64,
    pub end_time: f64,
}

/// Why an activation was refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationRefusal {
    #[error("power-ups only work during the workday")]
    NotPlaying,
    #[error("power-ups are disabled")]
    Disabled,
    #[error("power-ups are paused")]
    Paused,
    #[error("{0} is already active")]
    AlreadyActive(PowerUpKind),
    #[error("{kind} is recharging for {:.1}s", .remaining_ms / 1000.0)]
    CoolingDown { kind: PowerUpKind, remaining_ms: f64 },
    #[error("all {max} power-up slots are in use")]
    AtCapacity { max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PowerUpNotice {
    Activated(PowerUpKind),
    Expired(PowerUpKind),
    Ready(PowerUpKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerUpSystem {
    enabled: bool,
    paused: bool,
    max_active: usize,
    cooldown_multiplier: f64,
    active: Vec<ActivePowerUp>,
    /// Ready time per kind, indexed by `PowerUpKind::index`
    cooldowns: [Option<f64>; PowerUpKind::COUNT],
    notices: Vec<PowerUpNotice>,
}

impl Default for PowerUpSystem {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTIVE_POWER_UPS, 1.0)
    }
}

impl PowerUpSystem {
    pub fn new(max_active: usize, cooldown_multiplier: f64) -> Self {
        Self {
            enabled: true,
            paused: false,
            max_active: max_active.max(1),
            cooldown_multiplier,
            active: Vec::with_capacity(max_active),
            cooldowns: [None; PowerUpKind::COUNT],
            notices: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_max_active(&mut self, max_active: usize) {
        self.max_active = max_active.max(1);
    }

    pub fn set_cooldown_multiplier(&mut self, multiplier: f64) {
        self.cooldown_multiplier = multiplier;
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    pub fn is_power_up_active(&self, kind: PowerUpKind) -> bool {
        self.active.iter().any(|p| p.kind == kind)
    }

    pub fn active_power_ups(&self) -> &[ActivePowerUp] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Remaining cooldown (ms) for `kind` at `now`
    pub fn cooldown_remaining(&self, kind: PowerUpKind, now: f64) -> f64 {
        self.cooldowns[kind.index()]
            .map(|ready_at| (ready_at - now).max(0.0))
            .unwrap_or(0.0)
    }

    /// Whether `kind` could be activated at `now`
    pub fn can_activate(&self, kind: PowerUpKind, now: f64) -> Result<(), ActivationRefusal> {
        if !self.enabled {
            return Err(ActivationRefusal::Disabled);
        }
        if self.paused {
            return Err(ActivationRefusal::Paused);
        }
        if self.is_power_up_active(kind) {
            return Err(ActivationRefusal::AlreadyActive(kind));
        }
        let remaining_ms = self.cooldown_remaining(kind, now);
        if remaining_ms > 0.0 {
            return Err(ActivationRefusal::CoolingDown { kind, remaining_ms });
        }
        if self.active.len() >= self.max_active {
            return Err(ActivationRefusal::AtCapacity { max: self.max_active });
        }
        Ok(())
    }

    pub fn can_activate_power_up(&self, kind: PowerUpKind, now: f64) -> bool {
        self.can_activate(kind, now).is_ok()
    }

    /// Activate `kind`. Returns the definition so the caller can apply
    /// instant boosts.
    pub fn try_activate(&mut self, kind: PowerUpKind, now: f64) -> Result<PowerUp, ActivationRefusal> {
        self.can_activate(kind, now)?;

        let def = kind.definition();
        self.active.push(ActivePowerUp {
            kind,
            start_time: now,
            end_time: now + def.duration,
        });
        self.cooldowns[kind.index()] = Some(now + def.cooldown * self.cooldown_multiplier);
        self.notices.push(PowerUpNotice::Activated(kind));
        log::info!("Power-up activated: {}", def.name);
        Ok(def)
    }

    pub fn activate_power_up(&mut self, kind: PowerUpKind, now: f64) -> bool {
        self.try_activate(kind, now).is_ok()
    }

    /// Expire finished power-ups and announce lapsed cooldowns
    pub fn update(&mut self, now: f64) {
        if self.paused {
            return;
        }

        let notices = &mut self.notices;
        self.active.retain(|p| {
            let keep = now < p.end_time;
            if !keep {
                notices.push(PowerUpNotice::Expired(p.kind));
                log::debug!("Power-up expired: {}", p.kind);
            }
            keep
        });

        for kind in PowerUpKind::ALL {
            let slot = &mut self.cooldowns[kind.index()];
            if let Some(ready_at) = *slot {
                if now >= ready_at {
                    *slot = None;
                    self.notices.push(PowerUpNotice::Ready(kind));
                    log::debug!("Power-up ready: {}", kind);
                }
            }
        }
    }

    /// Stacked modifiers of every active duration power-up
    pub fn combined_effect(&self) -> EffectModifiers {
        self.active
            .iter()
            .filter_map(|p| match p.kind.definition().effect {
                PowerUpEffect::Duration(m) => Some(m),
                PowerUpEffect::Instant { .. } => None,
            })
            .fold(EffectModifiers::IDENTITY, EffectModifiers::combine)
    }

    pub fn take_notices(&mut self) -> Vec<PowerUpNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Back to a freshly constructed system with the same slot count and
    /// cooldown multiplier
    pub fn reset(&mut self) {
        *self = Self::new(self.max_active, self.cooldown_multiplier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protein_bar_twice_is_refused() {
        let mut p = PowerUpSystem::default();
        assert!(p.activate_power_up(PowerUpKind::ProteinBar, 0.0));
        assert!(!p.activate_power_up(PowerUpKind::ProteinBar, 100.0));
        assert_eq!(p.active_count(), 1);
    }

    #[test]
    fn cooldown_starts_at_activation() {
        let mut p = PowerUpSystem::default();
        p.activate_power_up(PowerUpKind::Snack, 1_000.0);
        assert_eq!(p.cooldown_remaining(PowerUpKind::Snack, 1_000.0), 30_000.0);
        p.update(4_000.0);
        assert!(!p.is_power_up_active(PowerUpKind::Snack));
        assert_eq!(p.cooldown_remaining(PowerUpKind::Snack, 4_000.0), 27_000.0);
        assert!(matches!(
            p.can_activate(PowerUpKind::Snack, 4_000.0),
            Err(ActivationRefusal::CoolingDown { .. })
        ));
    }

    #[test]
    fn ready_notice_fires_once_when_cooldown_lapses() {
        let mut p = PowerUpSystem::new(3, 0.5);
        p.activate_power_up(PowerUpKind::Snack, 0.0);
        p.take_notices();
        p.update(3_000.0);
        assert_eq!(p.take_notices(), vec![PowerUpNotice::Expired(PowerUpKind::Snack)]);
        p.update(15_000.0);
        assert_eq!(p.take_notices(), vec![PowerUpNotice::Ready(PowerUpKind::Snack)]);
        p.update(16_000.0);
        assert!(p.take_notices().is_empty());
        assert!(p.can_activate_power_up(PowerUpKind::Snack, 16_000.0));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut p = PowerUpSystem::new(2, 1.0);
        assert!(p.activate_power_up(PowerUpKind::Vitamins, 0.0));
        assert!(p.activate_power_up(PowerUpKind::Meditation, 0.0));
        assert_eq!(
            p.try_activate(PowerUpKind::FlowState, 0.0),
            Err(ActivationRefusal::AtCapacity { max: 2 })
        );
        assert_eq!(p.active_count(), 2);
    }

    #[test]
    fn reductions_saturate_and_multipliers_multiply() {
        let a = EffectModifiers {
            crash_reduction: 0.5,
            score_multiplier: 2.0,
            ..EffectModifiers::IDENTITY
        };
        let b = EffectModifiers {
            crash_reduction: 0.3,
            caffeine_depletion_reduction: 0.4,
            score_multiplier: 1.5,
            productivity_multiplier: 1.5,
            ..EffectModifiers::IDENTITY
        };
        let c = a.combine(b);
        assert_eq!(c.crash_reduction, 0.5);
        assert_eq!(c.caffeine_depletion_reduction, 0.4);
        assert_eq!(c.score_multiplier, 3.0);
        assert_eq!(c.total_score_multiplier(), 4.5);
        assert!(!c.damage_immunity);
    }

    #[test]
    fn combined_effect_ignores_instant_power_ups() {
        let mut p = PowerUpSystem::new(4, 1.0);
        p.activate_power_up(PowerUpKind::ProteinBar, 0.0);
        assert_eq!(p.combined_effect(), EffectModifiers::IDENTITY);
        p.activate_power_up(PowerUpKind::FlowState, 0.0);
        p.activate_power_up(PowerUpKind::DeepFocus, 0.0);
        p.activate_power_up(PowerUpKind::ZenMode, 0.0);
        let effect = p.combined_effect();
        assert_eq!(effect.total_score_multiplier(), 3.0);
        assert!(effect.damage_immunity);
    }

    #[test]
    fn disabled_or_paused_refuses() {
        let mut p = PowerUpSystem::default();
        p.pause();
        assert_eq!(p.try_activate(PowerUpKind::Snack, 0.0), Err(ActivationRefusal::Paused));
        p.resume();
        p.set_enabled(false);
        assert_eq!(p.try_activate(PowerUpKind::Snack, 0.0), Err(ActivationRefusal::Disabled));
    }

    #[test]
    fn paused_system_keeps_power_ups_running() {
        let mut p = PowerUpSystem::default();
        p.activate_power_up(PowerUpKind::Vitamins, 0.0);
        p.pause();
        p.update(60_000.0);
        assert!(p.is_power_up_active(PowerUpKind::Vitamins));
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut p = PowerUpSystem::new(2, 1.5);
        p.activate_power_up(PowerUpKind::ZenMode, 0.0);
        p.activate_power_up(PowerUpKind::Snack, 0.0);
        p.update(5_000.0);
        p.pause();
        p.set_enabled(false);
        p.reset();
        assert_eq!(p, PowerUpSystem::new(2, 1.5));
        for kind in PowerUpKind::ALL {
            assert_eq!(p.cooldown_remaining(kind, 0.0), 0.0);
        }
    }

    #[test]
    fn unknown_power_up_id_is_reported() {
        assert_eq!("zenmode".parse::<PowerUpKind>(), Ok(PowerUpKind::ZenMode));
        assert!(matches!(
            "coffeeIV".parse::<PowerUpKind>(),
            Err(CoreError::UnknownPowerUp(_))
        ));
    }
}
