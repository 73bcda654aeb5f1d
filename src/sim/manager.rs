//! Game state manager
//!
//! Single writer of [`GameStateData`]. Owns the drink engine, event
//! scheduler, power-up system and scoring engine, and composes their output
//! into the stats once per tick in a fixed order:
//!
//! 1. clocks
//! 2. events, then power-ups (modifiers and notices)
//! 3. drink deltas and caffeine depletion
//! 4. zone membership and streak
//! 5. health, then score and milestones
//! 6. end conditions
//! 7. listener notification
//!
//! Calls that are illegal in the current phase are ignored and return
//! `false`; nothing here panics for gameplay input.

use super::drinks::{DrinkEngine, DrinkKind, DrinkReceipt, DrinkRefusal};
use super::events::{ActiveEvent, EventKind, EventScheduler};
use super::notice::GameNotice;
use super::powerups::{ActivationRefusal, PowerUpEffect, PowerUpKind, PowerUpSystem};
use super::scoring::{GameOutcome, ScoreBreakdown, ScoringEngine, SessionSummary, evaluate_achievements};
use super::state::{GamePhase, GameSnapshot, GameStateData, GameStats, OptimalZone};
use crate::clamp_resource;
use crate::config::{ConfigPatch, Difficulty, GameConfig};
use crate::consts::*;
use crate::error::CoreError;
use crate::highscores::HighScoreEntry;
use crate::persistence::{Persistence, StatisticsUpdate};

/// Receives a snapshot after every mutation
pub trait StateListener {
    fn notify(&mut self, snapshot: &GameSnapshot);
}

impl<F: FnMut(&GameSnapshot)> StateListener for F {
    fn notify(&mut self, snapshot: &GameSnapshot) {
        self(snapshot)
    }
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct GameStateManager {
    data: GameStateData,
    drinks: DrinkEngine,
    events: EventScheduler,
    power_ups: PowerUpSystem,
    scoring: ScoringEngine,
    persistence: Option<Box<dyn Persistence>>,
    listeners: Vec<(ListenerId, Box<dyn StateListener>)>,
    next_listener_id: u64,
    /// Collected since the last notification
    notices: Vec<GameNotice>,
}

impl Default for GameStateManager {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl GameStateManager {
    pub fn new(config: GameConfig) -> Self {
        let mut manager = Self {
            drinks: DrinkEngine::new(config.features.crashes),
            events: EventScheduler::new(config.difficulty, config.seed),
            power_ups: PowerUpSystem::new(config.max_active_power_ups, config.cooldown_multiplier),
            scoring: ScoringEngine::new(config.difficulty),
            data: GameStateData::new(config),
            persistence: None,
            listeners: Vec::new(),
            next_listener_id: 1,
            notices: Vec::new(),
        };
        manager.sync_subsystems();
        manager
    }

    /// Attach a storage backend used at game end
    pub fn with_persistence(mut self, persistence: Box<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn set_persistence(&mut self, persistence: Option<Box<dyn Persistence>>) {
        self.persistence = persistence;
    }

    pub fn persistence(&self) -> Option<&dyn Persistence> {
        self.persistence.as_deref()
    }

    // === Observation ===

    pub fn state(&self) -> GamePhase {
        self.data.phase
    }

    pub fn stats(&self) -> &GameStats {
        &self.data.stats
    }

    pub fn config(&self) -> &GameConfig {
        &self.data.config
    }

    pub fn data(&self) -> &GameStateData {
        &self.data
    }

    /// Session time of the last update (ms)
    pub fn now(&self) -> f64 {
        self.data.clock.last_update_time.unwrap_or(0.0)
    }

    pub fn optimal_zone(&self) -> OptimalZone {
        OptimalZone::new(
            self.data.config.difficulty,
            self.events.current_effect().optimal_zone_shift,
        )
    }

    pub fn active_event(&self) -> Option<&ActiveEvent> {
        self.events.active_event()
    }

    pub fn events(&self) -> &EventScheduler {
        &self.events
    }

    pub fn power_ups(&self) -> &PowerUpSystem {
        &self.power_ups
    }

    pub fn drinks(&self) -> &DrinkEngine {
        &self.drinks
    }

    pub fn drink_cooldown(&self, kind: DrinkKind) -> f64 {
        self.drinks.cooldown_remaining(kind, self.now())
    }

    pub fn power_up_cooldown(&self, kind: PowerUpKind) -> f64 {
        self.power_ups.cooldown_remaining(kind, self.now())
    }

    /// Copy of the current state, including notices not yet delivered
    pub fn snapshot(&self) -> GameSnapshot {
        self.build_snapshot(self.notices.clone())
    }

    pub fn subscribe<L: StateListener + 'static>(&mut self, listener: L) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // === State machine ===

    /// Menu -> Playing with a fresh session
    pub fn start_game(&mut self) -> bool {
        if self.data.phase != GamePhase::Menu {
            log::debug!("start_game ignored in {:?}", self.data.phase);
            return false;
        }

        self.reset_session();
        self.set_phase(GamePhase::Playing);
        log::info!(
            "Clocked in: {} ({}h workday)",
            self.data.config.difficulty.as_str(),
            self.data.config.difficulty.workday_length()
        );
        self.notify_listeners();
        true
    }

    pub fn pause_game(&mut self) -> bool {
        if self.data.phase != GamePhase::Playing {
            log::debug!("pause_game ignored in {:?}", self.data.phase);
            return false;
        }
        self.events.pause();
        self.power_ups.pause();
        self.set_phase(GamePhase::Paused);
        self.notify_listeners();
        true
    }

    pub fn resume_game(&mut self) -> bool {
        if self.data.phase != GamePhase::Paused {
            log::debug!("resume_game ignored in {:?}", self.data.phase);
            return false;
        }
        self.events.resume();
        self.power_ups.resume();
        self.data.clock.resume_pending = true;
        self.set_phase(GamePhase::Playing);
        self.notify_listeners();
        true
    }

    /// Playing -> Victory or GameOver
    pub fn end_game(&mut self, outcome: GameOutcome) -> bool {
        if self.data.phase != GamePhase::Playing {
            log::debug!("end_game ignored in {:?}", self.data.phase);
            return false;
        }
        self.finish(outcome);
        self.notify_listeners();
        true
    }

    /// Paused or finished -> Menu, discarding the session
    pub fn return_to_menu(&mut self) -> bool {
        if !(self.data.phase == GamePhase::Paused || self.data.phase.is_terminal()) {
            log::debug!("return_to_menu ignored in {:?}", self.data.phase);
            return false;
        }
        self.reset_session();
        self.set_phase(GamePhase::Menu);
        self.notify_listeners();
        true
    }

    // === Configuration ===

    /// Only allowed from the menu
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.data.phase != GamePhase::Menu {
            log::debug!("set_difficulty ignored in {:?}", self.data.phase);
            return false;
        }
        self.data.config.difficulty = difficulty;
        self.sync_subsystems();
        self.refresh_zone();
        self.notify_listeners();
        true
    }

    /// Apply a validated partial config. Difficulty, seed and slot count
    /// only change from the menu.
    pub fn set_config(&mut self, patch: ConfigPatch) -> Result<(), CoreError> {
        let mut patch = patch;
        if self.data.phase != GamePhase::Menu {
            if patch.difficulty.is_some()
                || patch.seed.is_some()
                || patch.max_active_power_ups.is_some()
            {
                log::debug!("session-shaping config ignored in {:?}", self.data.phase);
            }
            patch.difficulty = None;
            patch.seed = None;
            patch.max_active_power_ups = None;
        }
        self.data.config.apply(&patch)?;
        self.sync_subsystems();
        self.collect_notices();
        self.refresh_zone();
        self.notify_listeners();
        Ok(())
    }

    // === Player actions ===

    /// Shift caffeine by `delta`, clamped to the resource bounds
    pub fn update_caffeine_level(&mut self, delta: f64) -> bool {
        if self.data.phase != GamePhase::Playing {
            return false;
        }
        self.add_caffeine(delta);
        self.refresh_zone();
        self.notify_listeners();
        true
    }

    /// Count a drink and apply `amount` caffeine immediately
    pub fn consume_drink(&mut self, amount: f64) -> bool {
        if self.data.phase != GamePhase::Playing {
            return false;
        }
        self.data.stats.drinks_consumed += 1;
        self.add_caffeine(amount);
        self.refresh_zone();
        self.notify_listeners();
        true
    }

    /// Drink `kind`; its caffeine arrives over the following ticks
    pub fn drink(&mut self, kind: DrinkKind) -> Result<DrinkReceipt, DrinkRefusal> {
        if self.data.phase != GamePhase::Playing {
            return Err(DrinkRefusal::NotPlaying);
        }
        if let Some(event) = self.events.active_event().copied() {
            if event.kind.definition().effect.drink_restriction {
                return Err(DrinkRefusal::Restricted {
                    event: event.kind.to_string(),
                });
            }
        }

        let now = self.now();
        let receipt = self.drinks.consume_drink(kind, now)?;
        self.data.stats.drinks_consumed += 1;
        self.notices.push(GameNotice::DrinkConsumed(kind));
        self.notify_listeners();
        Ok(receipt)
    }

    /// `drink` by string id
    pub fn drink_by_id(&mut self, id: &str) -> Result<DrinkReceipt, DrinkRefusal> {
        let kind: DrinkKind = id
            .parse()
            .map_err(|_| DrinkRefusal::Unknown(id.to_string()))?;
        self.drink(kind)
    }

    pub fn try_activate_power_up(&mut self, kind: PowerUpKind) -> Result<(), ActivationRefusal> {
        if self.data.phase != GamePhase::Playing {
            return Err(ActivationRefusal::NotPlaying);
        }

        let now = self.now();
        let def = self.power_ups.try_activate(kind, now)?;
        if let PowerUpEffect::Instant { caffeine, health } = def.effect {
            self.add_caffeine(caffeine);
            self.data.stats.health =
                clamp_resource(self.data.stats.health + health, HEALTH_MIN, HEALTH_MAX);
            self.refresh_zone();
        }
        self.collect_notices();
        self.notify_listeners();
        Ok(())
    }

    pub fn activate_power_up(&mut self, kind: PowerUpKind) -> bool {
        self.try_activate_power_up(kind).is_ok()
    }

    /// `activate_power_up` by string id
    pub fn activate_power_up_by_id(&mut self, id: &str) -> Result<bool, CoreError> {
        let kind: PowerUpKind = id.parse()?;
        Ok(self.activate_power_up(kind))
    }

    /// Debug hook: start `kind` immediately at `time`
    pub fn force_event(&mut self, kind: EventKind, time: f64) {
        self.events.force_event(kind, time);
        self.collect_notices();
        self.refresh_zone();
        self.notify_listeners();
    }

    pub fn force_event_by_id(&mut self, id: &str, time: f64) -> Result<(), CoreError> {
        let kind: EventKind = id.parse()?;
        self.force_event(kind, time);
        Ok(())
    }

    // === Tick ===

    /// Advance the session to the caller's timestamp `current_time` (ms).
    /// Only mutates while playing; time between a pause and the first update
    /// after resume is never simulated.
    pub fn update(&mut self, current_time: f64) {
        if self.data.phase != GamePhase::Playing {
            return;
        }

        let clock = &mut self.data.clock;
        let current_time = clock.session_time(current_time);
        let delta_ms = match clock.last_update_time.replace(current_time) {
            Some(prev) => (current_time - prev).max(0.0),
            None => 0.0,
        };
        clock.start_time.get_or_insert(current_time);
        let dt = delta_ms / 1000.0;
        let difficulty = self.data.config.difficulty;

        clock.real_time_elapsed += delta_ms;
        clock.game_time += dt * difficulty.time_scale();
        self.data.stats.time_elapsed += dt;

        // Modifiers
        self.events.update(current_time);
        self.power_ups.update(current_time);
        self.collect_notices();
        let event = self.events.current_effect();
        let boosts = self.power_ups.combined_effect();

        // Caffeine
        let drink_delta = self.drinks.update(current_time, boosts.crash_reduction);
        let depletion = difficulty.caffeine_depletion_rate()
            * dt
            * event.caffeine_multiplier
            * (1.0 - boosts.caffeine_depletion_reduction).max(0.0);
        self.add_caffeine(drink_delta - depletion);

        // Zone and streak
        let in_zone = self.refresh_zone();
        let stats = &mut self.data.stats;
        if in_zone {
            stats.streak += dt;
            stats.max_streak = stats.max_streak.max(stats.streak);
        }

        // Health
        if !in_zone && !boosts.damage_immunity {
            stats.health = clamp_resource(
                stats.health - HEALTH_DEPLETION_RATE * dt * event.health_multiplier,
                HEALTH_MIN,
                HEALTH_MAX,
            );
        }

        // Score
        let before = stats.score;
        stats.score += self.scoring.tick_score(
            dt,
            in_zone,
            stats.streak,
            boosts.total_score_multiplier(),
        );
        for milestone in self.scoring.check_milestones(before, stats.score) {
            log::info!("Milestone reached: {}", milestone);
            self.notices.push(GameNotice::Milestone(milestone));
        }

        // End conditions
        if self.data.clock.game_time >= difficulty.workday_minutes() {
            self.finish(GameOutcome::Victory);
        } else if self.data.stats.health <= HEALTH_MIN {
            let outcome = if self.data.stats.caffeine >= CAFFEINE_MAX - EXPLOSION_MARGIN {
                GameOutcome::Explosion
            } else {
                GameOutcome::PassOut
            };
            self.finish(outcome);
        }

        self.notify_listeners();
    }

    // === Internals ===

    fn add_caffeine(&mut self, delta: f64) {
        let stats = &mut self.data.stats;
        stats.caffeine = clamp_resource(stats.caffeine + delta, CAFFEINE_MIN, CAFFEINE_MAX);
    }

    /// Re-derive zone membership; the streak drops to zero outside it
    fn refresh_zone(&mut self) -> bool {
        let in_zone = self.optimal_zone().contains(self.data.stats.caffeine);
        let stats = &mut self.data.stats;
        if stats.is_in_optimal_zone != in_zone && self.data.phase == GamePhase::Playing {
            self.notices.push(if in_zone {
                GameNotice::EnteredZone
            } else {
                GameNotice::LeftZone
            });
        }
        if !in_zone {
            stats.streak = 0.0;
        }
        stats.is_in_optimal_zone = in_zone;
        in_zone
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.data.phase;
        if from != to {
            self.data.phase = to;
            self.notices.push(GameNotice::PhaseChanged { from, to });
            log::debug!("Phase {:?} -> {:?}", from, to);
        }
    }

    /// Fresh stats and subsystems, same config
    fn reset_session(&mut self) {
        self.data.reset();
        self.drinks.reset();
        let config = &self.data.config;
        self.events = EventScheduler::new(config.difficulty, config.seed);
        self.power_ups = PowerUpSystem::new(config.max_active_power_ups, config.cooldown_multiplier);
        self.scoring = ScoringEngine::new(config.difficulty);
        self.sync_subsystems();
    }

    /// Push config values down into the subsystems
    fn sync_subsystems(&mut self) {
        let config = &self.data.config;
        self.drinks.set_crashes_enabled(config.features.crashes);
        self.events.set_difficulty(config.difficulty);
        self.events.set_enabled(config.features.events);
        self.power_ups.set_enabled(config.features.power_ups);
        self.power_ups.set_max_active(config.max_active_power_ups);
        self.power_ups.set_cooldown_multiplier(config.cooldown_multiplier);
        self.scoring.set_difficulty(config.difficulty);
    }

    fn collect_notices(&mut self) {
        self.notices
            .extend(self.events.take_notices().into_iter().map(GameNotice::from));
        self.notices
            .extend(self.power_ups.take_notices().into_iter().map(GameNotice::from));
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.set_phase(if outcome.is_victory() {
            GamePhase::Victory
        } else {
            GamePhase::GameOver
        });
        self.events.pause();
        self.power_ups.pause();

        let stats = &self.data.stats;
        let breakdown = self.scoring.calculate_final_score(
            stats.score,
            stats.max_streak,
            stats.health,
            outcome,
        );
        self.data.outcome = Some(outcome);
        self.data.final_score = Some(breakdown);
        self.notices.push(GameNotice::GameEnded(outcome));
        log::info!(
            "Workday over: {:?}, score {:.0} (rank {})",
            outcome,
            breakdown.total,
            breakdown.rank.info().label
        );

        self.record_session(outcome, &breakdown);
    }

    /// Report the finished session to persistence, if any
    fn record_session(&mut self, outcome: GameOutcome, breakdown: &ScoreBreakdown) {
        let Some(store) = self.persistence.as_deref_mut() else {
            return;
        };
        let stats = &self.data.stats;
        let config = &self.data.config;

        let entry = HighScoreEntry {
            score: breakdown.total.max(0.0).round() as u64,
            difficulty: config.difficulty,
            outcome,
            game_minutes: self.data.clock.game_time,
            timestamp: self.data.clock.last_update_time.unwrap_or(0.0),
        };
        if let Some(rank) = store.add_high_score(entry) {
            log::info!("New high score, rank #{}", rank);
            self.notices.push(GameNotice::NewHighScore { rank });
        }

        store.update_statistics(StatisticsUpdate {
            games_played: 1,
            victories: u32::from(outcome.is_victory()),
            drinks: stats.drinks_consumed,
            play_time: stats.time_elapsed,
            score: Some(breakdown.total),
            streak: Some(stats.max_streak),
        });

        if !config.features.achievements {
            return;
        }
        let summary = SessionSummary {
            outcome,
            difficulty: config.difficulty,
            final_score: breakdown.total,
            health: stats.health,
            max_streak_secs: stats.max_streak,
            drinks_consumed: stats.drinks_consumed,
            games_played: store.statistics().games_played,
        };
        for id in evaluate_achievements(&summary) {
            if store.unlock_achievement(id) {
                log::info!("Achievement unlocked: {}", id.title());
                self.notices.push(GameNotice::AchievementUnlocked(id));
            }
        }
    }

    fn build_snapshot(&self, notices: Vec<GameNotice>) -> GameSnapshot {
        GameSnapshot {
            data: self.data.clone(),
            optimal_zone: self.optimal_zone(),
            active_event: self.events.active_event().copied(),
            upcoming_event: self.events.scheduled_event().copied(),
            active_power_ups: self.power_ups.active_power_ups().to_vec(),
            power_up_effect: self.power_ups.combined_effect(),
            drink_effects: self.drinks.active_effects().to_vec(),
            notices,
        }
    }

    fn notify_listeners(&mut self) {
        let notices = std::mem::take(&mut self.notices);
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.build_snapshot(notices);
        for (_, listener) in self.listeners.iter_mut() {
            listener.notify(&snapshot);
        }
    }
}
