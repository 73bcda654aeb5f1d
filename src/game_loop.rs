//! Fixed-timestep driver
//!
//! The host calls [`GameLoop::frame`] from its animation-frame callback with
//! its own timestamp. Raw frame time is clamped, accumulated and drained in
//! fixed steps; each step advances the [`SimClock`] and runs exactly one
//! manager update. The leftover fraction of a step is exposed as an
//! interpolation factor for the renderer.

use serde::{Deserialize, Serialize};

use crate::consts::{FIXED_TIME_STEP, MAX_DELTA_TIME, MAX_SUBSTEPS};
use crate::sim::{GamePhase, GameStateManager, ListenerId, SimClock, StateListener};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// ms per simulation step
    pub fixed_time_step: f64,
    /// Longest frame accepted (ms); longer frames are truncated
    pub max_delta_time: f64,
    /// Steps drained per frame at most
    pub max_substeps: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: FIXED_TIME_STEP,
            max_delta_time: MAX_DELTA_TIME,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

/// What one `frame` call did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub steps: u32,
    /// Fraction of a step left in the accumulator, `[0, 1)`
    pub interpolation: f64,
    /// Clamped frame delta (ms)
    pub raw_delta: f64,
}

pub struct GameLoop {
    manager: GameStateManager,
    clock: SimClock,
    config: LoopConfig,
    accumulator: f64,
    /// Host timestamp of the previous frame
    last_frame: Option<f64>,
    running: bool,
    interpolation: f64,
    total_steps: u64,
}

impl GameLoop {
    pub fn new(manager: GameStateManager, config: LoopConfig) -> Self {
        let config = LoopConfig {
            fixed_time_step: config.fixed_time_step.max(1.0),
            max_delta_time: config.max_delta_time.max(0.0),
            max_substeps: config.max_substeps.max(1),
        };
        Self {
            manager,
            clock: SimClock::new(),
            config,
            accumulator: 0.0,
            last_frame: None,
            running: false,
            interpolation: 0.0,
            total_steps: 0,
        }
    }

    /// Start a session on a fresh clock
    pub fn start(&mut self) -> bool {
        if !self.manager.start_game() {
            return false;
        }
        self.clock = SimClock::new();
        self.accumulator = 0.0;
        self.interpolation = 0.0;
        self.last_frame = None;
        self.running = true;
        // Baseline tick so the first real step has a delta
        self.manager.update(self.clock.now());
        log::debug!("Loop started ({:.2}ms steps)", self.config.fixed_time_step);
        true
    }

    /// Stop draining frames. The session itself is left as is.
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
        self.last_frame = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) -> bool {
        if !self.manager.pause_game() {
            return false;
        }
        self.clock.pause();
        self.accumulator = 0.0;
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.manager.resume_game() {
            return false;
        }
        self.clock.resume();
        // Time spent paused is not simulated
        self.last_frame = None;
        true
    }

    /// Feed one host animation frame
    pub fn frame(&mut self, timestamp: f64) -> FrameStats {
        let raw_delta = match self.last_frame.replace(timestamp) {
            Some(prev) => (timestamp - prev).clamp(0.0, self.config.max_delta_time),
            None => 0.0,
        };

        if !self.running || self.manager.state() != GamePhase::Playing {
            self.accumulator = 0.0;
            self.interpolation = 0.0;
            return FrameStats {
                raw_delta,
                ..FrameStats::default()
            };
        }

        let step = self.config.fixed_time_step;
        self.accumulator += raw_delta;

        let mut steps = 0;
        while self.accumulator >= step && steps < self.config.max_substeps {
            let now = self.clock.advance(step);
            self.manager.update(now);
            self.accumulator -= step;
            steps += 1;

            if self.manager.state() != GamePhase::Playing {
                self.accumulator = 0.0;
                break;
            }
        }
        if steps == self.config.max_substeps && self.accumulator >= step {
            log::warn!("Dropping {:.1}ms of backlog", self.accumulator - self.accumulator % step);
            self.accumulator %= step;
        }

        self.total_steps += u64::from(steps);
        self.interpolation = (self.accumulator / step).clamp(0.0, 1.0);
        FrameStats {
            steps,
            interpolation: self.interpolation,
            raw_delta,
        }
    }

    pub fn interpolation(&self) -> f64 {
        self.interpolation
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Session time (ms)
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn manager(&self) -> &GameStateManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut GameStateManager {
        &mut self.manager
    }

    pub fn subscribe<L: StateListener + 'static>(&mut self, listener: L) -> ListenerId {
        self.manager.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, GameConfig};
    use crate::sim::GameOutcome;

    fn started() -> GameLoop {
        let mut config = GameConfig::with_difficulty(Difficulty::Junior);
        config.features.events = false;
        let mut game = GameLoop::new(GameStateManager::new(config), LoopConfig::default());
        assert!(game.start());
        game
    }

    #[test]
    fn first_frame_is_a_baseline() {
        let mut game = started();
        let stats = game.frame(12_345.0);
        assert_eq!(stats.steps, 0);
        assert_eq!(stats.raw_delta, 0.0);
        assert_eq!(game.now(), 0.0);
    }

    #[test]
    fn frames_drain_in_fixed_steps() {
        let mut game = started();
        game.frame(0.0);
        let stats = game.frame(55.0);
        assert_eq!(stats.steps, 3);
        assert!((game.now() - 3.0 * FIXED_TIME_STEP).abs() < 1e-9);
        assert!(stats.interpolation >= 0.0 && stats.interpolation < 1.0);
        assert!((stats.interpolation - (55.0 - 3.0 * FIXED_TIME_STEP) / FIXED_TIME_STEP).abs() < 1e-9);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut game = started();
        game.frame(0.0);
        let stats = game.frame(10_000.0);
        assert_eq!(stats.raw_delta, MAX_DELTA_TIME);
        // 250ms is fifteen steps give or take float rounding
        assert!((14..=15).contains(&stats.steps));
    }

    #[test]
    fn backwards_timestamps_do_not_step() {
        let mut game = started();
        game.frame(1_000.0);
        let stats = game.frame(500.0);
        assert_eq!(stats.raw_delta, 0.0);
        assert_eq!(stats.steps, 0);
    }

    #[test]
    fn substeps_are_capped() {
        let mut game = GameLoop::new(
            GameStateManager::default(),
            LoopConfig {
                max_delta_time: 1_000.0,
                max_substeps: 4,
                ..LoopConfig::default()
            },
        );
        game.start();
        game.frame(0.0);
        let stats = game.frame(1_000.0);
        assert_eq!(stats.steps, 4);
        assert!(stats.interpolation < 1.0);
    }

    #[test]
    fn paused_loop_freezes_time() {
        let mut game = started();
        game.frame(0.0);
        game.frame(100.0);
        let before = game.now();
        assert!(game.pause());
        for t in 1..100 {
            assert_eq!(game.frame(100.0 + t as f64 * 16.0).steps, 0);
        }
        assert_eq!(game.now(), before);
        assert!(game.resume());
        // Gap since the last frame is not simulated
        assert_eq!(game.frame(60_000.0).steps, 0);
        assert_eq!(game.frame(60_016.0).steps, 0);
        assert!(game.frame(60_040.0).steps > 0);
    }

    #[test]
    fn pause_freezes_cooldowns() {
        use crate::sim::DrinkKind;

        let mut game = started();
        game.frame(0.0);
        game.manager_mut().drink(DrinkKind::Soda).unwrap();
        let before = game.manager().drink_cooldown(DrinkKind::Soda);
        game.pause();
        let mut t = 0.0;
        for _ in 0..500 {
            t += 16.0;
            game.frame(t);
        }
        game.resume();
        assert_eq!(game.manager().drink_cooldown(DrinkKind::Soda), before);
    }

    #[test]
    fn draining_stops_when_game_ends() {
        let mut game = started();
        game.frame(0.0);
        game.manager_mut().end_game(GameOutcome::Quit);
        let stats = game.frame(100.0);
        assert_eq!(stats.steps, 0);
        assert_eq!(game.manager().state(), GamePhase::GameOver);
        assert_eq!(game.interpolation(), 0.0);
    }

    #[test]
    fn a_full_workday_runs_through_the_loop() {
        let mut game = started();
        let mut t = 0.0;
        while game.manager().state() == GamePhase::Playing && t < 400_000.0 {
            let zone = game.manager().optimal_zone();
            let caffeine = game.manager().stats().caffeine;
            game.manager_mut()
                .update_caffeine_level((zone.low + zone.high) / 2.0 - caffeine);
            game.frame(t);
            t += 16.0;
        }
        assert_eq!(game.manager().state(), GamePhase::Victory);
        assert!(game.now() >= 300_000.0 - FIXED_TIME_STEP);
    }
}
