//! Random workplace events
//!
//! At most one event is pending or active at a time. A scheduled event
//! warns `warning_time` before it starts, applies its modifiers while
//! active, then clears and the next one is scheduled. The scheduler only
//! publishes modifiers; it never touches stats.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::error::CoreError;

/// Base interval between events before difficulty scaling (ms)
pub const MIN_EVENT_INTERVAL: f64 = 45_000.0;
pub const MAX_EVENT_INTERVAL: f64 = 90_000.0;

/// Recent event ids kept for anti-repetition
pub const EVENT_HISTORY_LEN: usize = 4;
/// How many of the most recent events are excluded from the next draw
pub const EVENT_NO_REPEAT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    MorningMeeting,
    Deadline,
    CodeReview,
    LunchBreak,
    ServerOutage,
    FireDrill,
    BirthdayCake,
}

/// Modifiers an event applies to the depletion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    pub caffeine_multiplier: f64,
    pub health_multiplier: f64,
    /// Moves the optimal zone center
    pub optimal_zone_shift: f64,
    pub drink_restriction: bool,
}

impl EventEffect {
    /// No event running
    pub const NEUTRAL: EventEffect = EventEffect {
        caffeine_multiplier: 1.0,
        health_multiplier: 1.0,
        optimal_zone_shift: 0.0,
        drink_restriction: false,
    };
}

impl Default for EventEffect {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Static event definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameEvent {
    pub kind: EventKind,
    pub name: &'static str,
    pub description: &'static str,
    /// ms
    pub duration: f64,
    /// ms of notice before start
    pub warning_time: f64,
    pub effect: EventEffect,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::MorningMeeting,
        EventKind::Deadline,
        EventKind::CodeReview,
        EventKind::LunchBreak,
        EventKind::ServerOutage,
        EventKind::FireDrill,
        EventKind::BirthdayCake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MorningMeeting => "morningMeeting",
            EventKind::Deadline => "deadline",
            EventKind::CodeReview => "codeReview",
            EventKind::LunchBreak => "lunchBreak",
            EventKind::ServerOutage => "serverOutage",
            EventKind::FireDrill => "fireDrill",
            EventKind::BirthdayCake => "birthdayCake",
        }
    }

    pub fn definition(self) -> GameEvent {
        let (name, description, duration, warning_time, caffeine, health, shift, restricted) =
            match self {
                EventKind::MorningMeeting => (
                    "Morning Meeting",
                    "An hour of slides. Caffeine drains twice as fast and the mugs stay outside.",
                    30_000.0, 5_000.0, 2.0, 1.0, 0.0, true,
                ),
                EventKind::Deadline => (
                    "Deadline",
                    "Ship it by end of day. You need more caffeine to keep up.",
                    25_000.0, 4_000.0, 1.5, 1.5, 10.0, false,
                ),
                EventKind::CodeReview => (
                    "Code Review",
                    "Forty comments on a one-line change.",
                    20_000.0, 3_000.0, 1.2, 1.0, 5.0, false,
                ),
                EventKind::LunchBreak => (
                    "Lunch Break",
                    "Food slows everything down.",
                    20_000.0, 5_000.0, 0.5, 0.5, -5.0, false,
                ),
                EventKind::ServerOutage => (
                    "Server Outage",
                    "Production is down and everyone is looking at you.",
                    15_000.0, 3_000.0, 1.8, 2.0, 15.0, false,
                ),
                EventKind::FireDrill => (
                    "Fire Drill",
                    "Everybody out. No drinks on the stairs.",
                    15_000.0, 5_000.0, 1.0, 1.0, 0.0, true,
                ),
                EventKind::BirthdayCake => (
                    "Birthday Cake",
                    "Sugar in the break room. Ease off the caffeine.",
                    15_000.0, 4_000.0, 0.8, 1.0, -10.0, false,
                ),
            };
        GameEvent {
            kind: self,
            name,
            description,
            duration,
            warning_time,
            effect: EventEffect {
                caffeine_multiplier: caffeine,
                health_multiplier: health,
                optimal_zone_shift: shift,
                drink_restriction: restricted,
            },
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for EventKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownEvent(s.to_string()))
    }
}

/// A running event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub kind: EventKind,
    pub start_time: f64,
    pub end_time: f64,
    pub is_active: bool,
}

/// An event waiting for its start time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub kind: EventKind,
    pub start_time: f64,
    pub warned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EventSlot {
    Unscheduled,
    Scheduled(ScheduledEvent),
    Active(ActiveEvent),
}

/// Lifecycle notifications produced by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventNotice {
    Warning { kind: EventKind, starts_at: f64 },
    Started(EventKind),
    Ended(EventKind),
}

#[derive(Debug, Clone)]
pub struct EventScheduler {
    seed: u64,
    rng: Pcg32,
    difficulty: Difficulty,
    enabled: bool,
    paused: bool,
    slot: EventSlot,
    history: VecDeque<EventKind>,
    notices: Vec<EventNotice>,
}

impl EventScheduler {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            difficulty,
            enabled: true,
            paused: false,
            slot: EventSlot::Unscheduled,
            history: VecDeque::with_capacity(EVENT_HISTORY_LEN),
            notices: Vec::new(),
        }
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Disabling ends a running event and drops a pending one
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            match self.slot {
                EventSlot::Active(active) => self.finish_event(active.kind),
                EventSlot::Scheduled(_) => self.slot = EventSlot::Unscheduled,
                EventSlot::Unscheduled => {}
            }
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Interval bounds (ms) after difficulty scaling
    pub fn interval_bounds(&self) -> (f64, f64) {
        let freq = self.difficulty.event_frequency();
        (MIN_EVENT_INTERVAL / freq, MAX_EVENT_INTERVAL / freq)
    }

    /// Advance the scheduler to `now`
    pub fn update(&mut self, now: f64) {
        if self.paused {
            return;
        }
        if !self.enabled {
            // A forced event still runs to its end; nothing new is scheduled
            if let EventSlot::Active(active) = self.slot {
                if now >= active.end_time {
                    self.finish_event(active.kind);
                }
            }
            return;
        }

        match self.slot {
            EventSlot::Unscheduled => self.schedule_next(now),
            EventSlot::Scheduled(mut pending) => {
                let warning_at = pending.start_time - pending.kind.definition().warning_time;
                if !pending.warned && now >= warning_at {
                    pending.warned = true;
                    self.notices.push(EventNotice::Warning {
                        kind: pending.kind,
                        starts_at: pending.start_time,
                    });
                    log::info!(
                        "Heads up: {} in {:.1}s",
                        pending.kind,
                        (pending.start_time - now).max(0.0) / 1000.0
                    );
                }
                if now >= pending.start_time {
                    self.start_event(pending.kind, pending.start_time);
                } else {
                    self.slot = EventSlot::Scheduled(pending);
                }
            }
            EventSlot::Active(active) => {
                if now >= active.end_time {
                    self.finish_event(active.kind);
                    self.schedule_next(now);
                }
            }
        }
    }

    /// Replace whatever is pending or running with `kind`, active at `time`
    pub fn force_event(&mut self, kind: EventKind, time: f64) {
        if let EventSlot::Active(active) = self.slot {
            self.finish_event(active.kind);
        }
        self.start_event(kind, time);
    }

    pub fn active_event(&self) -> Option<&ActiveEvent> {
        match &self.slot {
            EventSlot::Active(active) => Some(active),
            _ => None,
        }
    }

    pub fn scheduled_event(&self) -> Option<&ScheduledEvent> {
        match &self.slot {
            EventSlot::Scheduled(pending) => Some(pending),
            _ => None,
        }
    }

    /// Modifiers in force right now
    pub fn current_effect(&self) -> EventEffect {
        self.active_event()
            .map(|e| e.kind.definition().effect)
            .unwrap_or(EventEffect::NEUTRAL)
    }

    pub fn are_drinks_restricted(&self) -> bool {
        self.current_effect().drink_restriction
    }

    /// Most recent last
    pub fn history(&self) -> impl Iterator<Item = &EventKind> {
        self.history.iter()
    }

    pub fn take_notices(&mut self) -> Vec<EventNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Back to a freshly constructed scheduler (same seed and difficulty).
    /// The enabled flag returns to its default too.
    pub fn reset(&mut self) {
        *self = Self::new(self.difficulty, self.seed);
    }

    fn start_event(&mut self, kind: EventKind, time: f64) {
        let def = kind.definition();
        self.slot = EventSlot::Active(ActiveEvent {
            kind,
            start_time: time,
            end_time: time + def.duration,
            is_active: true,
        });
        self.notices.push(EventNotice::Started(kind));
        log::info!("Event started: {} ({:.0}s)", def.name, def.duration / 1000.0);
    }

    fn finish_event(&mut self, kind: EventKind) {
        if self.history.len() == EVENT_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(kind);
        self.slot = EventSlot::Unscheduled;
        self.notices.push(EventNotice::Ended(kind));
        log::info!("Event ended: {}", kind);
    }

    fn schedule_next(&mut self, now: f64) {
        let kind = self.pick_event();
        let (min, max) = self.interval_bounds();
        let start_time = now + self.rng.random_range(min..=max);
        self.slot = EventSlot::Scheduled(ScheduledEvent {
            kind,
            start_time,
            warned: false,
        });
        log::debug!("Next event {} scheduled at {:.0}ms", kind, start_time);
    }

    /// Random pick that skips the most recent events while enough remain
    fn pick_event(&mut self) -> EventKind {
        let recent: Vec<EventKind> = self
            .history
            .iter()
            .rev()
            .take(EVENT_NO_REPEAT)
            .copied()
            .collect();
        let fresh: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|k| !recent.contains(k))
            .collect();
        let pool: &[EventKind] = if fresh.len() >= 2 {
            &fresh
        } else {
            &EventKind::ALL
        };
        pool[self.rng.random_range(0..pool.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(s: &EventScheduler) -> ScheduledEvent {
        *s.scheduled_event().expect("an event should be scheduled")
    }

    #[test]
    fn forced_meeting_restricts_drinks_and_doubles_depletion() {
        let mut s = EventScheduler::new(Difficulty::Junior, 7);
        s.force_event(EventKind::MorningMeeting, 1_000.0);
        assert!(s.are_drinks_restricted());
        assert_eq!(s.current_effect().caffeine_multiplier, 2.0);
        assert_eq!(s.active_event().map(|e| e.end_time), Some(31_000.0));
    }

    #[test]
    fn schedules_within_scaled_bounds() {
        for d in Difficulty::ALL {
            let mut s = EventScheduler::new(d, 42);
            s.update(10_000.0);
            let (min, max) = s.interval_bounds();
            let start = scheduled(&s).start_time;
            assert!(start >= 10_000.0 + min && start <= 10_000.0 + max);
        }
        let intern = EventScheduler::new(Difficulty::Intern, 1).interval_bounds();
        let founder = EventScheduler::new(Difficulty::Founder, 1).interval_bounds();
        assert!(founder.1 < intern.1);
    }

    #[test]
    fn phases_fire_each_notice_once() {
        let mut s = EventScheduler::new(Difficulty::Intern, 3);
        s.update(0.0);
        let pending = scheduled(&s);
        let def = pending.kind.definition();
        assert!(s.take_notices().is_empty());

        let warn_at = pending.start_time - def.warning_time;
        s.update(warn_at);
        s.update(warn_at + 10.0);
        let notices = s.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], EventNotice::Warning { kind, .. } if kind == pending.kind));
        assert_eq!(s.current_effect(), EventEffect::NEUTRAL);

        s.update(pending.start_time);
        assert_eq!(s.take_notices(), vec![EventNotice::Started(pending.kind)]);
        assert_eq!(s.current_effect(), def.effect);

        s.update(pending.start_time + def.duration);
        assert_eq!(s.take_notices(), vec![EventNotice::Ended(pending.kind)]);
        assert!(s.active_event().is_none());
        assert!(s.scheduled_event().is_some());
        assert_eq!(s.history().last(), Some(&pending.kind));
    }

    #[test]
    fn coarse_tick_past_start_still_warns() {
        let mut s = EventScheduler::new(Difficulty::Intern, 9);
        s.update(0.0);
        let pending = scheduled(&s);
        s.update(pending.start_time + 1.0);
        let notices = s.take_notices();
        assert_eq!(notices.len(), 2);
        assert!(matches!(notices[0], EventNotice::Warning { .. }));
        assert_eq!(notices[1], EventNotice::Started(pending.kind));
    }

    #[test]
    fn never_repeats_the_last_two_events() {
        let mut s = EventScheduler::new(Difficulty::Founder, 1234);
        let mut now = 0.0;
        let mut seen: Vec<EventKind> = Vec::new();
        for _ in 0..40 {
            s.update(now);
            let pending = scheduled(&s);
            seen.push(pending.kind);
            now = pending.start_time;
            s.update(now);
            now += pending.kind.definition().duration;
            s.update(now);
        }
        for window in seen.windows(3) {
            assert_ne!(window[2], window[1]);
            assert_ne!(window[2], window[0]);
        }
    }

    #[test]
    fn history_is_bounded() {
        let mut s = EventScheduler::new(Difficulty::Senior, 5);
        for i in 0..10 {
            s.force_event(EventKind::ALL[i % EventKind::ALL.len()], i as f64);
        }
        assert!(s.history().count() <= EVENT_HISTORY_LEN);
    }

    #[test]
    fn paused_scheduler_does_not_advance() {
        let mut s = EventScheduler::new(Difficulty::Junior, 11);
        s.update(0.0);
        let pending = scheduled(&s);
        s.pause();
        s.update(pending.start_time + 1.0);
        assert!(s.active_event().is_none());
        s.resume();
        s.update(pending.start_time + 1.0);
        assert!(s.active_event().is_some());
    }

    #[test]
    fn disabled_scheduler_never_schedules() {
        let mut s = EventScheduler::new(Difficulty::Junior, 11);
        s.set_enabled(false);
        s.update(500_000.0);
        assert!(s.scheduled_event().is_none());
        assert!(s.active_event().is_none());
    }

    #[test]
    fn forced_event_expires_while_disabled() {
        let mut s = EventScheduler::new(Difficulty::Junior, 11);
        s.set_enabled(false);
        s.force_event(EventKind::MorningMeeting, 0.0);
        s.update(29_999.0);
        assert!(s.are_drinks_restricted());
        s.update(31_000.0);
        assert!(s.active_event().is_none());
        assert!(!s.are_drinks_restricted());
        assert_eq!(s.current_effect(), EventEffect::NEUTRAL);
        assert!(s.take_notices().contains(&EventNotice::Ended(EventKind::MorningMeeting)));
        // Still nothing new while disabled
        s.update(500_000.0);
        assert!(s.scheduled_event().is_none());
    }

    #[test]
    fn disabling_ends_the_running_event() {
        let mut s = EventScheduler::new(Difficulty::Senior, 21);
        s.force_event(EventKind::ServerOutage, 0.0);
        s.take_notices();
        s.set_enabled(false);
        assert!(s.active_event().is_none());
        assert_eq!(s.take_notices(), vec![EventNotice::Ended(EventKind::ServerOutage)]);
        assert_eq!(s.history().last(), Some(&EventKind::ServerOutage));
        // Repeated disables do not end anything twice
        s.set_enabled(false);
        assert!(s.take_notices().is_empty());
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut s = EventScheduler::new(Difficulty::Senior, 77);
        s.update(0.0);
        s.force_event(EventKind::Deadline, 2_000.0);
        s.update(40_000.0);
        s.pause();
        s.set_enabled(false);
        s.reset();

        let mut fresh = EventScheduler::new(Difficulty::Senior, 77);
        assert!(s.is_enabled());
        assert!(s.active_event().is_none());
        assert!(s.scheduled_event().is_none());
        assert_eq!(s.history().count(), 0);
        assert!(!s.is_paused());
        assert!(s.take_notices().is_empty());

        s.update(0.0);
        fresh.update(0.0);
        assert_eq!(s.scheduled_event(), fresh.scheduled_event());
    }

    #[test]
    fn unknown_event_id_is_reported() {
        assert_eq!("fireDrill".parse::<EventKind>(), Ok(EventKind::FireDrill));
        assert!(matches!(
            "layoffs".parse::<EventKind>(),
            Err(CoreError::UnknownEvent(_))
        ));
    }
}
