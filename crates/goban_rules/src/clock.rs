//! # Clock Engine
//!
//! Main time followed by a fixed number of overtime windows.
//!
//! Time is charged lazily. Whenever the match calls [`GameClock::tick`] the
//! side that is *waiting* (the opponent of `active`) is charged for the time
//! since its own last update, then both sides are stamped with `now`. The
//! match ticks once before a move (active = mover) and once after it
//! (active = new side to move); because both sides are stamped on every tick
//! no interval is ever charged twice.
//!
//! Elapsed time drains main time first. Once main time is gone it drains the
//! current overtime window; a window that runs out consumes one period and the
//! next window starts from full length, absorbing any leftover. Running out of
//! periods (or out of main time with no periods configured) is a timeout.

use crate::types::Color;
use std::time::{Duration, Instant};

/// Time control for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    pub main_time: Duration,
    pub overtime: Duration,
    pub overtime_periods: u32,
}

impl ClockSettings {
    pub fn from_secs(main_time: u64, overtime: u64, overtime_periods: u32) -> Self {
        Self {
            main_time: Duration::from_secs(main_time),
            overtime: Duration::from_secs(overtime),
            overtime_periods,
        }
    }

    /// A clock with no main time and no overtime never runs.
    pub fn is_untimed(&self) -> bool {
        self.main_time.is_zero() && self.overtime_periods == 0
    }
}

/// Remaining time for one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockState {
    main_remaining: Duration,
    overtime_remaining: Duration,
    periods_left: u32,
    last_update: Option<Instant>,
}

impl ClockState {
    fn new(settings: &ClockSettings) -> Self {
        let overtime_remaining = if settings.overtime_periods > 0 {
            settings.overtime
        } else {
            Duration::ZERO
        };
        Self {
            main_remaining: settings.main_time,
            overtime_remaining,
            periods_left: settings.overtime_periods,
            last_update: None,
        }
    }

    pub fn main_remaining(&self) -> Duration {
        self.main_remaining
    }

    /// Time left in the current overtime window.
    pub fn overtime_remaining(&self) -> Duration {
        self.overtime_remaining
    }

    pub fn periods_left(&self) -> u32 {
        self.periods_left
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    pub fn in_overtime(&self) -> bool {
        self.main_remaining.is_zero()
    }

    /// Drains `elapsed` from this side. Returns `true` when time has run out.
    fn charge(&mut self, elapsed: Duration, settings: &ClockSettings) -> bool {
        let mut left = elapsed;
        let from_main = left.min(self.main_remaining);
        self.main_remaining -= from_main;
        left -= from_main;
        if !self.main_remaining.is_zero() {
            return false;
        }

        while self.periods_left > 0 {
            if left < self.overtime_remaining {
                self.overtime_remaining -= left;
                return false;
            }
            left -= self.overtime_remaining;
            self.periods_left -= 1;
            self.overtime_remaining = if self.periods_left > 0 {
                settings.overtime
            } else {
                Duration::ZERO
            };
        }
        true
    }
}

/// Result of charging the waiting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Running,
    Expired(Color),
}

/// Both players' clocks under one time control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClock {
    settings: ClockSettings,
    states: [ClockState; 2],
}

impl GameClock {
    pub fn new(settings: ClockSettings) -> Self {
        let state = ClockState::new(&settings);
        Self {
            settings,
            states: [state.clone(), state],
        }
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    pub fn state(&self, color: Color) -> &ClockState {
        &self.states[color.index()]
    }

    /// Starts timing `active` from `now` without charging anyone.
    pub fn start(&mut self, active: Color, now: Instant) {
        self.states[active.index()].last_update = Some(now);
    }

    /// Charges the side waiting on `active` and stamps both sides.
    ///
    /// # Arguments
    ///
    /// * `active` - The side whose turn it is at `now`
    /// * `now` - Current time, injected so callers and tests control it
    ///
    /// # Returns
    ///
    /// [`ClockTick::Expired`] naming the side that ran out, if any.
    pub fn tick(&mut self, active: Color, now: Instant) -> ClockTick {
        if self.settings.is_untimed() {
            return ClockTick::Running;
        }

        let waiting = active.opponent();
        let settings = self.settings;
        let state = &mut self.states[waiting.index()];
        let mut expired = false;
        if let Some(last) = state.last_update {
            expired = state.charge(now.saturating_duration_since(last), &settings);
            state.last_update = Some(now);
        }
        self.states[active.index()].last_update = Some(now);

        if expired {
            ClockTick::Expired(waiting)
        } else {
            ClockTick::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_time_drains_before_overtime() {
        let mut clock = GameClock::new(ClockSettings::from_secs(10, 5, 2));
        let t0 = Instant::now();
        clock.start(Color::White, t0);

        assert_eq!(clock.tick(Color::Black, t0 + Duration::from_secs(4)), ClockTick::Running);
        let white = clock.state(Color::White);
        assert_eq!(white.main_remaining(), Duration::from_secs(6));
        assert_eq!(white.periods_left(), 2);
    }

    #[test]
    fn overflow_spills_into_the_next_window() {
        let mut clock = GameClock::new(ClockSettings::from_secs(2, 5, 3));
        let t0 = Instant::now();
        clock.start(Color::White, t0);

        // 2s main + 5s window + 1s of the next window.
        assert_eq!(clock.tick(Color::Black, t0 + Duration::from_secs(8)), ClockTick::Running);
        let white = clock.state(Color::White);
        assert!(white.in_overtime());
        assert_eq!(white.periods_left(), 2);
        assert_eq!(white.overtime_remaining(), Duration::from_secs(4));
    }

    #[test]
    fn last_window_expiring_is_a_timeout() {
        let mut clock = GameClock::new(ClockSettings::from_secs(0, 1, 1));
        let t0 = Instant::now();
        clock.start(Color::White, t0);
        assert_eq!(
            clock.tick(Color::Black, t0 + Duration::from_secs(2)),
            ClockTick::Expired(Color::White)
        );
    }

    #[test]
    fn no_interval_is_charged_twice() {
        let mut clock = GameClock::new(ClockSettings::from_secs(60, 0, 0));
        let t0 = Instant::now();
        clock.start(Color::Black, t0);

        // Black moves after 10s: tick before (active black) and after
        // (active white) at the same instant.
        let t1 = t0 + Duration::from_secs(10);
        clock.tick(Color::Black, t1);
        clock.tick(Color::White, t1);
        assert_eq!(clock.state(Color::Black).main_remaining(), Duration::from_secs(60));

        // White moves 5s later; black waited those 5s.
        let t2 = t1 + Duration::from_secs(5);
        clock.tick(Color::White, t2);
        clock.tick(Color::Black, t2);
        assert_eq!(clock.state(Color::Black).main_remaining(), Duration::from_secs(55));
        assert_eq!(clock.state(Color::White).main_remaining(), Duration::from_secs(60));

        // Black moves 7s later; white waited those 7s, black is not charged again.
        let t3 = t2 + Duration::from_secs(7);
        clock.tick(Color::Black, t3);
        clock.tick(Color::White, t3);
        assert_eq!(clock.state(Color::White).main_remaining(), Duration::from_secs(53));
        assert_eq!(clock.state(Color::Black).main_remaining(), Duration::from_secs(55));
    }

    #[test]
    fn untimed_clock_never_expires() {
        let mut clock = GameClock::new(ClockSettings::from_secs(0, 0, 0));
        let t0 = Instant::now();
        clock.start(Color::Black, t0);
        assert_eq!(
            clock.tick(Color::White, t0 + Duration::from_secs(86_400)),
            ClockTick::Running
        );
    }
}
