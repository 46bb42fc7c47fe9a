use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GameTime {
    /// Seconds since the previous tick; zero while stopped.
    pub dt: f32,

    /// Seconds since reset, not counting paused spans.
    pub total: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Pausable game clock.
///
/// `total` excludes every span between `stop` and `start`; the runtime stops
/// the timer while the window is minimized or inactive.
#[derive(Debug, Clone)]
pub struct GameTimer {
    base: Instant,
    prev: Instant,
    stop_time: Option<Instant>,
    paused: Duration,
    dt: Duration,
    frame_index: u64,
}

impl GameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            base: now,
            prev: now,
            stop_time: None,
            paused: Duration::ZERO,
            dt: Duration::ZERO,
            frame_index: 0,
        }
    }

    /// Restarts from zero, running.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_time.is_some()
    }

    /// Pauses the clock. Idempotent.
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    /// Resumes after [`GameTimer::stop`]. Idempotent.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Advances the clock and returns a new `GameTime`.
    pub fn tick(&mut self) -> GameTime {
        self.tick_at(Instant::now())
    }

    /// Seconds since reset, excluding paused time.
    pub fn total(&self) -> f32 {
        self.total_at(Instant::now())
    }

    fn stop_at(&mut self, now: Instant) {
        if self.stop_time.is_none() {
            self.stop_time = Some(now);
        }
    }

    fn start_at(&mut self, now: Instant) {
        if let Some(stopped) = self.stop_time.take() {
            self.paused += now.saturating_duration_since(stopped);
            self.prev = now;
        }
    }

    fn tick_at(&mut self, now: Instant) -> GameTime {
        if self.is_stopped() {
            self.dt = Duration::ZERO;
        } else {
            // saturating: never negative even if the clock misbehaves.
            self.dt = now.saturating_duration_since(self.prev);
            self.prev = now;
        }

        let t = GameTime {
            dt: self.dt.as_secs_f32(),
            total: self.total_at(now),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        t
    }

    fn total_at(&self, now: Instant) -> f32 {
        let end = self.stop_time.unwrap_or(now);
        end.saturating_duration_since(self.base)
            .saturating_sub(self.paused)
            .as_secs_f32()
    }
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn total_excludes_paused_span() {
        let t0 = Instant::now();
        let mut timer = GameTimer::starting_at(t0);

        timer.stop_at(t0 + 100 * MS);
        timer.start_at(t0 + 400 * MS);
        let t = timer.tick_at(t0 + 500 * MS);

        assert!((t.total - 0.2).abs() < 1e-4, "total was {}", t.total);
    }

    #[test]
    fn dt_is_zero_while_stopped_and_resumes_from_start() {
        let t0 = Instant::now();
        let mut timer = GameTimer::starting_at(t0);
        timer.tick_at(t0 + 10 * MS);

        timer.stop_at(t0 + 20 * MS);
        assert_eq!(timer.tick_at(t0 + 30 * MS).dt, 0.0);

        timer.start_at(t0 + 50 * MS);
        let t = timer.tick_at(t0 + 60 * MS);
        assert!((t.dt - 0.010).abs() < 1e-4);
        assert_eq!(t.frame_index, 2);
    }

    #[test]
    fn stop_and_start_are_idempotent() {
        let t0 = Instant::now();
        let mut timer = GameTimer::starting_at(t0);
        timer.stop_at(t0 + 10 * MS);
        timer.stop_at(t0 + 20 * MS);
        timer.start_at(t0 + 30 * MS);
        timer.start_at(t0 + 40 * MS);
        assert!((timer.total_at(t0 + 50 * MS) - 0.030).abs() < 1e-4);
    }
}
