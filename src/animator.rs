//! Pure time-to-value animation engine.
//!
//! The animator never draws and owns no callbacks: the host schedules
//! ticks, [`ValueAnimator::tick`] turns a timestamp into at most one
//! event, and the player interprets it. Cancellation via [`stop`] takes
//! effect at the next tick boundary.
//!
//! [`stop`]: ValueAnimator::stop

/// Which bound the animation freezes at on natural completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimatorEvent {
    /// The floored value changed; duplicate-frame ticks are suppressed.
    Update(f64),
    /// Natural end: carries the terminal value. Emitted exactly once,
    /// after which the animator is no longer running.
    Finished(f64),
}

#[derive(Clone, Debug)]
pub struct ValueAnimator {
    pub start_value: f64,
    pub end_value: f64,
    pub duration_ms: f64,
    /// Number of loops; `f64::INFINITY` for unbounded playback.
    pub loops: f64,
    pub fill_rule: FillRule,
    reverse: bool,
    running: bool,
    start_time_ms: f64,
    current_fraction: f64,
    last_reported: Option<i64>,
}

impl Default for ValueAnimator {
    fn default() -> Self {
        Self {
            start_value: 0.0,
            end_value: 0.0,
            duration_ms: 0.0,
            loops: 1.0,
            fill_rule: FillRule::Forward,
            reverse: false,
            running: false,
            start_time_ms: 0.0,
            current_fraction: 0.0,
            last_reported: None,
        }
    }
}

impl ValueAnimator {
    /// Normalize a loop count: non-positive requests mean "infinite".
    pub fn set_loops(&mut self, loops: i32) {
        self.loops = if loops <= 0 {
            f64::INFINITY
        } else {
            f64::from(loops)
        };
    }

    /// Begin ticking forward. `from_value` back-dates the start time so
    /// playback appears already at that position.
    pub fn start(&mut self, now_ms: f64, from_value: Option<f64>) {
        self.do_start(now_ms, false, from_value);
    }

    /// Begin ticking in reverse, measuring progress from the end.
    pub fn start_reversed(&mut self, now_ms: f64, from_value: Option<f64>) {
        self.do_start(now_ms, true, from_value);
    }

    fn do_start(&mut self, now_ms: f64, reverse: bool, from_value: Option<f64>) {
        if self.running {
            self.stop();
        }
        self.reverse = reverse;
        self.running = true;
        self.start_time_ms = now_ms;
        self.current_fraction = 0.0;
        self.last_reported = None;
        if let Some(value) = from_value {
            let span = self.end_value - self.start_value;
            let fraction = if span > 0.0 {
                ((value - self.start_value) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let consumed = if reverse { 1.0 - fraction } else { fraction };
            self.start_time_ms -= consumed * self.duration_ms;
        }
    }

    /// Clears running; never fires completion.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn animated_value(&self) -> f64 {
        self.start_value + (self.end_value - self.start_value) * self.current_fraction
    }

    /// Advance to `now_ms`. Returns at most one event; `None` while idle
    /// or when the floored value has not moved since the last report.
    pub fn tick(&mut self, now_ms: f64) -> Option<AnimatorEvent> {
        if !self.running {
            return None;
        }
        let elapsed = now_ms - self.start_time_ms;
        if self.duration_ms <= 0.0 || elapsed >= self.duration_ms * self.loops {
            self.current_fraction = match self.fill_rule {
                FillRule::Forward => 1.0,
                FillRule::Backward => 0.0,
            };
            self.running = false;
            return Some(AnimatorEvent::Finished(self.animated_value()));
        }
        let mut fraction = (elapsed.max(0.0) % self.duration_ms) / self.duration_ms;
        if self.reverse {
            fraction = 1.0 - fraction;
        }
        self.current_fraction = fraction;
        let value = self.animated_value();
        let floored = value.floor() as i64;
        if self.last_reported == Some(floored) {
            return None;
        }
        self.last_reported = Some(floored);
        Some(AnimatorEvent::Update(value))
    }
}
