//! Step counters with play/pause/reset and timed auto-advance.

use std::time::{Duration, Instant};

/// What happens when a playing [`Stepper`] wraps from its last step back to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    /// Playback stops on wrap-around.
    #[default]
    StopAtEnd,
    /// Playback continues from step 0.
    Loop,
}

/// Fires at most once per interval while running.
///
/// Used for auto-advance wherever a simulation owns its own notion of "next step".
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    running: bool,
    last: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts or stops the ticker. Starting counts as having fired at `now`.
    pub fn toggle(&mut self, now: Instant) {
        if self.running {
            self.stop();
        } else {
            self.start(now);
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.running = true;
        self.last = Some(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Returns `true` (and records `now`) if running and more than one interval has elapsed since
    /// the last firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        let last = *self.last.get_or_insert(now);
        if now.saturating_duration_since(last) > self.interval {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

/// Options for a [`Stepper`].
#[derive(Debug, Clone, Copy)]
pub struct StepperOptions {
    interval: Duration,
    wrap: WrapPolicy,
}

impl Default for StepperOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            wrap: WrapPolicy::default(),
        }
    }
}

impl StepperOptions {
    /// Creates the default options: a 2 second interval and [`WrapPolicy::StopAtEnd`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of `self` with a different base auto-advance interval.
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Returns a copy of `self` with a different wrap-around policy.
    pub fn with_wrap_policy(self, wrap: WrapPolicy) -> Self {
        Self { wrap, ..self }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.wrap
    }
}

/// A step counter in `0..=total_steps` with play/pause/reset.
///
/// [`Stepper::next`] wraps from `total_steps` back to 0. While playing, [`Stepper::tick`] advances
/// once per interval; what happens on wrap-around is decided by the [`WrapPolicy`].
///
/// # Examples
///
/// ```
/// # use microsim::*;
/// # use std::time::{Duration, Instant};
/// let mut stepper = Stepper::new(2, StepperOptions::new().with_interval(Duration::from_secs(1)));
/// let t0 = Instant::now();
/// stepper.toggle_play(t0);
/// assert!(stepper.tick(t0 + Duration::from_millis(1500)));
/// assert_eq!(stepper.step(), 1);
/// assert!(!stepper.tick(t0 + Duration::from_millis(2000)));
/// ```
#[derive(Debug, Clone)]
pub struct Stepper {
    step: usize,
    total_steps: usize,
    base_interval: Duration,
    speed: f64,
    wrap: WrapPolicy,
    ticker: Ticker,
}

impl Stepper {
    pub fn new(total_steps: usize, options: StepperOptions) -> Self {
        Self {
            step: 0,
            total_steps,
            base_interval: options.interval,
            speed: 1.0,
            wrap: options.wrap,
            ticker: Ticker::new(options.interval),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn is_playing(&self) -> bool {
        self.ticker.is_running()
    }

    /// Returns `true` on the last step.
    pub fn is_at_end(&self) -> bool {
        self.step == self.total_steps
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.wrap
    }

    /// The effective auto-advance interval (base interval divided by speed).
    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Advances to the next step, wrapping to 0 after the last one.
    ///
    /// Returns `true` if the counter wrapped.
    pub fn next(&mut self) -> bool {
        let wrapped = self.step >= self.total_steps;
        self.step = if wrapped { 0 } else { self.step + 1 };
        log::trace!("step {}/{}", self.step, self.total_steps);
        wrapped
    }

    /// Returns to step 0 and pauses.
    pub fn reset(&mut self) {
        self.step = 0;
        self.ticker.stop();
    }

    /// Starts or pauses playback. Starting records `now` as the time of the last advance.
    pub fn toggle_play(&mut self, now: Instant) {
        self.ticker.toggle(now);
        log::trace!(
            "{} at step {}",
            if self.is_playing() { "playing" } else { "paused" },
            self.step
        );
    }

    /// Advances one step if playing and more than one interval has elapsed since the last advance.
    ///
    /// Returns `true` if the step changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.ticker.poll(now) {
            return false;
        }
        if self.next() && self.wrap == WrapPolicy::StopAtEnd {
            self.ticker.stop();
            log::trace!("wrapped around, playback stopped");
        }
        true
    }

    /// Changes the number of steps. This is a structural change, so the stepper is also reset.
    pub fn set_total_steps(&mut self, total_steps: usize) {
        self.total_steps = total_steps;
        self.reset();
    }

    /// Scales the auto-advance speed: an interval of `base / multiplier`.
    ///
    /// Multipliers that are not finite and positive, or that would make the interval
    /// unrepresentable, are ignored.
    pub fn set_speed(&mut self, multiplier: f64) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            log::debug!("ignoring invalid speed multiplier {multiplier}");
            return;
        }
        match Duration::try_from_secs_f64(self.base_interval.as_secs_f64() / multiplier) {
            Ok(interval) => {
                self.speed = multiplier;
                self.ticker.set_interval(interval);
            }
            Err(err) => log::debug!("ignoring speed multiplier {multiplier}: {err}"),
        }
    }

    pub fn set_wrap_policy(&mut self, wrap: WrapPolicy) {
        self.wrap = wrap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn wraps_after_total_plus_one() {
        for total in 0..6 {
            let mut s = Stepper::new(total, StepperOptions::new());
            for i in 0..total {
                assert!(!s.next(), "wrapped early at {i}");
            }
            assert!(s.is_at_end());
            assert!(s.next());
            assert_eq!(s.step(), 0);
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let t0 = Instant::now();
        let mut s = Stepper::new(4, StepperOptions::new());
        s.next();
        s.next();
        s.toggle_play(t0);
        s.reset();
        assert_eq!((s.step(), s.is_playing()), (0, false));
        s.reset();
        assert_eq!((s.step(), s.is_playing()), (0, false));
    }

    #[test]
    fn tick_needs_strictly_more_than_interval() {
        let t0 = Instant::now();
        let mut s = Stepper::new(3, StepperOptions::new().with_interval(ms(100)));
        assert!(!s.tick(t0 + ms(500)), "paused stepper must not advance");

        s.toggle_play(t0);
        assert!(!s.tick(t0 + ms(100)));
        assert!(s.tick(t0 + ms(101)));
        assert_eq!(s.step(), 1);
        assert!(!s.tick(t0 + ms(150)));
        assert!(s.tick(t0 + ms(250)));
        assert_eq!(s.step(), 2);
    }

    #[test]
    fn stop_at_end() {
        let t0 = Instant::now();
        let mut s = Stepper::new(2, StepperOptions::new().with_interval(ms(10)));
        s.toggle_play(t0);
        for i in 1..=3 {
            assert!(s.tick(t0 + ms(11 * i)));
        }
        assert_eq!(s.step(), 0);
        assert!(!s.is_playing());
    }

    #[test]
    fn loop_policy() {
        let t0 = Instant::now();
        let options = StepperOptions::new()
            .with_interval(ms(10))
            .with_wrap_policy(WrapPolicy::Loop);
        let mut s = Stepper::new(1, options);
        s.toggle_play(t0);
        for i in 1..=5 {
            assert!(s.tick(t0 + ms(11 * i)));
        }
        assert_eq!(s.step(), 1);
        assert!(s.is_playing());
    }

    #[test]
    fn speed_and_structure() {
        let mut s = Stepper::new(7, StepperOptions::new().with_interval(ms(1500)));
        s.set_speed(3.0);
        assert_eq!(s.interval(), ms(500));
        s.set_speed(0.0);
        assert_eq!(s.speed(), 3.0);
        // Too slow for the interval to fit in a `Duration`.
        s.set_speed(1e-300);
        assert_eq!((s.speed(), s.interval()), (3.0, ms(500)));

        s.next();
        s.set_total_steps(4);
        assert_eq!((s.step(), s.total_steps()), (0, 4));
    }

    #[test]
    fn ticker() {
        let t0 = Instant::now();
        let mut t = Ticker::new(ms(50));
        assert!(!t.poll(t0 + ms(100)));
        t.toggle(t0);
        assert!(t.is_running());
        assert!(t.poll(t0 + ms(51)));
        assert!(!t.poll(t0 + ms(60)));
        t.toggle(t0 + ms(70));
        assert!(!t.poll(t0 + ms(500)));
    }
}
