use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use fastrand::Rng;
use microsim_linalg::{Eigenvalues, Mat2d, Matrix, PowerIteration, Vec2d};

use crate::config::Tolerances;
use crate::sim::check_finite;
use crate::{Sim, SimError, Ticker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerEvent {
    Step,
    ToggleRun,
    /// Restarts from a random unit vector.
    Reset,
    /// Edits a matrix entry. The value is clamped to `-10..=10` and rounded to one decimal.
    SetCell { row: usize, col: usize, value: f64 },
}

/// Power iteration on a 2x2 matrix, converging to its dominant eigenvector.
#[derive(Debug, Clone)]
pub struct PowerIterationSim {
    iteration: PowerIteration<f64, 2>,
    history: Vec<Vec2d>,
    ticker: Ticker,
    tolerances: Tolerances,
    rng: Rng,
}

impl Default for PowerIterationSim {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerIterationSim {
    pub const MAX_ITERATIONS: usize = 50;
    pub const RUN_INTERVAL: Duration = Duration::from_millis(400);

    pub fn new() -> Self {
        let tolerances = Tolerances::default();
        let matrix = Matrix::from_rows([[3.0, 1.0], [1.0, 2.0]]);
        let mut this = Self {
            iteration: PowerIteration::new(matrix, Vec2d::X, tolerances.singular_display),
            history: Vec::with_capacity(Self::MAX_ITERATIONS + 1),
            ticker: Ticker::new(Self::RUN_INTERVAL),
            tolerances,
            rng: Rng::new(),
        };
        this.restart();
        this
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self.restart();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.ticker.set_interval(interval);
        self
    }

    pub fn matrix(&self) -> &Mat2d {
        self.iteration.matrix()
    }

    pub fn current(&self) -> Vec2d {
        self.iteration.current()
    }

    pub fn iterations(&self) -> usize {
        self.iteration.iteration()
    }

    /// The start vector followed by the vector after each step.
    pub fn history(&self) -> &[Vec2d] {
        &self.history
    }

    /// The eigenvalue estimate `xᵀAx / xᵀx`, 0 before the first step.
    pub fn rayleigh_quotient(&self) -> f64 {
        self.iteration.rayleigh_quotient()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn is_at_max(&self) -> bool {
        self.iterations() >= Self::MAX_ITERATIONS
    }

    /// Eigenvalues ordered by magnitude, dominant first. `None` if they are complex.
    pub fn eigenvalues(&self) -> Option<[f64; 2]> {
        match self.matrix().eigenvalues() {
            Eigenvalues::Real(l1, l2) if l1.abs() >= l2.abs() => Some([l1, l2]),
            Eigenvalues::Real(l1, l2) => Some([l2, l1]),
            Eigenvalues::Complex { .. } => None,
        }
    }

    pub fn dominant_eigenvector(&self) -> Option<Vec2d> {
        let [dominant, _] = self.eigenvalues()?;
        Some(
            self.matrix()
                .eigenvector(dominant, self.tolerances.singular_display),
        )
    }

    /// `|λ2 / λ1|`, the factor by which the error shrinks per step.
    pub fn convergence_ratio(&self) -> Option<f64> {
        let [l1, l2] = self.eigenvalues()?;
        (l1 != 0.0).then(|| (l2 / l1).abs())
    }

    /// Angle in degrees between the current vector and the dominant eigenvector (90 if there is
    /// none).
    pub fn angle_error(&self) -> f64 {
        match self.dominant_eigenvector() {
            Some(v) => self.iteration.angle_error_degrees(v),
            None => 90.0,
        }
    }

    /// The angle error predicted after `step` iterations from the initial error and the
    /// convergence ratio.
    pub fn predicted_angle_error(&self, step: usize) -> Option<f64> {
        let ratio = self.convergence_ratio()?;
        let dominant = self.dominant_eigenvector()?;
        let start = *self.history.first()?;
        let initial = PowerIteration::new(*self.matrix(), start, self.tolerances.singular_display)
            .angle_error_degrees(dominant);
        Some((initial * ratio.powi(step as i32)).clamp(0.0, 90.0))
    }

    fn step(&mut self) -> bool {
        if self.is_at_max() {
            return false;
        }
        let v = self.iteration.step();
        self.history.push(v);
        log::trace!(
            "power iteration {}: x = {v}, λ ≈ {}",
            self.iterations(),
            self.rayleigh_quotient()
        );
        true
    }

    fn restart(&mut self) {
        let start = Vec2d::from_angle(self.rng.f64() * TAU);
        self.iteration.restart(start);
        self.history.clear();
        self.history.push(start);
        self.ticker.stop();
    }
}

impl Sim for PowerIterationSim {
    type Event = PowerEvent;

    fn name(&self) -> &'static str {
        "Power Iteration"
    }

    fn handle_event(&mut self, event: PowerEvent, now: Instant) -> Result<(), SimError> {
        match event {
            PowerEvent::Step => {
                self.step();
            }
            PowerEvent::ToggleRun => self.ticker.toggle(now),
            PowerEvent::Reset => self.restart(),
            PowerEvent::SetCell { row, col, value } => {
                let value = (check_finite(value)?.clamp(-10.0, 10.0) * 10.0).round() / 10.0;
                let mut matrix = *self.matrix();
                matrix.set(row, col, value)?;
                self.iteration = PowerIteration::new(
                    matrix,
                    self.current(),
                    self.tolerances.singular_display,
                );
                self.restart();
            }
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> bool {
        if !self.ticker.poll(now) {
            return false;
        }
        let stepped = self.step();
        if self.is_at_max() {
            self.ticker.stop();
        }
        stepped
    }
}
