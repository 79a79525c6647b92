use std::f64::consts::TAU;
use std::time::Instant;

use fastrand::Rng;
use microsim_linalg::{vec2, Conditioning, Mat2d, Matrix, Vec2d, CONDITION_SENTINEL};

use crate::config::Tolerances;
use crate::sim::check_range;
use crate::{Sim, SimError};

/// Example systems of increasing sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionPreset {
    #[default]
    Well,
    Moderate,
    Ill,
    NearlySingular,
}

impl ConditionPreset {
    pub const ALL: [Self; 4] = [Self::Well, Self::Moderate, Self::Ill, Self::NearlySingular];

    /// The system `(A, b)`.
    pub fn system(&self) -> (Mat2d, Vec2d) {
        match self {
            Self::Well => (Matrix::from_rows([[2.0, 0.0], [0.0, 2.0]]), vec2(4.0, 4.0)),
            Self::Moderate => (Matrix::from_rows([[10.0, 1.0], [1.0, 1.0]]), vec2(11.0, 2.0)),
            Self::Ill => (Matrix::from_rows([[1.0, 1.0], [1.0, 1.001]]), vec2(2.0, 2.001)),
            Self::NearlySingular => (Matrix::from_rows([[1.0, 2.0], [2.0, 4.0001]]), vec2(3.0, 6.0)),
        }
    }
}

/// A randomly perturbed right-hand side and the solution it leads to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    /// The offset added to `b`.
    pub delta: Vec2d,
    pub solution: Vec2d,
}

/// Shows how the condition number bounds the effect of perturbing `b` in `A x = b`.
#[derive(Debug, Clone)]
pub struct ConditionNumber {
    preset: ConditionPreset,
    a: Mat2d,
    b: Vec2d,
    radius: f64,
    samples: Vec<Perturbation>,
    tolerances: Tolerances,
    rng: Rng,
}

impl Default for ConditionNumber {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionNumber {
    pub const SAMPLES: usize = 50;
    pub const MIN_RADIUS: f64 = 0.01;
    pub const MAX_RADIUS: f64 = 1.0;

    pub fn new() -> Self {
        let preset = ConditionPreset::default();
        let (a, b) = preset.system();
        let mut this = Self {
            preset,
            a,
            b,
            radius: 0.3,
            samples: Vec::with_capacity(Self::SAMPLES),
            tolerances: Tolerances::default(),
            rng: Rng::new(),
        };
        this.resample();
        this
    }

    /// Reseeds the RNG and draws a fresh set of perturbations.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self.resample();
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self.resample();
        self
    }

    pub fn preset(&self) -> ConditionPreset {
        self.preset
    }

    pub fn a(&self) -> &Mat2d {
        &self.a
    }

    pub fn b(&self) -> Vec2d {
        self.b
    }

    /// Largest `|δb|` drawn when resampling.
    pub fn perturbation_radius(&self) -> f64 {
        self.radius
    }

    pub fn perturbations(&self) -> &[Perturbation] {
        &self.samples
    }

    /// The unperturbed solution, or `None` if `A` is singular.
    pub fn solution(&self) -> Option<Vec2d> {
        self.solve(self.b)
    }

    pub fn singular_values(&self) -> [f64; 2] {
        self.a.singular_values()
    }

    /// `σ1 / σ2`, or the configured sentinel if `σ2` is negligible.
    pub fn condition_number(&self) -> f64 {
        let kappa = self.a.condition_number(self.tolerances.epsilon);
        if kappa == CONDITION_SENTINEL {
            self.tolerances.condition_sentinel
        } else {
            kappa
        }
    }

    pub fn conditioning(&self) -> Conditioning {
        Conditioning::classify(self.condition_number())
    }

    /// `true` if the condition number is the "infinite" sentinel.
    pub fn is_singular(&self) -> bool {
        self.condition_number() >= self.tolerances.condition_sentinel
    }

    /// `(|δx| / |x|) / (|δb| / |b|)` for one perturbation. Bounded by the condition number.
    pub fn amplification(&self, perturbation: &Perturbation) -> Option<f64> {
        let x = self.solution()?;
        let db = perturbation.delta.length();
        if db <= 0.0 || x.length() <= 0.0 {
            return None;
        }
        let dx = (perturbation.solution - x).length();
        Some((dx / x.length()) / (db / self.b.length()))
    }

    pub fn worst_amplification(&self) -> Option<f64> {
        self.samples
            .iter()
            .filter_map(|p| self.amplification(p))
            .reduce(f64::max)
    }

    fn solve(&self, b: Vec2d) -> Option<Vec2d> {
        self.a
            .solve_cramer(b, self.tolerances.epsilon)
            .ok()
            .map(|s| s.solution)
    }

    fn resample(&mut self) {
        self.samples.clear();
        for _ in 0..Self::SAMPLES {
            let angle = self.rng.f64() * TAU;
            let r = self.rng.f64() * self.radius;
            let delta = Vec2d::from_angle(angle) * r;
            if let Some(solution) = self.solve(self.b + delta) {
                self.samples.push(Perturbation { delta, solution });
            }
        }
        log::trace!(
            "{} perturbed solutions (κ = {:.3e})",
            self.samples.len(),
            self.condition_number()
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionEvent {
    SelectPreset(ConditionPreset),
    /// Sets the perturbation radius, in `0.01..=1`.
    SetPerturbation(f64),
    Resample,
}

impl Sim for ConditionNumber {
    type Event = ConditionEvent;

    fn name(&self) -> &'static str {
        "Condition Number"
    }

    fn handle_event(&mut self, event: ConditionEvent, _now: Instant) -> Result<(), SimError> {
        match event {
            ConditionEvent::SelectPreset(preset) => {
                self.preset = preset;
                (self.a, self.b) = preset.system();
                if self.is_singular() {
                    log::debug!("preset {preset:?} is singular");
                }
            }
            ConditionEvent::SetPerturbation(radius) => {
                self.radius = check_range(
                    "perturbation radius",
                    radius,
                    Self::MIN_RADIUS,
                    Self::MAX_RADIUS,
                )?;
            }
            ConditionEvent::Resample => {}
        }
        self.resample();
        Ok(())
    }

    fn tick(&mut self, _now: Instant) -> bool {
        false
    }
}
