use std::time::{Duration, Instant};

use microsim_linalg::{
    vec3, GramSchmidt, GramSchmidtStep, LinalgError, Mat3d, Matrix, Phase, Qr, Vec3d,
};

use crate::config::Tolerances;
use crate::sim::check_range;
use crate::{Sim, SimError, Ticker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GramSchmidtEvent {
    Next,
    ToggleAuto,
    Reset,
    /// Replaces input vector `index` (0-based) and restarts.
    SetVector { index: usize, vector: Vec3d },
    /// Auto-advance interval in milliseconds, in `300..=2000`.
    SetInterval(f64),
}

/// Gram-Schmidt orthonormalization of three vectors in 3D, three phases per vector.
#[derive(Debug, Clone)]
pub struct GramSchmidtSim {
    process: GramSchmidt<f64, 3, 3>,
    last: Option<GramSchmidtStep>,
    ticker: Ticker,
    tolerances: Tolerances,
}

impl Default for GramSchmidtSim {
    fn default() -> Self {
        Self::new()
    }
}

impl GramSchmidtSim {
    pub const MIN_INTERVAL_MS: f64 = 300.0;
    pub const MAX_INTERVAL_MS: f64 = 2000.0;

    pub fn new() -> Self {
        let tolerances = Tolerances::default();
        let vectors = [
            vec3(1.0, 1.0, 0.0),
            vec3(1.0, 0.0, 1.0),
            vec3(0.0, 1.0, 1.0),
        ];
        Self {
            process: Self::process(vectors, &tolerances),
            last: None,
            ticker: Ticker::new(Duration::from_millis(1200)),
            tolerances,
        }
    }

    fn process(vectors: [Vec3d; 3], tolerances: &Tolerances) -> GramSchmidt<f64, 3, 3> {
        GramSchmidt::new(vectors, tolerances.singular_display).expect("input vectors are finite")
    }

    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self {
            process: Self::process(*self.process.vectors(), &tolerances),
            last: None,
            tolerances,
            ..self
        }
    }

    pub fn vectors(&self) -> &[Vec3d; 3] {
        self.process.vectors()
    }

    /// The input vectors as the columns of a matrix.
    pub fn input_matrix(&self) -> Mat3d {
        Matrix::from_columns(*self.vectors())
    }

    /// The orthonormal vectors produced so far.
    pub fn basis(&self) -> &[Vec3d] {
        self.process.basis()
    }

    /// The residual of the vector in progress, after its subtract phase.
    pub fn residual(&self) -> Vec3d {
        self.process.residual()
    }

    pub fn projection_coefficients(&self) -> &Mat3d {
        self.process.r()
    }

    /// The step performed last, for highlighting.
    pub fn last_step(&self) -> Option<GramSchmidtStep> {
        self.last
    }

    pub fn steps_done(&self) -> usize {
        self.process.steps_done()
    }

    pub fn total_steps(&self) -> usize {
        self.process.total_steps()
    }

    pub fn is_complete(&self) -> bool {
        self.process.is_complete()
    }

    pub fn is_auto(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Set if some vector turned out to depend on the previous ones.
    pub fn failure(&self) -> Option<LinalgError> {
        self.process.failure()
    }

    pub fn qr(&self) -> Option<Qr<f64, 3, 3>> {
        self.process.qr()
    }

    /// Gram matrix `QᵀQ` of the finished basis, the identity if orthonormalization succeeded.
    pub fn gram_matrix(&self) -> Option<Mat3d> {
        self.qr().map(|qr| qr.q.transpose() * qr.q)
    }

    /// Human-readable description of the last step.
    pub fn description(&self) -> Option<String> {
        let step = self.last?;
        let n = step.index + 1;
        Some(match step.phase {
            Phase::Project if step.index == 0 => format!("v{n} has nothing to project onto"),
            Phase::Project => format!("Project v{n} onto q1..q{}", step.index),
            Phase::Subtract => format!("Subtract projections from v{n}"),
            Phase::Normalize => format!("Normalize to get q{n}"),
        })
    }

    fn advance(&mut self) -> bool {
        match self.process.step() {
            Ok(Some(step)) => {
                self.last = Some(step);
                if self.process.is_complete() {
                    self.ticker.stop();
                }
                true
            }
            Ok(None) => {
                self.ticker.stop();
                false
            }
            Err(err) => {
                if self.ticker.is_running() {
                    log::debug!("Gram-Schmidt stopped: {err}");
                }
                self.ticker.stop();
                false
            }
        }
    }

    fn restart(&mut self) {
        self.process.reset();
        self.last = None;
        self.ticker.stop();
    }
}

impl Sim for GramSchmidtSim {
    type Event = GramSchmidtEvent;

    fn name(&self) -> &'static str {
        "Gram-Schmidt"
    }

    fn handle_event(&mut self, event: GramSchmidtEvent, now: Instant) -> Result<(), SimError> {
        match event {
            GramSchmidtEvent::Next => {
                self.advance();
            }
            GramSchmidtEvent::ToggleAuto => self.ticker.toggle(now),
            GramSchmidtEvent::Reset => self.restart(),
            GramSchmidtEvent::SetVector { index, vector } => {
                if index >= 3 {
                    return Err(LinalgError::IndexOutOfBounds {
                        row: 0,
                        col: index,
                        rows: 3,
                        cols: 3,
                    }
                    .into());
                }
                if !vector.is_finite() {
                    return Err(LinalgError::NonFinite.into());
                }
                let mut vectors = *self.vectors();
                vectors[index] = vector;
                self.process = Self::process(vectors, &self.tolerances);
                self.restart();
            }
            GramSchmidtEvent::SetInterval(ms) => {
                let ms = check_range(
                    "interval",
                    ms,
                    Self::MIN_INTERVAL_MS,
                    Self::MAX_INTERVAL_MS,
                )?;
                self.ticker
                    .set_interval(Duration::from_millis(ms.round() as u64));
            }
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> bool {
        self.ticker.poll(now) && self.advance()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn run(sim: &mut GramSchmidtSim) {
        for _ in 0..sim.total_steps() {
            sim.handle_event(GramSchmidtEvent::Next, Instant::now())
                .unwrap();
        }
    }

    #[test]
    fn orthonormalizes() {
        let mut sim = GramSchmidtSim::new();
        assert_eq!(sim.total_steps(), 9);
        run(&mut sim);
        assert!(sim.is_complete());
        assert_abs_diff_eq!(sim.gram_matrix().unwrap(), Mat3d::IDENTITY, epsilon = 1e-12);
        let qr = sim.qr().unwrap();
        assert_abs_diff_eq!(qr.reconstruct(), sim.input_matrix(), epsilon = 1e-12);
        assert_eq!(sim.description().unwrap(), "Normalize to get q3");
    }

    #[test]
    fn descriptions() {
        let now = Instant::now();
        let mut sim = GramSchmidtSim::new();
        assert_eq!(sim.description(), None);
        let mut seen = Vec::new();
        for _ in 0..4 {
            sim.handle_event(GramSchmidtEvent::Next, now).unwrap();
            seen.push(sim.description().unwrap());
        }
        assert_eq!(
            seen,
            [
                "v1 has nothing to project onto",
                "Subtract projections from v1",
                "Normalize to get q1",
                "Project v2 onto q1..q1",
            ]
        );
    }

    #[test]
    fn dependent_vector() {
        let now = Instant::now();
        let mut sim = GramSchmidtSim::new();
        sim.handle_event(
            GramSchmidtEvent::SetVector {
                index: 2,
                vector: vec3(2.0, 1.0, 1.0),
            },
            now,
        )
        .unwrap();
        run(&mut sim);
        assert_eq!(sim.failure(), Some(LinalgError::LinearlyDependent { index: 2 }));
        assert!(!sim.is_complete());
        assert_eq!(sim.basis().len(), 2);
        assert_eq!(sim.gram_matrix(), None);

        sim.handle_event(GramSchmidtEvent::Reset, now).unwrap();
        assert_eq!(sim.failure(), None);
        assert_eq!(sim.steps_done(), 0);
    }

    #[test]
    fn auto_and_input_checks() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut sim = GramSchmidtSim::new();
        sim.handle_event(GramSchmidtEvent::SetInterval(300.0), t0)
            .unwrap();
        assert_eq!(sim.interval(), ms(300));
        assert!(sim
            .handle_event(GramSchmidtEvent::SetInterval(100.0), t0)
            .is_err());

        sim.handle_event(GramSchmidtEvent::ToggleAuto, t0).unwrap();
        for i in 1..=9 {
            assert!(sim.tick(t0 + ms(301 * i)));
        }
        assert!(sim.is_complete());
        assert!(!sim.is_auto());

        assert!(sim
            .handle_event(
                GramSchmidtEvent::SetVector {
                    index: 3,
                    vector: Vec3d::X
                },
                t0
            )
            .is_err());
        assert!(sim
            .handle_event(
                GramSchmidtEvent::SetVector {
                    index: 0,
                    vector: vec3(f64::NAN, 0.0, 0.0)
                },
                t0
            )
            .is_err());
        assert!(sim.is_complete());
    }
}
