use std::fmt;
use std::time::{Duration, Instant};

use microsim_linalg::{Elimination, EliminationStep, LinalgError, Lu, Mat3d, Mat4d, Matrix};

use crate::config::Tolerances;
use crate::{Sim, SimError, Ticker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LuEvent<const N: usize> {
    /// Performs one elimination step.
    Next,
    /// Starts or stops automatic stepping.
    ToggleAuto,
    Reset,
    /// Checks `L·U` against the original matrix.
    Verify,
    SetMatrix(Matrix<f64, N, N>),
}

/// Outcome of the last [`LuEvent::Verify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verification {
    /// The decomposition has not finished yet.
    Incomplete,
    Match { max_error: f64 },
    Mismatch { max_error: f64 },
}

impl Verification {
    /// Largest entry of `|L·U - A|` accepted as a match.
    pub const TOLERANCE: f64 = 1e-3;
}

/// LU decomposition without pivoting, one row operation per step.
#[derive(Debug, Clone)]
pub struct LuStepper<const N: usize> {
    elimination: Elimination<f64, N>,
    complete: bool,
    verification: Option<Verification>,
    ticker: Ticker,
}

impl Default for LuStepper<3> {
    fn default() -> Self {
        #[rustfmt::skip]
        let preset: Mat3d = Matrix::from_rows([
            [2.0, 1.0, 1.0],
            [4.0, 3.0, 3.0],
            [8.0, 7.0, 9.0],
        ]);
        Self::new(preset).expect("preset matrix is finite")
    }
}

impl Default for LuStepper<4> {
    fn default() -> Self {
        #[rustfmt::skip]
        let preset: Mat4d = Matrix::from_rows([
            [2.0, 1.0, 1.0, 0.0],
            [4.0, 3.0, 3.0, 1.0],
            [8.0, 7.0, 9.0, 5.0],
            [6.0, 7.0, 9.0, 8.0],
        ]);
        Self::new(preset).expect("preset matrix is finite")
    }
}

impl<const N: usize> LuStepper<N> {
    pub const AUTO_INTERVAL: Duration = Duration::from_millis(1000);

    /// # Errors
    ///
    /// Returns [`LinalgError::NonFinite`] if `matrix` contains NaN or infinite elements.
    pub fn new(matrix: Matrix<f64, N, N>) -> Result<Self, SimError> {
        let epsilon = Tolerances::default().singular_display;
        Ok(Self {
            elimination: Elimination::new(matrix, epsilon)?,
            complete: false,
            verification: None,
            ticker: Ticker::new(Self::AUTO_INTERVAL),
        })
    }

    /// Uses `tolerances.singular_display` as the pivot threshold. Restarts the decomposition.
    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self {
            elimination: self.elimination.with_epsilon(tolerances.singular_display),
            complete: false,
            verification: None,
            ..self
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.ticker.set_interval(interval);
        self
    }

    pub fn original(&self) -> &Matrix<f64, N, N> {
        self.elimination.original()
    }

    pub fn l(&self) -> &Matrix<f64, N, N> {
        self.elimination.l()
    }

    pub fn u(&self) -> &Matrix<f64, N, N> {
        self.elimination.u()
    }

    pub fn steps_done(&self) -> usize {
        self.elimination.steps_done()
    }

    pub fn total_steps(&self) -> usize {
        self.elimination.total_steps()
    }

    /// `true` once every step ran, or elimination stopped at a zero pivot.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_auto(&self) -> bool {
        self.ticker.is_running()
    }

    /// The zero pivot that stopped the elimination, if any.
    pub fn failure(&self) -> Option<LinalgError> {
        self.elimination.failure()
    }

    pub fn last_step(&self) -> Option<EliminationStep<f64>> {
        self.elimination.last_step()
    }

    /// The pivot `(row, col)` and target row of the next step.
    pub fn next_position(&self) -> Option<(usize, usize)> {
        if self.complete {
            return None;
        }
        self.elimination.next_position()
    }

    /// Describes the last step, e.g. `Row 2 -= 2.000 × Row 1`.
    pub fn description(&self) -> Option<StepDescription> {
        self.last_step().map(StepDescription)
    }

    pub fn factors(&self) -> Option<Lu<f64, N>> {
        (self.complete && self.failure().is_none()).then(|| self.elimination.factors())
    }

    pub fn verification(&self) -> Option<Verification> {
        self.verification
    }

    /// Returns `true` if the state changed.
    fn advance(&mut self) -> bool {
        if self.complete {
            self.ticker.stop();
            return false;
        }
        match self.elimination.step() {
            Ok(Some(step)) => {
                log::trace!("{}", StepDescription(step));
            }
            Ok(None) => {
                self.complete = true;
                self.ticker.stop();
                log::trace!("LU decomposition complete");
            }
            Err(err) => {
                self.complete = true;
                self.ticker.stop();
                log::debug!("LU decomposition stopped: {err}");
            }
        }
        true
    }

    fn verify(&self) -> Verification {
        if !self.complete {
            return Verification::Incomplete;
        }
        let residual = self.elimination.factors().reconstruct() - *self.original();
        let max_error = residual
            .into_rows()
            .iter()
            .flatten()
            .fold(0.0, |max: f64, v| max.max(v.abs()));
        if max_error <= Verification::TOLERANCE {
            Verification::Match { max_error }
        } else {
            Verification::Mismatch { max_error }
        }
    }

    fn restart(&mut self) {
        self.elimination.reset();
        self.complete = false;
        self.verification = None;
        self.ticker.stop();
    }
}

/// Displays an [`EliminationStep`] with 1-based rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDescription(pub EliminationStep<f64>);

impl fmt::Display for StepDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = &self.0;
        write!(
            f,
            "Row {} -= {:.3} × Row {}",
            step.target_row + 1,
            step.multiplier,
            step.pivot_row + 1
        )
    }
}

impl<const N: usize> Sim for LuStepper<N> {
    type Event = LuEvent<N>;

    fn name(&self) -> &'static str {
        "LU Decomposition"
    }

    fn handle_event(&mut self, event: LuEvent<N>, now: Instant) -> Result<(), SimError> {
        match event {
            LuEvent::Next => {
                self.advance();
            }
            LuEvent::ToggleAuto => self.ticker.toggle(now),
            LuEvent::Reset => self.restart(),
            LuEvent::Verify => self.verification = Some(self.verify()),
            LuEvent::SetMatrix(matrix) => {
                let epsilon = self.elimination.epsilon();
                self.elimination = Elimination::new(matrix, epsilon)?;
                self.restart();
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
    use microsim_linalg::vec4;

    use super::*;

    fn run<const N: usize>(sim: &mut LuStepper<N>) {
        let now = Instant::now();
        while !sim.is_complete() {
            sim.handle_event(LuEvent::Next, now).unwrap();
        }
    }

    #[test]
    fn preset3() {
        let now = Instant::now();
        let mut sim = LuStepper::<3>::default();
        assert_eq!(sim.total_steps(), 3);

        sim.handle_event(LuEvent::Verify, now).unwrap();
        assert_eq!(sim.verification(), Some(Verification::Incomplete));

        sim.handle_event(LuEvent::Next, now).unwrap();
        assert_eq!(
            sim.description().unwrap().to_string(),
            "Row 2 -= 2.000 × Row 1"
        );

        run(&mut sim);
        assert_eq!(sim.steps_done(), 3);
        assert_eq!(sim.next_position(), None);
        sim.handle_event(LuEvent::Verify, now).unwrap();
        assert!(matches!(
            sim.verification(),
            Some(Verification::Match { max_error }) if max_error < 1e-12
        ));
        let lu = sim.factors().unwrap();
        assert_abs_diff_eq!(lu.reconstruct(), *sim.original(), epsilon = 1e-12);

        sim.handle_event(LuEvent::Reset, now).unwrap();
        assert_eq!(sim.steps_done(), 0);
        assert_eq!(sim.verification(), None);
        assert_eq!(sim.u(), sim.original());
    }

    #[test]
    fn preset4() {
        let mut sim = LuStepper::<4>::default();
        assert_eq!(sim.total_steps(), 6);
        run(&mut sim);
        let diagonal = sim.u().into_diagonal();
        assert_abs_diff_eq!(diagonal, vec4(2.0, 1.0, 2.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn zero_pivot() {
        let now = Instant::now();
        let mut sim = LuStepper::<3>::default();
        let singular = Matrix::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 7.0], [1.0, 1.0, 1.0]]);
        sim.handle_event(LuEvent::SetMatrix(singular), now).unwrap();
        run(&mut sim);
        assert_eq!(sim.steps_done(), 2);
        assert!(matches!(
            sim.failure(),
            Some(LinalgError::ZeroPivot { column: 1, .. })
        ));
        assert!(sim.factors().is_none());

        // The partial factors still multiply back to A; U is just not triangular.
        sim.handle_event(LuEvent::Verify, now).unwrap();
        assert!(matches!(
            sim.verification(),
            Some(Verification::Match { .. })
        ));
        assert_ne!(sim.u()[(2, 1)], 0.0);
    }

    #[test]
    fn auto_run_stops_when_complete() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut sim = LuStepper::<3>::default().with_interval(ms(10));
        sim.handle_event(LuEvent::ToggleAuto, t0).unwrap();
        assert!(sim.is_auto());
        for i in 1..=4 {
            assert!(sim.tick(t0 + ms(11 * i)));
        }
        assert!(sim.is_complete());
        assert!(!sim.is_auto());
        assert!(!sim.tick(t0 + ms(100)));
    }

    #[test]
    fn rejects_non_finite() {
        let mut sim = LuStepper::<3>::default();
        let bad = Matrix::from_fn(|r, c| if (r, c) == (1, 1) { f64::NAN } else { 1.0 });
        assert_eq!(
            sim.handle_event(LuEvent::SetMatrix(bad), Instant::now()),
            Err(SimError::Linalg(LinalgError::NonFinite))
        );
        assert_eq!(sim.original()[(0, 0)], 2.0);
    }
}
