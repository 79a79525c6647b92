use std::time::{Duration, Instant};

use fastrand::Rng;
use microsim_linalg::{vec2, CramerSolution, LinalgError, Mat2d, Matrix, Vec2d};

use crate::config::Tolerances;
use crate::{Sim, SimError, StepControl, Stepper, StepperOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CramerEvent {
    Step(StepControl),
    /// Rolls a random non-singular system with small integer coefficients.
    Randomize,
    /// Loads a system whose coefficient matrix has determinant 0.
    MakeSingular,
    SetSystem { a: Mat2d, b: Vec2d },
}

/// What the current step of [`CramersRule`] reveals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CramerStage {
    System,
    DetA(f64),
    /// `det(A_i)`, where column `i` of `A` is replaced by `b`.
    DetReplaced { column: usize, value: f64 },
    Solution(Vec2d),
    /// `det(A)` is (near) zero: no unique solution.
    Singular { determinant: f64 },
}

/// Solves a 2x2 system `A x = b` by Cramer's rule in four steps.
#[derive(Debug, Clone)]
pub struct CramersRule {
    a: Mat2d,
    b: Vec2d,
    stepper: Stepper,
    tolerances: Tolerances,
    rng: Rng,
}

impl Default for CramersRule {
    fn default() -> Self {
        Self::new()
    }
}

impl CramersRule {
    pub const TOTAL_STEPS: usize = 4;

    pub fn new() -> Self {
        Self {
            a: Matrix::from_rows([[2.0, 3.0], [1.0, 4.0]]),
            b: vec2(7.0, 9.0),
            stepper: Stepper::new(
                Self::TOTAL_STEPS,
                StepperOptions::new().with_interval(Duration::from_millis(2000)),
            ),
            tolerances: Tolerances::default(),
            rng: Rng::new(),
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
            ..self
        }
    }

    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self { tolerances, ..self }
    }

    pub fn with_stepper_options(self, options: StepperOptions) -> Self {
        Self {
            stepper: Stepper::new(Self::TOTAL_STEPS, options),
            ..self
        }
    }

    pub fn a(&self) -> &Mat2d {
        &self.a
    }

    pub fn b(&self) -> Vec2d {
        self.b
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    pub fn determinant(&self) -> f64 {
        self.a.determinant()
    }

    /// `A` with column `i` replaced by `b`.
    pub fn replaced(&self, column: usize) -> Mat2d {
        self.a.with_column(column, self.b)
    }

    pub fn is_singular(&self) -> bool {
        self.determinant().abs() < self.tolerances.epsilon
    }

    /// The full solution, or the reason there is none.
    pub fn solve(&self) -> Result<CramerSolution<f64, 2>, LinalgError> {
        self.a.solve_cramer(self.b, self.tolerances.epsilon)
    }

    pub fn stage(&self) -> CramerStage {
        let step = self.stepper.step();
        if step == 0 {
            return CramerStage::System;
        }
        let solution = match self.solve() {
            Ok(solution) => solution,
            Err(_) if step == 1 => return CramerStage::DetA(self.determinant()),
            Err(_) => {
                return CramerStage::Singular {
                    determinant: self.determinant(),
                }
            }
        };
        match step {
            1 => CramerStage::DetA(solution.determinant),
            2 | 3 => CramerStage::DetReplaced {
                column: step - 2,
                value: solution.replaced_determinants[step - 2],
            },
            _ => CramerStage::Solution(solution.solution),
        }
    }

    fn randomize(&mut self) {
        let mut coeff = || self.rng.i32(-5..=5) as f64;
        let mut a = Matrix::from_rows([[coeff(), coeff()], [coeff(), coeff()]]);
        while a.determinant() == 0.0 {
            a[(1, 1)] = coeff();
        }
        let mut rhs = || self.rng.i32(-10..=10) as f64;
        self.b = vec2(rhs(), rhs());
        self.a = a;
    }
}

impl Sim for CramersRule {
    type Event = CramerEvent;

    fn name(&self) -> &'static str {
        "Cramer's Rule"
    }

    fn handle_event(&mut self, event: CramerEvent, now: Instant) -> Result<(), SimError> {
        match event {
            CramerEvent::Step(control) => {
                control.apply(&mut self.stepper, now);
                return Ok(());
            }
            CramerEvent::Randomize => self.randomize(),
            CramerEvent::MakeSingular => {
                self.a = Matrix::from_rows([[2.0, 4.0], [1.0, 2.0]]);
                self.b = vec2(6.0, 3.0);
            }
            CramerEvent::SetSystem { a, b } => {
                if !a.is_finite() || !b.is_finite() {
                    log::debug!("rejected non-finite system {a:?}, {b:?}");
                    return Err(LinalgError::NonFinite.into());
                }
                self.a = a;
                self.b = b;
            }
        }
        if self.is_singular() {
            log::debug!("system is singular (det = {})", self.determinant());
        }
        self.stepper.reset();
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> bool {
        self.stepper.tick(now)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn next(sim: &mut CramersRule) -> CramerStage {
        sim.handle_event(CramerEvent::Step(StepControl::Next), Instant::now())
            .unwrap();
        sim.stage()
    }

    #[test]
    fn stages() {
        let mut sim = CramersRule::new();
        assert_eq!(sim.stage(), CramerStage::System);
        assert_eq!(next(&mut sim), CramerStage::DetA(5.0));
        assert_eq!(
            next(&mut sim),
            CramerStage::DetReplaced {
                column: 0,
                value: 1.0
            }
        );
        assert_eq!(
            next(&mut sim),
            CramerStage::DetReplaced {
                column: 1,
                value: 11.0
            }
        );
        let CramerStage::Solution(x) = next(&mut sim) else {
            panic!("expected a solution");
        };
        assert_relative_eq!(x, vec2(0.2, 2.2), epsilon = 1e-12);
        assert_eq!(next(&mut sim), CramerStage::System);
    }

    #[test]
    fn singular() {
        let now = Instant::now();
        let mut sim = CramersRule::new();
        sim.handle_event(CramerEvent::MakeSingular, now).unwrap();
        assert!(sim.is_singular());
        assert_eq!(next(&mut sim), CramerStage::DetA(0.0));
        assert_eq!(
            next(&mut sim),
            CramerStage::Singular { determinant: 0.0 }
        );
        assert!(matches!(sim.solve(), Err(LinalgError::Singular { .. })));
    }

    #[test]
    fn randomize() {
        let now = Instant::now();
        let mut sim = CramersRule::new().with_seed(3);
        for _ in 0..50 {
            sim.handle_event(CramerEvent::Randomize, now).unwrap();
            assert!(!sim.is_singular());
            assert!(sim.a().into_rows().iter().flatten().all(|v| v.abs() <= 5.0));
            assert!(sim.b().as_array().iter().all(|v| v.abs() <= 10.0));
            let x = sim.solve().unwrap().solution;
            assert_relative_eq!(*sim.a() * x, sim.b(), epsilon = 1e-9);
        }
    }

    #[test]
    fn rejects_non_finite() {
        let mut sim = CramersRule::new();
        let err = sim.handle_event(
            CramerEvent::SetSystem {
                a: Mat2d::IDENTITY,
                b: vec2(f64::NAN, 0.0),
            },
            Instant::now(),
        );
        assert_eq!(err, Err(SimError::Linalg(LinalgError::NonFinite)));
        assert_eq!(sim.b(), vec2(7.0, 9.0));
    }
}
