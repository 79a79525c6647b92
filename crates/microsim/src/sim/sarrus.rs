use std::time::{Duration, Instant};

use microsim_linalg::{Mat3d, Matrix, SarrusDiagonals};

use crate::sim::check_range;
use crate::{Sim, SimError, StepControl, Stepper, StepperOptions};

/// Example matrices selectable in [`SarrusRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SarrusExample {
    /// Keeps whatever matrix is currently loaded.
    #[default]
    Custom,
    Identity,
    /// Rotation by 90° about the z axis.
    Rotation,
    Singular,
}

impl SarrusExample {
    pub const ALL: [Self; 4] = [Self::Custom, Self::Identity, Self::Rotation, Self::Singular];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Identity => "Identity",
            Self::Rotation => "Rotation",
            Self::Singular => "Singular",
        }
    }

    /// The preset matrix, or `None` for [`SarrusExample::Custom`].
    pub fn matrix(&self) -> Option<Mat3d> {
        match self {
            Self::Custom => None,
            Self::Identity => Some(Mat3d::IDENTITY),
            Self::Rotation => Some(Matrix::from_rows([
                [0.0, -1.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
            ])),
            Self::Singular => Some(singular()),
        }
    }
}

fn singular() -> Mat3d {
    Matrix::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SarrusEvent {
    Step(StepControl),
    SelectExample(SarrusExample),
    /// Playback speed multiplier in `0.5..=3`.
    SetSpeed(f64),
}

/// Which part of Sarrus' rule the current step highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SarrusHighlight {
    /// Step 0: nothing highlighted.
    None,
    /// Steps 1 to 3: a down-right diagonal.
    Positive(usize),
    /// Steps 4 to 6: a down-left diagonal.
    Negative(usize),
    /// Step 7: the final sum.
    Result,
}

/// Determinant of a 3x3 matrix by Sarrus' rule, one diagonal product per step.
#[derive(Debug, Clone)]
pub struct SarrusRule {
    matrix: Mat3d,
    example: SarrusExample,
    stepper: Stepper,
}

impl Default for SarrusRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SarrusRule {
    pub const TOTAL_STEPS: usize = 7;
    pub const MIN_SPEED: f64 = 0.5;
    pub const MAX_SPEED: f64 = 3.0;

    pub fn new() -> Self {
        Self {
            matrix: singular(),
            example: SarrusExample::Custom,
            stepper: Stepper::new(
                Self::TOTAL_STEPS,
                StepperOptions::new().with_interval(Duration::from_millis(1500)),
            ),
        }
    }

    pub fn with_stepper_options(self, options: StepperOptions) -> Self {
        Self {
            stepper: Stepper::new(Self::TOTAL_STEPS, options),
            ..self
        }
    }

    pub fn matrix(&self) -> &Mat3d {
        &self.matrix
    }

    pub fn example(&self) -> SarrusExample {
        self.example
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    pub fn diagonals(&self) -> SarrusDiagonals<f64> {
        self.matrix.sarrus_diagonals()
    }

    pub fn highlight(&self) -> SarrusHighlight {
        match self.stepper.step() {
            0 => SarrusHighlight::None,
            s @ 1..=3 => SarrusHighlight::Positive(s - 1),
            s @ 4..=6 => SarrusHighlight::Negative(s - 4),
            _ => SarrusHighlight::Result,
        }
    }

    /// The cells on the highlighted diagonal.
    pub fn highlighted_cells(&self) -> Option<[(usize, usize); 3]> {
        match self.highlight() {
            SarrusHighlight::Positive(i) => Some(SarrusDiagonals::<f64>::positive_cells(i)),
            SarrusHighlight::Negative(i) => Some(SarrusDiagonals::<f64>::negative_cells(i)),
            SarrusHighlight::None | SarrusHighlight::Result => None,
        }
    }

    /// Sum of the positive products revealed so far.
    pub fn positive_sum(&self) -> f64 {
        let shown = self.stepper.step().min(3);
        self.diagonals().positive[..shown].iter().sum()
    }

    /// Sum of the negative products revealed so far.
    pub fn negative_sum(&self) -> f64 {
        let shown = self.stepper.step().saturating_sub(3).min(3);
        self.diagonals().negative[..shown].iter().sum()
    }

    /// The determinant, once the final step is reached.
    pub fn result(&self) -> Option<f64> {
        self.stepper
            .is_at_end()
            .then(|| self.diagonals().determinant())
    }
}

impl Sim for SarrusRule {
    type Event = SarrusEvent;

    fn name(&self) -> &'static str {
        "Sarrus' Rule"
    }

    fn handle_event(&mut self, event: SarrusEvent, now: Instant) -> Result<(), SimError> {
        match event {
            SarrusEvent::Step(control) => control.apply(&mut self.stepper, now),
            SarrusEvent::SelectExample(example) => {
                if let Some(matrix) = example.matrix() {
                    self.matrix = matrix;
                }
                self.example = example;
                self.stepper.reset();
            }
            SarrusEvent::SetSpeed(speed) => {
                let speed = check_range("speed", speed, Self::MIN_SPEED, Self::MAX_SPEED)?;
                self.stepper.set_speed(speed);
            }
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> bool {
        self.stepper.tick(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(sim: &mut SarrusRule, n: usize) {
        for _ in 0..n {
            sim.handle_event(SarrusEvent::Step(StepControl::Next), Instant::now())
                .unwrap();
        }
    }

    #[test]
    fn partial_sums() {
        let mut sim = SarrusRule::new();
        step(&mut sim, 2);
        assert_eq!(sim.highlight(), SarrusHighlight::Positive(1));
        assert_eq!(sim.positive_sum(), 45.0 + 84.0);
        assert_eq!(sim.negative_sum(), 0.0);

        step(&mut sim, 3);
        assert_eq!(sim.highlight(), SarrusHighlight::Negative(1));
        assert_eq!(sim.highlighted_cells(), Some([(0, 1), (1, 0), (2, 2)]));
        assert_eq!(sim.positive_sum(), 45.0 + 84.0 + 96.0);
        assert_eq!(sim.negative_sum(), 105.0 + 72.0);
        assert_eq!(sim.result(), None);

        step(&mut sim, 2);
        assert_eq!(sim.highlight(), SarrusHighlight::Result);
        assert_eq!(sim.result(), Some(0.0));
    }

    #[test]
    fn examples() {
        let now = Instant::now();
        let mut sim = SarrusRule::new();
        step(&mut sim, 3);

        sim.handle_event(SarrusEvent::SelectExample(SarrusExample::Rotation), now)
            .unwrap();
        assert_eq!(sim.stepper().step(), 0);
        assert_eq!(sim.diagonals().determinant(), 1.0);

        sim.handle_event(SarrusEvent::SelectExample(SarrusExample::Custom), now)
            .unwrap();
        assert_eq!(sim.example(), SarrusExample::Custom);
        assert_eq!(sim.matrix(), &SarrusExample::Rotation.matrix().unwrap());

        sim.handle_event(SarrusEvent::SelectExample(SarrusExample::Identity), now)
            .unwrap();
        assert_eq!(sim.diagonals().determinant(), 1.0);
    }

    #[test]
    fn speed() {
        let now = Instant::now();
        let mut sim = SarrusRule::new();
        sim.handle_event(SarrusEvent::SetSpeed(3.0), now).unwrap();
        assert_eq!(sim.stepper().interval(), Duration::from_millis(500));
        assert!(matches!(
            sim.handle_event(SarrusEvent::SetSpeed(5.0), now),
            Err(SimError::OutOfRange { what: "speed", .. })
        ));
        assert_eq!(sim.stepper().speed(), 3.0);
    }
}
