use std::time::Instant;

use microsim_linalg::{Matrix, PowerSvd, Svd};

use crate::config::Tolerances;
use crate::sim::check_range;
use crate::{Sim, SimError};

/// Synthetic grayscale test images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePattern {
    /// A horizontal gradient with two bright discs.
    #[default]
    Circles,
    Checkerboard,
    /// Diagonal sine stripes.
    Diagonal,
    Face,
}

impl ImagePattern {
    pub const ALL: [Self; 4] = [Self::Circles, Self::Checkerboard, Self::Diagonal, Self::Face];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Circles => "Gradient + Circles",
            Self::Checkerboard => "Checkerboard",
            Self::Diagonal => "Diagonal Lines",
            Self::Face => "Face-like",
        }
    }

    /// Renders the pattern as an `N`x`N` image with values in `0..=255`.
    pub fn render<const N: usize>(&self) -> Matrix<f64, N, N> {
        Matrix::from_fn(|i, j| self.pixel(i as f64, j as f64, N as f64).clamp(0.0, 255.0))
    }

    fn pixel(&self, i: f64, j: f64, n: f64) -> f64 {
        let dist = |ci: f64, cj: f64| (i - ci).hypot(j - cj);
        match self {
            Self::Circles => {
                if dist(0.6 * n, 0.7 * n) < 0.15 * n {
                    180.0
                } else if dist(0.4 * n, 0.3 * n) < 0.2 * n {
                    220.0
                } else {
                    50.0 + 2.0 * j
                }
            }
            Self::Checkerboard => {
                let block = ((i / 8.0).floor() + (j / 8.0).floor()) as u64;
                if block % 2 == 0 {
                    220.0
                } else {
                    50.0
                }
            }
            Self::Diagonal => 128.0 + 80.0 * ((i + j) * 0.3).sin(),
            Self::Face => {
                let (ci, cj) = (n / 2.0, n / 2.0);
                let d = dist(ci, cj);
                let eye_i = ci - 0.1 * n;
                let in_mouth = i > ci + 0.1 * n
                    && i < ci + 0.2 * n
                    && j > cj - 0.15 * n
                    && j < cj + 0.15 * n;
                if in_mouth {
                    100.0
                } else if dist(eye_i, cj - 0.15 * n) < 0.08 * n
                    || dist(eye_i, cj + 0.15 * n) < 0.08 * n
                {
                    50.0
                } else if d < 0.4 * n {
                    230.0
                } else if d < 0.45 * n {
                    50.0
                } else {
                    200.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvdEvent {
    /// Sets the number of kept components, in `1..=N`.
    SetRank(usize),
    SetImage(ImagePattern),
}

/// Low-rank image compression with the power-iteration SVD.
#[derive(Debug, Clone)]
pub struct SvdCompression<const N: usize = 64> {
    pattern: ImagePattern,
    image: Matrix<f64, N, N>,
    svd: Svd<f64, N, N>,
    rank: usize,
    solver: PowerSvd,
}

impl Default for SvdCompression<64> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SvdCompression<N> {
    pub fn new() -> Self {
        let solver = Self::solver(&Tolerances::default(), 0);
        let pattern = ImagePattern::default();
        let image = pattern.render();
        Self {
            pattern,
            image,
            svd: solver.decompose(&image, N),
            rank: 10.min(N),
            solver,
        }
    }

    fn solver(tolerances: &Tolerances, seed: u64) -> PowerSvd {
        PowerSvd::new()
            .with_iterations(tolerances.svd_iterations)
            .with_epsilon(tolerances.epsilon)
            .with_seed(seed)
    }

    fn recompute(&mut self) {
        self.image = self.pattern.render();
        self.svd = self.solver.decompose(&self.image, N);
        log::debug!(
            "{:?}: {} significant components of {}",
            self.pattern,
            self.svd.len(),
            N
        );
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.solver = Self::solver(&tolerances, self.solver.seed());
        self.recompute();
        self
    }

    /// Seeds the random start vectors of the power iteration.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.solver = self.solver.with_seed(seed);
        self.recompute();
        self
    }

    pub fn pattern(&self) -> ImagePattern {
        self.pattern
    }

    pub fn image(&self) -> &Matrix<f64, N, N> {
        &self.image
    }

    pub fn svd(&self) -> &Svd<f64, N, N> {
        &self.svd
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn singular_values(&self) -> Vec<f64> {
        self.svd.singular_values()
    }

    /// The rank-`k` approximation, clamped to displayable gray values.
    pub fn reconstruction(&self) -> Matrix<f64, N, N> {
        self.svd.reconstruct(self.rank).map(|v| v.clamp(0.0, 255.0))
    }

    /// `|A - A_k|_F / |A|_F`.
    pub fn relative_error(&self) -> f64 {
        self.svd.relative_error(&self.image, self.rank)
    }

    /// Fraction of `Σσ²` kept by the first `k` components.
    pub fn variance_captured(&self) -> f64 {
        self.svd.energy_captured(self.rank)
    }

    /// Values stored for the rank-`k` approximation: `k (2N + 1)`.
    pub fn storage(&self) -> usize {
        self.rank * (2 * N + 1)
    }

    /// Pixel count divided by [`SvdCompression::storage`].
    pub fn compression_ratio(&self) -> f64 {
        (N * N) as f64 / self.storage() as f64
    }
}

impl<const N: usize> Sim for SvdCompression<N> {
    type Event = SvdEvent;

    fn name(&self) -> &'static str {
        "SVD Image Compression"
    }

    fn handle_event(&mut self, event: SvdEvent, _now: Instant) -> Result<(), SimError> {
        match event {
            SvdEvent::SetRank(rank) => {
                check_range("rank", rank as f64, 1.0, N as f64)?;
                self.rank = rank;
            }
            SvdEvent::SetImage(pattern) => {
                self.pattern = pattern;
                self.recompute();
            }
        }
        Ok(())
    }

    fn tick(&mut self, _now: Instant) -> bool {
        false
    }
}
