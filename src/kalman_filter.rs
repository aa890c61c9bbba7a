//! Constant-velocity Kalman filter over `[x, y, a, h, vx, vy, va, vh]`.
//!
//! The filter owns no track state: every operation takes a mean and covariance
//! and returns new ones. Noise terms are proportional to the current box size,
//! so small (far away) objects get proportionally small uncertainties.
//!
//! All measurements must have `h > 0`. This is not checked here.

use nalgebra::{SMatrix, SVector};
use tracing::warn;

pub type StateMean = SVector<f32, 8>;
pub type StateCovariance = SMatrix<f32, 8, 8>;
pub type Measurement = SVector<f32, 4>;

const INITIAL_UNCERTAINTY: f32 = 1.0;
const STD_WEIGHT_POSITION: f32 = 1.0 / 160.0;
const VELOCITY_NOISE_FACTOR: f32 = 10.0;
const STD_WEIGHT_MEASUREMENT: f32 = 1.0 / 20.0;

/// Mean and covariance of one track's filter.
#[derive(Clone, Debug, PartialEq)]
pub struct KalmanState {
    pub mean: StateMean,
    pub covariance: StateCovariance,
}

#[derive(Clone, Debug)]
pub struct KalmanFilter {
    motion: SMatrix<f32, 8, 8>,
    observation: SMatrix<f32, 4, 8>,
    initial_uncertainty: f32,
    std_weight_position: f32,
    std_weight_velocity: f32,
    std_weight_measurement: f32,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(
            INITIAL_UNCERTAINTY,
            STD_WEIGHT_POSITION,
            STD_WEIGHT_POSITION * VELOCITY_NOISE_FACTOR,
            STD_WEIGHT_MEASUREMENT,
        )
    }
}

impl KalmanFilter {
    pub fn new(
        initial_uncertainty: f32,
        std_weight_position: f32,
        std_weight_velocity: f32,
        std_weight_measurement: f32,
    ) -> Self {
        let mut motion = SMatrix::<f32, 8, 8>::identity();
        for i in 0..4 {
            motion[(i, i + 4)] = 1.0;
        }

        Self {
            motion,
            observation: SMatrix::<f32, 4, 8>::identity(),
            initial_uncertainty,
            std_weight_position,
            std_weight_velocity,
            std_weight_measurement,
        }
    }

    /// Starts a filter at `measurement` with zero velocity.
    pub fn initiate(&self, measurement: &Measurement) -> KalmanState {
        let mut mean = StateMean::zeros();
        mean.fixed_rows_mut::<4>(0).copy_from(measurement);

        KalmanState {
            mean,
            covariance: StateCovariance::identity() * self.initial_uncertainty,
        }
    }

    /// Motion-only step: `x' = F x`, `P' = F P Fᵀ + Q`.
    pub fn predict(&self, state: &KalmanState) -> KalmanState {
        let scale = size_scale(&state.mean);
        let std_position = scale * self.std_weight_position;
        let std_velocity = scale * self.std_weight_velocity;

        let mut process_noise = StateMean::zeros();
        process_noise
            .fixed_rows_mut::<4>(0)
            .copy_from(&std_position.component_mul(&std_position));
        process_noise
            .fixed_rows_mut::<4>(4)
            .copy_from(&std_velocity.component_mul(&std_velocity));

        KalmanState {
            mean: self.motion * state.mean,
            covariance: self.motion * state.covariance * self.motion.transpose()
                + StateCovariance::from_diagonal(&process_noise),
        }
    }

    /// Correction step with a `[x, y, a, h]` measurement.
    pub fn update(&self, state: &KalmanState, measurement: &Measurement) -> KalmanState {
        let (projected_mean, innovation_cov, measurement_noise) = self.project(state);

        let Some(innovation_inv) = gauss_jordan_inverse(&innovation_cov) else {
            warn!("singular innovation covariance, skipping kalman correction");
            return state.clone();
        };

        let kalman_gain = state.covariance * self.observation.transpose() * innovation_inv;
        let innovation = measurement - projected_mean;

        // Joseph form keeps the covariance symmetric positive definite in f32.
        let residual = StateCovariance::identity() - kalman_gain * self.observation;
        let covariance = residual * state.covariance * residual.transpose()
            + kalman_gain * measurement_noise * kalman_gain.transpose();

        KalmanState {
            mean: state.mean + kalman_gain * innovation,
            covariance,
        }
    }

    /// Measurement-space mean, innovation covariance `H P Hᵀ + R`, and `R`.
    fn project(&self, state: &KalmanState) -> (Measurement, SMatrix<f32, 4, 4>, SMatrix<f32, 4, 4>) {
        let std = size_scale(&state.mean) * self.std_weight_measurement;
        let measurement_noise = SMatrix::<f32, 4, 4>::from_diagonal(&std.component_mul(&std));

        let projected_mean = self.observation * state.mean;
        let projected_cov =
            self.observation * state.covariance * self.observation.transpose() + measurement_noise;

        (projected_mean, projected_cov, measurement_noise)
    }
}

/// `[w, h, w, h]` for the box described by `mean`.
fn size_scale(mean: &StateMean) -> SVector<f32, 4> {
    let height = mean[3];
    let width = mean[2] * height;
    SVector::<f32, 4>::new(width, height, width, height)
}

/// Inverts `matrix` by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` when a pivot vanishes.
pub fn gauss_jordan_inverse<const N: usize>(
    matrix: &SMatrix<f32, N, N>,
) -> Option<SMatrix<f32, N, N>> {
    let mut reduced = *matrix;
    let mut inverse = SMatrix::<f32, N, N>::identity();

    for col in 0..N {
        let pivot_row = (col..N).max_by(|&a, &b| {
            reduced[(a, col)]
                .abs()
                .total_cmp(&reduced[(b, col)].abs())
        })?;
        let pivot = reduced[(pivot_row, col)];
        if pivot == 0.0 || !pivot.is_finite() {
            return None;
        }

        reduced.swap_rows(col, pivot_row);
        inverse.swap_rows(col, pivot_row);

        for k in 0..N {
            reduced[(col, k)] /= pivot;
            inverse[(col, k)] /= pivot;
        }

        for row in (0..N).filter(|&row| row != col) {
            let factor = reduced[(row, col)];
            if factor == 0.0 {
                continue;
            }
            for k in 0..N {
                reduced[(row, k)] -= factor * reduced[(col, k)];
                inverse[(row, k)] -= factor * inverse[(col, k)];
            }
        }
    }

    Some(inverse)
}
