use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// Height used when a box carries no usable shape.
pub const DEFAULT_HEIGHT: f32 = 0.05;
/// Aspect ratio (w / h) used when a box carries no usable shape.
pub const DEFAULT_ASPECT_RATIO: f32 = 1.0;

/// Axis-aligned box in normalized image coordinates.
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_1: f32,
    pub y_1: f32,
    pub x_2: f32,
    pub y_2: f32,
}

impl BBox {
    pub fn new(x_1: f32, y_1: f32, x_2: f32, y_2: f32) -> Self {
        if x_1 > x_2 || y_1 > y_2 {
            return BBox {
                x_1: 0.0,
                y_1: 0.0,
                x_2: 0.0,
                y_2: 0.0,
            };
        };
        BBox { x_1, y_1, x_2, y_2 }
    }

    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Builds a box from the first four entries of a Kalman state `[x, y, a, h, ..]`.
    pub fn from_state_vector(state_vector: &SVector<f32, 8>) -> Self {
        if state_vector[2] < 0.0 || state_vector[3] < 0.0 {
            return BBox::new(0.0, 0.0, 0.0, 0.0);
        }
        let h = state_vector[3];
        let w = state_vector[2] * h;

        Self::from_center(state_vector[0], state_vector[1], w, h)
    }

    /// Kalman measurement `[cx, cy, w / h, h]`.
    ///
    /// Boxes without height fall back to the default shape around their center.
    pub fn to_measurement(&self) -> SVector<f32, 4> {
        let (cx, cy) = self.center();
        if self.is_degenerate() {
            return SVector::<f32, 4>::new(cx, cy, DEFAULT_ASPECT_RATIO, DEFAULT_HEIGHT);
        }

        SVector::<f32, 4>::new(cx, cy, self.width() / self.height(), self.height())
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x_1 + self.width() / 2.0,
            self.y_1 + self.height() / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        (self.x_2 - self.x_1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y_2 - self.y_1).max(0.0)
    }

    /// Zero-area boxes break the size-proportional noise model.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_new_bbox_returns_zero_bbox() {
        let bbox = BBox::new(0.3, 0.4, 0.2, 0.5);

        assert_eq!(bbox, BBox::default());
        assert!(bbox.is_degenerate());
    }

    #[test]
    fn test_from_state_vector_returns_zero_bbox_for_invalid_state() {
        let state_vector =
            SVector::<f32, 8>::from_vec(vec![0.5, 0.5, 1.0, -0.1, 0.0, 0.0, 0.0, 0.0]);
        let bbox = BBox::from_state_vector(&state_vector);

        assert_eq!(bbox, BBox::default());
    }

    #[test]
    fn test_measurement_and_state_vector_describe_the_same_box() {
        let bbox = BBox::new(0.2, 0.1, 0.4, 0.2);
        let z = bbox.to_measurement();

        assert_relative_eq!(z[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(z[1], 0.15, epsilon = 1e-6);
        assert_relative_eq!(z[2], 2.0, epsilon = 1e-5);
        assert_relative_eq!(z[3], 0.1, epsilon = 1e-6);

        let mut state = SVector::<f32, 8>::zeros();
        state.fixed_rows_mut::<4>(0).copy_from(&z);
        let back = BBox::from_state_vector(&state);

        assert_relative_eq!(back.x_1, bbox.x_1, epsilon = 1e-6);
        assert_relative_eq!(back.y_2, bbox.y_2, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_box_measures_with_default_shape() {
        let bbox = BBox::new(0.5, 0.5, 0.5, 0.5);
        let z = bbox.to_measurement();

        assert_eq!(z[2], DEFAULT_ASPECT_RATIO);
        assert_eq!(z[3], DEFAULT_HEIGHT);
    }
}
