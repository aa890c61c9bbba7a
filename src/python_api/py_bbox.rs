use pyo3::{pyclass, pymethods};

use crate::BBox;

/// Normalized detection box as seen from Python.
#[pyclass(name = "BBox")]
#[derive(Clone)]
pub struct PyBBox {
    pub inner: BBox,
}

#[pymethods]
impl PyBBox {
    /// Corners in normalized coordinates; inverted corners give an empty box.
    #[new]
    pub fn new(x_1: f32, y_1: f32, x_2: f32, y_2: f32) -> Self {
        Self {
            inner: BBox::new(x_1, y_1, x_2, y_2),
        }
    }

    #[staticmethod]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            inner: BBox::from_center(cx, cy, width, height),
        }
    }

    #[getter]
    fn corners(&self) -> (f32, f32, f32, f32) {
        let BBox { x_1, y_1, x_2, y_2 } = self.inner;
        (x_1, y_1, x_2, y_2)
    }

    #[getter]
    fn center(&self) -> (f32, f32) {
        self.inner.center()
    }

    #[getter]
    fn width(&self) -> f32 {
        self.inner.width()
    }

    #[getter]
    fn height(&self) -> f32 {
        self.inner.height()
    }

    /// Boxes without area are dropped before tracking.
    fn is_degenerate(&self) -> bool {
        self.inner.is_degenerate()
    }

    /// `(cx, cy, aspect, height)` as fed to the motion model.
    fn to_measurement(&self) -> (f32, f32, f32, f32) {
        let z = self.inner.to_measurement();
        (z[0], z[1], z[2], z[3])
    }

    fn __repr__(&self) -> String {
        let (cx, cy) = self.inner.center();
        format!(
            "BBox(center=({cx:.3}, {cy:.3}), size=({:.3}, {:.3}))",
            self.inner.width(),
            self.inner.height()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_matches_rust_box() {
        let bbox = PyBBox::from_center(0.5, 0.4, 0.2, 0.1);

        assert_eq!(bbox.inner, BBox::from_center(0.5, 0.4, 0.2, 0.1));
        assert!(!bbox.is_degenerate());
        assert_eq!(bbox.to_measurement().3, bbox.height());
    }

    #[test]
    fn test_inverted_corners_are_degenerate() {
        let bbox = PyBBox::new(0.6, 0.6, 0.4, 0.4);

        assert!(bbox.is_degenerate());
        assert_eq!(bbox.corners(), (0.0, 0.0, 0.0, 0.0));
    }
}
