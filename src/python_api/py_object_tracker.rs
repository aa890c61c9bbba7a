use pyo3::{PyRef, PyResult, exceptions::PyValueError, pyclass, pymethods};

use crate::{
    CountingDirection, CountingPolicy, Detection, ObjectTracker, TrackerConfig,
    python_api::{PyDetection, PyTrack},
};

#[pyclass(name = "ObjectTracker")]
pub struct PyObjectTracker {
    inner: ObjectTracker,
}

#[pymethods]
impl PyObjectTracker {
    #[new]
    #[pyo3(signature = (direction="top_to_bottom", thresholds=(0.3, 0.7), policy="both_lines_in_order", max_distance=0.1))]
    pub fn new(
        direction: &str,
        thresholds: (f32, f32),
        policy: &str,
        max_distance: f32,
    ) -> PyResult<Self> {
        let config = TrackerConfig {
            direction: direction.parse::<CountingDirection>().map_err(to_py_err)?,
            thresholds: [thresholds.0, thresholds.1],
            policy: policy.parse::<CountingPolicy>().map_err(to_py_err)?,
            max_distance,
            ..TrackerConfig::default()
        };
        let inner = ObjectTracker::new(config).map_err(to_py_err)?;

        Ok(Self { inner })
    }

    pub fn get_tracks(&self) -> Vec<PyTrack> {
        self.inner
            .get_tracks()
            .into_iter()
            .map(PyTrack::from)
            .collect()
    }

    pub fn update(&mut self, detections: Vec<PyRef<PyDetection>>) -> Vec<PyTrack> {
        let inner_detections = detections
            .iter()
            .map(|detection| detection.inner)
            .collect::<Vec<Detection>>();

        self.inner
            .update(&inner_detections)
            .into_iter()
            .map(PyTrack::from)
            .collect()
    }

    pub fn is_object_tracked(&self, detection_index: usize) -> bool {
        self.inner.is_object_tracked(detection_index)
    }

    pub fn is_object_counted(&self, detection_index: usize) -> bool {
        self.inner.is_object_counted(detection_index)
    }

    #[getter]
    pub fn total_count(&self) -> u32 {
        self.inner.total_count()
    }

    pub fn reset_count(&mut self) {
        self.inner.reset_count();
    }

    pub fn reset_tracks(&mut self) {
        self.inner.reset_tracks();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.inner.set_enabled(enabled);
    }
}

fn to_py_err(error: crate::Error) -> pyo3::PyErr {
    PyValueError::new_err(error.to_string())
}
