use pyo3::{pyclass, pymethods};

use crate::{Detection, python_api::PyBBox};

#[pyclass(name = "Detection")]
pub struct PyDetection {
    pub inner: Detection,
}

#[pymethods]
impl PyDetection {
    #[new]
    #[pyo3(signature = (bbox, score, class_id=0))]
    pub fn new(bbox: &PyBBox, score: f32, class_id: u32) -> Self {
        Self {
            inner: Detection {
                bbox: bbox.inner,
                score,
                class: class_id,
            },
        }
    }

    #[getter]
    fn bbox(&self) -> PyBBox {
        PyBBox {
            inner: self.inner.bbox,
        }
    }

    #[getter]
    fn score(&self) -> f32 {
        self.inner.score
    }

    #[getter]
    fn class_id(&self) -> u32 {
        self.inner.class
    }
}
