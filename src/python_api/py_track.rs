use pyo3::{pyclass, pymethods};

use crate::{TrackInfo, TrackState, python_api::PyBBox};

#[pyclass(name = "Track")]
pub struct PyTrack {
    #[pyo3(get)]
    pub id: u64,
    #[pyo3(get)]
    pub position: (f32, f32),
    pub bbox: PyBBox,
    pub state: TrackState,
    #[pyo3(get)]
    pub counted: bool,
    #[pyo3(get)]
    pub class_id: u32,
    #[pyo3(get)]
    pub score: f32,
}

impl From<TrackInfo> for PyTrack {
    fn from(track: TrackInfo) -> Self {
        Self {
            id: track.id,
            position: track.position,
            bbox: PyBBox { inner: track.bbox },
            state: track.state,
            counted: track.counted,
            class_id: track.class,
            score: track.score,
        }
    }
}

#[pymethods]
impl PyTrack {
    #[getter]
    fn bbox(&self) -> PyBBox {
        self.bbox.clone()
    }

    #[getter]
    fn state(&self) -> &'static str {
        match self.state {
            TrackState::New => "new",
            TrackState::Tracked => "tracked",
            TrackState::Lost => "lost",
            TrackState::Removed => "removed",
        }
    }
}
