mod associate;
mod bbox;
mod config;
mod counting;
mod direction;
mod error;
mod kalman_filter;
#[cfg(feature = "python")]
mod python_api;
mod strack;
mod trackable;
mod tracker;

pub use associate::{Assignment, MatchingStrategy, find_best_match, greedy_assign, hungarian_assign};
pub use bbox::BBox;
pub use config::{MotionTuning, TrackerConfig, TtlTiers};
pub use counting::{CountingPolicy, CrossingState};
pub use direction::CountingDirection;
pub use error::{Error, Result};
pub use kalman_filter::{KalmanFilter, KalmanState, Measurement, StateCovariance, StateMean};
pub use strack::{STrack, TrackInfo, TrackState};
pub use trackable::Trackable;
pub use tracker::{Detection, ObjectTracker, TrackIdCounter};

#[cfg(feature = "python")]
use pyo3::{
    Bound, PyResult, pymodule,
    types::{PyModule, PyModuleMethods},
};

#[cfg(feature = "python")]
use crate::python_api::{PyBBox, PyDetection, PyObjectTracker, PyTrack};

#[cfg(feature = "python")]
#[pymodule]
fn linecount(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBBox>()?;
    m.add_class::<PyDetection>()?;
    m.add_class::<PyObjectTracker>()?;
    m.add_class::<PyTrack>()?;

    Ok(())
}
