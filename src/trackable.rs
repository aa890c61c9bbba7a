use crate::{
    strack::TrackInfo,
    tracker::{Detection, ObjectTracker},
};

/// Capability of a detector variant that can feed an [`ObjectTracker`].
///
/// Detectors without tracking support simply do not implement it; callers
/// decide at construction time whether they hold a `dyn Trackable`.
pub trait Trackable {
    fn tracker(&self) -> &ObjectTracker;

    fn tracker_mut(&mut self) -> &mut ObjectTracker;

    fn track(&mut self, detections: &[Detection]) -> Vec<TrackInfo> {
        self.tracker_mut().update(detections)
    }

    fn is_object_tracked(&self, detection_index: usize) -> bool {
        self.tracker().is_object_tracked(detection_index)
    }

    fn is_object_counted(&self, detection_index: usize) -> bool {
        self.tracker().is_object_counted(detection_index)
    }

    fn total_count(&self) -> u32 {
        self.tracker().total_count()
    }
}

impl Trackable for ObjectTracker {
    fn tracker(&self) -> &ObjectTracker {
        self
    }

    fn tracker_mut(&mut self) -> &mut ObjectTracker {
        self
    }
}
