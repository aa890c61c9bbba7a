use serde::{Deserialize, Serialize};

use crate::{
    bbox::BBox,
    config::{MotionTuning, TtlTiers},
    counting::{CountingPolicy, CrossingState},
    direction::CountingDirection,
    kalman_filter::{KalmanFilter, KalmanState},
    tracker::Detection,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    #[default]
    New,
    Tracked,
    Lost,
    Removed,
}

/// Snapshot of a track handed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: u64,
    pub position: (f32, f32),
    pub bbox: BBox,
    pub state: TrackState,
    pub counted: bool,
    pub class: u32,
    pub score: f32,
    pub ttl: u32,
    pub movement_consistency: f32,
}

/// One tracked object.
///
/// Owns its filter state exclusively. The TTL is derived from the movement
/// consistency every time the track is matched and cannot be set from outside.
#[derive(Clone, Debug)]
pub struct STrack {
    track_id: u64,
    state: TrackState,
    is_activated: bool,
    position: (f32, f32),
    last_observed: (f32, f32),
    previous_observed: Option<(f32, f32)>,
    kalman: Option<KalmanState>,
    ttl: u32,
    movement_consistency: f32,
    frames_with_expected_movement: u32,
    counted: bool,
    crossing: CrossingState,
    score: f32,
    class: u32,
    last_detection: Option<Detection>,
    start_frame: u32,
    end_frame: u32,
    tracklet_len: u32,
    lost_frames: u32,
}

impl STrack {
    pub fn new(detection: Detection) -> Self {
        let center = detection.bbox.center();
        Self {
            track_id: 0,
            state: TrackState::New,
            is_activated: false,
            position: center,
            last_observed: center,
            previous_observed: None,
            kalman: None,
            ttl: 0,
            movement_consistency: 0.0,
            frames_with_expected_movement: 0,
            counted: false,
            crossing: CrossingState::default(),
            score: detection.score,
            class: detection.class,
            last_detection: Some(detection),
            start_frame: 0,
            end_frame: 0,
            tracklet_len: 0,
            lost_frames: 0,
        }
    }

    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn is_activated(&self) -> bool {
        self.is_activated
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn movement_consistency(&self) -> f32 {
        self.movement_consistency
    }

    pub fn frames_with_expected_movement(&self) -> u32 {
        self.frames_with_expected_movement
    }

    pub fn is_counted(&self) -> bool {
        self.counted
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn class(&self) -> u32 {
        self.class
    }

    pub fn last_detection(&self) -> Option<&Detection> {
        self.last_detection.as_ref()
    }

    pub fn kalman_state(&self) -> Option<&KalmanState> {
        self.kalman.as_ref()
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u32 {
        self.end_frame
    }

    pub fn tracklet_len(&self) -> u32 {
        self.tracklet_len
    }

    pub fn bbox(&self) -> BBox {
        match (&self.kalman, &self.last_detection) {
            (Some(kalman), _) => BBox::from_state_vector(&kalman.mean),
            (None, Some(detection)) => detection.bbox,
            (None, None) => BBox::default(),
        }
    }

    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            id: self.track_id,
            position: self.position,
            bbox: self.bbox(),
            state: self.state,
            counted: self.counted,
            class: self.class,
            score: self.score,
            ttl: self.ttl,
            movement_consistency: self.movement_consistency,
        }
    }

    /// First observation of a new object.
    ///
    /// `is_activated` is only set for tracks born on the first frame of a session.
    pub fn activate(
        &mut self,
        kalman_filter: &KalmanFilter,
        track_id: u64,
        frame_id: u32,
        tuning: &MotionTuning,
    ) {
        let bbox = self.bbox();
        let kalman = kalman_filter.initiate(&bbox.to_measurement());

        self.track_id = track_id;
        self.position = (kalman.mean[0], kalman.mean[1]);
        self.last_observed = bbox.center();
        self.kalman = Some(kalman);
        self.movement_consistency = tuning.initial_consistency;
        self.frames_with_expected_movement = 0;
        self.ttl = self.derive_ttl(tuning, &tuning.update_ttl);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = frame_id == 1;
        self.start_frame = frame_id;
        self.end_frame = frame_id;
    }

    /// Corrects a tracked object with the detection matched to it this frame.
    pub fn update(
        &mut self,
        kalman_filter: &KalmanFilter,
        detection: &Detection,
        frame_id: u32,
        direction: CountingDirection,
        tuning: &MotionTuning,
    ) {
        self.observe_movement(detection.bbox.center(), direction, tuning);
        self.ttl = self.derive_ttl(tuning, &tuning.update_ttl);
        self.correct(kalman_filter, detection);

        self.state = TrackState::Tracked;
        self.tracklet_len += 1;
        self.end_frame = frame_id;
    }

    /// Revives a lost track with the detection matched to it this frame.
    pub fn reactivate(
        &mut self,
        kalman_filter: &KalmanFilter,
        detection: &Detection,
        frame_id: u32,
        direction: CountingDirection,
        tuning: &MotionTuning,
    ) {
        self.observe_movement(detection.bbox.center(), direction, tuning);
        self.ttl = self.derive_ttl(tuning, &tuning.reactivate_ttl);
        self.correct(kalman_filter, detection);

        self.state = TrackState::Tracked;
        self.lost_frames = 0;
        self.tracklet_len = 0;
        self.end_frame = frame_id;
    }

    /// Motion-only step. Lost tracks stop growing or shrinking.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let Some(kalman) = self.kalman.as_mut() {
            if self.state != TrackState::Tracked {
                kalman.mean[7] = 0.0;
            }
            *kalman = kalman_filter.predict(kalman);
            self.position = (kalman.mean[0], kalman.mean[1]);
        }
    }

    /// Ages an unmatched track by one frame; `false` once its TTL is spent.
    pub fn decrease_ttl(&mut self) -> bool {
        self.ttl = self.ttl.saturating_sub(1);
        self.ttl > 0
    }

    /// Counts one more frame spent in `Lost`; returns the total so far.
    pub fn age_lost(&mut self) -> u32 {
        self.lost_frames += 1;
        self.lost_frames
    }

    pub fn mark_lost(&mut self) {
        if self.state != TrackState::Removed {
            self.state = TrackState::Lost;
        }
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn mark_counted(&mut self) {
        self.counted = true;
    }

    /// Evaluates the movement recorded by the last update against the
    /// counting lines. Returns `true` only when this call counted the track.
    ///
    /// A crossing made below `min_consistency` stays pending and is counted
    /// on a later update once the consistency has caught up.
    pub fn check_crossing(
        &mut self,
        direction: CountingDirection,
        lines: [f32; 2],
        policy: CountingPolicy,
        min_consistency: f32,
    ) -> bool {
        let Some(previous) = self.previous_observed.take() else {
            return false;
        };

        self.crossing.advance(
            policy,
            lines,
            direction.progress(previous),
            direction.progress(self.last_observed),
        );

        if self.crossing.is_pending()
            && !self.counted
            && self.movement_consistency >= min_consistency
        {
            self.crossing.settle();
            self.mark_counted();
            return true;
        }
        false
    }

    /// Drops the filter state and detection of an evicted track.
    ///
    /// Id, position and state stay readable for lingering references.
    pub fn cleanup(&mut self) {
        self.kalman = None;
        self.last_detection = None;
        self.previous_observed = None;
        self.crossing.reset();
        self.ttl = 0;
        self.movement_consistency = 0.0;
        self.frames_with_expected_movement = 0;
        self.score = 0.0;
        self.start_frame = 0;
        self.end_frame = 0;
        self.tracklet_len = 0;
        self.lost_frames = 0;
    }

    fn observe_movement(
        &mut self,
        observed: (f32, f32),
        direction: CountingDirection,
        tuning: &MotionTuning,
    ) {
        let displacement = (
            observed.0 - self.last_observed.0,
            observed.1 - self.last_observed.1,
        );
        let (along, perpendicular) = direction.decompose(displacement);
        let expected = along > 0.0 && perpendicular.abs() < tuning.perpendicular_tolerance;

        self.movement_consistency = step_consistency(self.movement_consistency, expected, tuning);
        if expected {
            self.frames_with_expected_movement += 1;
        }

        self.previous_observed = Some(self.last_observed);
        self.last_observed = observed;
    }

    fn derive_ttl(&self, tuning: &MotionTuning, tiers: &TtlTiers) -> u32 {
        tuning.ttl_for(
            tiers,
            self.movement_consistency,
            self.frames_with_expected_movement,
        )
    }

    fn correct(&mut self, kalman_filter: &KalmanFilter, detection: &Detection) {
        let z = detection.bbox.to_measurement();
        let kalman = match &self.kalman {
            Some(kalman) => kalman_filter.update(kalman, &z),
            None => kalman_filter.initiate(&z),
        };

        self.position = (kalman.mean[0], kalman.mean[1]);
        self.kalman = Some(kalman);
        self.score = detection.score;
        self.class = detection.class;
        self.last_detection = Some(*detection);
    }
}

/// Next movement consistency after one classified movement.
///
/// Expected movement closes `rate_up` of the gap to 1.0, so it never gains more
/// than `rate_up`. Unexpected movement costs a flat `rate_down`, floored at 0.
fn step_consistency(consistency: f32, expected: bool, tuning: &MotionTuning) -> f32 {
    let next = if expected {
        consistency + tuning.consistency_rate_up * (1.0 - consistency)
    } else {
        consistency - tuning.consistency_rate_down
    };
    next.clamp(0.0, 1.0)
}
