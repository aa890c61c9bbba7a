use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    associate::{Assignment, associate},
    bbox::BBox,
    config::TrackerConfig,
    error::Result,
    kalman_filter::KalmanFilter,
    strack::{STrack, TrackInfo, TrackState},
};

const FIRST_TRACK_ID: u64 = 1;

/// One detector output for the current frame, in normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub score: f32,
    pub class: u32,
}

/// Source of track ids for a single tracking session.
#[derive(Debug)]
pub struct TrackIdCounter {
    next: u64,
}

impl Default for TrackIdCounter {
    fn default() -> Self {
        Self {
            next: FIRST_TRACK_ID,
        }
    }
}

impl TrackIdCounter {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn reset_id(&mut self) {
        self.next = FIRST_TRACK_ID;
    }
}

/// Multi-object tracker that counts objects crossing two lines.
///
/// Each call to [`ObjectTracker::update`] runs one full frame: predict,
/// associate, update, age, spawn, count.
pub struct ObjectTracker {
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
    tracks: Vec<STrack>,
    ids: TrackIdCounter,
    lines: [f32; 2],
    frame_id: u32,
    total_count: u32,
    enabled: bool,
    detection_tracks: Vec<Option<u64>>,
}

impl ObjectTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            lines: config.direction.ordered_lines(config.thresholds),
            config,
            kalman_filter: KalmanFilter::default(),
            tracks: Vec::new(),
            ids: TrackIdCounter::default(),
            frame_id: 0,
            total_count: 0,
            enabled: true,
            detection_tracks: Vec::new(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Live tracks, both tracked and lost.
    pub fn tracks(&self) -> &[STrack] {
        &self.tracks
    }

    pub fn get_tracks(&self) -> Vec<TrackInfo> {
        self.tracks.iter().map(STrack::info).collect()
    }

    pub fn track_info(&self, track_id: u64) -> Option<TrackInfo> {
        self.find_track(track_id).map(STrack::info)
    }

    /// Whether the detection at `detection_index` of the last frame belongs
    /// to a currently tracked object.
    pub fn is_object_tracked(&self, detection_index: usize) -> bool {
        self.detection_track(detection_index)
            .is_some_and(|track| track.state() == TrackState::Tracked)
    }

    /// Whether the detection at `detection_index` of the last frame belongs
    /// to an object that has already been counted.
    pub fn is_object_counted(&self, detection_index: usize) -> bool {
        self.detection_track(detection_index)
            .is_some_and(STrack::is_counted)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!(enabled, "tracking toggled");
        }
        self.enabled = enabled;
        if !enabled {
            self.detection_tracks.clear();
        }
    }

    /// Restarts the aggregate count. Objects already counted stay counted.
    pub fn reset_count(&mut self) {
        info!(previous = self.total_count, "count reset");
        self.total_count = 0;
    }

    /// Drops every track and starts a fresh session.
    pub fn reset_tracks(&mut self) {
        info!(tracks = self.tracks.len(), "tracker reset");
        self.tracks.clear();
        self.ids.reset_id();
        self.detection_tracks.clear();
        self.frame_id = 0;
        self.total_count = 0;
    }

    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackInfo> {
        if !self.enabled {
            return Vec::new();
        }

        self.frame_id += 1;
        let frame_id = self.frame_id;

        for track in self.tracks.iter_mut() {
            track.predict(&self.kalman_filter);
        }

        let detection_indices = detections
            .iter()
            .enumerate()
            .filter(|(index, detection)| self.accepts(*index, detection))
            .map(|(index, _)| index)
            .collect_vec();
        let track_indices = (0..self.tracks.len()).collect_vec();

        let Assignment {
            matches,
            unmatched_detections,
            unmatched_tracks,
        } = associate(
            detections,
            &detection_indices,
            &self.tracks,
            &track_indices,
            self.config.max_distance,
            self.config.match_class,
            self.config.matching,
        );

        self.detection_tracks = vec![None; detections.len()];

        for (detection_index, track_index) in matches {
            let detection = &detections[detection_index];
            let track = &mut self.tracks[track_index];
            if track.state() == TrackState::Lost {
                track.reactivate(
                    &self.kalman_filter,
                    detection,
                    frame_id,
                    self.config.direction,
                    &self.config.motion,
                );
                debug!(track_id = track.track_id(), frame_id, "track reactivated");
            } else {
                track.update(
                    &self.kalman_filter,
                    detection,
                    frame_id,
                    self.config.direction,
                    &self.config.motion,
                );
            }
            self.detection_tracks[detection_index] = Some(track.track_id());
        }

        for track_index in unmatched_tracks {
            let track = &mut self.tracks[track_index];
            match track.state() {
                TrackState::Tracked if !track.decrease_ttl() => {
                    track.mark_lost();
                    debug!(track_id = track.track_id(), frame_id, "track lost");
                }
                TrackState::Lost if track.age_lost() > self.config.max_lost_frames => {
                    track.mark_removed();
                    debug!(track_id = track.track_id(), frame_id, "track removed");
                    track.cleanup();
                }
                _ => {}
            }
        }
        self.tracks
            .retain(|track| track.state() != TrackState::Removed);

        for detection_index in unmatched_detections {
            let mut track = STrack::new(detections[detection_index]);
            let track_id = self.ids.next_id();
            track.activate(
                &self.kalman_filter,
                track_id,
                frame_id,
                &self.config.motion,
            );
            debug!(track_id, frame_id, "track started");
            self.detection_tracks[detection_index] = Some(track_id);
            self.tracks.push(track);
        }

        self.count_crossings();

        self.get_tracks()
    }

    fn accepts(&self, index: usize, detection: &Detection) -> bool {
        if detection.score < self.config.min_detection_score {
            return false;
        }
        if detection.bbox.is_degenerate() {
            warn!(index, bbox = ?detection.bbox, "dropping degenerate detection");
            return false;
        }
        true
    }

    fn count_crossings(&mut self) {
        let direction = self.config.direction;
        let policy = self.config.policy;
        let min_consistency = self.config.min_count_consistency;

        for track in self.tracks.iter_mut() {
            if track.check_crossing(direction, self.lines, policy, min_consistency) {
                self.total_count += 1;
                debug!(
                    track_id = track.track_id(),
                    total = self.total_count,
                    "object counted"
                );
            }
        }
    }

    fn find_track(&self, track_id: u64) -> Option<&STrack> {
        self.tracks
            .iter()
            .find(|track| track.track_id() == track_id)
    }

    fn detection_track(&self, detection_index: usize) -> Option<&STrack> {
        self.detection_tracks
            .get(detection_index)
            .copied()
            .flatten()
            .and_then(|track_id| self.find_track(track_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{counting::CountingPolicy, direction::CountingDirection};

    fn detection(x: f32, y: f32) -> Detection {
        Detection {
            bbox: BBox::from_center(x, y, 0.06, 0.06),
            score: 0.9,
            class: 0,
        }
    }

    fn tracker() -> ObjectTracker {
        ObjectTracker::new(TrackerConfig::default()).unwrap()
    }

    #[test]
    fn test_ids_are_strictly_increasing_and_reset() {
        let mut ids = TrackIdCounter::default();
        let issued: Vec<u64> = (0..50).map(|_| ids.next_id()).collect();

        assert!(issued.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(issued[0], FIRST_TRACK_ID);

        ids.reset_id();
        assert_eq!(ids.next_id(), FIRST_TRACK_ID);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrackerConfig {
            max_distance: -1.0,
            ..TrackerConfig::default()
        };

        assert!(ObjectTracker::new(config).is_err());
    }

    #[test]
    fn test_first_frame_spawns_tracks() {
        let mut tracker = tracker();
        let tracks = tracker.update(&[detection(0.2, 0.1), detection(0.8, 0.1)]);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[1].id, 2);
        assert!(tracks.iter().all(|t| t.state == TrackState::Tracked));
        assert!(tracker.tracks().iter().all(STrack::is_activated));
        assert!(tracker.is_object_tracked(0));
        assert!(tracker.is_object_tracked(1));
        assert!(!tracker.is_object_tracked(2));
    }

    #[test]
    fn test_identity_survives_motion() {
        let mut tracker = tracker();
        tracker.update(&[detection(0.5, 0.1)]);

        for frame in 1..10 {
            let tracks = tracker.update(&[detection(0.5, 0.1 + 0.03 * frame as f32)]);
            assert_eq!(tracks.len(), 1);
            assert_eq!(tracks[0].id, 1);
        }
    }

    #[test]
    fn test_later_spawns_are_not_session_origin() {
        let mut tracker = tracker();
        tracker.update(&[detection(0.2, 0.1)]);
        tracker.update(&[detection(0.2, 0.1), detection(0.8, 0.8)]);

        let origin: Vec<bool> = tracker.tracks().iter().map(STrack::is_activated).collect();
        assert_eq!(origin, vec![true, false]);
    }

    #[test]
    fn test_unmatched_track_goes_lost_then_removed() {
        let config = TrackerConfig {
            max_lost_frames: 3,
            ..TrackerConfig::default()
        };
        let mut tracker = ObjectTracker::new(config).unwrap();
        tracker.update(&[detection(0.5, 0.5)]);
        let ttl = tracker.tracks()[0].ttl();

        for _ in 1..ttl {
            tracker.update(&[]);
            assert_eq!(tracker.tracks()[0].state(), TrackState::Tracked);
        }
        tracker.update(&[]);
        assert_eq!(tracker.tracks()[0].state(), TrackState::Lost);

        for _ in 0..3 {
            tracker.update(&[]);
            assert_eq!(tracker.tracks()[0].state(), TrackState::Lost);
        }
        tracker.update(&[]);
        assert!(tracker.tracks().is_empty());
        assert_eq!(tracker.track_info(1), None);
    }

    #[test]
    fn test_lost_track_is_reactivated() {
        let mut tracker = tracker();
        tracker.update(&[detection(0.5, 0.5)]);
        let ttl = tracker.tracks()[0].ttl();
        for _ in 0..ttl {
            tracker.update(&[]);
        }
        assert_eq!(tracker.tracks()[0].state(), TrackState::Lost);

        let tracks = tracker.update(&[detection(0.5, 0.52)]);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[0].state, TrackState::Tracked);
        assert!(tracks[0].ttl <= tracker.config().motion.reactivate_ttl.high);
    }

    #[test]
    fn test_degenerate_and_low_score_detections_are_ignored() {
        let config = TrackerConfig {
            min_detection_score: 0.5,
            ..TrackerConfig::default()
        };
        let mut tracker = ObjectTracker::new(config).unwrap();
        let weak = Detection {
            score: 0.3,
            ..detection(0.2, 0.2)
        };
        let flat = Detection {
            bbox: BBox::new(0.4, 0.4, 0.5, 0.4),
            ..detection(0.0, 0.0)
        };

        let tracks = tracker.update(&[weak, flat, detection(0.8, 0.8)]);

        assert_eq!(tracks.len(), 1);
        assert!(!tracker.is_object_tracked(0));
        assert!(!tracker.is_object_tracked(1));
        assert!(tracker.is_object_tracked(2));
    }

    #[test]
    fn test_object_crossing_both_lines_is_counted_once() {
        let mut tracker = tracker();

        for frame in 0..20 {
            tracker.update(&[detection(0.5, 0.1 + 0.04 * frame as f32)]);
        }

        assert_eq!(tracker.total_count(), 1);
        assert!(tracker.is_object_counted(0));
        assert!(tracker.track_info(1).unwrap().counted);
    }

    #[test]
    fn test_object_moving_against_direction_is_not_counted() {
        let mut tracker = tracker();

        for frame in 0..20 {
            tracker.update(&[detection(0.5, 0.9 - 0.04 * frame as f32)]);
        }

        assert_eq!(tracker.total_count(), 0);
        assert!(!tracker.is_object_counted(0));
    }

    #[test]
    fn test_horizontal_direction_and_policy() {
        let config = TrackerConfig {
            direction: CountingDirection::RightToLeft,
            thresholds: [0.6, 0.4],
            policy: CountingPolicy::FirstLine,
            ..TrackerConfig::default()
        };
        let mut tracker = ObjectTracker::new(config).unwrap();

        for frame in 0..5 {
            tracker.update(&[detection(0.7 - 0.03 * frame as f32, 0.5)]);
        }

        assert_eq!(tracker.total_count(), 1);
    }

    #[test]
    fn test_reset_count_keeps_counted_objects() {
        let mut tracker = tracker();
        for frame in 0..20 {
            tracker.update(&[detection(0.5, 0.1 + 0.04 * frame as f32)]);
        }
        assert_eq!(tracker.total_count(), 1);

        tracker.reset_count();
        tracker.update(&[detection(0.5, 0.9)]);

        assert_eq!(tracker.total_count(), 0);
        assert!(tracker.is_object_counted(0));
    }

    #[test]
    fn test_reset_tracks_starts_a_new_session() {
        let mut tracker = tracker();
        tracker.update(&[detection(0.2, 0.2), detection(0.7, 0.7)]);

        tracker.reset_tracks();

        assert!(tracker.tracks().is_empty());
        assert_eq!(tracker.frame_id(), 0);
        assert_eq!(tracker.total_count(), 0);
        let tracks = tracker.update(&[detection(0.5, 0.5)]);
        assert_eq!(tracks[0].id, FIRST_TRACK_ID);
    }

    #[test]
    fn test_disabled_tracker_ignores_frames() {
        let mut tracker = tracker();
        tracker.update(&[detection(0.5, 0.5)]);
        let before = tracker.get_tracks();

        tracker.set_enabled(false);
        assert!(tracker.update(&[detection(0.9, 0.9)]).is_empty());
        assert!(!tracker.is_object_tracked(0));
        assert_eq!(tracker.get_tracks(), before);
        assert_eq!(tracker.frame_id(), 1);

        tracker.set_enabled(true);
        let tracks = tracker.update(&[detection(0.5, 0.5)]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 1);
    }

    #[test]
    fn test_independent_sessions_do_not_share_ids() {
        let mut a = tracker();
        let mut b = tracker();

        a.update(&[detection(0.2, 0.2), detection(0.6, 0.6)]);
        let tracks = b.update(&[detection(0.2, 0.2)]);

        assert_eq!(tracks[0].id, FIRST_TRACK_ID);
    }
}
