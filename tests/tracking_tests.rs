//! End-to-end tracking and counting scenarios.

use linecount::{
    BBox, CountingDirection, CountingPolicy, Detection, MatchingStrategy, ObjectTracker,
    TrackState, TrackerConfig, find_best_match,
};

fn detection(x: f32, y: f32) -> Detection {
    Detection {
        bbox: BBox::from_center(x, y, 0.06, 0.05),
        score: 0.9,
        class: 0,
    }
}

// =============================================================================
// Matching gate
// =============================================================================

#[test]
fn test_gate_accepts_close_track() {
    assert_eq!(find_best_match((0.50, 0.10), &[(0.50, 0.12)], 0.1), Some(0));
}

#[test]
fn test_gate_rejects_lone_far_track() {
    assert_eq!(find_best_match((0.50, 0.10), &[(0.50, 0.30)], 0.1), None);
}

// =============================================================================
// Counting
// =============================================================================

#[test]
fn test_two_objects_crossing_are_counted_with_stable_ids() {
    for matching in [MatchingStrategy::Hungarian, MatchingStrategy::Greedy] {
        let config = TrackerConfig {
            matching,
            ..TrackerConfig::default()
        };
        let mut tracker = ObjectTracker::new(config).expect("valid config");

        for frame in 0..25 {
            let t = frame as f32;
            let tracks =
                tracker.update(&[detection(0.3, 0.05 + 0.04 * t), detection(0.7, 0.1 + 0.035 * t)]);

            let mut ids: Vec<u64> = tracks.iter().map(|track| track.id).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2], "{matching:?} frame {frame}");
        }

        assert_eq!(tracker.total_count(), 2, "{matching:?}");
        assert!(tracker.is_object_counted(0));
        assert!(tracker.is_object_counted(1));
    }
}

#[test]
fn test_object_survives_short_occlusion() {
    let mut tracker = ObjectTracker::new(TrackerConfig::default()).expect("valid config");

    for frame in 0..10 {
        tracker.update(&[detection(0.5, 0.1 + 0.03 * frame as f32)]);
    }
    for _ in 0..3 {
        let tracks = tracker.update(&[]);
        assert_eq!(tracks[0].state, TrackState::Tracked);
    }
    let tracks = tracker.update(&[detection(0.5, 0.1 + 0.03 * 13.0)]);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 1);
    assert!(tracker.is_object_tracked(0));
}

#[test]
fn test_bottom_to_top_second_line() {
    let config = TrackerConfig {
        direction: CountingDirection::BottomToTop,
        thresholds: [0.6, 0.4],
        policy: CountingPolicy::SecondLine,
        ..TrackerConfig::default()
    };
    let mut tracker = ObjectTracker::new(config).expect("valid config");

    let mut counts = Vec::new();
    for frame in 0..12 {
        tracker.update(&[detection(0.5, 0.8 - 0.04 * frame as f32)]);
        counts.push(tracker.total_count());
    }

    // y passes 0.6 around frame 5 and 0.4 around frame 10
    assert_eq!(counts[6], 0);
    assert_eq!(*counts.last().unwrap(), 1);
}

#[test]
fn test_consistency_gate_blocks_erratic_objects() {
    let config = TrackerConfig {
        policy: CountingPolicy::AnyLine,
        min_count_consistency: 0.6,
        ..TrackerConfig::default()
    };
    let mut tracker = ObjectTracker::new(config).expect("valid config");

    // wanders back and forth over the first line
    for y in [0.25, 0.32, 0.27, 0.33, 0.26, 0.34, 0.28, 0.35] {
        tracker.update(&[detection(0.5, y)]);
    }

    assert_eq!(tracker.total_count(), 0);
}

// =============================================================================
// Lifecycle controls
// =============================================================================

#[test]
fn test_reset_tracks_restarts_ids_and_count() {
    let mut tracker = ObjectTracker::new(TrackerConfig::default()).expect("valid config");
    for frame in 0..20 {
        tracker.update(&[detection(0.5, 0.1 + 0.04 * frame as f32)]);
    }
    assert_eq!(tracker.total_count(), 1);

    tracker.reset_tracks();
    let tracks = tracker.update(&[detection(0.2, 0.2)]);

    assert_eq!(tracker.total_count(), 0);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 1);
    assert!(!tracks[0].counted);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = TrackerConfig {
        direction: CountingDirection::LeftToRight,
        policy: CountingPolicy::FirstLine,
        matching: MatchingStrategy::Greedy,
        ..TrackerConfig::default()
    };

    let json = serde_json::to_string(&config).expect("serializable");
    let parsed: TrackerConfig = serde_json::from_str(&json).expect("deserializable");

    assert_eq!(parsed, config);
}
