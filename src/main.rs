use linecount::{BBox, Detection, ObjectTracker, TrackerConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tracker = match ObjectTracker::new(TrackerConfig::default()) {
        Ok(tracker) => tracker,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    // two objects swimming down, one drifting sideways near the top
    for frame in 0..25 {
        let t = frame as f32;
        let detections = vec![
            Detection {
                bbox: BBox::from_center(0.3, 0.05 + 0.04 * t, 0.06, 0.05),
                score: 0.9,
                class: 0,
            },
            Detection {
                bbox: BBox::from_center(0.7, 0.15 + 0.035 * t, 0.08, 0.06),
                score: 0.8,
                class: 0,
            },
            Detection {
                bbox: BBox::from_center(0.1 + 0.02 * t, 0.2, 0.05, 0.05),
                score: 0.6,
                class: 1,
            },
        ];

        let tracks = tracker.update(&detections);
        println!(
            "frame {:>2}: {} tracks, count {}, {:?}",
            tracker.frame_id(),
            tracks.len(),
            tracker.total_count(),
            tracks
                .iter()
                .map(|track| (track.id, track.state, track.counted))
                .collect::<Vec<_>>()
        );
    }
}
