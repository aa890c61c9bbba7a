use std::collections::HashSet;

use itertools::iproduct;
use pathfinding::prelude::{Matrix, kuhn_munkres_min};
use serde::{Deserialize, Serialize};

use crate::{strack::STrack, tracker::Detection};

// used to convert distances to integers since the weight
// matrix of the hungarian algorithm only accepts integers.
const DISTANCE_MULTIPLIER: f32 = 1_000_000.0;
// cost of a pair outside the gate; large enough that the solver
// always prefers one more valid pair over any distance saving.
const GATED_COST: i64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingStrategy {
    /// Minimum-cost bipartite assignment.
    #[default]
    Hungarian,
    /// First-come nearest neighbour in detection order.
    Greedy,
}

/// Result of matching one frame's detections against the live tracks.
///
/// All indices refer to the slices passed to [`associate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    /// `(detection_index, track_index)` pairs.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_detections: Vec<usize>,
    pub unmatched_tracks: Vec<usize>,
}

/// Finds the track nearest to `position` that is strictly closer than
/// `max_distance`.
///
/// A track outside the gate is never returned, even when it is the only one.
pub fn find_best_match(
    position: (f32, f32),
    track_positions: &[(f32, f32)],
    max_distance: f32,
) -> Option<usize> {
    nearest_within(position, track_positions.iter().copied().enumerate(), max_distance)
}

/// Associates the given detections to the given tracks.
///
/// ## Args
///  - detections: Reference to all detections.
///  - detection_indices: The indices of the detections available for association.
///  - tracks: Reference to all tracks.
///  - track_indices: The indices of the tracks available for association.
///  - max_distance: Euclidean gate in normalized coordinates.
///  - match_class: Whether detections may only match tracks of their class.
///  - strategy: Hungarian or greedy assignment.
pub fn associate(
    detections: &[Detection],
    detection_indices: &[usize],
    tracks: &[STrack],
    track_indices: &[usize],
    max_distance: f32,
    match_class: bool,
    strategy: MatchingStrategy,
) -> Assignment {
    if detection_indices.is_empty() || track_indices.is_empty() {
        return Assignment {
            matches: Vec::new(),
            unmatched_detections: Vec::from(detection_indices),
            unmatched_tracks: Vec::from(track_indices),
        };
    }

    match strategy {
        MatchingStrategy::Hungarian => hungarian_assign(
            detections,
            detection_indices,
            tracks,
            track_indices,
            max_distance,
            match_class,
        ),
        MatchingStrategy::Greedy => greedy_assign(
            detections,
            detection_indices,
            tracks,
            track_indices,
            max_distance,
            match_class,
        ),
    }
}

/// Walks the detections in order; each one claims its nearest unclaimed track.
///
/// Order dependent.
pub fn greedy_assign(
    detections: &[Detection],
    detection_indices: &[usize],
    tracks: &[STrack],
    track_indices: &[usize],
    max_distance: f32,
    match_class: bool,
) -> Assignment {
    let mut claimed = vec![false; track_indices.len()];
    let mut assignment = Assignment::default();

    for &detection_index in detection_indices {
        let detection = &detections[detection_index];
        let candidates = track_indices
            .iter()
            .enumerate()
            .filter(|&(slot, &track_index)| {
                !claimed[slot] && class_allowed(detection, &tracks[track_index], match_class)
            })
            .map(|(slot, &track_index)| (slot, tracks[track_index].position()));

        match nearest_within(detection.bbox.center(), candidates, max_distance) {
            Some(slot) => {
                claimed[slot] = true;
                assignment
                    .matches
                    .push((detection_index, track_indices[slot]));
            }
            None => assignment.unmatched_detections.push(detection_index),
        }
    }

    assignment.unmatched_tracks = track_indices
        .iter()
        .zip(claimed)
        .filter(|(_, claimed)| !claimed)
        .map(|(&track_index, _)| track_index)
        .collect();

    assignment
}

/// Solves the assignment with the Kuhn-Munkres algorithm on a gated distance
/// cost matrix, then drops pairs that fall outside the gate.
pub fn hungarian_assign(
    detections: &[Detection],
    detection_indices: &[usize],
    tracks: &[STrack],
    track_indices: &[usize],
    max_distance: f32,
    match_class: bool,
) -> Assignment {
    let cost_matrix = calc_distance_cost_matrix(
        detections,
        detection_indices,
        tracks,
        track_indices,
        max_distance,
        match_class,
    );

    let transpose = cost_matrix.rows > cost_matrix.columns;
    let transposed;
    let weights = if transpose {
        transposed = cost_matrix.transposed();
        &transposed
    } else {
        &cost_matrix
    };
    let assignment_vector = kuhn_munkres_min(weights).1;
    let assigned: HashSet<usize> = assignment_vector.iter().cloned().collect();

    let mut unmatched_detections: Vec<usize> = if transpose {
        (0..weights.columns)
            .filter(|col| !assigned.contains(col))
            .map(|col| detection_indices[col])
            .collect()
    } else {
        Vec::new()
    };
    let mut unmatched_tracks: Vec<usize> = if transpose {
        Vec::new()
    } else {
        (0..weights.columns)
            .filter(|col| !assigned.contains(col))
            .map(|col| track_indices[col])
            .collect()
    };

    let mut matches = Vec::new();

    for (i, &j) in assignment_vector.iter().enumerate() {
        let (detection_slot, track_slot) = if transpose { (j, i) } else { (i, j) };

        let detection_index = detection_indices[detection_slot];
        let track_index = track_indices[track_slot];

        if cost_matrix[(detection_slot, track_slot)] >= GATED_COST {
            unmatched_detections.push(detection_index);
            unmatched_tracks.push(track_index);
            continue;
        }
        matches.push((detection_index, track_index));
    }

    unmatched_detections.sort_unstable();
    unmatched_tracks.sort_unstable();

    Assignment {
        matches,
        unmatched_detections,
        unmatched_tracks,
    }
}

fn calc_distance_cost_matrix(
    detections: &[Detection],
    detection_indices: &[usize],
    tracks: &[STrack],
    track_indices: &[usize],
    max_distance: f32,
    match_class: bool,
) -> Matrix<i64> {
    let mut matrix = Matrix::new(detection_indices.len(), track_indices.len(), GATED_COST);

    for ((i, &detection_index), (j, &track_index)) in iproduct!(
        detection_indices.iter().enumerate(),
        track_indices.iter().enumerate()
    ) {
        let detection = &detections[detection_index];
        let track = &tracks[track_index];
        if !class_allowed(detection, track, match_class) {
            continue;
        }

        let d = distance(detection.bbox.center(), track.position());
        if d < max_distance {
            matrix[(i, j)] = (d * DISTANCE_MULTIPLIER) as i64;
        }
    }

    matrix
}

fn nearest_within(
    position: (f32, f32),
    candidates: impl IntoIterator<Item = (usize, (f32, f32))>,
    max_distance: f32,
) -> Option<usize> {
    candidates
        .into_iter()
        .map(|(index, candidate)| (index, distance(position, candidate)))
        .filter(|&(_, d)| d < max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

fn class_allowed(detection: &Detection, track: &STrack, match_class: bool) -> bool {
    !match_class || detection.class == track.class()
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
