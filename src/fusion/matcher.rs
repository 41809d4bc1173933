// src/fusion/matcher.rs
//
// Greedy nearest-neighbour matching of two timestamp lists.
//
// Near records are visited in aligned-timestamp order (near_ts − offset);
// each takes the closest unused far record within the window. Ties go to
// the lower far index. Pure function of its inputs.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub near_index: usize,
    pub far_index: usize,
    /// |aligned near − far|, seconds
    pub time_diff: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_near: Vec<usize>,
    pub unmatched_far: Vec<usize>,
}

pub fn match_records(near: &[f64], far: &[f64], offset_seconds: f64, window_seconds: f64) -> MatchResult {
    let mut order: Vec<usize> = (0..near.len()).collect();
    order.sort_by(|&a, &b| near[a].total_cmp(&near[b]));

    let mut far_used = vec![false; far.len()];
    let mut near_used = vec![false; near.len()];
    let mut pairs = Vec::new();

    for i in order {
        let aligned = near[i] - offset_seconds;
        let mut best: Option<(usize, f64)> = None;

        for (j, &far_ts) in far.iter().enumerate() {
            if far_used[j] {
                continue;
            }
            let diff = (aligned - far_ts).abs();
            if diff <= window_seconds && best.map_or(true, |(_, d)| diff < d) {
                best = Some((j, diff));
            }
        }

        if let Some((j, diff)) = best {
            far_used[j] = true;
            near_used[i] = true;
            debug!("🔗 near #{} ↔ far #{} (Δ{:.2}s)", i, j, diff);
            pairs.push(MatchedPair {
                near_index: i,
                far_index: j,
                time_diff: diff,
            });
        }
    }

    MatchResult {
        pairs,
        unmatched_near: (0..near.len()).filter(|&i| !near_used[i]).collect(),
        unmatched_far: (0..far.len()).filter(|&j| !far_used[j]).collect(),
    }
}
