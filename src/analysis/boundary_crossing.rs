// src/analysis/boundary_crossing.rs
//
// Geometric features of one finalized shot sequence against the hoop box.
//
// Crossing test: a trajectory segment crosses an edge (top y1 / bottom y2)
// only when it goes from above the edge to at/below it AND the point where
// the segment meets the edge line lies within the box's horizontal span.
// Plain point-in-box membership would count balls that fly past beside the
// hoop at the same image height.
//
// Depth test: the ball's bbox area must sit inside [min_ratio, max_ratio] of
// the hoop bbox area and inside a band around the sequence's mean ball area.
// A ball much larger than the hoop-plane ratio is in front of the rim.

use crate::error::{require_non_negative, require_ordered, require_positive, ConfigError};
use crate::shot_tracker::ShotSequence;
use crate::types::{BBox, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// Lowest ball/hoop area ratio accepted as "at hoop depth"
    pub min_ball_hoop_ratio: f32,
    /// Highest ball/hoop area ratio accepted as "at hoop depth"
    pub max_ball_hoop_ratio: f32,
    /// Accepted band of ball area as a multiple of the sequence mean, low end
    pub depth_band_low: f32,
    /// Accepted band of ball area as a multiple of the sequence mean, high end
    pub depth_band_high: f32,
    /// Upward px after the first bottom crossing that marks an in-and-out
    pub bounce_out_px: f32,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            min_ball_hoop_ratio: 0.17,
            max_ball_hoop_ratio: 0.30,
            depth_band_low: 0.5,
            depth_band_high: 2.0,
            bounce_out_px: 50.0,
        }
    }
}

impl CrossingConfig {
    /// Tighter ratio band; measured made shots sat at 0.165–0.340 and misses
    /// at 0.324–0.490, so this trades recall for fewer front-of-rim makes.
    pub fn strict() -> Self {
        Self {
            min_ball_hoop_ratio: 0.18,
            max_ball_hoop_ratio: 0.28,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("crossing.min_ball_hoop_ratio", self.min_ball_hoop_ratio as f64)?;
        require_positive("crossing.max_ball_hoop_ratio", self.max_ball_hoop_ratio as f64)?;
        require_ordered(
            "crossing.min_ball_hoop_ratio",
            self.min_ball_hoop_ratio as f64,
            "crossing.max_ball_hoop_ratio",
            self.max_ball_hoop_ratio as f64,
        )?;
        require_positive("crossing.depth_band_low", self.depth_band_low as f64)?;
        require_ordered(
            "crossing.depth_band_low",
            self.depth_band_low as f64,
            "crossing.depth_band_high",
            self.depth_band_high as f64,
        )?;
        require_non_negative("crossing.bounce_out_px", self.bounce_out_px as f64)?;
        Ok(())
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoopEdge {
    Top,
    Bottom,
}

/// Features derived once per finalized sequence. All pixel totals are
/// non-negative; every ratio is 0 when its divisor is 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometricFeatures {
    /// In-zone samples in the sequence
    pub total_points: usize,
    pub top_crossings: u32,
    pub bottom_crossings: u32,
    /// Top crossings at hoop depth
    pub valid_top_crossings: u32,
    /// Bottom crossings at hoop depth
    pub valid_bottom_crossings: u32,
    pub points_inside: u32,
    pub points_inside_at_depth: u32,
    /// Ball/hoop area ratio sampled at each crossing
    pub size_ratios: Vec<f32>,
    pub avg_size_ratio: f32,
    pub avg_ball_size: f32,
    pub avg_size_inside: f32,
    pub avg_size_outside: f32,
    /// last.y − first.y; positive means the ball ended lower than it started
    pub net_vertical_displacement: f32,
    pub upward_total: f32,
    pub downward_total: f32,
    pub up_down_ratio: f32,
    /// downward / (downward + upward)
    pub trajectory_consistency: f32,
    pub first_bottom_crossing: Option<usize>,
    /// Largest rise above the first bottom-crossing sample, after it
    pub bounce_after_bottom: f32,
    pub bounced_back_out: bool,
}

impl GeometricFeatures {
    pub fn total_crossings(&self) -> u32 {
        self.top_crossings + self.bottom_crossings
    }

    pub fn has_crossing(&self) -> bool {
        self.total_crossings() > 0
    }

    pub fn valid_crossings(&self) -> u32 {
        self.valid_top_crossings + self.valid_bottom_crossings
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Does the segment `prev → curr` pass downward through `edge` of `bbox`
/// at a point horizontally inside the box?
pub fn segment_crosses_edge(prev: Point, curr: Point, bbox: &BBox, edge: HoopEdge) -> bool {
    let edge_y = match edge {
        HoopEdge::Top => bbox.y1,
        HoopEdge::Bottom => bbox.y2,
    };

    if !(prev.y < edge_y && curr.y >= edge_y) {
        return false;
    }

    // curr.y > prev.y here, so the divisor is positive
    let t = (edge_y - prev.y) / (curr.y - prev.y);
    let x_at_edge = prev.x + t * (curr.x - prev.x);
    bbox.spans_x(x_at_edge)
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    if n > 0 {
        sum / n as f32
    } else {
        0.0
    }
}

fn ratio(num: f32, den: f32) -> f32 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct BoundaryCrossingAnalyzer {
    config: CrossingConfig,
}

impl BoundaryCrossingAnalyzer {
    pub fn new(config: CrossingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CrossingConfig {
        &self.config
    }

    /// Is a sample of `ball_size` px² at the hoop's depth plane?
    pub fn is_depth_correct(&self, ball_size: f32, hoop_area: f32, mean_ball_size: f32) -> bool {
        if hoop_area <= 0.0 || mean_ball_size <= 0.0 {
            return false;
        }
        let hoop_ratio = ball_size / hoop_area;
        let band = ball_size / mean_ball_size;
        hoop_ratio >= self.config.min_ball_hoop_ratio
            && hoop_ratio <= self.config.max_ball_hoop_ratio
            && band >= self.config.depth_band_low
            && band <= self.config.depth_band_high
    }

    pub fn analyze(&self, sequence: &ShotSequence, hoop_bbox: &BBox) -> GeometricFeatures {
        let positions = sequence.positions();
        let sizes = sequence.sizes();

        if positions.len() < 2 {
            return GeometricFeatures {
                total_points: positions.len(),
                ..GeometricFeatures::default()
            };
        }

        let hoop_area = hoop_bbox.area();
        let avg_ball_size = mean(sizes.iter().copied());

        let mut f = GeometricFeatures {
            total_points: positions.len(),
            avg_ball_size,
            ..GeometricFeatures::default()
        };

        // Per-sample membership
        let mut inside_sizes = Vec::new();
        let mut outside_sizes = Vec::new();
        for (p, &size) in positions.iter().zip(sizes) {
            if hoop_bbox.contains(*p) {
                f.points_inside += 1;
                inside_sizes.push(size);
                if self.is_depth_correct(size, hoop_area, avg_ball_size) {
                    f.points_inside_at_depth += 1;
                }
            } else {
                outside_sizes.push(size);
            }
        }
        f.avg_size_inside = mean(inside_sizes.into_iter());
        f.avg_size_outside = mean(outside_sizes.into_iter());

        // Per-segment crossings and movement
        for i in 1..positions.len() {
            let prev = positions[i - 1];
            let curr = positions[i];
            let size = sizes[i];

            let dy = curr.y - prev.y;
            if dy > 0.0 {
                f.downward_total += dy;
            } else {
                f.upward_total += -dy;
            }

            let at_depth = self.is_depth_correct(size, hoop_area, avg_ball_size);

            if segment_crosses_edge(prev, curr, hoop_bbox, HoopEdge::Top) {
                f.top_crossings += 1;
                f.size_ratios.push(ratio(size, hoop_area));
                if at_depth {
                    f.valid_top_crossings += 1;
                }
            }

            if segment_crosses_edge(prev, curr, hoop_bbox, HoopEdge::Bottom) {
                f.bottom_crossings += 1;
                f.size_ratios.push(ratio(size, hoop_area));
                if f.first_bottom_crossing.is_none() {
                    f.first_bottom_crossing = Some(i);
                }
                if at_depth {
                    f.valid_bottom_crossings += 1;
                }
            }
        }

        f.avg_size_ratio = mean(f.size_ratios.iter().copied());
        f.up_down_ratio = ratio(f.upward_total, f.downward_total);
        f.trajectory_consistency = ratio(f.downward_total, f.downward_total + f.upward_total);

        if let (Some(first), Some(last)) = (positions.first(), positions.last()) {
            f.net_vertical_displacement = last.y - first.y;
        }

        if let Some(idx) = f.first_bottom_crossing {
            let bottom_y = positions[idx].y;
            f.bounce_after_bottom = positions[idx + 1..]
                .iter()
                .map(|p| bottom_y - p.y)
                .fold(0.0f32, f32::max);
        }
        f.bounced_back_out =
            f.valid_bottom_crossings >= 1 && f.bounce_after_bottom > self.config.bounce_out_px;

        debug!(
            "Crossings top={}/{} bottom={}/{} inside={} (depth {}) up={:.0}px down={:.0}px bounce={:.0}px",
            f.valid_top_crossings,
            f.top_crossings,
            f.valid_bottom_crossings,
            f.bottom_crossings,
            f.points_inside,
            f.points_inside_at_depth,
            f.upward_total,
            f.downward_total,
            f.bounce_after_bottom,
        );

        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{
        hoop_box, scenario_a, scenario_b, sequence_from, BALL_AREA_AT_DEPTH,
    };

    fn analyzer() -> BoundaryCrossingAnalyzer {
        BoundaryCrossingAnalyzer::new(CrossingConfig::default()).unwrap()
    }

    #[test]
    fn test_straight_drop_crosses_top_and_bottom() {
        let f = analyzer().analyze(&scenario_a(), &hoop_box());
        assert_eq!(f.top_crossings, 1);
        assert_eq!(f.bottom_crossings, 1);
        assert_eq!(f.valid_top_crossings, 1);
        assert_eq!(f.valid_bottom_crossings, 1);
        assert_eq!(f.points_inside, 1);
        assert_eq!(f.points_inside_at_depth, 1);
        assert_eq!(f.downward_total, 80.0);
        assert_eq!(f.upward_total, 0.0);
        assert_eq!(f.trajectory_consistency, 1.0);
        assert_eq!(f.net_vertical_displacement, 80.0);
        assert!(!f.bounced_back_out);
    }

    #[test]
    fn test_bounce_after_bottom_crossing() {
        let f = analyzer().analyze(&scenario_b(), &hoop_box());
        assert_eq!(f.first_bottom_crossing, Some(3));
        assert_eq!(f.bounce_after_bottom, 70.0);
        assert!(f.bounced_back_out);
        assert_eq!(f.upward_total, 70.0);
        assert_eq!(f.net_vertical_displacement, 10.0);
    }

    #[test]
    fn test_no_horizontal_overlap_means_no_crossing() {
        let seq = sequence_from(&[(300.0, 50.0), (300.0, 70.0), (300.0, 95.0), (300.0, 130.0)]);
        let f = analyzer().analyze(&seq, &hoop_box());
        assert_eq!(f.total_crossings(), 0);
        assert_eq!(f.points_inside, 0);
        assert_eq!(f.downward_total, 80.0);
    }

    #[test]
    fn test_crossing_uses_segment_intersection_not_endpoint() {
        let hoop = hoop_box();
        // Ends inside horizontally, but meets y=80 at x=76: beside the rim
        assert!(!segment_crosses_edge(
            Point::new(60.0, 70.0),
            Point::new(100.0, 95.0),
            &hoop,
            HoopEdge::Top
        ));
        // Ends outside horizontally, but meets y=80 at x=112: through the rim
        assert!(segment_crosses_edge(
            Point::new(100.0, 70.0),
            Point::new(130.0, 95.0),
            &hoop,
            HoopEdge::Top
        ));
        // Moving upward through the edge is never a crossing
        assert!(!segment_crosses_edge(
            Point::new(100.0, 95.0),
            Point::new(100.0, 70.0),
            &hoop,
            HoopEdge::Top
        ));
    }

    #[test]
    fn test_landing_exactly_on_edge_counts() {
        assert!(segment_crosses_edge(
            Point::new(100.0, 60.0),
            Point::new(100.0, 80.0),
            &hoop_box(),
            HoopEdge::Top
        ));
    }

    #[test]
    fn test_oversized_ball_is_not_at_depth() {
        let big = BALL_AREA_AT_DEPTH * 2.5; // ratio ≈ 0.58
        let samples: Vec<(Point, f32)> = [(100.0, 50.0), (100.0, 70.0), (100.0, 95.0), (100.0, 130.0)]
            .iter()
            .map(|&(x, y)| (Point::new(x, y), big))
            .collect();
        let seq = ShotSequence::from_samples(hoop_box(), &samples);
        let f = analyzer().analyze(&seq, &hoop_box());
        assert_eq!(f.top_crossings, 1);
        assert_eq!(f.valid_top_crossings, 0);
        assert_eq!(f.valid_bottom_crossings, 0);
        assert!(f.avg_size_ratio > 0.5);
    }

    #[test]
    fn test_size_spike_outside_band_is_not_at_depth() {
        let a = analyzer();
        // ratio 0.23 is fine, but 4× the mean ball size is not
        assert!(a.is_depth_correct(368.0, 1600.0, 368.0));
        assert!(!a.is_depth_correct(368.0, 1600.0, 92.0));
        assert!(!a.is_depth_correct(368.0, 0.0, 368.0));
    }

    #[test]
    fn test_degenerate_inputs_return_zero_features() {
        let a = analyzer();
        let empty = ShotSequence::from_samples(hoop_box(), &[]);
        assert_eq!(a.analyze(&empty, &hoop_box()), GeometricFeatures::default());

        let single = sequence_from(&[(100.0, 90.0)]);
        let f = a.analyze(&single, &hoop_box());
        assert_eq!(f.total_points, 1);
        assert_eq!(f.total_crossings(), 0);
        assert_eq!(f.trajectory_consistency, 0.0);
    }

    #[test]
    fn test_stationary_ball_has_zero_ratios() {
        let seq = sequence_from(&[(100.0, 90.0), (100.0, 90.0), (100.0, 90.0)]);
        let f = analyzer().analyze(&seq, &hoop_box());
        assert_eq!(f.up_down_ratio, 0.0);
        assert_eq!(f.trajectory_consistency, 0.0);
        assert_eq!(f.avg_size_ratio, 0.0);
    }
}
