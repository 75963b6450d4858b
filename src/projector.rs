//! Radial projection of n-part compositions onto the unit disk.
//!
//! Each dimension owns an anchor on a circle of radius [`ANCHOR_RADIUS`],
//! spaced `2π/n` apart clockwise from `π/2 + rotation`. A row is first
//! mapped to the weighted combination of the anchors and then pushed out
//! radially to the edge of the sector spanned by the two anchors around
//! it, which spreads the samples in a star shape instead of collapsing
//! them toward the centre.

use crate::error::{ConfigError, DataError, Error};
use crate::geometry::{norm, normalize_angle, polar_to_cartesian, rotate};
use crate::Point2;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use tracing::{debug, warn};

/// Anchors sit just inside the unit circle so they stay distinct from the rim.
pub const ANCHOR_RADIUS: f64 = 0.997;

/// Below this, `cos(half sector)` is treated as zero (two opposite anchors).
const FLAT_SECTOR_EPS: f64 = 1e-12;

/// Output of one projection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// One anchor per dimension, in column order.
    pub anchors: Vec<Point2>,
    /// One point per input row, in row order.
    pub samples: Vec<Point2>,
    /// Indices of rows that summed to zero and were placed at the origin.
    pub degenerate: Vec<usize>,
}

impl Projection {
    /// Apply a post-hoc rotation to both samples and anchors.
    pub fn rotated(&self, angle: f64) -> Projection {
        Projection {
            anchors: rotate(&self.anchors, angle),
            samples: rotate(&self.samples, angle),
            degenerate: self.degenerate.clone(),
        }
    }
}

/// Raw anchor angles: `π/2 + rotation`, then stepping clockwise by `2π/n`.
pub fn anchor_angles(dims: usize, rotation: f64) -> Vec<f64> {
    let step = TAU / dims as f64;
    let mut angles = Vec::with_capacity(dims);
    let mut a = FRAC_PI_2 + rotation;
    for _ in 0..dims {
        angles.push(a);
        a -= step;
    }
    angles
}

/// Anchor layout for a fixed dimension count and rotation.
#[derive(Debug, Clone)]
pub struct Projector {
    dims: usize,
    rotation: f64,
    anchors: Vec<Point2>,
    /// Normalized anchor angles, ascending.
    sorted_angles: Vec<f64>,
}

impl Projector {
    pub fn new(dims: usize, rotation: f64) -> Result<Self, ConfigError> {
        if dims < 2 {
            return Err(ConfigError::TooFewDimensions { found: dims });
        }

        let angles = anchor_angles(dims, rotation);
        let anchors = angles
            .iter()
            .map(|&a| polar_to_cartesian(ANCHOR_RADIUS, a))
            .collect();

        let mut sorted_angles: Vec<f64> = angles.iter().map(|&a| normalize_angle(a)).collect();
        sorted_angles.sort_by(f64::total_cmp);

        Ok(Projector {
            dims,
            rotation,
            anchors,
            sorted_angles,
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn anchors(&self) -> &[Point2] {
        &self.anchors
    }

    /// The pair `(lo, hi)` of sorted anchor angles with `lo <= theta < hi`.
    /// When `theta` lies past the last anchor the sector wraps through 2π.
    fn sector(&self, theta: f64) -> (f64, f64) {
        self.sorted_angles
            .windows(2)
            .find(|w| w[0] <= theta && theta < w[1])
            .map(|w| (w[0], w[1]))
            .unwrap_or_else(|| {
                let first = self.sorted_angles[0];
                let last = self.sorted_angles[self.dims - 1];
                (last, first + TAU)
            })
    }

    /// Project a single row. The row must have exactly `dims` entries.
    pub fn project_row(&self, row: &[f64]) -> Point2 {
        debug_assert_eq!(row.len(), self.dims);

        let total: f64 = row.iter().sum();
        if total == 0.0 {
            return [0.0, 0.0];
        }

        let mut raw = [0.0, 0.0];
        for (&v, anchor) in row.iter().zip(&self.anchors) {
            let w = v / total;
            raw[0] += w * anchor[0];
            raw[1] += w * anchor[1];
        }

        let theta = normalize_angle(raw[1].atan2(raw[0]));
        let (lo, hi) = self.sector(theta);
        let half_cos = ((hi - lo) / 2.0).cos();
        if half_cos.abs() < FLAT_SECTOR_EPS {
            // Opposite anchors: the combination already lies on the sector edge.
            return raw;
        }

        let length = norm(raw) / half_cos * (theta - (hi + lo) / 2.0).cos();
        polar_to_cartesian(length, theta)
    }

    /// Project every row, rejecting the whole set if any row is malformed.
    pub fn project<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Projection, DataError> {
        validate_rows(rows, self.dims)?;

        let mut degenerate = Vec::new();
        let samples: Vec<Point2> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let row = row.as_ref();
                if row.iter().sum::<f64>() == 0.0 {
                    degenerate.push(i);
                }
                self.project_row(row)
            })
            .collect();

        debug!(
            rows = samples.len(),
            dims = self.dims,
            degenerate = degenerate.len(),
            "projected compositions"
        );
        if !samples.is_empty() && degenerate.len() == samples.len() {
            warn!(rows = samples.len(), "every row sums to zero; all samples sit at the origin");
        }

        Ok(Projection {
            anchors: self.anchors.clone(),
            samples,
            degenerate,
        })
    }
}

/// Check that every row has `dims` finite entries.
pub fn validate_rows<R: AsRef<[f64]>>(rows: &[R], dims: usize) -> Result<(), DataError> {
    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != dims {
            return Err(DataError::RowLength {
                row: i,
                expected: dims,
                found: row.len(),
            });
        }
        if let Some(column) = row.iter().position(|v| !v.is_finite()) {
            return Err(DataError::NonFinite { row: i, column });
        }
    }
    Ok(())
}

/// Project `rows` with anchors laid out for `rotation` radians.
///
/// The dimension count is taken from the first row; an empty matrix has no
/// usable dimension count and is rejected like `n < 2`.
pub fn project<R: AsRef<[f64]>>(rows: &[R], rotation: f64) -> Result<Projection, Error> {
    let dims = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    let projector = Projector::new(dims, rotation)?;
    Ok(projector.project(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::constrain_to_unit_disk;
    use proptest::prelude::*;

    fn close(a: Point2, b: Point2, tol: f64) -> bool {
        (a[0] - b[0]).abs() < tol && (a[1] - b[1]).abs() < tol
    }

    #[test]
    fn test_three_anchor_layout() {
        let p = Projector::new(3, 0.0).unwrap();
        let degrees: Vec<f64> = anchor_angles(3, 0.0)
            .into_iter()
            .map(|a| normalize_angle(a).to_degrees())
            .collect();
        assert!((degrees[0] - 90.0).abs() < 1e-9);
        assert!((degrees[1] - 330.0).abs() < 1e-9);
        assert!((degrees[2] - 210.0).abs() < 1e-9);
        for a in p.anchors() {
            assert!((norm(*a) - ANCHOR_RADIUS).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sorted_angles_are_numeric() {
        // 8 anchors produce angles whose degree values span 1-3 digits.
        let p = Projector::new(8, 0.3).unwrap();
        for w in p.sorted_angles.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_single_component_hits_anchor() {
        let proj = project(&[vec![1.0, 0.0, 0.0]], 0.0).unwrap();
        assert!(close(proj.samples[0], [0.0, ANCHOR_RADIUS], 1e-9));
        assert!(close(proj.samples[0], proj.anchors[0], 1e-9));
    }

    #[test]
    fn test_every_pure_row_hits_its_anchor() {
        let p = Projector::new(5, 0.7).unwrap();
        for k in 0..5 {
            let mut row = vec![0.0; 5];
            row[k] = 2.5;
            assert!(close(p.project_row(&row), p.anchors()[k], 1e-9), "dim {}", k);
        }
    }

    #[test]
    fn test_zero_row_is_origin() {
        let proj = project(&[vec![0.0, 0.0, 0.0], vec![1.0, 2.0, 3.0]], 0.0).unwrap();
        assert_eq!(proj.samples[0], [0.0, 0.0]);
        assert_eq!(proj.degenerate, vec![0]);
    }

    #[test]
    fn test_edge_midpoint_reaches_anchor_radius() {
        // Halfway between two anchors the raw point is on the hull edge; the
        // sector rescale pushes it out to the anchor radius.
        let p = Projector::new(4, 0.0).unwrap();
        let pt = p.project_row(&[1.0, 1.0, 0.0, 0.0]);
        assert!((norm(pt) - ANCHOR_RADIUS).abs() < 1e-9);
    }

    #[test]
    fn test_two_dimensions() {
        let p = Projector::new(2, 0.0).unwrap();
        let top = p.project_row(&[1.0, 0.0]);
        assert!(close(top, [0.0, ANCHOR_RADIUS], 1e-9));
        let mid = p.project_row(&[1.0, 1.0]);
        assert!(norm(mid) < 1e-9);
        let skew = p.project_row(&[3.0, 1.0]);
        assert!(close(skew, [0.0, 0.5 * ANCHOR_RADIUS], 1e-9));
    }

    #[test]
    fn test_too_few_dimensions() {
        assert!(matches!(
            Projector::new(1, 0.0),
            Err(ConfigError::TooFewDimensions { found: 1 })
        ));
        let empty: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            project(&empty, 0.0),
            Err(Error::Config(ConfigError::TooFewDimensions { found: 0 }))
        ));
    }

    #[test]
    fn test_row_length_mismatch_rejected() {
        let rows = vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]];
        match project(&rows, 0.0) {
            Err(Error::Data(DataError::RowLength { row, expected, found })) => {
                assert_eq!((row, expected, found), (1, 3, 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let rows = vec![vec![1.0, f64::NAN, 0.0]];
        assert!(matches!(
            project(&rows, 0.0),
            Err(Error::Data(DataError::NonFinite { row: 0, column: 1 }))
        ));
    }

    #[test]
    fn test_baked_rotation_matches_post_hoc_rotation() {
        let rows = vec![
            vec![0.2, 0.5, 0.3, 0.0],
            vec![0.9, 0.05, 0.0, 0.05],
            vec![0.1, 0.1, 0.1, 0.7],
        ];
        let angle = 0.83;
        let baked = project(&rows, angle).unwrap();
        let post = project(&rows, 0.0).unwrap().rotated(angle);
        for (a, b) in baked.samples.iter().zip(&post.samples) {
            assert!(close(*a, *b, 1e-9), "{:?} vs {:?}", a, b);
        }
        for (a, b) in baked.anchors.iter().zip(&post.anchors) {
            assert!(close(*a, *b, 1e-9));
        }
        let again = rotate(&post.samples, -angle);
        assert!(close(again[0], project(&rows, 0.0).unwrap().samples[0], 1e-9));
    }

    #[test]
    fn test_negative_and_large_rotations_match_post_hoc() {
        // Anchor angles here reach several turns below zero.
        for dims in 3..=8 {
            let unrotated = Projector::new(dims, 0.0).unwrap();
            let mut rows = vec![vec![0.0; dims]; 3];
            rows[0][1] = 0.6;
            rows[0][2] = 0.4;
            rows[1][dims - 1] = 1.0;
            rows[1][0] = 0.3;
            rows[2] = (1..=dims).map(|v| v as f64).collect();
            for step in -3600..=3600 {
                let angle = (step as f64 * 0.1).to_radians();
                let baked = Projector::new(dims, angle).unwrap();
                for row in &rows {
                    let post = rotate(&[unrotated.project_row(row)], angle)[0];
                    let got = baked.project_row(row);
                    assert!(
                        close(got, post, 1e-9),
                        "dims {} rotation {:.1} deg row {:?}: {:?} vs {:?}",
                        dims,
                        step as f64 * 0.1,
                        row,
                        got,
                        post
                    );
                }
            }
        }
    }

    // Boundedness: a row with positive total, once constrained, never leaves the disk.
    // Uniform rows collapse to the origin at any rotation.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_projection_bounded(
            row in proptest::collection::vec(0.0f64..10.0, 3..=8),
            rotation in -TAU..TAU,
        ) {
            prop_assume!(row.iter().sum::<f64>() > 0.0);
            let proj = project(&[row.clone()], rotation).unwrap();
            let [x, y] = proj.samples[0];
            let (cx, cy) = constrain_to_unit_disk(x, y);
            prop_assert!(cx.hypot(cy) <= 1.0 + 1e-9);
            // The sector rescale itself stays within the anchor circle.
            prop_assert!(x.hypot(y) <= ANCHOR_RADIUS + 1e-9, "{:?} -> {:?}", row, [x, y]);
        }

        #[test]
        fn prop_baked_rotation_matches_post_hoc(
            row in proptest::collection::vec(0.0f64..10.0, 3..=8),
            rotation in -4.0 * TAU..4.0 * TAU,
        ) {
            prop_assume!(row.iter().sum::<f64>() > 0.0);
            let baked = Projector::new(row.len(), rotation).unwrap().project_row(&row);
            let unrotated = Projector::new(row.len(), 0.0).unwrap().project_row(&row);
            let post = rotate(&[unrotated], rotation)[0];
            prop_assert!(close(baked, post, 1e-9), "{:?} vs {:?}", baked, post);
        }

        #[test]
        fn prop_uniform_row_is_origin(
            dims in 3usize..=8,
            value in 0.01f64..100.0,
            rotation in -TAU..TAU,
        ) {
            let proj = project(&[vec![value; dims]], rotation).unwrap();
            prop_assert!(norm(proj.samples[0]) < 1e-9, "{:?}", proj.samples[0]);
        }
    }
}
