//! Density-aware subsampling of projected points.
//!
//! Points are binned on a uniform `b × b` grid over `[-1, 1]²`, then each
//! non-empty bin contributes a subsample whose size grows sublinearly with
//! the bin population. Sparse regions keep about half their points, dense
//! regions are thinned logarithmically, so the scatter keeps its shape
//! without overplotting.

use crate::error::ConfigError;
use crate::projector::Projection;
use crate::sampling::{unit_index, UnitSource};
use crate::Point2;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Reduced samples plus the anchors passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reduction {
    pub samples: Vec<Point2>,
    pub anchors: Vec<Point2>,
}

/// Grid cell of coordinate `v` for `bins` cells over `[-1, 1]`, clamped so
/// points slightly outside the domain land in the border cells.
pub fn bin_index(v: f64, bins: usize) -> usize {
    let delta = 2.0 / bins as f64;
    let cell = ((v + 1.0) / delta).floor();
    // NaN falls through both comparisons and is cast to 0
    if cell >= (bins - 1) as f64 {
        bins - 1
    } else if cell > 0.0 {
        cell as usize
    } else {
        0
    }
}

/// Number of points to keep from a bin holding `count` points.
pub fn target_size(count: usize) -> f64 {
    let k = count as f64;
    if count <= 100 {
        k / 2.0
    } else if count <= 1000 {
        k.log2()
    } else {
        5.0 * k.log2()
    }
}

/// Group `points` by grid cell. The result is indexed `[i * bins + j]` where
/// `i` is the x cell and `j` the y cell.
pub fn bin_points(points: &[Point2], bins: usize) -> Vec<Vec<Point2>> {
    let mut grid = vec![Vec::new(); bins * bins];
    for &[x, y] in points {
        let i = bin_index(x, bins);
        let j = bin_index(y, bins);
        grid[i * bins + j].push([x, y]);
    }
    grid
}

/// Rejection draws allowed per requested entry before giving up on the source.
const DRAWS_PER_PICK: usize = 64;

/// Draw `ceil(target_size(len))` distinct entries from one bin by rejection
/// sampling, in draw order.
///
/// A source that keeps repeating itself is cut off after a bounded number of
/// draws. The rest of the quota is then filled with the lowest unused indices.
fn sample_bin<S: UnitSource + ?Sized>(entries: &[Point2], rng: &mut S, out: &mut Vec<Point2>) {
    let n = entries.len();
    let want = (target_size(n).ceil() as usize).min(n);
    let mut taken = HashSet::with_capacity(want);
    let mut draws = 0usize;
    while taken.len() < want && draws < want * DRAWS_PER_PICK {
        draws += 1;
        let idx = unit_index(rng.next_unit(), n);
        if taken.insert(idx) {
            out.push(entries[idx]);
        }
    }

    if taken.len() < want {
        warn!(
            bin_size = n,
            wanted = want,
            drawn = taken.len(),
            draws,
            "random source stalled, filling bin deterministically"
        );
        for idx in (0..n).filter(|i| !taken.contains(i)).take(want - taken.len()) {
            out.push(entries[idx]);
        }
    }
}

/// Reduce `points` to a density-aware subsample.
///
/// Output order is bin traversal order (x cell major, then y cell), and
/// within a bin the order of the draws. Given the same points and a source
/// in the same state, the result is identical.
pub fn reduce<S: UnitSource + ?Sized>(
    points: &[Point2],
    bins: usize,
    rng: &mut S,
) -> Result<Vec<Point2>, ConfigError> {
    if bins == 0 {
        return Err(ConfigError::ZeroBins);
    }

    let grid = bin_points(points, bins);
    let mut out = Vec::new();
    let mut occupied = 0usize;
    for entries in grid.iter().filter(|e| !e.is_empty()) {
        occupied += 1;
        sample_bin(entries, rng, &mut out);
    }

    debug!(
        input = points.len(),
        kept = out.len(),
        bins,
        occupied,
        "reduced projected samples"
    );
    Ok(out)
}

/// Reduce the samples of a projection, passing its anchors through.
pub fn reduce_projection<S: UnitSource + ?Sized>(
    projection: &Projection,
    bins: usize,
    rng: &mut S,
) -> Result<Reduction, ConfigError> {
    Ok(Reduction {
        samples: reduce(&projection.samples, bins, rng)?,
        anchors: projection.anchors.clone(),
    })
}
