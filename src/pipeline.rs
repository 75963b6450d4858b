//! Memoized view pipeline.
//!
//! Expensive stages (projection, reduction, rasterization) are cached under
//! explicit keys built from their inputs. Rotation is applied after the
//! fact to the cached unrotated results, so turning the view never
//! reprojects, re-reduces or advances the random source.

use crate::color::{color_points, render_color_field_with, ColorField, Rgb};
use crate::config::ViewConfig;
use crate::error::Result;
use crate::geometry::rotate;
use crate::projector::{validate_rows, Projection, Projector};
use crate::reducer::{reduce_projection, Reduction};
use crate::sampling::{select_rows, RowSelection, UnitSource};
use crate::Point2;
use tracing::{info, warn};

// ─── Single-slot memo ───────────────────────────────────────────────────────

/// Holds the value computed for the most recent key.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Memo { slot: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if that is the key it was computed for.
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.slot {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    pub fn is_cached(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Return the cached value for `key`, computing it if the key changed.
    /// A failed computation leaves the memo empty.
    pub fn get_or_try_compute<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<&V, E> {
        let entry = match self.slot.take() {
            Some((k, v)) if k == key => (k, v),
            _ => (key, compute()?),
        };
        Ok(&self.slot.insert(entry).1)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}

// ─── Pipeline ───────────────────────────────────────────────────────────────

/// How many times each stage actually ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub projections: usize,
    pub reductions: usize,
    pub color_fields: usize,
}

/// Selected row indices and their unrotated projection.
#[derive(Debug, Clone)]
pub struct SelectedProjection {
    pub rows: Vec<usize>,
    pub projection: Projection,
}

/// Everything a renderer needs for one frame.
#[derive(Debug)]
pub struct View<'a> {
    pub labels: &'a [String],
    /// Rotated anchors, one per label.
    pub anchors: Vec<Point2>,
    /// Rotated reduced samples.
    pub samples: Vec<Point2>,
    pub color_field: &'a ColorField,
}

type ProjectionKey = (u64, usize, RowSelection);
type ReductionKey = (ProjectionKey, usize);
type ColorKey = (u32, bool, u64);

pub struct RadViz {
    labels: Vec<String>,
    rows: Vec<Vec<f64>>,
    dims: usize,
    revision: u64,
    config: ViewConfig,
    rng: Box<dyn UnitSource + Send>,
    projection: Memo<ProjectionKey, SelectedProjection>,
    reduction: Memo<ReductionKey, Reduction>,
    color_field: Memo<ColorKey, ColorField>,
    stats: PipelineStats,
}

impl std::fmt::Debug for RadViz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadViz")
            .field("labels", &self.labels)
            .field("rows", &self.rows.len())
            .field("dims", &self.dims)
            .field("revision", &self.revision)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Dimension count from the data, falling back to the labels when empty.
fn infer_dims(labels: &[String], rows: &[Vec<f64>]) -> usize {
    rows.first().map(Vec::len).unwrap_or(labels.len())
}

impl RadViz {
    pub fn new(labels: Vec<String>, rows: Vec<Vec<f64>>, config: ViewConfig) -> Result<Self> {
        config.validate()?;
        let rng = config.sampler.build(config.seed);
        let mut viz = RadViz {
            labels: Vec::new(),
            rows: Vec::new(),
            dims: 0,
            revision: 0,
            config,
            rng,
            projection: Memo::new(),
            reduction: Memo::new(),
            color_field: Memo::new(),
            stats: PipelineStats::default(),
        };
        viz.set_data(labels, rows)?;
        Ok(viz)
    }

    /// Replace the data set. Invalidates projection and reduction.
    pub fn set_data(&mut self, labels: Vec<String>, rows: Vec<Vec<f64>>) -> Result<()> {
        let dims = infer_dims(&labels, &rows);
        Projector::new(dims, 0.0)?;
        validate_rows(&rows, dims)?;
        if !labels.is_empty() && labels.len() != dims {
            warn!(labels = labels.len(), dims, "label count does not match dimension count");
        }

        self.labels = labels;
        self.rows = rows;
        self.dims = dims;
        self.revision += 1;
        Ok(())
    }

    /// Replace the view configuration. A new seed or sampler restarts the
    /// random source; other changes only affect the cache keys they feed.
    pub fn set_config(&mut self, config: ViewConfig) -> Result<()> {
        config.validate()?;
        if config.seed != self.config.seed || config.sampler != self.config.sampler {
            self.rng = config.sampler.build(config.seed);
            self.reduction.invalidate();
            self.projection.invalidate();
        }
        self.config = config;
        Ok(())
    }

    /// Swap in a caller-provided random source.
    pub fn set_random_source(&mut self, rng: Box<dyn UnitSource + Send>) {
        self.rng = rng;
        self.reduction.invalidate();
        self.projection.invalidate();
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    fn projection_key(&self) -> ProjectionKey {
        (self.revision, self.config.sample_size, self.config.row_selection)
    }

    fn color_key(&self) -> ColorKey {
        (self.config.size, self.config.flat_mode, self.config.lightness.to_bits())
    }

    /// Unrotated projection of the selected rows.
    pub fn projection(&mut self) -> Result<&SelectedProjection> {
        let key = self.projection_key();
        ensure_projection(
            &mut self.projection,
            key,
            &self.rows,
            self.dims,
            self.rng.as_mut(),
            &mut self.stats,
        )
    }

    /// Unrotated reduction of the current projection.
    pub fn reduction(&mut self) -> Result<&Reduction> {
        let projection_key = self.projection_key();
        let bins = self.config.bins;
        let selected = ensure_projection(
            &mut self.projection,
            projection_key,
            &self.rows,
            self.dims,
            self.rng.as_mut(),
            &mut self.stats,
        )?;
        let rng = self.rng.as_mut();
        let stats = &mut self.stats;
        let reduction = self.reduction.get_or_try_compute((projection_key, bins), || -> Result<Reduction> {
            let reduced = reduce_projection(&selected.projection, bins, rng)?;
            stats.reductions += 1;
            info!(kept = reduced.samples.len(), bins, "recomputed reduction");
            Ok(reduced)
        })?;
        Ok(reduction)
    }

    /// Background raster for the current size and mode.
    pub fn color_field(&mut self) -> Result<&ColorField> {
        let key = self.color_key();
        ensure_color_field(&mut self.color_field, key, &mut self.stats)
    }

    /// Rotated projected samples (all selected rows, not only the reduced ones).
    pub fn rotated_samples(&mut self) -> Result<Vec<Point2>> {
        let angle = self.config.rotation_radians();
        let selected = self.projection()?;
        Ok(rotate(&selected.projection.samples, angle))
    }

    /// Color of every selected sample at the current rotation.
    pub fn sample_colors(&mut self) -> Result<Vec<Rgb>> {
        let lightness = self.config.lightness;
        Ok(color_points(&self.rotated_samples()?, lightness))
    }

    /// Lens membership of every selected sample; all `true` without a lens.
    pub fn lens_mask(&mut self) -> Result<Vec<bool>> {
        let lens = self.config.lens;
        let samples = self.rotated_samples()?;
        Ok(match lens {
            Some(lens) => lens.mask(&samples),
            None => vec![true; samples.len()],
        })
    }

    /// Assemble the current frame.
    pub fn view(&mut self) -> Result<View<'_>> {
        let angle = self.config.rotation_radians();
        let (anchors, samples) = {
            let reduction = self.reduction()?;
            (rotate(&reduction.anchors, angle), rotate(&reduction.samples, angle))
        };
        let key = self.color_key();
        let color_field = ensure_color_field(&mut self.color_field, key, &mut self.stats)?;
        Ok(View {
            labels: &self.labels,
            anchors,
            samples,
            color_field,
        })
    }
}

fn ensure_projection<'a>(
    memo: &'a mut Memo<ProjectionKey, SelectedProjection>,
    key: ProjectionKey,
    rows: &[Vec<f64>],
    dims: usize,
    rng: &mut (dyn UnitSource + Send),
    stats: &mut PipelineStats,
) -> Result<&'a SelectedProjection> {
    let (_, sample_size, selection) = key;
    memo.get_or_try_compute(key, || -> Result<SelectedProjection> {
        let picked = select_rows(rows.len(), sample_size, selection, rng);
        let subset: Vec<&[f64]> = picked.iter().map(|&i| rows[i].as_slice()).collect();
        let projection = Projector::new(dims, 0.0)?.project(&subset)?;
        stats.projections += 1;
        info!(rows = picked.len(), dims, "recomputed projection");
        Ok(SelectedProjection {
            rows: picked,
            projection,
        })
    })
}

fn ensure_color_field<'a>(
    memo: &'a mut Memo<ColorKey, ColorField>,
    key: ColorKey,
    stats: &mut PipelineStats,
) -> Result<&'a ColorField> {
    let (size, flat_mode, lightness) = (key.0, key.1, f64::from_bits(key.2));
    memo.get_or_try_compute(key, || -> Result<ColorField> {
        let field = render_color_field_with(size, flat_mode, lightness)?;
        stats.color_fields += 1;
        info!(size, flat_mode, "recomputed color field");
        Ok(field)
    })
}
