//! Radial projection of compositional data onto a color disk.
//!
//! Each n-part composition is placed on a 2D disk where every dimension
//! owns one direction (its anchor), the projected cloud is thinned by a
//! density-aware grid sampler, and disk positions are encoded as HSL
//! colors. Rendering, pointer interaction and file loading live outside
//! this crate and consume the values produced here.

pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lens;
pub mod pipeline;
pub mod preprocess;
pub mod projector;
pub mod reducer;
pub mod sampling;

/// A point in the plane, `[x, y]`.
pub type Point2 = [f64; 2];

// ─── Public surface ─────────────────────────────────────────────────────────

pub use color::{render_color_field, ColorField, ColorFieldGeometry, Hsl, Rgb};
pub use config::ViewConfig;
pub use error::{ConfigError, DataError, Error, Result};
pub use geometry::{constrain_to_unit_disk, normalize_angle, rotate};
pub use lens::Lens;
pub use pipeline::{Memo, RadViz, View};
pub use projector::{project, Projection, Projector, ANCHOR_RADIUS};
pub use reducer::{reduce, reduce_projection, Reduction};
pub use sampling::{ChaChaSource, SamplerKind, SineSequence, UnitSource};
