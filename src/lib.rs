//! Grid-based point clustering with per-level caching and parent linkage.
//!
//! Points are bucketed into a uniform grid sized by the level's resolution,
//! adjacent cells with close centers are merged, and each level's clusters
//! link to the cluster containing them one level coarser, so a renderer can
//! interpolate positions while zooming.
//!
//! ```rust
//! use geocluster::{ClusterEngine, Config, Feature, FeatureId, WebMercatorResolutions};
//! use geo::Point;
//!
//! let mut engine = ClusterEngine::new(Config::default(), WebMercatorResolutions::default())?;
//! engine.set_features(vec![
//!     Feature::new(FeatureId(1), Point::new(261_000.0, 6_250_000.0)),
//!     Feature::new(FeatureId(2), Point::new(261_050.0, 6_250_020.0)),
//! ]);
//!
//! let level = engine.level(10).into_result().unwrap();
//! assert_eq!(level.point_count(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod index;
pub mod level;
pub mod merge;
pub mod query;

#[cfg(feature = "sync")]
pub mod sync;

pub use cluster::{Cluster, LevelResult};
pub use config::{Config, MergeStrategy};
pub use engine::{ClusterEngine, EngineStats, OwnedMarker};
pub use error::{ClusterError, Result};
pub use grid::{Cell, CellKey};
pub use index::{IndexStats, PointIndex};
pub use level::{
    CacheStats, FixedResolutions, Level, LevelCache, LevelOutcome, ResolutionSource,
    WebMercatorResolutions,
};
pub use query::Marker;

#[cfg(feature = "sync")]
pub use sync::SyncClusterEngine;

pub use geocluster_types::feature::{Feature, FeatureId};
pub use geocluster_types::point::ClusterPoint;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{ClusterEngine, ClusterError, Config, MergeStrategy, Result};

    pub use crate::{Cluster, LevelOutcome, LevelResult, Marker, OwnedMarker};

    pub use crate::{Feature, FeatureId};

    pub use crate::{FixedResolutions, Level, ResolutionSource, WebMercatorResolutions};

    pub use geo::Point;

    #[cfg(feature = "sync")]
    pub use crate::SyncClusterEngine;
}
