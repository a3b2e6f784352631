//! Thread-safe wrapper for sharing one engine between threads.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! geocluster = { version = "0.1", features = ["sync"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use geocluster::{Config, Feature, FeatureId, SyncClusterEngine, WebMercatorResolutions};
//! use geo::Point;
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncClusterEngine::new(Config::default(), WebMercatorResolutions::default())?;
//! engine.set_features(vec![Feature::new(FeatureId(1), Point::new(0.0, 0.0))]);
//!
//! let reader = engine.clone();
//! let handle = thread::spawn(move || reader.level(12).is_ready());
//!
//! assert!(engine.level(12).is_ready());
//! assert!(handle.join().unwrap());
//! # Ok(())
//! # }
//! ```

use crate::cluster::Cluster;
use crate::config::Config;
use crate::engine::{ClusterEngine, EngineStats, OwnedMarker};
use crate::error::Result;
use crate::level::{Level, LevelOutcome, ResolutionSource};
use crate::query::validate_hit_query;
use geo::Point;
use geocluster_types::feature::{Feature, FeatureId};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;

/// Thread-safe wrapper around `ClusterEngine` using `Arc<RwLock<_>>`.
///
/// Cached levels are served under a shared lock. A miss takes an upgradable
/// read and upgrades to exclusive access only to compute, so concurrent
/// readers never observe a half-computed level. Mutations take the write lock.
#[derive(Debug, Clone)]
pub struct SyncClusterEngine {
    inner: Arc<RwLock<ClusterEngine>>,
}

impl SyncClusterEngine {
    pub fn new<R>(config: Config, resolutions: R) -> Result<Self>
    where
        R: ResolutionSource + Send + Sync + 'static,
    {
        Ok(Self::from_engine(ClusterEngine::new(config, resolutions)?))
    }

    pub fn from_engine(engine: ClusterEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn level(&self, level: Level) -> LevelOutcome {
        if let Some(result) = self.inner.read().cached_level(level) {
            return LevelOutcome::Ready(result);
        }

        let guard = self.inner.upgradable_read();
        if let Some(result) = guard.cached_level(level) {
            return LevelOutcome::Ready(result);
        }
        let mut engine = RwLockUpgradableReadGuard::upgrade(guard);
        engine.level(level)
    }

    pub fn locate(&self, level: Level, point: Point<f64>, hit_radius: f64) -> Result<Option<Cluster>> {
        validate_hit_query(point, hit_radius)?;
        match self.level(level).into_result() {
            Some(result) => Ok(result.locate(point, hit_radius)?.cloned()),
            None => Ok(None),
        }
    }

    /// Markers for `level`, built under the same guard that found the level.
    pub fn markers(&self, level: Level) -> Vec<OwnedMarker> {
        {
            let engine = self.inner.read();
            if let Some(result) = engine.cached_level(level) {
                let passthrough = engine.config().singleton_passthrough;
                return result.markers(passthrough).map(OwnedMarker::from).collect();
            }
        }
        self.with_engine(|engine| engine.markers(level))
    }

    pub fn set_features<I>(&self, features: I)
    where
        I: IntoIterator<Item = Feature>,
    {
        self.inner.write().set_features(features);
    }

    pub fn insert_feature(&self, feature: Feature) -> Option<Feature> {
        self.inner.write().insert_feature(feature)
    }

    pub fn remove_feature(&self, id: FeatureId) -> Option<Feature> {
        self.inner.write().remove_feature(id)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn stats(&self) -> EngineStats {
        self.inner.read().stats()
    }

    /// Run `f` with exclusive access to the underlying engine.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut ClusterEngine) -> T) -> T {
        f(&mut self.inner.write())
    }
}
