//! # geocluster-types
//!
//! Plain data types exchanged between the geocluster engine and its host:
//!
//! - **Input**: `Feature`, identified by a `FeatureId`
//! - **Snapshot**: `ClusterPoint`, the immutable per-build view of a clusterable feature
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::feature::{Feature, FeatureId};
//! use geo::Point;
//!
//! let shop = Feature::new(FeatureId(7), Point::new(2.35, 48.85))
//!     .with_property("visitors", 120);
//! assert!(shop.visible);
//! assert_eq!(shop.numeric_property("visitors"), Some(120.0));
//! ```

pub mod feature;
pub mod point;
