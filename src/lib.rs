//! Tech communities on a terminal map.
//!
//! The map core is three pure pieces: [`projection`] places coordinates on
//! the canvas, [`cluster`] merges nearby markers, and [`interaction`] turns
//! clicks into tooltips, hover notifications and navigation. The rest of the
//! crate loads the static data and draws it with ratatui.

pub mod cli;
pub mod cluster;
pub mod data;
pub mod error;
pub mod interaction;
pub mod logging;
pub mod map_draw;
pub mod projection;
pub mod state;
pub mod ui;
pub mod viewport;

pub use cluster::{Cluster, build_clusters, build_clusters_with};
pub use data::{CommunityRecord, CommunityStore, Location};
pub use error::{AtlasError, Result};
pub use interaction::{
    HoverSink, InteractionController, NavigationSink, ScreenRect, TooltipContent, TooltipPosition,
    TooltipState, normalize_name,
};
pub use projection::{ProjectedPoint, Projection};
pub use viewport::{ClusterPolicy, DeviceClass, MapSettings, ViewportConfig};
