//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::viewport::{ClusterPolicy, MapSettings};

#[derive(Parser, Debug, Clone)]
#[command(name = "community-atlas")]
#[command(about = "Tech communities across the country, on a terminal map")]
#[command(version)]
pub struct Cli {
    /// Directory holding communities.json, communities/<slug>.json and outline.geojson
    #[arg(long, env = "ATLAS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for rotating log files
    #[arg(long, env = "ATLAS_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, env = "ATLAS_LOG", default_value = "info")]
    pub log_level: String,

    /// Distance in canvas pixels under which markers merge
    #[arg(long, default_value_t = 8.0)]
    pub cluster_radius: f64,

    /// Which in-range cluster absorbs a marker
    #[arg(long, value_enum, default_value_t = ClusterPolicy::FirstFit)]
    pub cluster_policy: ClusterPolicy,

    /// Terminals narrower than this many columns use the compact layout
    #[arg(long, default_value_t = 100)]
    pub compact_breakpoint: u16,
}

impl Cli {
    pub fn map_settings(&self) -> MapSettings {
        MapSettings {
            cluster_radius: self.cluster_radius.max(0.0),
            cluster_policy: self.cluster_policy,
            compact_breakpoint: self.compact_breakpoint,
            ..MapSettings::default()
        }
    }
}
