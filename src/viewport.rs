use geo::Coord;

/// Smallest and largest zoom the map accepts, in Web Mercator zoom levels.
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 6.0;

/// Device class: narrow terminals behave like touch devices
/// (tabs instead of side-by-side panels, no hover, no zoom keys).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Compact,
    Full,
}

impl DeviceClass {
    /// Classifies a terminal by its width in columns.
    pub fn from_width(columns: u16, breakpoint: u16) -> Self {
        if columns < breakpoint {
            DeviceClass::Compact
        } else {
            DeviceClass::Full
        }
    }
}

/// How a projected point picks among clusters that are all within range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ClusterPolicy {
    /// First qualifying cluster in creation order.
    #[default]
    FirstFit,
    /// Qualifying cluster with the closest centroid.
    Nearest,
}

/// Static map configuration, resolved from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSettings {
    /// Map center as (x = longitude, y = latitude).
    pub center: Coord<f64>,
    pub full_zoom: f64,
    pub compact_zoom: f64,
    /// Terminal width (columns) under which the viewport is compact.
    pub compact_breakpoint: u16,
    /// Cluster distance threshold in canvas pixels.
    pub cluster_radius: f64,
    pub cluster_policy: ClusterPolicy,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: Coord { x: -65.0, y: -38.0 },
            full_zoom: 2.5,
            compact_zoom: 1.25,
            compact_breakpoint: 100,
            cluster_radius: 8.0,
            cluster_policy: ClusterPolicy::FirstFit,
        }
    }
}

impl MapSettings {
    pub fn zoom_for(&self, device: DeviceClass) -> f64 {
        match device {
            DeviceClass::Compact => self.compact_zoom,
            DeviceClass::Full => self.full_zoom,
        }
    }
}

/// Everything the projection and the interaction controller need to know
/// about the surface they are drawn on. Width and height are in canvas
/// pixels (braille dots), `scale` is the projected world size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub center: Coord<f64>,
    pub is_compact: bool,
}

impl ViewportConfig {
    pub fn new(
        width: f64,
        height: f64,
        device: DeviceClass,
        settings: &MapSettings,
        zoom_offset: f64,
    ) -> Self {
        let zoom = (settings.zoom_for(device) + zoom_offset).clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            width,
            height,
            scale: 256.0 * zoom.exp2(),
            center: settings.center,
            is_compact: device == DeviceClass::Compact,
        }
    }

    pub fn zoom(&self) -> f64 {
        (self.scale / 256.0).log2()
    }

    /// Radius of an individual marker in canvas pixels.
    pub fn marker_radius(&self) -> f64 {
        if self.is_compact { 1.0 } else { 2.0 }
    }
}
