//! Spherical Web Mercator projection between longitude/latitude and canvas
//! pixels. The projection never wraps around the antimeridian, so longitudes
//! outside [-180, 180] have no image.

use std::f64::consts::PI;

use geo::Coord;

use crate::viewport::ViewportConfig;

/// Pixel-space position on the map canvas, y growing downwards.
pub type ProjectedPoint = Coord<f64>;

/// Latitude at which Web Mercator becomes a square world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Projection bound to one viewport. Rebuild it whenever the viewport changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    world_size: f64,
    origin: Coord<f64>,
}

impl Projection {
    pub fn new(viewport: &ViewportConfig) -> Self {
        let world_size = viewport.scale;
        let center = mercator(
            viewport.center.x.clamp(-180.0, 180.0),
            viewport.center.y.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            world_size,
        );
        let origin = Coord {
            x: center.x - viewport.width / 2.0,
            y: center.y - viewport.height / 2.0,
        };
        Self { world_size, origin }
    }

    /// Projects a geographic position. `None` means the point has no place
    /// on this map and should be skipped.
    pub fn project(&self, lng: f64, lat: f64) -> Option<ProjectedPoint> {
        if !lng.is_finite() || !lat.is_finite() {
            return None;
        }
        if !(-180.0..=180.0).contains(&lng) || !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&lat) {
            return None;
        }
        let world = mercator(lng, lat, self.world_size);
        Some(world - self.origin)
    }

    /// Inverse of [`Projection::project`]; returns (x = lng, y = lat).
    pub fn invert(&self, x: f64, y: f64) -> Option<Coord<f64>> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let world = Coord { x, y } + self.origin;
        if !(0.0..=self.world_size).contains(&world.x) || !(0.0..=self.world_size).contains(&world.y) {
            return None;
        }
        let lng = world.x / self.world_size * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * world.y / self.world_size);
        let lat = n.sinh().atan().to_degrees();
        Some(Coord { x: lng, y: lat })
    }
}

fn mercator(lng: f64, lat: f64, world_size: f64) -> Coord<f64> {
    let phi = lat.to_radians();
    let x = (lng + 180.0) / 360.0 * world_size;
    let y = (1.0 - (PI / 4.0 + phi / 2.0).tan().ln() / PI) / 2.0 * world_size;
    Coord { x, y }
}
