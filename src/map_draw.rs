use geo::{Area, Geometry, MultiPolygon, Polygon};
use geojson::GeoJson;
use log::debug;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::canvas::{Circle, Context, Line};

use crate::cluster::Cluster;
use crate::error::Result;
use crate::interaction::ScreenRect;
use crate::projection::{ProjectedPoint, Projection};
use crate::viewport::ViewportConfig;

/// Fragments smaller than this share of a feature's largest polygon are
/// dropped (islets make the braille outline noisy).
const MIN_FRAGMENT_SHARE: f64 = 0.01;

const OUTLINE_COLOR: Color = Color::DarkGray;
const MARKER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Red;

/// Country outline prepared for drawing.
pub struct MapView {
    items: Vec<(String, MultiPolygon<f64>)>,
}

impl MapView {
    pub fn new(raw: GeoJson) -> Result<Self> {
        let mut items = Vec::new();

        let features = match raw {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(g) => vec![geojson::Feature {
                bbox: None,
                geometry: Some(g),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        for feature in features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name").or_else(|| p.get("ADMIN")).and_then(|v| v.as_str()))
                .unwrap_or("")
                .to_string();

            let Some(gj) = feature.geometry else { continue };
            let geom: Geometry<f64> = gj.value.try_into()?;
            let mp = match geom {
                Geometry::Polygon(p) => MultiPolygon(vec![p]),
                Geometry::MultiPolygon(m) => drop_fragments(m),
                _ => continue,
            };
            items.push((name, mp));
        }

        debug!("event=outline_loaded features={}", items.len());
        Ok(Self { items })
    }

    pub fn feature_count(&self) -> usize {
        self.items.len()
    }

    /// Name of the first named feature, shown as the map title.
    pub fn region_name(&self) -> Option<&str> {
        self.items.iter().map(|(name, _)| name.as_str()).find(|name| !name.is_empty())
    }

    /// Draws every ring of the outline. Segments with an endpoint outside
    /// the projection's domain are left out.
    pub fn paint(&self, ctx: &mut Context<'_>, projection: &Projection, viewport: &ViewportConfig) {
        for (_, mp) in &self.items {
            for poly in &mp.0 {
                for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
                    for window in ring.0.windows(2) {
                        let a = projection.project(window[0].x, window[0].y);
                        let b = projection.project(window[1].x, window[1].y);
                        if let (Some(a), Some(b)) = (a, b) {
                            let (a, b) = (to_canvas(a, viewport), to_canvas(b, viewport));
                            ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color: OUTLINE_COLOR });
                        }
                    }
                }
            }
        }
    }
}

fn drop_fragments(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if mp.0.len() < 2 {
        return mp;
    }
    let max_area = mp.0.iter().map(|p| p.unsigned_area()).fold(0.0, f64::max);
    let threshold = max_area * MIN_FRAGMENT_SHARE;
    let kept: Vec<Polygon<f64>> = mp.0.into_iter().filter(|p| p.unsigned_area() >= threshold).collect();
    MultiPolygon(kept)
}

/// Canvas coordinates grow upwards; projected pixels grow downwards.
fn to_canvas(p: ProjectedPoint, viewport: &ViewportConfig) -> ProjectedPoint {
    ProjectedPoint { x: p.x, y: viewport.height - p.y }
}

/// Pixel-space footprint of a cluster's marker: a circle for a single
/// community, a text label (two pixels per character, one cell high) for
/// an aggregate.
pub fn marker_bounds(cluster: &Cluster, viewport: &ViewportConfig) -> ScreenRect {
    let (half_w, half_h) = if cluster.is_single() {
        let r = viewport.marker_radius();
        (r, r)
    } else {
        (cluster.label().len() as f64, 2.0)
    };
    ScreenRect::new(
        cluster.centroid.x - half_w,
        cluster.centroid.y - half_h,
        half_w * 2.0,
        half_h * 2.0,
    )
}

/// Draws the markers on a layer above the outline. `highlight` names the
/// community currently selected in the list.
pub fn paint_markers(ctx: &mut Context<'_>, clusters: &[Cluster], viewport: &ViewportConfig, highlight: Option<&str>) {
    ctx.layer();
    for cluster in clusters {
        let at = to_canvas(cluster.centroid, viewport);
        let highlighted = highlight.is_some_and(|id| cluster.members.iter().any(|m| m.id == id));
        let color = if highlighted { HIGHLIGHT_COLOR } else { MARKER_COLOR };

        if cluster.is_single() {
            ctx.draw(&Circle { x: at.x, y: at.y, radius: viewport.marker_radius(), color });
        } else {
            let label = cluster.label();
            let x = at.x - label.len() as f64;
            let style = Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD);
            ctx.print(x, at.y, Span::styled(label, style));
        }
    }
}
