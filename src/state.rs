use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info, warn};
use ratatui::layout::{Position, Rect};
use std::mem;
use std::path::Path;

use crate::{
    cluster::{Cluster, build_clusters_with},
    data::{CommunityRecord, CommunityStore},
    error::Result,
    interaction::{HoverSink, InteractionController, NavigationSink, ScreenRect, TooltipState},
    map_draw::{MapView, marker_bounds},
    projection::{ProjectedPoint, Projection},
    viewport::{DeviceClass, MAX_ZOOM, MIN_ZOOM, MapSettings, ViewportConfig},
};

/// Braille canvas resolution per terminal cell.
const DOTS_PER_COLUMN: f64 = 2.0;
const DOTS_PER_ROW: f64 = 4.0;
const ZOOM_STEP: f64 = 0.5;

/// Which page is on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Map,
    Community(String),
}

/// Navigation sink: keeps the current route and a back stack.
#[derive(Debug)]
pub struct Router {
    route: Route,
    history: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self { route: Route::Map, history: Vec::new() }
    }
}

impl Router {
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Returns false when there is nowhere to go back to.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.route = previous;
                true
            }
            None => false,
        }
    }
}

impl NavigationSink for Router {
    fn navigate(&mut self, slug: &str) {
        let previous = mem::replace(&mut self.route, Route::Community(slug.to_string()));
        self.history.push(previous);
    }
}

/// Community list beside the map. Acts as the hover sink so the map can
/// point at the entry under focus.
#[derive(Debug, Default)]
pub struct ListPanel {
    pub selected: usize,
    pub hovered: Option<String>,
}

impl HoverSink for ListPanel {
    fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.map(str::to_string);
    }
}

/// Tabs shown instead of side-by-side panels on compact terminals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    List,
    Map,
}

pub struct AppState {
    store: CommunityStore,
    settings: MapSettings,
    pub outline: Option<MapView>,
    viewport: Option<ViewportConfig>,
    projection: Option<Projection>,
    clusters: Vec<Cluster>,
    controller: InteractionController,
    pub list: ListPanel,
    router: Router,
    detail: Option<CommunityRecord>,
    pub tab: Panel,
    zoom_offset: f64,
    map_area: Option<Rect>,
    tooltip_area: Option<Rect>,
}

impl AppState {
    pub const HELP_TEXT: &'static str =
        "↑/↓ move · Enter open · click marker · Esc close/back · +/- zoom · Tab switch · q quit";

    pub fn new(store: CommunityStore, outline: Option<MapView>, settings: MapSettings) -> Self {
        Self {
            store,
            settings,
            outline,
            viewport: None,
            projection: None,
            clusters: Vec::new(),
            controller: InteractionController::default(),
            list: ListPanel::default(),
            router: Router::default(),
            detail: None,
            tab: Panel::List,
            zoom_offset: 0.0,
            map_area: None,
            tooltip_area: None,
        }
    }

    /// Opens the data directory. A missing or broken outline only costs the
    /// country shape; the markers are still drawn.
    pub fn load<P: AsRef<Path>>(data_dir: P, settings: MapSettings) -> Result<Self> {
        let store = CommunityStore::open(data_dir)?;
        let outline = match store.load_outline().and_then(MapView::new) {
            Ok(view) => Some(view),
            Err(err) => {
                warn!("event=outline_unavailable error={err}");
                None
            }
        };
        Ok(Self::new(store, outline, settings))
    }

    pub fn communities(&self) -> &[CommunityRecord] {
        self.store.communities()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn viewport(&self) -> Option<&ViewportConfig> {
        self.viewport.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn tooltip(&self) -> &TooltipState {
        self.controller.tooltip()
    }

    pub fn route(&self) -> &Route {
        self.router.route()
    }

    pub fn detail(&self) -> Option<&CommunityRecord> {
        self.detail.as_ref()
    }

    pub fn selected(&self) -> Option<&CommunityRecord> {
        self.communities().get(self.list.selected)
    }

    pub fn device_class(&self, columns: u16) -> DeviceClass {
        DeviceClass::from_width(columns, self.settings.compact_breakpoint)
    }

    /// Called by the UI with the canvas area of the map each frame.
    /// Projection and clusters are rebuilt only when the viewport changed.
    pub fn sync_viewport(&mut self, area: Rect, device: DeviceClass) {
        self.map_area = Some(area);
        let viewport = ViewportConfig::new(
            area.width as f64 * DOTS_PER_COLUMN,
            area.height as f64 * DOTS_PER_ROW,
            device,
            &self.settings,
            self.zoom_offset,
        );
        if self.viewport == Some(viewport) {
            return;
        }

        let projection = Projection::new(&viewport);
        self.clusters = build_clusters_with(
            self.store.communities(),
            &projection,
            self.settings.cluster_radius,
            self.settings.cluster_policy,
        );
        self.controller.configure(&viewport);
        info!(
            "event=viewport_changed width={} height={} zoom={:.2} compact={} clusters={}",
            viewport.width,
            viewport.height,
            viewport.zoom(),
            viewport.is_compact,
            self.clusters.len()
        );
        self.projection = Some(projection);
        self.viewport = Some(viewport);
    }

    /// Canvas area of the map in the last frame, if it was drawn.
    pub fn map_area(&self) -> Option<Rect> {
        self.map_area
    }

    pub fn tooltip_area(&self) -> Option<Rect> {
        self.tooltip_area
    }

    /// The map is not on screen (compact list tab or detail page).
    pub fn hide_map(&mut self) {
        self.map_area = None;
        self.tooltip_area = None;
    }

    pub fn set_tooltip_area(&mut self, area: Option<Rect>) {
        self.tooltip_area = area;
    }

    /// Returns true when the app should exit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        if key == Char('q') {
            return true;
        }

        if matches!(self.router.route(), Route::Community(_)) {
            if matches!(key, Esc | Backspace) {
                self.router.back();
                self.detail = None;
            }
            return false;
        }

        match key {
            Up => self.list.selected = self.list.selected.saturating_sub(1),
            Down => {
                if self.list.selected + 1 < self.communities().len() {
                    self.list.selected += 1;
                }
            }
            Enter => {
                if let Some(slug) = self.selected().map(CommunityRecord::slug) {
                    if !slug.is_empty() {
                        self.controller.dismiss(&mut self.list);
                        self.router.navigate(&slug);
                        self.open_detail(&slug);
                    }
                }
            }
            Esc => self.controller.dismiss(&mut self.list),
            Tab => {
                self.tab = match self.tab {
                    Panel::List => Panel::Map,
                    Panel::Map => Panel::List,
                };
            }
            Char('+') | Char('=') => self.zoom(ZOOM_STEP),
            Char('-') => self.zoom(-ZOOM_STEP),
            _ => {}
        }
        false
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if self.router.route() != &Route::Map {
            return;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.click(event.column, event.row),
            MouseEventKind::Moved => self.pointer_moved(event.column, event.row),
            _ => {}
        }
    }

    /// Routes a click to the tooltip, a marker, or the empty map, in that order.
    pub fn click(&mut self, column: u16, row: u16) {
        let at = Position::new(column, row);

        let tooltip_hit = match (self.tooltip_area, self.controller.tooltip()) {
            (Some(area), TooltipState::Showing { content, .. }) if area.contains(at) => Some(
                row.checked_sub(area.y + 1)
                    .and_then(|line| content.entry_at(line as usize))
                    .cloned(),
            ),
            _ => None,
        };
        if let Some(picked) = tooltip_hit {
            if let Some(record) = picked {
                if let Some(slug) = self.controller.select(&record, &mut self.router) {
                    self.open_detail(&slug);
                }
            }
            return;
        }

        let target = self.marker_under(column, row);
        match (target, self.map_area, self.viewport) {
            (Some(index), Some(area), Some(viewport)) => {
                let cluster = &self.clusters[index];
                let marker = to_screen(area, marker_bounds(cluster, &viewport));
                let container = ScreenRect::new(area.x as f64, area.y as f64, area.width as f64, area.height as f64);
                self.controller.click_marker(cluster, marker, container, &mut self.list);
            }
            _ => self.controller.click_outside(&mut self.list),
        }
    }

    fn pointer_moved(&mut self, column: u16, row: u16) {
        let target = self.marker_under(column, row);
        self.controller.pointer_over(target.map(|i| &self.clusters[i]), &mut self.list);
    }

    /// Index of the cluster whose marker covers the cell, nearest first.
    fn marker_under(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.map_area?;
        let viewport = self.viewport.as_ref()?;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let p = ProjectedPoint {
            x: (column - area.x) as f64 * DOTS_PER_COLUMN + DOTS_PER_COLUMN / 2.0,
            y: (row - area.y) as f64 * DOTS_PER_ROW + DOTS_PER_ROW / 2.0,
        };

        self.clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let b = marker_bounds(c, viewport);
                // A cell covers a 2x4 block of dots; give clicks that much slack.
                let slack = ScreenRect::new(
                    b.x - DOTS_PER_COLUMN / 2.0,
                    b.y - DOTS_PER_ROW / 2.0,
                    b.width + DOTS_PER_COLUMN,
                    b.height + DOTS_PER_ROW,
                );
                slack.contains(p.x, p.y)
            })
            .map(|(i, c)| (i, (c.centroid.x - p.x).hypot(c.centroid.y - p.y)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn zoom(&mut self, step: f64) {
        if self.viewport.is_some_and(|v| v.is_compact) {
            return;
        }
        let range = MAX_ZOOM - MIN_ZOOM;
        self.zoom_offset = (self.zoom_offset + step).clamp(-range, range);
        self.controller.dismiss(&mut self.list);
        debug!("event=zoom offset={}", self.zoom_offset);
    }

    fn open_detail(&mut self, slug: &str) {
        self.detail = self.store.find_by_slug(slug);
        self.tooltip_area = None;
    }
}

/// Converts a rectangle in canvas dots into terminal cells.
fn to_screen(area: Rect, dots: ScreenRect) -> ScreenRect {
    ScreenRect::new(
        area.x as f64 + dots.x / DOTS_PER_COLUMN,
        area.y as f64 + dots.y / DOTS_PER_ROW,
        dots.width / DOTS_PER_COLUMN,
        dots.height / DOTS_PER_ROW,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_keeps_a_back_stack() {
        let mut router = Router::default();
        assert!(!router.back());

        router.navigate("rosario-js");
        assert_eq!(router.route(), &Route::Community("rosario-js".to_string()));
        assert!(router.back());
        assert_eq!(router.route(), &Route::Map);
    }

    #[test]
    fn list_panel_tracks_hover() {
        let mut list = ListPanel::default();
        list.hover(Some("7"));
        assert_eq!(list.hovered.as_deref(), Some("7"));
        list.hover(None);
        assert_eq!(list.hovered, None);
    }

    #[test]
    fn dot_rectangles_map_to_cells() {
        let area = Rect::new(1, 2, 40, 20);
        let cells = to_screen(area, ScreenRect::new(10.0, 8.0, 4.0, 4.0));
        assert_eq!(cells, ScreenRect::new(6.0, 4.0, 2.0, 1.0));
    }
}
