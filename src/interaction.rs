//! Tooltip state machine for the map.
//!
//! The controller is the only owner of [`TooltipState`]. Every transition
//! builds a fresh state value; collaborators learn about focus changes through
//! a [`HoverSink`] and about page changes through a [`NavigationSink`].

use log::{debug, warn};

use crate::cluster::Cluster;
use crate::data::CommunityRecord;
use crate::viewport::ViewportConfig;

/// Vertical gap between a marker's top edge and the tooltip anchor.
pub const TOOLTIP_GAP: f64 = 1.0;

/// Receives the id of the record under interactive focus, or `None`.
pub trait HoverSink {
    fn hover(&mut self, id: Option<&str>);
}

/// Opens the detail view for a normalized identifier.
pub trait NavigationSink {
    fn navigate(&mut self, slug: &str);
}

/// Axis-aligned rectangle in screen units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Tooltip anchor relative to the map container: the bottom-center point
/// the tooltip hangs from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TooltipPosition {
    pub x: f64,
    pub y: f64,
}

impl TooltipPosition {
    /// Centered over `marker`, just above its top edge.
    pub fn above(marker: ScreenRect, container: ScreenRect) -> Self {
        Self {
            x: marker.x - container.x + marker.width / 2.0,
            y: marker.y - container.y - TOOLTIP_GAP,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TooltipContent {
    Single(CommunityRecord),
    Cluster(Vec<CommunityRecord>),
}

impl TooltipContent {
    /// Record behind a tooltip line. A single tooltip shows the name on its
    /// first line and the province below it; a cluster lists one member per
    /// line.
    pub fn entry_at(&self, line: usize) -> Option<&CommunityRecord> {
        match self {
            TooltipContent::Single(record) => (line == 0).then_some(record),
            TooltipContent::Cluster(members) => members.get(line),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum TooltipState {
    #[default]
    Idle,
    Showing {
        content: TooltipContent,
        position: TooltipPosition,
    },
}

impl TooltipState {
    pub fn is_showing(&self) -> bool {
        matches!(self, TooltipState::Showing { .. })
    }
}

#[derive(Debug)]
pub struct InteractionController {
    tooltip: TooltipState,
    hover_enabled: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self { tooltip: TooltipState::Idle, hover_enabled: true }
    }
}

impl InteractionController {
    pub fn new(viewport: &ViewportConfig) -> Self {
        let mut controller = Self::default();
        controller.configure(viewport);
        controller
    }

    /// Adopts a new viewport. Compact viewports behave like touch screens
    /// and never report hover.
    pub fn configure(&mut self, viewport: &ViewportConfig) {
        self.hover_enabled = !viewport.is_compact;
    }

    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    /// Pointer click on a rendered marker. Replaces any open tooltip.
    pub fn click_marker(
        &mut self,
        cluster: &Cluster,
        marker: ScreenRect,
        container: ScreenRect,
        hover: &mut impl HoverSink,
    ) {
        let position = TooltipPosition::above(marker, container);
        let (content, focus) = match cluster.members.as_slice() {
            [record] => (TooltipContent::Single(record.clone()), Some(record.id.as_str())),
            members => (TooltipContent::Cluster(members.to_vec()), None),
        };
        debug!("event=tooltip_open members={} x={:.1} y={:.1}", cluster.len(), position.x, position.y);
        self.notify(hover, focus);
        self.tooltip = TooltipState::Showing { content, position };
    }

    /// Pointer click that hit neither the tooltip nor a marker.
    pub fn click_outside(&mut self, hover: &mut impl HoverSink) {
        if self.tooltip.is_showing() {
            self.close(hover);
        }
    }

    pub fn dismiss(&mut self, hover: &mut impl HoverSink) {
        self.close(hover);
    }

    /// Pointer motion. Only plain markers report focus.
    pub fn pointer_over(&mut self, cluster: Option<&Cluster>, hover: &mut impl HoverSink) {
        let focus = cluster.filter(|c| c.is_single()).map(|c| c.members[0].id.as_str());
        self.notify(hover, focus);
    }

    /// Picks a record out of the tooltip and navigates to its detail page.
    /// Returns the identifier handed to the navigation sink, if any.
    pub fn select(&mut self, record: &CommunityRecord, navigation: &mut impl NavigationSink) -> Option<String> {
        self.tooltip = TooltipState::Idle;
        let slug = normalize_name(&record.name);
        if slug.is_empty() {
            warn!("event=navigate status=skipped reason=empty_slug id={}", record.id);
            return None;
        }
        debug!("event=navigate slug={slug}");
        navigation.navigate(&slug);
        Some(slug)
    }

    fn close(&mut self, hover: &mut impl HoverSink) {
        self.tooltip = TooltipState::Idle;
        self.notify(hover, None);
    }

    fn notify(&self, hover: &mut impl HoverSink, id: Option<&str>) {
        if self.hover_enabled {
            hover.hover(id);
        }
    }
}

/// Turns a display name into a URL-safe identifier: ASCII letters and digits
/// are kept (lowercased), whitespace and hyphen runs become one hyphen,
/// everything else is dropped. Separators never lead or trail.
pub fn normalize_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_separator = true;
        }
    }
    slug
}
