use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap,
        canvas::Canvas,
    },
};

use crate::interaction::{TooltipContent, TooltipState};
use crate::map_draw::{MapView, paint_markers};
use crate::state::{AppState, Panel, Route};
use crate::viewport::DeviceClass;

const ACCENT: Color = Color::Cyan;
/// Where new communities are submitted.
const SUBMIT_URL: &str = "https://techhubs.ar";

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.area());

    let help = Paragraph::new(AppState::HELP_TEXT).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[1]);

    if let Route::Community(slug) = state.route().clone() {
        state.hide_map();
        draw_detail(f, state, &slug, chunks[0]);
        return;
    }

    let device = state.device_class(f.area().width);
    match device {
        DeviceClass::Full => {
            // map two thirds, list one third
            let panels = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(66), Constraint::Percentage(34)].as_ref())
                .split(chunks[0]);
            draw_map(f, state, panels[0], device);
            draw_list(f, state, panels[1]);
        }
        DeviceClass::Compact => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
                .split(chunks[0]);
            let selected = match state.tab {
                Panel::List => 0,
                Panel::Map => 1,
            };
            let tabs = Tabs::new(vec!["List", "Map"])
                .block(Block::default().borders(Borders::ALL))
                .select(selected)
                .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
            f.render_widget(tabs, parts[0]);

            match state.tab {
                Panel::List => {
                    state.hide_map();
                    draw_list(f, state, parts[1]);
                }
                Panel::Map => draw_map(f, state, parts[1], device),
            }
        }
    }
}

fn draw_map(f: &mut Frame, state: &mut AppState, area: Rect, device: DeviceClass) {
    let title = match state.outline.as_ref().and_then(MapView::region_name) {
        Some(region) => format!(" Tech Communities in {region} "),
        None => " Tech Communities ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        state.hide_map();
        return;
    }

    state.sync_viewport(inner, device);
    {
        let (Some(viewport), Some(projection)) = (state.viewport(), state.projection()) else {
            return;
        };
        let highlight = state.selected().map(|c| c.id.as_str());
        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, viewport.width])
            .y_bounds([0.0, viewport.height])
            .paint(|ctx| {
                if let Some(outline) = &state.outline {
                    outline.paint(ctx, projection, viewport);
                }
                paint_markers(ctx, state.clusters(), viewport, highlight);
            });
        f.render_widget(canvas, inner);
    }

    draw_tooltip(f, state, inner);
}

/// Pops the tooltip up over the map, hanging from the anchor the controller
/// computed, and records where it landed so clicks can be routed to it.
fn draw_tooltip(f: &mut Frame, state: &mut AppState, map: Rect) {
    let (title, lines, position) = match state.tooltip() {
        TooltipState::Showing { content, position } => {
            let (title, lines) = tooltip_text(content);
            (title, lines, *position)
        }
        TooltipState::Idle => {
            state.set_tooltip_area(None);
            return;
        }
    };

    let text_width = lines.iter().map(Line::width).max().unwrap_or(0).max(title.chars().count());
    let width = (text_width as u16).saturating_add(2).min(map.width);
    let height = (lines.len() as u16).saturating_add(2).min(map.height);

    let anchor_x = map.x as f64 + position.x;
    let anchor_y = map.y as f64 + position.y;
    let left = (anchor_x - width as f64 / 2.0)
        .round()
        .clamp(map.x as f64, (map.right() - width) as f64) as u16;
    let top = (anchor_y - height as f64 + 1.0)
        .round()
        .clamp(map.y as f64, (map.bottom() - height) as f64) as u16;
    let rect = Rect::new(left, top, width, height);

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(title),
    );
    f.render_widget(Clear, rect);
    f.render_widget(popup, rect);
    state.set_tooltip_area(Some(rect));
}

/// One line per selectable entry, in the order `TooltipContent::entry_at` expects.
fn tooltip_text(content: &TooltipContent) -> (String, Vec<Line<'static>>) {
    let link = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    match content {
        TooltipContent::Single(record) => (
            "Community".to_string(),
            vec![
                Line::from(Span::styled(record.name.clone(), link)),
                Line::from(record.province.clone()),
            ],
        ),
        TooltipContent::Cluster(members) => (
            format!("{} communities", members.len()),
            members
                .iter()
                .map(|m| Line::from(Span::styled(m.name.clone(), link)))
                .collect(),
        ),
    }
}

fn draw_list(f: &mut Frame, state: &AppState, area: Rect) {
    let hovered = state.list.hovered.as_deref();
    let items: Vec<ListItem> = state
        .communities()
        .iter()
        .map(|c| {
            let name_style = if hovered == Some(c.id.as_str()) {
                Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            ListItem::new(vec![
                Line::from(Span::styled(c.name.clone(), name_style)),
                Line::from(Span::styled(c.province.clone(), Style::default().fg(Color::DarkGray))),
            ])
        })
        .collect();

    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(state.list.selected));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Communities")
                .title_bottom(Line::from(format!(" Add yours: {SUBMIT_URL} ")).style(Style::default().fg(ACCENT))),
        )
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_detail(f: &mut Frame, state: &AppState, slug: &str, area: Rect) {
    let text: Vec<Line> = match state.detail() {
        Some(c) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    c.name.clone(),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                )),
                Line::from(c.province.clone()),
            ];
            if let Some(loc) = c.location {
                lines.push(Line::from(format!("{:.4}, {:.4}", loc.lat, loc.lng)));
            }
            if let Some(description) = &c.description {
                lines.push(Line::from(""));
                lines.push(Line::from(description.clone()));
            }
            if let Some(website) = &c.website {
                lines.push(Line::from(""));
                lines.push(Line::from(website.clone()));
            }
            lines
        }
        None => vec![Line::from(format!("No community found for \"{slug}\"."))],
    };

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(format!(" {slug} ")))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
