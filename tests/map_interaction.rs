use std::fs;

use community_atlas::state::{AppState, Route};
use community_atlas::{DeviceClass, MapSettings, TooltipContent, TooltipState, ui};
use crossterm::event::KeyCode;
use ratatui::{Terminal, backend::TestBackend, layout::Rect};
use tempfile::TempDir;

const LISTING: &str = r#"[
    {"id": "ba", "name": "Buenos Aires Tech!", "province": "Buenos Aires",
     "location": {"lat": -34.60, "lng": -58.38}},
    {"id": "lp", "name": "La Plata Devs", "province": "Buenos Aires",
     "location": {"lat": -34.62, "lng": -58.30}},
    {"id": "ush", "name": "Ushuaia Hackers", "province": "Tierra del Fuego",
     "location": {"lat": -54.80, "lng": -68.30}},
    {"id": "web", "name": "Remote Rustaceans", "province": "Online"}
]"#;

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("communities.json"), LISTING).unwrap();
    fs::create_dir_all(dir.path().join("communities")).unwrap();
    fs::write(
        dir.path().join("communities").join("ushuaia-hackers.json"),
        r#"{"id": "ush", "name": "Ushuaia Hackers", "province": "Tierra del Fuego",
            "description": "The southernmost meetup"}"#,
    )
    .unwrap();
    dir
}

/// Terminal cell covering the marker of the cluster holding `id`.
fn marker_cell(state: &AppState, id: &str) -> (u16, u16) {
    let area = state.map_area().unwrap();
    let cluster = state
        .clusters()
        .iter()
        .find(|c| c.members.iter().any(|m| m.id == id))
        .unwrap();
    (area.x + (cluster.centroid.x / 2.0) as u16, area.y + (cluster.centroid.y / 4.0) as u16)
}

fn full_state(dir: &TempDir) -> AppState {
    let mut state = AppState::load(dir.path(), MapSettings::default()).unwrap();
    state.sync_viewport(Rect::new(0, 0, 100, 60), DeviceClass::Full);
    state
}

#[test]
fn nearby_communities_share_a_marker() {
    let dir = data_dir();
    let state = full_state(&dir);

    let sizes: Vec<usize> = state.clusters().iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![2, 1]);
    assert!(state.outline.is_none());
}

#[test]
fn clicking_a_single_marker_opens_its_tooltip_and_focuses_the_list() {
    let dir = data_dir();
    let mut state = full_state(&dir);

    let (col, row) = marker_cell(&state, "ush");
    state.click(col, row);

    match state.tooltip() {
        TooltipState::Showing { content: TooltipContent::Single(record), .. } => assert_eq!(record.id, "ush"),
        other => panic!("unexpected tooltip {other:?}"),
    }
    assert_eq!(state.list.hovered.as_deref(), Some("ush"));
}

#[test]
fn clicking_empty_map_closes_the_tooltip() {
    let dir = data_dir();
    let mut state = full_state(&dir);

    let (col, row) = marker_cell(&state, "ush");
    state.click(col, row);
    state.click(0, 0);

    assert_eq!(state.tooltip(), &TooltipState::Idle);
    assert_eq!(state.list.hovered, None);
}

#[test]
fn cluster_tooltips_list_members_without_focus() {
    let dir = data_dir();
    let mut state = full_state(&dir);

    let (col, row) = marker_cell(&state, "ba");
    state.click(col, row);

    match state.tooltip() {
        TooltipState::Showing { content: TooltipContent::Cluster(members), .. } => {
            let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, ["ba", "lp"]);
        }
        other => panic!("unexpected tooltip {other:?}"),
    }
    assert_eq!(state.list.hovered, None);
}

#[test]
fn compact_viewports_do_not_report_hover() {
    let dir = data_dir();
    let mut state = AppState::load(dir.path(), MapSettings::default()).unwrap();
    state.sync_viewport(Rect::new(0, 0, 60, 40), DeviceClass::Compact);

    let (col, row) = marker_cell(&state, "ush");
    state.click(col, row);

    assert!(state.tooltip().is_showing());
    assert_eq!(state.list.hovered, None);
}

#[test]
fn selecting_from_the_drawn_tooltip_opens_the_detail_page() {
    let dir = data_dir();
    let mut state = AppState::load(dir.path(), MapSettings::default()).unwrap();
    let mut terminal = Terminal::new(TestBackend::new(150, 64)).unwrap();

    terminal.draw(|f| ui::draw(f, &mut state)).unwrap();
    assert!(state.viewport().is_some_and(|v| !v.is_compact));

    let (col, row) = marker_cell(&state, "ush");
    state.click(col, row);
    terminal.draw(|f| ui::draw(f, &mut state)).unwrap();

    let tooltip = state.tooltip_area().expect("tooltip drawn");
    // First line inside the border holds the community name.
    state.click(tooltip.x + 2, tooltip.y + 1);

    assert_eq!(state.route(), &Route::Community("ushuaia-hackers".to_string()));
    let detail = state.detail().unwrap();
    assert_eq!(detail.slug.as_deref(), Some("ushuaia-hackers"));
    assert_eq!(detail.description.as_deref(), Some("The southernmost meetup"));
    assert_eq!(state.tooltip(), &TooltipState::Idle);

    terminal.draw(|f| ui::draw(f, &mut state)).unwrap();
    assert!(!state.handle_input(KeyCode::Esc));
    assert_eq!(state.route(), &Route::Map);
    assert!(state.detail().is_none());
}

#[test]
fn opening_a_community_without_a_detail_file_renders_nothing() {
    let dir = data_dir();
    let mut state = full_state(&dir);

    assert!(!state.handle_input(KeyCode::Enter));

    assert_eq!(state.route(), &Route::Community("buenos-aires-tech".to_string()));
    assert!(state.detail().is_none());
    assert!(state.handle_input(KeyCode::Char('q')));
}

#[test]
fn opening_from_the_list_closes_an_open_tooltip() {
    let dir = data_dir();
    let mut state = full_state(&dir);

    let (col, row) = marker_cell(&state, "ush");
    state.click(col, row);
    assert!(state.tooltip().is_showing());

    assert!(!state.handle_input(KeyCode::Enter));
    assert_eq!(state.route(), &Route::Community("buenos-aires-tech".to_string()));
    assert_eq!(state.tooltip(), &TooltipState::Idle);
    assert_eq!(state.list.hovered, None);

    assert!(!state.handle_input(KeyCode::Esc));
    assert_eq!(state.route(), &Route::Map);
    assert_eq!(state.tooltip(), &TooltipState::Idle);
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn map_title_names_the_outline_and_list_links_submissions() {
    let dir = data_dir();
    fs::write(
        dir.path().join("outline.geojson"),
        r#"{"type": "FeatureCollection", "features": [{
            "type": "Feature", "properties": {"name": "Argentina"},
            "geometry": {"type": "Polygon",
                         "coordinates": [[[-73, -22], [-54, -22], [-54, -55], [-73, -55], [-73, -22]]]}
        }]}"#,
    )
    .unwrap();
    let mut state = AppState::load(dir.path(), MapSettings::default()).unwrap();
    let mut terminal = Terminal::new(TestBackend::new(150, 64)).unwrap();

    terminal.draw(|f| ui::draw(f, &mut state)).unwrap();

    let text = screen_text(&terminal);
    assert!(text.contains("Tech Communities in Argentina"));
    assert!(text.contains("Add yours: https://techhubs.ar"));
}

#[test]
fn compact_layout_starts_on_the_list_tab() {
    let dir = data_dir();
    let mut state = AppState::load(dir.path(), MapSettings::default()).unwrap();
    let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();

    terminal.draw(|f| ui::draw(f, &mut state)).unwrap();
    assert!(state.map_area().is_none());

    state.handle_input(KeyCode::Tab);
    terminal.draw(|f| ui::draw(f, &mut state)).unwrap();
    assert!(state.map_area().is_some());
    assert!(state.viewport().is_some_and(|v| v.is_compact));
}
