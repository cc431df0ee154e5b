use std::collections::HashMap;
use std::time::{Duration, Instant};

use cartografo::graph::LatencySeries;
use cartografo::layout::NodeTarget;
use cartografo::lod::LodUpdate;
use cartografo::render::{ChartSink, RenderSurface};
use cartografo::scene::{NodeShape, SceneEdge, SceneNode};
use cartografo::session::{Debouncer, MapSession, ZOOM_DEBOUNCE};
use cartografo::territory::Point;

#[derive(Default)]
struct RecordingSurface {
    nodes: Vec<SceneNode>,
    edges: Vec<SceneEdge>,
    cleared: usize,
    scale: f32,
    positions: HashMap<String, Point>,
    moves: Vec<(Vec<NodeTarget>, bool)>,
    physics: Vec<bool>,
    fits: usize,
    lod_updates: Vec<LodUpdate>,
}

impl RenderSurface for RecordingSurface {
    fn install_scene(&mut self, nodes: &[SceneNode], edges: &[SceneEdge]) {
        self.nodes = nodes.to_vec();
        self.edges = edges.to_vec();
    }

    fn clear(&mut self) {
        self.cleared += 1;
        self.nodes.clear();
        self.edges.clear();
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn node_position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    fn move_nodes(&mut self, targets: &[NodeTarget], animated: bool) {
        self.moves.push((targets.to_vec(), animated));
    }

    fn set_physics(&mut self, enabled: bool) {
        self.physics.push(enabled);
    }

    fn fit_view(&mut self) {
        self.fits += 1;
    }

    fn apply_lod(&mut self, update: &LodUpdate) {
        self.lod_updates.push(update.clone());
    }
}

#[derive(Default)]
struct RecordingChart {
    series: Vec<LatencySeries>,
}

impl ChartSink for RecordingChart {
    fn show_series(&mut self, series: &LatencySeries) {
        self.series.push(series.clone());
    }
}

const SAMPLE: &str = r#"{
    "file_version": "0.6.8",
    "timestamp": "2024-01-01T00:00:00Z",
    "nodes": [
        {"id": "explorer", "label": "📍 Explorador (explorer)"},
        {"id": "hop-a", "label": "hop-a", "geo_info": {"status": "success", "isp": "AcmeNet", "country": "BR", "city": "Recife"}},
        {"id": "hop-b", "label": "hop-b", "geo_info": {"isp": "AcmeNet"}},
        {"id": "hop-c", "label": "hop-c", "geo_info": {"isp": "AcmeNet"}},
        {"id": "alvo.example", "label": "🎯 alvo.example"}
    ],
    "edges": [
        {"from": "explorer", "to": "hop-a", "latencies": [5.0, 15.0]},
        {"from": "hop-a", "to": "alvo.example", "label": "TCP:443", "latencies": [7.0]}
    ]
}"#;

fn loaded_session() -> MapSession<RecordingSurface> {
    let mut session = MapSession::new(RecordingSurface::default());
    session.load_str(SAMPLE).expect("load");
    session
}

#[test]
fn load_installs_scene_and_enables_physics() {
    let session = loaded_session();
    let surface = session.surface();

    assert_eq!(surface.nodes.len(), 5);
    assert_eq!(surface.edges.len(), 2);
    assert_eq!(surface.physics, vec![true]);

    let explorer = surface
        .nodes
        .iter()
        .find(|node| node.id == "explorer")
        .expect("explorer in scene");
    assert_eq!(explorer.label, "Explorador (explorer)");
    assert_eq!(explorer.visual.shape, NodeShape::Star);
}

#[test]
fn failed_load_keeps_the_previous_graph() {
    let mut session = loaded_session();
    assert!(session.load_str("not json at all").is_err());

    assert!(session.graph().is_some());
    assert_eq!(session.surface().cleared, 1);
    assert_eq!(session.graph().unwrap().node_count(), 5);
}

#[test]
fn reload_supersedes_the_previous_session() {
    let mut session = loaded_session();
    let replacement = r#"{
        "file_version": "0.6.8",
        "nodes": [{"id": "only", "label": "only"}],
        "edges": []
    }"#;

    session.load_str(replacement).expect("reload");
    assert_eq!(session.surface().cleared, 2);
    assert_eq!(session.graph().unwrap().node_count(), 1);
    assert!(!session.graph().unwrap().nodes.contains_key("explorer"));
}

#[test]
fn zoom_bursts_coalesce_into_one_trailing_update() {
    let mut session = loaded_session();
    let start = Instant::now();

    session.on_zoom(0.4, start);
    session.tick(start + Duration::from_millis(50));
    assert!(session.surface().lod_updates.is_empty());

    session.on_zoom(0.5, start + Duration::from_millis(100));
    session.tick(start + Duration::from_millis(200));
    assert!(session.surface().lod_updates.is_empty(), "window restarted");

    session.tick(start + Duration::from_millis(260));
    assert_eq!(session.surface().lod_updates.len(), 1);

    session.tick(start + Duration::from_millis(400));
    assert_eq!(session.surface().lod_updates.len(), 1, "nothing pending");
}

#[test]
fn first_stabilization_lays_out_fits_and_refreshes() {
    let mut session = loaded_session();
    session.surface_mut().scale = 0.5;

    session.on_stabilization_complete();

    let surface = session.surface();
    assert_eq!(surface.moves.len(), 1);
    let (targets, animated) = &surface.moves[0];
    assert_eq!(targets.len(), 5);
    assert!(!animated);
    assert_eq!(surface.fits, 1);
    assert_eq!(surface.physics, vec![true, false]);
    assert_eq!(surface.lod_updates.len(), 1);
}

#[test]
fn reorganize_animates_and_restarts_physics() {
    let mut session = loaded_session();
    session.on_stabilization_complete();
    session.reorganize();

    {
        let surface = session.surface();
        assert_eq!(surface.moves.len(), 2);
        assert!(surface.moves[1].1, "reorganize animates");
        assert_eq!(surface.physics, vec![true, false, true]);
    }

    session.on_stabilization_complete();
    let surface = session.surface();
    assert_eq!(surface.physics, vec![true, false, true, false]);
    assert_eq!(surface.fits, 1, "only the first settle fits the view");
    assert_eq!(surface.moves.len(), 2, "later settles do not re-layout");
}

#[test]
fn stabilization_progress_is_tracked_while_physics_runs() {
    let mut session = loaded_session();
    session.on_stabilization_progress(0.4);
    assert_eq!(session.stabilization_progress(), 0.4);

    session.on_stabilization_complete();
    assert_eq!(session.stabilization_progress(), 1.0);

    session.on_stabilization_progress(0.2);
    assert_eq!(session.stabilization_progress(), 1.0, "ignored once physics stops");
}

#[test]
fn territories_come_from_rendered_positions() {
    let mut session = loaded_session();
    session.surface_mut().scale = 0.5;
    session.surface_mut().positions = HashMap::from([
        ("hop-a".to_string(), Point::new(0.0, 0.0)),
        ("hop-b".to_string(), Point::new(10.0, 0.0)),
        ("hop-c".to_string(), Point::new(0.0, 10.0)),
    ]);

    session.on_stabilization_complete();

    let territories = session.territories();
    assert_eq!(territories.len(), 1);
    assert_eq!(territories[0].isp, "AcmeNet");
    assert_eq!(territories[0].hull.len(), 3);

    session.surface_mut().scale = 0.9;
    assert!(session.territories().is_empty(), "suppressed when zoomed in");
}

#[test]
fn territories_wait_for_physics_to_settle() {
    let mut session = loaded_session();
    session.surface_mut().scale = 0.5;
    assert!(session.territories().is_empty());
}

#[test]
fn node_selection_reports_stripped_title_and_geo() {
    let session = loaded_session();

    let details = session.select_node("hop-a").expect("details");
    assert_eq!(details.title, "hop-a");
    let geo = details.geo.expect("resolved geo");
    assert_eq!(geo.isp.as_deref(), Some("AcmeNet"));
    assert_eq!(geo.city.as_deref(), Some("Recife"));

    let unresolved = session.select_node("hop-b").expect("details");
    assert!(unresolved.geo.is_none(), "geo shown only when lookup succeeded");

    assert!(session.select_node("missing").is_none());
}

#[test]
fn edge_selection_surfaces_stats_and_charts_multi_sample_series() {
    let session = loaded_session();
    let mut chart = RecordingChart::default();

    let details = session
        .select_edge("explorer-hop-a-conn", &mut chart)
        .expect("details");
    assert_eq!(details.stats.samples, 2);
    assert_eq!(details.stats.avg, 10.0);
    assert_eq!(details.stats.min, 5.0);
    assert_eq!(details.stats.max, 15.0);
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].samples, vec![5.0, 15.0]);

    let single = session
        .select_edge("hop-a-alvo.example-TCP:443", &mut chart)
        .expect("details");
    assert_eq!(single.stats.samples, 1);
    assert_eq!(chart.series.len(), 1, "single-sample edges draw no chart");
}

#[test]
fn renderer_edge_ids_resolve_to_stored_keys() {
    let session = loaded_session();
    assert_eq!(
        session.edge_key_for_endpoints("hop-a", "alvo.example"),
        Some("hop-a-alvo.example-TCP:443".to_string())
    );
    assert_eq!(session.edge_key_for_endpoints("explorer", "hop-b"), None);
}

#[test]
fn debouncer_keeps_only_the_trailing_value() {
    let start = Instant::now();
    let mut debounce: Debouncer<u32> = Debouncer::new(ZOOM_DEBOUNCE);

    debounce.submit(start, 1);
    debounce.submit(start + Duration::from_millis(100), 2);
    assert_eq!(debounce.fire(start + Duration::from_millis(200)), None);
    assert_eq!(debounce.fire(start + Duration::from_millis(250)), Some(2));
    assert!(debounce.idle());
    assert_eq!(debounce.fire(start + Duration::from_millis(900)), None);
}
