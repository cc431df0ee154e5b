use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::graph::{self, GeoInfo, LatencyStats, LoadReport, NodeGroup, TopologyGraph};
use crate::layout::cluster_layout;
use crate::lod::{LodConfig, LodEngine};
use crate::render::{ChartSink, RenderSurface};
use crate::scene::build_scene;
use crate::territory::{Point, Territory, TerritoryConfig, compute_territories};

pub const ZOOM_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn submit(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.window, value));
    }

    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn idle(&self) -> bool {
        self.pending.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
    pub title: String,
    pub id: String,
    pub group: NodeGroup,
    pub fqdns: Vec<String>,
    pub geo: Option<GeoInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDetails {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub stats: LatencyStats,
}

pub struct MapSession<S: RenderSurface> {
    surface: S,
    graph: Option<TopologyGraph>,
    report: Option<LoadReport>,
    lod: LodEngine,
    territory_config: TerritoryConfig,
    zoom_debounce: Debouncer<f32>,
    physics_enabled: bool,
    auto_layout_done: bool,
    stabilization_progress: f32,
}

impl<S: RenderSurface> MapSession<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            graph: None,
            report: None,
            lod: LodEngine::new(LodConfig::default()),
            territory_config: TerritoryConfig::default(),
            zoom_debounce: Debouncer::new(ZOOM_DEBOUNCE),
            physics_enabled: false,
            auto_layout_done: false,
            stabilization_progress: 0.0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn graph(&self) -> Option<&TopologyGraph> {
        self.graph.as_ref()
    }

    pub fn last_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    pub fn stabilization_progress(&self) -> f32 {
        self.stabilization_progress
    }

    pub fn load_str(&mut self, raw: &str) -> Result<LoadReport> {
        let (graph, report) = graph::load_from_str(raw)?;

        self.reset();
        let (nodes, edges) = build_scene(&graph);
        self.surface.install_scene(&nodes, &edges);
        self.surface.set_physics(true);
        self.physics_enabled = true;
        self.graph = Some(graph);
        self.report = Some(report);
        Ok(report)
    }

    pub fn reset(&mut self) {
        self.surface.clear();
        self.graph = None;
        self.report = None;
        self.lod.reset();
        self.zoom_debounce.clear();
        self.physics_enabled = false;
        self.auto_layout_done = false;
        self.stabilization_progress = 0.0;
    }

    pub fn on_zoom(&mut self, scale: f32, now: Instant) {
        self.zoom_debounce.submit(now, scale);
    }

    pub fn on_drag_end(&mut self, now: Instant) {
        let scale = self.surface.scale();
        self.zoom_debounce.submit(now, scale);
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(scale) = self.zoom_debounce.fire(now) {
            self.refresh_lod(scale);
        }
    }

    pub fn on_stabilization_progress(&mut self, fraction: f32) {
        if self.physics_enabled {
            self.stabilization_progress = fraction.clamp(0.0, 1.0);
        }
    }

    pub fn on_stabilization_complete(&mut self) {
        self.stabilization_progress = 1.0;

        let first_settle = !self.auto_layout_done;
        if first_settle {
            self.auto_layout_done = true;
            self.apply_cluster_layout(false);
        }

        self.surface.set_physics(false);
        self.physics_enabled = false;

        if first_settle {
            self.surface.fit_view();
            let scale = self.surface.scale();
            self.refresh_lod(scale);
        }
    }

    pub fn reorganize(&mut self) {
        if self.apply_cluster_layout(true) {
            self.surface.set_physics(true);
            self.physics_enabled = true;
            self.stabilization_progress = 0.0;
        }
    }

    fn apply_cluster_layout(&mut self, animated: bool) -> bool {
        let Self {
            graph: Some(graph),
            surface,
            ..
        } = self
        else {
            return false;
        };
        if graph.nodes.is_empty() {
            return false;
        }

        let targets = cluster_layout(graph);
        surface.move_nodes(&targets, animated);
        true
    }

    fn refresh_lod(&mut self, scale: f32) {
        let Self {
            graph: Some(graph),
            lod,
            surface,
            ..
        } = self
        else {
            return;
        };

        let update = lod.apply_scale(scale, graph);
        if !update.is_empty() {
            surface.apply_lod(&update);
        }
    }

    pub fn territories(&self) -> Vec<Territory> {
        let Some(graph) = &self.graph else {
            return Vec::new();
        };
        if self.physics_enabled {
            return Vec::new();
        }

        let scale = self.surface.scale();
        if scale > self.territory_config.max_scale {
            return Vec::new();
        }

        let mut buckets: BTreeMap<&str, Vec<Point>> = BTreeMap::new();
        for (id, node) in &graph.nodes {
            if !self.lod.node_visible(id) {
                continue;
            }
            let Some(position) = self.surface.node_position(id) else {
                continue;
            };
            buckets.entry(node.isp()).or_default().push(position);
        }

        compute_territories(&buckets, scale, &self.territory_config)
    }

    pub fn select_node(&self, id: &str) -> Option<NodeDetails> {
        let node = self.graph.as_ref()?.nodes.get(id)?;
        Some(NodeDetails {
            title: node.display_label(),
            id: node.id.clone(),
            group: node.group,
            fqdns: node.fqdns.clone(),
            geo: node.geo_info.as_ref().filter(|geo| geo.resolved()).cloned(),
        })
    }

    pub fn select_edge(&self, key: &str, chart: &mut dyn ChartSink) -> Option<EdgeDetails> {
        let edge = self.graph.as_ref()?.edges.get(key)?;
        let stats = edge.stats();
        if stats.samples > 1 {
            chart.show_series(&edge.series());
        }

        Some(EdgeDetails {
            from: edge.from.clone(),
            to: edge.to.clone(),
            label: edge.label.clone(),
            stats,
        })
    }

    pub fn edge_key_for_endpoints(&self, from: &str, to: &str) -> Option<String> {
        let prefix = format!("{from}-{to}-");
        self.graph
            .as_ref()?
            .edges
            .range(prefix.clone()..)
            .next()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
    }
}
