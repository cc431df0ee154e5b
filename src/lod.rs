use std::collections::HashMap;

use crate::graph::{NodeGroup, TopologyGraph};
use crate::scene::group_visual;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodConfig {
    pub min_node_size: f32,
    pub max_node_size: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            min_node_size: 6.0,
            max_node_size: 25.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupPolicy {
    pub visible_from: f32,
    pub base_size: f32,
    pub fade: Option<(f32, f32)>,
}

impl LodConfig {
    pub fn policy(&self, group: NodeGroup) -> GroupPolicy {
        let base_size = group_visual(group).base_size;
        match group {
            NodeGroup::Explorer | NodeGroup::Target => GroupPolicy {
                visible_from: 0.0,
                base_size,
                fade: None,
            },
            NodeGroup::Hop => GroupPolicy {
                visible_from: 0.2,
                base_size,
                fade: Some((0.2, 0.5)),
            },
            NodeGroup::Phantom => GroupPolicy {
                visible_from: 0.35,
                base_size,
                fade: Some((0.35, 0.65)),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeLod {
    pub visible: bool,
    pub size: f32,
    pub opacity: f32,
}

pub fn node_lod_at(scale: f32, group: NodeGroup, config: &LodConfig) -> NodeLod {
    let policy = config.policy(group);
    let ceiling = policy.base_size.min(config.max_node_size);
    let size = (policy.base_size * scale.max(0.0).sqrt() * 1.5).clamp(config.min_node_size, ceiling);
    let opacity = match policy.fade {
        None => 1.0,
        Some((fade_end, fade_start)) => {
            ((scale - fade_end) / (fade_start - fade_end)).clamp(0.0, 1.0)
        }
    };

    NodeLod {
        visible: scale >= policy.visible_from,
        size,
        opacity,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeLodChange {
    pub id: String,
    pub lod: NodeLod,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLodChange {
    pub key: String,
    pub visible: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LodUpdate {
    pub nodes: Vec<NodeLodChange>,
    pub edges: Vec<EdgeLodChange>,
}

impl LodUpdate {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct LodEngine {
    config: LodConfig,
    nodes: HashMap<String, NodeLod>,
    edges: HashMap<String, bool>,
}

impl LodEngine {
    pub fn new(config: LodConfig) -> Self {
        Self {
            config,
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn node_visible(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|lod| lod.visible)
    }

    pub fn apply_scale(&mut self, scale: f32, graph: &TopologyGraph) -> LodUpdate {
        let mut update = LodUpdate::default();

        for (id, node) in &graph.nodes {
            let next = node_lod_at(scale, node.group, &self.config);
            if self.nodes.get(id) != Some(&next) {
                self.nodes.insert(id.clone(), next);
                update.nodes.push(NodeLodChange {
                    id: id.clone(),
                    lod: next,
                });
            }
        }

        for (key, edge) in &graph.edges {
            let visible = self.node_visible(&edge.from) && self.node_visible(&edge.to);
            if self.edges.get(key) != Some(&visible) {
                self.edges.insert(key.clone(), visible);
                update.edges.push(EdgeLodChange {
                    key: key.clone(),
                    visible,
                });
            }
        }

        update
    }
}
