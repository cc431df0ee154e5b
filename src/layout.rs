use std::collections::BTreeMap;
use std::f64::consts::TAU;

use serde::Serialize;

use crate::graph::TopologyGraph;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeTarget {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

pub fn isp_buckets(graph: &TopologyGraph) -> BTreeMap<&str, Vec<&str>> {
    let mut buckets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, node) in &graph.nodes {
        buckets.entry(node.isp()).or_default().push(id);
    }
    buckets
}

pub fn cluster_layout(graph: &TopologyGraph) -> Vec<NodeTarget> {
    let buckets = isp_buckets(graph);
    if buckets.is_empty() {
        return Vec::new();
    }

    let slice = TAU / buckets.len() as f64;
    let mut targets = Vec::with_capacity(graph.node_count());

    for (bucket_index, members) in buckets.values().enumerate() {
        let start = bucket_index as f64 * slice;
        let radius = 400.0 + 200.0 * ((members.len() + 1) as f64).ln();

        for (member_index, id) in members.iter().enumerate() {
            let angle = start + (member_index as f64 / members.len() as f64) * slice * 0.8;
            targets.push(NodeTarget {
                id: (*id).to_string(),
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            });
        }
    }

    targets
}
