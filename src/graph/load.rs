use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::util::mean;

use super::migrate::{FILE_VERSION, upgrade_if_needed};
use super::{EdgeRecord, GeoInfo, GraphMeta, NodeGroup, NodeRecord, TopologyGraph, edge_key};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub migrated: bool,
    pub nodes: usize,
    pub edges: usize,
    pub skipped_nodes: usize,
    pub skipped_edges: usize,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    file_version: Option<String>,
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<Value>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: String,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    geo_info: Option<Value>,
    #[serde(default)]
    fqdns: Vec<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    latencies: Option<Vec<f64>>,
}

enum GroupRule {
    IdPrefix(&'static str, NodeGroup),
    LabelMarker(&'static [&'static str], NodeGroup),
}

const GROUP_RULES: &[GroupRule] = &[
    GroupRule::IdPrefix("phantom", NodeGroup::Phantom),
    GroupRule::LabelMarker(&["📍", "Explorador"], NodeGroup::Explorer),
    GroupRule::LabelMarker(&["🎯"], NodeGroup::Target),
];

fn infer_group(id: &str, label: &str) -> NodeGroup {
    for rule in GROUP_RULES {
        match rule {
            GroupRule::IdPrefix(prefix, group) if id.starts_with(prefix) => return *group,
            GroupRule::LabelMarker(markers, group)
                if markers.iter().any(|marker| label.contains(marker)) =>
            {
                return *group;
            }
            _ => {}
        }
    }
    NodeGroup::Hop
}

fn parse_group(raw: &str) -> Option<NodeGroup> {
    match raw {
        "explorer" => Some(NodeGroup::Explorer),
        "target" => Some(NodeGroup::Target),
        "hop" => Some(NodeGroup::Hop),
        "phantom" => Some(NodeGroup::Phantom),
        _ => None,
    }
}

pub fn load_from_str(raw: &str) -> Result<(TopologyGraph, LoadReport)> {
    let data: Value =
        serde_json::from_str(raw).context("failed to parse .graph file as JSON")?;
    load_from_value(data)
}

pub fn load_from_value(data: Value) -> Result<(TopologyGraph, LoadReport)> {
    let (data, migrated) = upgrade_if_needed(data)?;
    let raw = RawFile::deserialize(&data)
        .context("graph file does not match the expected shape")?;

    let mut report = LoadReport {
        migrated,
        ..LoadReport::default()
    };

    let mut nodes = BTreeMap::new();
    for value in &raw.nodes {
        let Ok(node) = RawNode::deserialize(value) else {
            report.skipped_nodes += 1;
            tracing::warn!("skipping malformed node record");
            continue;
        };
        let Some(id) = node.id.filter(|id| !id.is_empty()) else {
            report.skipped_nodes += 1;
            tracing::warn!("skipping node record without an id");
            continue;
        };

        let group = node
            .group
            .as_deref()
            .and_then(parse_group)
            .unwrap_or_else(|| infer_group(&id, &node.label));
        let geo_info = node
            .geo_info
            .and_then(|value| GeoInfo::deserialize(value).ok());

        let record = NodeRecord {
            id: id.clone(),
            label: node.label,
            group,
            geo_info,
            fqdns: node.fqdns,
            x: node.x,
            y: node.y,
        };
        if nodes.insert(id.clone(), record).is_some() {
            tracing::warn!("node id {id} repeats in this file; keeping the last record");
        }
    }

    let mut edges = BTreeMap::new();
    for value in &raw.edges {
        let Ok(edge) = RawEdge::deserialize(value) else {
            report.skipped_edges += 1;
            tracing::warn!("skipping malformed edge record");
            continue;
        };
        let (Some(from), Some(to)) = (
            edge.from.filter(|from| !from.is_empty()),
            edge.to.filter(|to| !to.is_empty()),
        ) else {
            report.skipped_edges += 1;
            tracing::warn!("skipping edge record without both endpoints");
            continue;
        };

        let latencies = edge.latencies.unwrap_or_default();
        let key = edge_key(&from, &to, edge.label.as_deref());
        let record = EdgeRecord {
            from,
            to,
            label: edge.label,
            avg_latency: mean(&latencies),
            latencies,
        };
        if edges.insert(key.clone(), record).is_some() {
            tracing::warn!("edge key {key} repeats in this file; keeping the last record");
        }
    }

    report.nodes = nodes.len();
    report.edges = edges.len();

    let meta = GraphMeta {
        version: raw.file_version.unwrap_or_else(|| FILE_VERSION.to_string()),
        timestamp: raw
            .timestamp
            .filter(|timestamp| !timestamp.is_empty())
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    };

    Ok((TopologyGraph { nodes, edges, meta }, report))
}
