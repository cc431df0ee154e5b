use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::util::{mean, strip_decorations};

mod load;
mod migrate;

pub use load::{LoadReport, load_from_str, load_from_value};
pub use migrate::{FILE_VERSION, FileVersion, upgrade_if_needed};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    Explorer,
    Target,
    Hop,
    Phantom,
}

impl NodeGroup {
    pub fn label(self) -> &'static str {
        match self {
            Self::Explorer => "explorer",
            Self::Target => "target",
            Self::Hop => "hop",
            Self::Phantom => "phantom",
        }
    }

    pub fn is_critical(self) -> bool {
        matches!(self, Self::Explorer | Self::Target)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, rename = "regionName", skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl GeoInfo {
    pub fn resolved(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub group: NodeGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_info: Option<GeoInfo>,
    #[serde(default)]
    pub fqdns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl NodeRecord {
    pub fn isp(&self) -> &str {
        self.geo_info
            .as_ref()
            .and_then(|geo| geo.isp.as_deref())
            .filter(|isp| !isp.is_empty())
            .unwrap_or("Unknown")
    }

    pub fn display_label(&self) -> String {
        strip_decorations(&self.label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub latencies: Vec<f64>,
    #[serde(skip)]
    pub avg_latency: f64,
}

impl EdgeRecord {
    pub fn key(&self) -> String {
        edge_key(&self.from, &self.to, self.label.as_deref())
    }

    pub fn stats(&self) -> LatencyStats {
        LatencyStats::from_samples(&self.latencies)
    }

    pub fn series(&self) -> LatencySeries {
        LatencySeries {
            stats: self.stats(),
            samples: self.latencies.clone(),
        }
    }
}

pub fn edge_key(from: &str, to: &str, label: Option<&str>) -> String {
    format!("{from}-{to}-{}", label.unwrap_or("conn"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatencyStats {
    pub samples: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl LatencyStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        Self {
            samples: samples.len(),
            avg: mean(samples),
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LatencySeries {
    pub samples: Vec<f64>,
    pub stats: LatencyStats,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphMeta {
    pub version: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopologyGraph {
    pub nodes: BTreeMap<String, NodeRecord>,
    pub edges: BTreeMap<String, EdgeRecord>,
    pub meta: GraphMeta,
}

impl TopologyGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn group_counts(&self) -> BTreeMap<NodeGroup, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.group).or_insert(0) += 1;
        }
        counts
    }

    pub fn isp_histogram(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.isp()).or_insert(0) += 1;
        }
        counts
    }

    pub fn to_file_json(&self) -> Value {
        let nodes = self
            .nodes
            .values()
            .map(|node| serde_json::to_value(node).unwrap_or(Value::Null))
            .collect::<Vec<_>>();
        let edges = self
            .edges
            .values()
            .map(|edge| serde_json::to_value(edge).unwrap_or(Value::Null))
            .collect::<Vec<_>>();

        json!({
            "file_version": self.meta.version,
            "timestamp": self.meta.timestamp,
            "nodes": nodes,
            "edges": edges,
            "explorers": Map::new(),
        })
    }
}
