use anyhow::{Result, bail};
use chrono::Utc;
use serde_json::{Map, Value, json};

pub const FILE_VERSION: &str = "0.6.8";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FileVersion {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw
            .split('.')
            .map(|part| part.trim().parse::<u32>().unwrap_or(0));

        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            patch: parts.next().unwrap_or(0),
        }
    }

    pub fn feature_level(self) -> (u32, u32) {
        (self.major, self.minor)
    }
}

pub fn upgrade_if_needed(data: Value) -> Result<(Value, bool)> {
    let raw_version = data
        .get("file_version")
        .and_then(Value::as_str)
        .unwrap_or("0.0")
        .to_string();
    let version = FileVersion::parse(&raw_version);
    let floor = FileVersion::parse(FILE_VERSION);

    if version.major > floor.major {
        bail!(
            "file version {raw_version} is newer than the supported {FILE_VERSION}; \
             refusing to load"
        );
    }

    if version.feature_level() >= floor.feature_level() {
        return Ok((data, false));
    }

    tracing::info!("migrating legacy graph file from {raw_version} to {FILE_VERSION}");
    Ok((migrate_legacy(&data), true))
}

fn migrate_legacy(data: &Value) -> Value {
    let edges = coerce_records(data.get("edges"))
        .into_iter()
        .map(|mut edge| {
            repair_edge_endpoints(&mut edge);
            edge
        })
        .collect::<Vec<_>>();

    let timestamp = data
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    let mut out = Map::new();
    out.insert("file_version".to_string(), json!(FILE_VERSION));
    out.insert("nodes".to_string(), Value::Array(coerce_records(data.get("nodes"))));
    out.insert("edges".to_string(), Value::Array(edges));
    out.insert(
        "explorers".to_string(),
        data.get("explorers").cloned().unwrap_or_else(|| json!({})),
    );
    out.insert("timestamp".to_string(), json!(timestamp));
    Value::Object(out)
}

fn coerce_records(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

fn repair_edge_endpoints(edge: &mut Value) {
    let Some(object) = edge.as_object_mut() else {
        return;
    };

    let complete = ["from", "to"].iter().all(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|value| !value.is_empty())
    });
    if complete {
        return;
    }

    let endpoints = object
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| id.split_once('-'))
        .map(|(from, to)| (from.to_string(), to.to_string()));

    if let Some((from, to)) = endpoints {
        object.insert("from".to_string(), json!(from));
        object.insert("to".to_string(), json!(to));
    }
}
