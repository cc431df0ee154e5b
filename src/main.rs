use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use clap::Parser;

use cartografo::graph::load_from_str;
use cartografo::layout::cluster_layout;
use cartografo::territory::{Point, TerritoryConfig, compute_territories};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    graph: PathBuf,

    #[arg(long)]
    layout_out: Option<PathBuf>,

    #[arg(long)]
    territories_at: Option<f32>,

    #[arg(long, default_value_t = 10)]
    top_isps: usize,
}

fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.format("%Y-%m-%d %H:%M").to_string())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|parsed| parsed.format("%Y-%m-%d %H:%M").to_string())
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.graph)
        .with_context(|| format!("failed to read {}", args.graph.display()))?;
    let (graph, report) = load_from_str(&raw)?;

    println!(
        "{}: v{} ({})",
        args.graph.display(),
        graph.meta.version,
        format_timestamp(&graph.meta.timestamp)
    );
    if report.migrated {
        println!("  migrated from a legacy file layout");
    }
    println!("  nodes: {}  edges: {}", report.nodes, report.edges);
    if report.skipped_nodes > 0 || report.skipped_edges > 0 {
        println!(
            "  skipped: {} nodes, {} edges (missing required fields)",
            report.skipped_nodes, report.skipped_edges
        );
    }

    for (group, count) in graph.group_counts() {
        println!("  {:>8}: {count}", group.label());
    }

    let mut isps = graph.isp_histogram().into_iter().collect::<Vec<_>>();
    isps.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    isps.truncate(args.top_isps);
    if !isps.is_empty() {
        println!("  providers:");
        for (isp, count) in isps {
            println!("    {count:>5}  {isp}");
        }
    }

    if let Some(path) = &args.layout_out {
        let targets = cluster_layout(&graph);
        let payload = serde_json::to_string_pretty(&targets)?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {} layout targets to {}", graph.node_count(), path.display());
    }

    if let Some(scale) = args.territories_at {
        let targets = cluster_layout(&graph);
        let positions = targets
            .iter()
            .map(|target| (target.id.as_str(), Point::new(target.x, target.y)))
            .collect::<HashMap<_, _>>();

        let mut buckets = std::collections::BTreeMap::new();
        for (id, node) in &graph.nodes {
            if let Some(position) = positions.get(id.as_str()) {
                buckets
                    .entry(node.isp())
                    .or_insert_with(Vec::new)
                    .push(*position);
            }
        }

        let territories = compute_territories(&buckets, scale, &TerritoryConfig::default());
        if territories.is_empty() {
            println!("no territories at scale {scale}");
        } else {
            println!("territories at scale {scale}:");
            for territory in territories {
                println!(
                    "  {} ({} hull vertices, anchor {:.1},{:.1}, rgb {},{},{})",
                    territory.isp,
                    territory.hull.len(),
                    territory.anchor.x,
                    territory.anchor.y,
                    territory.color.r,
                    territory.color.g,
                    territory.color.b
                );
            }
        }
    }

    Ok(())
}
