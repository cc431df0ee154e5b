use serde::Serialize;

use crate::graph::{NodeGroup, TopologyGraph};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Star,
    Triangle,
    Dot,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NodeVisual {
    pub shape: NodeShape,
    pub fill: Color,
    pub border: Color,
    pub base_size: f32,
}

pub fn group_visual(group: NodeGroup) -> NodeVisual {
    match group {
        NodeGroup::Explorer => NodeVisual {
            shape: NodeShape::Star,
            fill: Color::from_rgb(0xf5, 0x9e, 0x0b),
            border: Color::from_rgb(0xd9, 0x77, 0x06),
            base_size: 25.0,
        },
        NodeGroup::Target => NodeVisual {
            shape: NodeShape::Triangle,
            fill: Color::from_rgb(0xef, 0x44, 0x44),
            border: Color::from_rgb(0xdc, 0x26, 0x26),
            base_size: 25.0,
        },
        NodeGroup::Hop => NodeVisual {
            shape: NodeShape::Dot,
            fill: Color::from_rgb(0x63, 0x66, 0xf1),
            border: Color::from_rgb(0x4f, 0x46, 0xe5),
            base_size: 15.0,
        },
        NodeGroup::Phantom => NodeVisual {
            shape: NodeShape::Dot,
            fill: Color::from_rgb(0x6b, 0x72, 0x80),
            border: Color::from_rgb(0x4b, 0x56, 0x63),
            base_size: 10.0,
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgeVisual {
    pub dashed: bool,
    pub width: f32,
    pub color: Color,
    pub highlight: Color,
}

pub fn edge_visual(from: Option<NodeGroup>, to: Option<NodeGroup>) -> EdgeVisual {
    let touches_phantom = from == Some(NodeGroup::Phantom) || to == Some(NodeGroup::Phantom);
    let touches_critical = from.is_some_and(NodeGroup::is_critical)
        || to.is_some_and(NodeGroup::is_critical);

    if touches_phantom {
        EdgeVisual {
            dashed: true,
            width: 1.0,
            color: Color::from_rgb(0x6b, 0x72, 0x80),
            highlight: Color::from_rgb(0x63, 0x66, 0xf1),
        }
    } else if touches_critical {
        EdgeVisual {
            dashed: false,
            width: 3.0,
            color: Color::from_rgb(0xf5, 0x9e, 0x0b),
            highlight: Color::from_rgb(0xfa, 0xcc, 0x15),
        }
    } else {
        EdgeVisual {
            dashed: false,
            width: 2.0,
            color: Color::from_rgb(0x4b, 0x56, 0x63),
            highlight: Color::from_rgb(0x63, 0x66, 0xf1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: String,
    pub label: String,
    pub group: NodeGroup,
    pub visual: NodeVisual,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneEdge {
    pub key: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub visual: EdgeVisual,
}

pub fn build_scene(graph: &TopologyGraph) -> (Vec<SceneNode>, Vec<SceneEdge>) {
    let nodes = graph
        .nodes
        .values()
        .map(|node| SceneNode {
            id: node.id.clone(),
            label: node.display_label(),
            group: node.group,
            visual: group_visual(node.group),
            x: node.x,
            y: node.y,
        })
        .collect::<Vec<_>>();

    let edges = graph
        .edges
        .iter()
        .map(|(key, edge)| {
            let from_group = graph.nodes.get(&edge.from).map(|node| node.group);
            let to_group = graph.nodes.get(&edge.to).map(|node| node.group);

            SceneEdge {
                key: key.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.clone(),
                visual: edge_visual(from_group, to_group),
            }
        })
        .collect::<Vec<_>>();

    (nodes, edges)
}
