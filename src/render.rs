use crate::graph::LatencySeries;
use crate::layout::NodeTarget;
use crate::lod::LodUpdate;
use crate::scene::{SceneEdge, SceneNode};
use crate::territory::Point;

pub trait RenderSurface {
    fn install_scene(&mut self, nodes: &[SceneNode], edges: &[SceneEdge]);
    fn clear(&mut self);
    fn scale(&self) -> f32;
    fn node_position(&self, id: &str) -> Option<Point>;
    fn move_nodes(&mut self, targets: &[NodeTarget], animated: bool);
    fn set_physics(&mut self, enabled: bool);
    fn fit_view(&mut self);
    fn apply_lod(&mut self, update: &LodUpdate);
}

pub trait ChartSink {
    fn show_series(&mut self, series: &LatencySeries);
}
