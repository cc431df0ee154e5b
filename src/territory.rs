use std::collections::BTreeMap;

use crate::scene::Color;
use crate::util::name_color;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerritoryConfig {
    pub max_scale: f32,
    pub fill_alpha: f32,
    pub stroke_alpha: f32,
    pub stroke_width: f32,
    pub label_size: f32,
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        Self {
            max_scale: 0.8,
            fill_alpha: 0.10,
            stroke_alpha: 0.40,
            stroke_width: 2.0,
            label_size: 14.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Territory {
    pub isp: String,
    pub hull: Vec<Point>,
    pub anchor: Point,
    pub color: Color,
    pub fill_alpha: f32,
    pub stroke_alpha: f32,
    pub stroke_width: f32,
    pub label_size: f32,
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup_by(|a, b| a.x == b.x && a.y == b.y);
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::new();
    for &point in &sorted {
        while lower.len() >= 2
            && cross(lower[lower.len() - 2], lower[lower.len() - 1], point) <= 0.0
        {
            lower.pop();
        }
        lower.push(point);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &point in sorted.iter().rev() {
        while upper.len() >= 2
            && cross(upper[upper.len() - 2], upper[upper.len() - 1], point) <= 0.0
        {
            upper.pop();
        }
        upper.push(point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }

    let count = points.len() as f64;
    Point {
        x: points.iter().map(|point| point.x).sum::<f64>() / count,
        y: points.iter().map(|point| point.y).sum::<f64>() / count,
    }
}

pub fn compute_territories(
    buckets: &BTreeMap<&str, Vec<Point>>,
    scale: f32,
    config: &TerritoryConfig,
) -> Vec<Territory> {
    if scale > config.max_scale {
        return Vec::new();
    }

    let emphasis = (1.0 / scale.max(0.1)).clamp(1.0, 3.0);
    let mut territories = Vec::new();

    for (isp, points) in buckets {
        if points.len() < 3 {
            continue;
        }

        let hull = convex_hull(points);
        if hull.len() < 3 {
            continue;
        }

        let [r, g, b] = name_color(isp);
        territories.push(Territory {
            isp: (*isp).to_string(),
            anchor: centroid(&hull),
            hull,
            color: Color::from_rgb(r, g, b),
            fill_alpha: (config.fill_alpha * emphasis).min(0.25),
            stroke_alpha: (config.stroke_alpha * emphasis).min(0.8),
            stroke_width: config.stroke_width * emphasis,
            label_size: config.label_size * emphasis,
        });
    }

    territories
}
