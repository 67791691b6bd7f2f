use std::collections::HashMap;

use log::warn;

use crate::config::LayoutConfig;
use crate::id::NodeId;
use crate::propagate::{NodeKind, VisualGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl NodeKind {
    /// Fixed on-canvas size of a node of this kind.
    pub fn size(self) -> Size {
        let (width, height) = match self {
            NodeKind::Input => (300.0, 180.0),
            NodeKind::Hidden => (90.0, 90.0),
            NodeKind::Output => (170.0, 90.0),
            NodeKind::Weight => (170.0, 40.0),
        };
        Size { width, height }
    }
}

/// A layered graph-drawing algorithm.
///
/// Implementations must be deterministic: the same sizes, edges and config
/// always produce the same centers. The returned vector is indexed like `sizes`.
pub trait LayeredLayout {
    fn centers(&self, sizes: &[Size], edges: &[(usize, usize)], config: &LayoutConfig) -> Vec<Point>;
}

/// A placed node, anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox {
    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// One box per visual node, in the graph's node order.
    pub boxes: Vec<NodeBox>,
    index: HashMap<NodeId, usize>,
}

impl Layout {
    pub fn get(&self, id: &NodeId) -> Option<&NodeBox> {
        self.index.get(id).map(|&i| &self.boxes[i])
    }

    /// Width and height of the smallest box containing every node.
    pub fn extent(&self) -> Size {
        self.boxes.iter().fold(Size { width: 0.0, height: 0.0 }, |acc, b| Size {
            width: acc.width.max(b.x + b.width),
            height: acc.height.max(b.y + b.height),
        })
    }
}

pub fn layout(graph: &VisualGraph, config: &LayoutConfig, engine: &dyn LayeredLayout) -> Layout {
    let index: HashMap<NodeId, usize> = graph.nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    let sizes: Vec<Size> = graph.nodes.iter().map(|n| n.kind.size()).collect();
    let edges: Vec<(usize, usize)> = graph
        .edges
        .iter()
        .filter_map(|e| match (index.get(&e.source), index.get(&e.target)) {
            (Some(&s), Some(&t)) => Some((s, t)),
            _ => {
                warn!("edge {} has an endpoint outside the graph; skipped in layout", e.id);
                None
            }
        })
        .collect();

    let centers = engine.centers(&sizes, &edges, config);
    if centers.len() != sizes.len() {
        warn!("layout engine returned {} points for {} nodes", centers.len(), sizes.len());
    }

    let boxes = graph
        .nodes
        .iter()
        .zip(&sizes)
        .enumerate()
        .map(|(i, (node, size))| {
            let center = centers.get(i).copied().unwrap_or_default();
            NodeBox {
                id: node.id,
                x: center.x - size.width / 2.0,
                y: center.y - size.height / 2.0,
                width: size.width,
                height: size.height,
            }
        })
        .collect();
    Layout { boxes, index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layered::Sugiyama;
    use crate::model::NeuralNetwork;
    use crate::model::tests::with_hidden;
    use crate::propagate::synthesize;

    /// Puts every node's center at (10 * index, 0).
    struct Row;

    impl LayeredLayout for Row {
        fn centers(&self, sizes: &[Size], _: &[(usize, usize)], _: &LayoutConfig) -> Vec<Point> {
            (0..sizes.len()).map(|i| Point { x: 10.0 * i as f64, y: 0.0 }).collect()
        }
    }

    #[test]
    fn centers_become_top_left_boxes() {
        let graph = synthesize(&NeuralNetwork::default());
        let placed = layout(&graph, &LayoutConfig::default(), &Row);
        let first = placed.get(&NodeId::Input(0)).unwrap();
        assert_eq!((first.x, first.y), (-150.0, -90.0));
        assert_eq!(first.center(), Point { x: 0.0, y: 0.0 });
        let weight = &placed.boxes[1];
        assert_eq!((weight.width, weight.height), (170.0, 40.0));
        assert_eq!(weight.x, 10.0 - 85.0);
    }

    #[test]
    fn identical_input_gives_identical_coordinates() {
        let graph = synthesize(&with_hidden());
        let config = LayoutConfig::default();
        let a = layout(&graph, &config, &Sugiyama);
        let b = layout(&graph, &config, &Sugiyama);
        assert_eq!(a, b);
        assert_eq!(a.boxes.len(), graph.nodes.len());
    }

    #[test]
    fn flow_reads_left_to_right() {
        let graph = synthesize(&with_hidden());
        let placed = layout(&graph, &LayoutConfig::default(), &Sugiyama);
        for edge in &graph.edges {
            let from = placed.get(&edge.source).unwrap();
            let to = placed.get(&edge.target).unwrap();
            assert!(from.x + from.width <= to.x, "{}", edge.id);
        }
        let extent = placed.extent();
        assert!(extent.width > 0.0 && extent.height > 0.0);
    }
}
