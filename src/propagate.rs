//! Linear forward pass (no bias, no activation) and visual graph synthesis.

use crate::id::{DestKind, EdgeId, Hop, NodeId, WeightId};
use crate::model::{DestLayer, NeuralNetwork, SourceLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
    Weight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    /// Computed value for neurons, the raw weight for weight nodes.
    pub value: f64,
    /// Incoming connection handles.
    pub in_ports: usize,
    /// Outgoing connection handles.
    pub out_ports: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_port: Option<usize>,
    pub target_port: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn node(&self, id: &NodeId) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Edges touching `id`, for highlighting a selection.
    pub fn incident_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a VisualEdge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id || &e.target == id)
    }
}

/// Values of every layer in order: input values, each hidden layer, then the outputs.
pub fn layer_values(nn: &NeuralNetwork) -> Vec<Vec<f64>> {
    let mut values = vec![nn.input_layer.iter().map(|n| n.value).collect::<Vec<_>>()];
    for layer in nn.source_layers() {
        let prev = values.last().map(Vec::as_slice).unwrap_or_default();
        let next = weighted_sums(prev, &nn.weight_rows(layer), nn.next_len(layer));
        values.push(next);
    }
    values
}

/// `acc[n] = Σ_s rows[s][n] * prev[s]`. Positions past `len` are ignored.
fn weighted_sums(prev: &[f64], rows: &[&[f64]], len: usize) -> Vec<f64> {
    let mut acc = vec![0.0; len];
    for (weights, &value) in rows.iter().zip(prev) {
        for (slot, w) in acc.iter_mut().zip(weights.iter()) {
            *slot += w * value;
        }
    }
    acc
}

/// Turns a valid network into the node/edge set the host renders.
///
/// Each connection becomes two edges around a weight node so the weight can be
/// shown and edited on the canvas as its own element. Output order is
/// deterministic: layer by layer, each neuron followed by its weight nodes.
pub fn synthesize(nn: &NeuralNetwork) -> VisualGraph {
    let values = layer_values(nn);
    let mut graph = VisualGraph::default();
    let mut fan_in = 0;

    for (depth, layer) in nn.source_layers().into_iter().enumerate() {
        let dest = match nn.dest_of(layer) {
            Some(DestLayer::Hidden(_)) => DestKind::Hidden,
            Some(DestLayer::Output) | None => DestKind::Output,
        };
        let rows = nn.weight_rows(layer);
        for (s, weights) in rows.iter().enumerate() {
            let (id, kind, label) = match layer {
                SourceLayer::Input => (NodeId::Input(s), NodeKind::Input, nn.input_layer[s].label.clone()),
                SourceLayer::Hidden(l) => (
                    NodeId::Hidden { layer: l, node: s },
                    NodeKind::Hidden,
                    format!("Hidden {}.{}", l + 1, s + 1),
                ),
            };
            graph.nodes.push(VisualNode {
                id,
                kind,
                label: label.clone(),
                value: values[depth].get(s).copied().unwrap_or_default(),
                in_ports: fan_in,
                out_ports: weights.len(),
            });

            for (n, &weight) in weights.iter().enumerate() {
                let wid = WeightId { layer, node: s, dest, index: n };
                graph.nodes.push(VisualNode {
                    id: NodeId::Weight(wid),
                    kind: NodeKind::Weight,
                    label: label.clone(),
                    value: weight,
                    in_ports: 1,
                    out_ports: 1,
                });
                graph.edges.push(VisualEdge {
                    id: EdgeId { weight: wid, hop: Hop::In },
                    source: id,
                    target: NodeId::Weight(wid),
                    source_port: Some(n),
                    target_port: None,
                });
                graph.edges.push(VisualEdge {
                    id: EdgeId { weight: wid, hop: Hop::Out },
                    source: NodeId::Weight(wid),
                    target: wid.dest_node(),
                    source_port: None,
                    target_port: Some(s),
                });
            }
        }
        fan_in = rows.len();
    }

    let outputs = values.last().map(Vec::as_slice).unwrap_or_default();
    for (i, node) in nn.output_layer.iter().enumerate() {
        graph.nodes.push(VisualNode {
            id: NodeId::Output(i),
            kind: NodeKind::Output,
            label: node.label.clone(),
            value: outputs.get(i).copied().unwrap_or_default(),
            in_ports: fan_in,
            out_ports: 0,
        });
    }
    graph
}
