//! Node, weight and edge ids shared with the rendering host.

use std::fmt;
use std::str::FromStr;

use crate::error::IdParseError;
use crate::model::{DestLayer, NeuralNetwork, SourceLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestKind {
    Hidden,
    Output,
}

/// One weight: `node` of source `layer` to position `index` of the next layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightId {
    pub layer: SourceLayer,
    pub node: usize,
    pub dest: DestKind,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Input(usize),
    Hidden { layer: usize, node: usize },
    Output(usize),
    Weight(WeightId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hop {
    /// Source neuron to weight node.
    In,
    /// Weight node to destination neuron.
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId {
    pub weight: WeightId,
    pub hop: Hop,
}

impl WeightId {
    pub fn source_node(&self) -> NodeId {
        match self.layer {
            SourceLayer::Input => NodeId::Input(self.node),
            SourceLayer::Hidden(layer) => NodeId::Hidden { layer, node: self.node },
        }
    }

    pub fn dest_node(&self) -> NodeId {
        match self.dest {
            DestKind::Output => NodeId::Output(self.index),
            DestKind::Hidden => NodeId::Hidden {
                layer: match self.layer {
                    SourceLayer::Input => 0,
                    SourceLayer::Hidden(l) => l + 1,
                },
                node: self.index,
            },
        }
    }

    /// The weight this id names in `nn`, if the coordinate exists there and
    /// the encoded destination kind matches the layer that actually follows.
    pub fn value_in(&self, nn: &NeuralNetwork) -> Option<f64> {
        let kind = match nn.dest_of(self.layer)? {
            DestLayer::Hidden(_) => DestKind::Hidden,
            DestLayer::Output => DestKind::Output,
        };
        if kind != self.dest {
            return None;
        }
        nn.weight_rows(self.layer)
            .get(self.node)
            .and_then(|row| row.get(self.index))
            .copied()
    }
}

impl NodeId {
    pub fn exists_in(&self, nn: &NeuralNetwork) -> bool {
        match *self {
            NodeId::Input(i) => i < nn.input_layer.len(),
            NodeId::Hidden { layer, node } => nn.hidden_layers.get(layer).is_some_and(|l| node < l.len()),
            NodeId::Output(i) => i < nn.output_layer.len(),
            NodeId::Weight(w) => w.value_in(nn).is_some(),
        }
    }
}

impl EdgeId {
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        let weight = NodeId::Weight(self.weight);
        match self.hop {
            Hop::In => (self.weight.source_node(), weight),
            Hop::Out => (weight, self.weight.dest_node()),
        }
    }
}

impl fmt::Display for WeightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dest = match self.dest {
            DestKind::Hidden => "hidden",
            DestKind::Output => "output",
        };
        write!(f, "w:{}:{dest}-{}", self.source_node(), self.index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Input(i) => write!(f, "input-{i}"),
            NodeId::Hidden { layer, node } => write!(f, "hidden-{layer}-{node}"),
            NodeId::Output(i) => write!(f, "output-{i}"),
            NodeId::Weight(w) => fmt::Display::fmt(w, f),
        }
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hop = match self.hop {
            Hop::In => "in",
            Hop::Out => "out",
        };
        write!(f, "e:{}:{hop}", self.weight)
    }
}

/// Decimal digits only: no sign, no whitespace, no redundant leading zeros.
fn parse_index(s: &str, id: &str) -> Result<usize, IdParseError> {
    let canonical = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'));
    if !canonical {
        return Err(IdParseError::new(id, "index is not a plain decimal number"));
    }
    s.parse().map_err(|_| IdParseError::new(id, "index out of range"))
}

fn parse_neuron(s: &str, id: &str) -> Result<NodeId, IdParseError> {
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        ["input", i] => Ok(NodeId::Input(parse_index(i, id)?)),
        ["output", i] => Ok(NodeId::Output(parse_index(i, id)?)),
        ["hidden", layer, node] => Ok(NodeId::Hidden {
            layer: parse_index(layer, id)?,
            node: parse_index(node, id)?,
        }),
        _ => Err(IdParseError::new(id, "expected input-N, hidden-L-N or output-N")),
    }
}

fn parse_weight(s: &str, id: &str) -> Result<WeightId, IdParseError> {
    let body = s
        .strip_prefix("w:")
        .ok_or_else(|| IdParseError::new(id, "weight ids start with 'w:'"))?;
    let (source, dest) = body
        .split_once(':')
        .ok_or_else(|| IdParseError::new(id, "weight id needs a destination"))?;
    let (layer, node) = match parse_neuron(source, id)? {
        NodeId::Input(node) => (SourceLayer::Input, node),
        NodeId::Hidden { layer, node } => (SourceLayer::Hidden(layer), node),
        _ => return Err(IdParseError::new(id, "weights leave an input or hidden neuron")),
    };
    let (kind, index) = dest
        .split_once('-')
        .ok_or_else(|| IdParseError::new(id, "destination must be hidden-N or output-N"))?;
    let dest = match kind {
        "hidden" => DestKind::Hidden,
        "output" => DestKind::Output,
        _ => return Err(IdParseError::new(id, "destination must be hidden-N or output-N")),
    };
    Ok(WeightId { layer, node, dest, index: parse_index(index, id)? })
}

impl FromStr for WeightId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_weight(s, s)
    }
}

impl FromStr for NodeId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("w:") {
            parse_weight(s, s).map(NodeId::Weight)
        } else {
            parse_neuron(s, s)
        }
    }
}

impl FromStr for EdgeId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("e:")
            .ok_or_else(|| IdParseError::new(s, "edge ids start with 'e:'"))?;
        let (weight, hop) = body
            .rsplit_once(':')
            .ok_or_else(|| IdParseError::new(s, "edge id needs a hop"))?;
        let hop = match hop {
            "in" => Hop::In,
            "out" => Hop::Out,
            _ => return Err(IdParseError::new(s, "hop must be 'in' or 'out'")),
        };
        Ok(EdgeId { weight: parse_weight(weight, s)?, hop })
    }
}
