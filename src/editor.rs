use log::debug;

use crate::config::EditorConfig;
use crate::id::WeightId;
use crate::model::{HiddenNode, InputNode, NeuralNetwork, OutputNode, SourceLayer};

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    AddInputNode,
    RemoveInputNode(usize),
    AddOutputNode,
    RemoveOutputNode(usize),
    AddHiddenLayer,
    RemoveHiddenLayer(usize),
    AddHiddenNode(usize),
    RemoveHiddenNode { layer: usize, node: usize },
    SetInputValue { node: usize, value: f64 },
    SetWeight { weight: WeightId, value: f64 },
    SetInputLabel { node: usize, label: String },
    SetOutputLabel { node: usize, label: String },
}

impl EditCommand {
    /// Whether the edit can add, remove or shift nodes. Positional ids taken
    /// before such an edit may point at a different node afterwards.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            EditCommand::SetInputValue { .. }
                | EditCommand::SetWeight { .. }
                | EditCommand::SetInputLabel { .. }
                | EditCommand::SetOutputLabel { .. }
        )
    }
}

/// Computes the network that results from `command`, or `None` if nothing changes.
pub fn apply(nn: &NeuralNetwork, command: &EditCommand, config: &EditorConfig) -> Option<NeuralNetwork> {
    let fill = config.default_weight;
    let mut next = nn.clone();
    let changed = match *command {
        EditCommand::AddInputNode => {
            let weights = vec![fill; nn.next_len(SourceLayer::Input)];
            next.input_layer.push(InputNode { label: "New Input".to_string(), value: 0.0, weights });
            true
        }
        EditCommand::RemoveInputNode(i) => {
            guarded_remove(&mut next.input_layer, i);
            next.input_layer.len() != nn.input_layer.len()
        }
        EditCommand::AddOutputNode => {
            next.output_layer.push(OutputNode { label: "New Output".to_string() });
            for row in next.weight_rows_mut(nn.last_source_layer()) {
                row.push(fill);
            }
            true
        }
        EditCommand::RemoveOutputNode(i) => {
            let removed = guarded_remove(&mut next.output_layer, i);
            if removed {
                remove_column(&mut next, nn.last_source_layer(), i);
            }
            removed
        }
        EditCommand::AddHiddenLayer => add_hidden_layer(&mut next, config),
        EditCommand::RemoveHiddenLayer(l) => remove_hidden_layer(&mut next, l, fill),
        EditCommand::AddHiddenNode(l) => {
            let width = next.next_len(SourceLayer::Hidden(l));
            match next.hidden_layers.get_mut(l) {
                Some(layer) => {
                    layer.push(HiddenNode { weights: vec![fill; width] });
                    for row in next.weight_rows_mut(NeuralNetwork::feeder_of_hidden(l)) {
                        row.push(fill);
                    }
                    true
                }
                None => false,
            }
        }
        EditCommand::RemoveHiddenNode { layer, node } => {
            let removed = next
                .hidden_layers
                .get_mut(layer)
                .is_some_and(|nodes| guarded_remove(nodes, node));
            if removed {
                remove_column(&mut next, NeuralNetwork::feeder_of_hidden(layer), node);
            }
            removed
        }
        EditCommand::SetInputValue { node, value } => {
            match next.input_layer.get_mut(node) {
                Some(input) if value.is_finite() && input.value != value => {
                    input.value = value;
                    true
                }
                _ => false,
            }
        }
        EditCommand::SetWeight { weight, value } => {
            if !value.is_finite() || weight.value_in(nn).is_none_or(|old| old == value) {
                false
            } else {
                let mut rows = next.weight_rows_mut(weight.layer);
                match rows.get_mut(weight.node).and_then(|row| row.get_mut(weight.index)) {
                    Some(slot) => {
                        *slot = value;
                        true
                    }
                    None => false,
                }
            }
        }
        EditCommand::SetInputLabel { node, ref label } => match next.input_layer.get_mut(node) {
            Some(input) if &input.label != label => {
                input.label.clone_from(label);
                true
            }
            _ => false,
        },
        EditCommand::SetOutputLabel { node, ref label } => match next.output_layer.get_mut(node) {
            Some(output) if &output.label != label => {
                output.label.clone_from(label);
                true
            }
            _ => false,
        },
    };

    if changed {
        Some(next)
    } else {
        debug!("edit {command:?} left the network unchanged");
        None
    }
}

/// Removes `items[i]` unless it is out of range or the last remaining item.
fn guarded_remove<T>(items: &mut Vec<T>, i: usize) -> bool {
    if items.len() <= 1 || i >= items.len() {
        return false;
    }
    items.remove(i);
    true
}

fn remove_column(nn: &mut NeuralNetwork, layer: SourceLayer, column: usize) {
    for row in nn.weight_rows_mut(layer) {
        if column < row.len() {
            row.remove(column);
        }
    }
}

/// Replaces every weight vector of `layer` with `len` copies of `fill`.
fn rewire(nn: &mut NeuralNetwork, layer: SourceLayer, len: usize, fill: f64) {
    for row in nn.weight_rows_mut(layer) {
        *row = vec![fill; len];
    }
}

/// Appends a hidden layer in front of the output layer and points the former
/// last source layer at it.
fn add_hidden_layer(nn: &mut NeuralNetwork, config: &EditorConfig) -> bool {
    let fill = config.default_weight;
    let size = config.hidden_layer_size;
    if size == 0 {
        return false;
    }
    let feeder = nn.last_source_layer();
    rewire(nn, feeder, size, fill);
    let outputs = nn.output_layer.len();
    nn.hidden_layers
        .push((0..size).map(|_| HiddenNode { weights: vec![fill; outputs] }).collect());
    true
}

fn remove_hidden_layer(nn: &mut NeuralNetwork, l: usize, fill: f64) -> bool {
    if l >= nn.hidden_layers.len() {
        return false;
    }
    nn.hidden_layers.remove(l);
    let feeder = NeuralNetwork::feeder_of_hidden(l);
    let len = nn.next_len(feeder);
    rewire(nn, feeder, len, fill);
    true
}
