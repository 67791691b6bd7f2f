use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputNode {
    pub label: String,
    pub value: f64,
    /// `weights[n]` multiplies `value` on the connection to node `n` of the next layer.
    pub weights: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HiddenNode {
    pub weights: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputNode {
    pub label: String,
}

/// The canonical network document.
///
/// Field names serialize in camelCase so the JSON form matches the documents
/// produced by the bulk editor and the persisted state. A document without
/// `hiddenLayers` is read as having no hidden layers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NeuralNetwork {
    pub input_layer: Vec<InputNode>,
    #[serde(default)]
    pub hidden_layers: Vec<Vec<HiddenNode>>,
    pub output_layer: Vec<OutputNode>,
}

/// A layer that carries outgoing weights: the input layer or one of the hidden layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLayer {
    Input,
    Hidden(usize),
}

impl fmt::Display for SourceLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLayer::Input => write!(f, "input layer"),
            SourceLayer::Hidden(l) => write!(f, "hidden layer {l}"),
        }
    }
}

/// The layer a source layer feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestLayer {
    Hidden(usize),
    Output,
}

impl NeuralNetwork {
    /// Every source layer in propagation order.
    pub fn source_layers(&self) -> Vec<SourceLayer> {
        std::iter::once(SourceLayer::Input)
            .chain((0..self.hidden_layers.len()).map(SourceLayer::Hidden))
            .collect()
    }

    /// The source layer that feeds the output layer.
    pub fn last_source_layer(&self) -> SourceLayer {
        match self.hidden_layers.len() {
            0 => SourceLayer::Input,
            n => SourceLayer::Hidden(n - 1),
        }
    }

    /// The layer fed by `layer`. `None` if `layer` names a hidden layer that does not exist.
    pub fn dest_of(&self, layer: SourceLayer) -> Option<DestLayer> {
        let next = match layer {
            SourceLayer::Input => 0,
            SourceLayer::Hidden(l) if l < self.hidden_layers.len() => l + 1,
            SourceLayer::Hidden(_) => return None,
        };
        if next < self.hidden_layers.len() {
            Some(DestLayer::Hidden(next))
        } else {
            Some(DestLayer::Output)
        }
    }

    pub fn dest_len(&self, dest: DestLayer) -> usize {
        match dest {
            DestLayer::Hidden(l) => self.hidden_layers.get(l).map_or(0, Vec::len),
            DestLayer::Output => self.output_layer.len(),
        }
    }

    /// Number of nodes in the layer fed by `layer`.
    pub fn next_len(&self, layer: SourceLayer) -> usize {
        self.dest_of(layer).map_or(0, |d| self.dest_len(d))
    }

    /// The weight vectors of every node in `layer`, in node order.
    pub fn weight_rows(&self, layer: SourceLayer) -> Vec<&[f64]> {
        match layer {
            SourceLayer::Input => self.input_layer.iter().map(|n| n.weights.as_slice()).collect(),
            SourceLayer::Hidden(l) => self
                .hidden_layers
                .get(l)
                .map(|nodes| nodes.iter().map(|n| n.weights.as_slice()).collect())
                .unwrap_or_default(),
        }
    }

    /// Mutable access to the weight vectors of every node in `layer`.
    pub fn weight_rows_mut(&mut self, layer: SourceLayer) -> Vec<&mut Vec<f64>> {
        match layer {
            SourceLayer::Input => self.input_layer.iter_mut().map(|n| &mut n.weights).collect(),
            SourceLayer::Hidden(l) => self
                .hidden_layers
                .get_mut(l)
                .map(|nodes| nodes.iter_mut().map(|n| &mut n.weights).collect())
                .unwrap_or_default(),
        }
    }

    /// The layer whose weights point into hidden layer `l`.
    pub fn feeder_of_hidden(l: usize) -> SourceLayer {
        if l == 0 {
            SourceLayer::Input
        } else {
            SourceLayer::Hidden(l - 1)
        }
    }

    /// Checks every structural and numeric invariant of the model.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.input_layer.is_empty() {
            return Err(ValidationError::EmptyInputLayer);
        }
        if self.output_layer.is_empty() {
            return Err(ValidationError::EmptyOutputLayer);
        }
        if let Some(layer) = self.hidden_layers.iter().position(Vec::is_empty) {
            return Err(ValidationError::EmptyHiddenLayer { layer });
        }
        for (node, input) in self.input_layer.iter().enumerate() {
            if !input.value.is_finite() {
                return Err(ValidationError::NonFiniteValue { node });
            }
        }
        for layer in self.source_layers() {
            let expected = self.next_len(layer);
            for (node, weights) in self.weight_rows(layer).into_iter().enumerate() {
                if weights.len() != expected {
                    return Err(ValidationError::WeightCountMismatch {
                        layer,
                        node,
                        expected,
                        actual: weights.len(),
                    });
                }
                if let Some(weight) = weights.iter().position(|w| !w.is_finite()) {
                    return Err(ValidationError::NonFiniteWeight { layer, node, weight });
                }
            }
        }
        Ok(())
    }
}

impl Default for NeuralNetwork {
    /// The spam-classifier template shown on first start.
    fn default() -> Self {
        let input = |label: &str, value: f64, weights: [f64; 2]| InputNode {
            label: label.to_string(),
            value,
            weights: weights.to_vec(),
        };
        Self {
            input_layer: vec![
                input("Number of recipients", 1.0, [0.2, 0.1]),
                input("Trusted sender", 0.4, [0.7, 0.8]),
                input("Number of links", 3.0, [0.0, 0.1]),
                input("Words in subject", 3.0, [0.0, 0.1]),
                input("Emojis in subject", 0.0, [0.0, 0.1]),
                input("Text contains recipient name", 0.0, [0.0, 0.1]),
            ],
            hidden_layers: Vec::new(),
            output_layer: vec![
                OutputNode { label: "Spam".to_string() },
                OutputNode { label: "Not spam".to_string() },
            ],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two inputs, one hidden layer of three nodes, two outputs.
    pub(crate) fn with_hidden() -> NeuralNetwork {
        NeuralNetwork {
            input_layer: vec![
                InputNode { label: "a".into(), value: 1.0, weights: vec![1.0, 2.0, 3.0] },
                InputNode { label: "b".into(), value: 2.0, weights: vec![0.5, 0.5, 0.5] },
            ],
            hidden_layers: vec![vec![
                HiddenNode { weights: vec![1.0, 0.0] },
                HiddenNode { weights: vec![0.0, 1.0] },
                HiddenNode { weights: vec![1.0, 1.0] },
            ]],
            output_layer: vec![
                OutputNode { label: "x".into() },
                OutputNode { label: "y".into() },
            ],
        }
    }

    #[test]
    fn default_template_is_valid() {
        assert_eq!(NeuralNetwork::default().validate(), Ok(()));
        assert_eq!(with_hidden().validate(), Ok(()));
    }

    #[test]
    fn dest_of_walks_to_output() {
        let nn = with_hidden();
        assert_eq!(nn.dest_of(SourceLayer::Input), Some(DestLayer::Hidden(0)));
        assert_eq!(nn.dest_of(SourceLayer::Hidden(0)), Some(DestLayer::Output));
        assert_eq!(nn.dest_of(SourceLayer::Hidden(1)), None);
        assert_eq!(NeuralNetwork::default().dest_of(SourceLayer::Input), Some(DestLayer::Output));
    }

    #[test]
    fn weight_count_mismatch_names_layer_and_node() {
        let mut nn = with_hidden();
        nn.hidden_layers[0][2].weights.push(1.0);
        let err = nn.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::WeightCountMismatch {
                layer: SourceLayer::Hidden(0),
                node: 2,
                expected: 2,
                actual: 3,
            }
        );
        assert!(err.to_string().contains("hidden layer 0"));
    }

    #[test]
    fn empty_layers_are_rejected() {
        let mut nn = with_hidden();
        nn.hidden_layers.push(Vec::new());
        assert_eq!(nn.validate(), Err(ValidationError::EmptyHiddenLayer { layer: 1 }));

        let mut nn = NeuralNetwork::default();
        nn.output_layer.clear();
        assert_eq!(nn.validate(), Err(ValidationError::EmptyOutputLayer));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let mut nn = NeuralNetwork::default();
        nn.input_layer[1].value = f64::NAN;
        assert_eq!(nn.validate(), Err(ValidationError::NonFiniteValue { node: 1 }));

        let mut nn = with_hidden();
        nn.hidden_layers[0][1].weights[0] = f64::INFINITY;
        assert_eq!(
            nn.validate(),
            Err(ValidationError::NonFiniteWeight { layer: SourceLayer::Hidden(0), node: 1, weight: 0 })
        );
    }

    #[test]
    fn missing_hidden_layers_field_reads_as_empty() {
        let json = r#"{"inputLayer":[{"label":"a","value":2,"weights":[3]}],"outputLayer":[{"label":"o"}]}"#;
        let nn: NeuralNetwork = serde_json::from_str(json).unwrap();
        assert!(nn.hidden_layers.is_empty());
        assert_eq!(nn.validate(), Ok(()));
    }
}
