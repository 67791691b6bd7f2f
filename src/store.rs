use std::sync::Arc;

use log::{debug, info, warn};

use crate::codec;
use crate::config::EditorConfig;
use crate::editor::{self, EditCommand};
use crate::error::{BulkEditError, EncodeError, ValidationError};
use crate::id::NodeId;
use crate::layout::{self, LayeredLayout, Layout};
use crate::model::NeuralNetwork;
use crate::propagate::{self, VisualGraph};

/// Events coming back from the rendering host, still in string-id form.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Select(String),
    ClearSelection,
    ValueEdited { id: String, value: f64 },
}

/// Everything the host needs to draw one committed state.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub graph: VisualGraph,
    pub layout: Layout,
}

impl Scene {
    pub fn build(nn: &NeuralNetwork, config: &EditorConfig, engine: &dyn LayeredLayout) -> Self {
        let graph = propagate::synthesize(nn);
        let layout = layout::layout(&graph, &config.layout, engine);
        Self { graph, layout }
    }
}

#[derive(Debug)]
pub struct Store {
    current: Arc<NeuralNetwork>,
    config: EditorConfig,
    revision: u64,
    selected: Option<NodeId>,
}

impl Store {
    pub fn new(nn: NeuralNetwork, config: EditorConfig) -> Result<Self, ValidationError> {
        nn.validate()?;
        Ok(Self { current: Arc::new(nn), config, revision: 0, selected: None })
    }

    /// Starts from persisted state, or from the default template if there is
    /// none or it cannot be decoded.
    pub fn from_persisted(encoded: Option<&str>, config: EditorConfig) -> Self {
        let nn = match encoded.map(codec::decode) {
            Some(Ok(nn)) => {
                info!("restored network from persisted state");
                nn
            }
            Some(Err(err)) => {
                warn!("persisted state unusable, starting from the default network: {err}");
                NeuralNetwork::default()
            }
            None => {
                info!("no persisted state, starting from the default network");
                NeuralNetwork::default()
            }
        };
        Self { current: Arc::new(nn), config, revision: 0, selected: None }
    }

    pub fn network(&self) -> &NeuralNetwork {
        &self.current
    }

    pub fn snapshot(&self) -> Arc<NeuralNetwork> {
        Arc::clone(&self.current)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Bumped on every committed change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn scene(&self, engine: &dyn LayeredLayout) -> Scene {
        Scene::build(&self.current, &self.config, engine)
    }

    pub fn encode(&self) -> Result<String, EncodeError> {
        codec::encode(&self.current)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.current.as_ref())
    }

    /// Swaps in `nn` once it validates. A structural commit drops the
    /// selection, since ids are positional and may now name another node.
    fn commit(&mut self, nn: NeuralNetwork, structural: bool) -> Result<(), ValidationError> {
        nn.validate()?;
        self.current = Arc::new(nn);
        self.revision += 1;
        if structural || self.selected.is_some_and(|id| !id.exists_in(&self.current)) {
            self.selected = None;
        }
        Ok(())
    }

    /// Applies one edit. Returns whether the network changed.
    pub fn dispatch(&mut self, command: &EditCommand) -> bool {
        let Some(next) = editor::apply(&self.current, command, &self.config) else {
            return false;
        };
        match self.commit(next, command.is_structural()) {
            Ok(()) => {
                info!("applied {command:?} (revision {})", self.revision);
                true
            }
            Err(err) => {
                warn!("discarded {command:?}: {err}");
                false
            }
        }
    }

    /// Replaces the whole network with a JSON document from the text editor.
    /// On error the current network is kept.
    pub fn replace_from_json(&mut self, text: &str) -> Result<(), BulkEditError> {
        let nn: NeuralNetwork = serde_json::from_str(text)?;
        if nn == *self.current {
            return Ok(());
        }
        self.commit(nn, true).inspect_err(|err| warn!("rejected bulk edit: {err}"))?;
        info!("replaced network from document (revision {})", self.revision);
        Ok(())
    }

    /// Applies a host event. Ids that do not parse or do not resolve are
    /// ignored. Returns whether the network or the selection changed.
    pub fn handle_host_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::ClearSelection => self.selected.take().is_some(),
            HostEvent::Select(raw) => match raw.parse::<NodeId>() {
                Ok(id) if id.exists_in(&self.current) => self.selected.replace(id) != Some(id),
                Ok(id) => {
                    debug!("ignoring selection of unknown node {id}");
                    false
                }
                Err(err) => {
                    debug!("ignoring selection: {err}");
                    false
                }
            },
            HostEvent::ValueEdited { id, value } => {
                let command = match id.parse::<NodeId>() {
                    Ok(NodeId::Input(node)) => EditCommand::SetInputValue { node, value },
                    Ok(NodeId::Weight(weight)) => EditCommand::SetWeight { weight, value },
                    Ok(other) => {
                        debug!("ignoring value edit on derived node {other}");
                        return false;
                    }
                    Err(err) => {
                        debug!("ignoring value edit: {err}");
                        return false;
                    }
                };
                self.dispatch(&command)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layered::Sugiyama;
    use crate::model::tests::with_hidden;

    fn store() -> Store {
        Store::new(with_hidden(), EditorConfig::default()).unwrap()
    }

    #[test]
    fn snapshots_are_not_touched_by_later_commits() {
        let mut store = store();
        let before = store.snapshot();
        assert!(store.dispatch(&EditCommand::AddHiddenLayer));
        assert_eq!(*before, with_hidden());
        assert_eq!(store.network().hidden_layers.len(), 2);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn no_op_does_not_bump_revision() {
        let mut store = Store::new(NeuralNetwork::default(), EditorConfig::default()).unwrap();
        assert!(!store.dispatch(&EditCommand::RemoveHiddenLayer(0)));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn invalid_network_is_refused() {
        let mut nn = with_hidden();
        nn.output_layer.clear();
        assert_eq!(Store::new(nn, EditorConfig::default()).unwrap_err(), ValidationError::EmptyOutputLayer);
    }

    #[test]
    fn bulk_edit_keeps_previous_network_on_error() {
        let mut store = store();
        let err = store
            .replace_from_json(r#"{"inputLayer":[{"label":"a","value":1,"weights":[1,2]}],"outputLayer":[{"label":"o"}]}"#)
            .unwrap_err();
        assert!(matches!(err, BulkEditError::Invalid(ValidationError::WeightCountMismatch { node: 0, .. })));
        assert!(matches!(store.replace_from_json("{"), Err(BulkEditError::Parse(_))));
        assert_eq!(*store.network(), with_hidden());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn bulk_edit_round_trips_pretty_json() {
        let mut store = store();
        let text = store.to_json_pretty().unwrap();
        assert!(text.contains("\"hiddenLayers\""));
        store.replace_from_json(&text).unwrap();
        assert_eq!(store.revision(), 0);

        let text = text.replace("\"x\"", "\"renamed\"");
        store.replace_from_json(&text).unwrap();
        assert_eq!(store.network().output_layer[0].label, "renamed");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn value_edits_arrive_by_id() {
        let mut store = store();
        assert!(store.handle_host_event(HostEvent::ValueEdited { id: "input-1".into(), value: 4.0 }));
        assert_eq!(store.network().input_layer[1].value, 4.0);
        assert!(store.handle_host_event(HostEvent::ValueEdited { id: "w:hidden-0-0:output-1".into(), value: 2.0 }));
        assert_eq!(store.network().hidden_layers[0][0].weights, vec![1.0, 2.0]);
    }

    #[test]
    fn bad_ids_are_ignored() {
        let mut store = store();
        for id in ["output-0", "hidden-0-0", "bogus", "w:input-0:output-0", "input-7"] {
            assert!(!store.handle_host_event(HostEvent::ValueEdited { id: id.into(), value: 1.0 }), "{id}");
        }
        assert!(!store.handle_host_event(HostEvent::Select("hidden-9-9".into())));
        assert_eq!(store.revision(), 0);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn selection_is_dropped_when_node_disappears() {
        let mut store = store();
        assert!(store.handle_host_event(HostEvent::Select("hidden-0-2".into())));
        assert_eq!(store.selected(), Some(NodeId::Hidden { layer: 0, node: 2 }));
        assert!(!store.handle_host_event(HostEvent::Select("hidden-0-2".into())));
        store.dispatch(&EditCommand::RemoveHiddenNode { layer: 0, node: 2 });
        assert_eq!(store.selected(), None);
        assert!(!store.handle_host_event(HostEvent::ClearSelection));
    }

    #[test]
    fn structural_edit_clears_selection_even_if_id_still_resolves() {
        let mut store = store();
        store.dispatch(&EditCommand::AddInputNode);
        store.dispatch(&EditCommand::AddInputNode);
        assert!(store.handle_host_event(HostEvent::Select("input-2".into())));
        // input-2 still exists afterwards but names what used to be input-3.
        assert!(store.dispatch(&EditCommand::RemoveInputNode(0)));
        assert!(NodeId::Input(2).exists_in(store.network()));
        assert_eq!(store.selected(), None);

        assert!(store.handle_host_event(HostEvent::Select("input-1".into())));
        assert!(store.dispatch(&EditCommand::SetInputValue { node: 1, value: 8.0 }));
        assert!(store.dispatch(&EditCommand::SetOutputLabel { node: 0, label: "kept".into() }));
        assert_eq!(store.selected(), Some(NodeId::Input(1)));

        let text = store.to_json_pretty().unwrap().replace("\"kept\"", "\"swapped\"");
        store.replace_from_json(&text).unwrap();
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn corrupt_persisted_state_falls_back_to_default() {
        let store = Store::from_persisted(Some("%%%"), EditorConfig::default());
        assert_eq!(*store.network(), NeuralNetwork::default());

        let encoded = codec::encode(&with_hidden()).unwrap();
        let store = Store::from_persisted(Some(&encoded), EditorConfig::default());
        assert_eq!(*store.network(), with_hidden());
        assert_eq!(store.encode().unwrap(), encoded);
    }

    #[test]
    fn scene_places_every_node() {
        let scene = store().scene(&Sugiyama);
        assert_eq!(scene.layout.boxes.len(), scene.graph.nodes.len());
        assert!(scene.graph.nodes.iter().all(|n| scene.layout.get(&n.id).is_some()));
    }
}
