use nn_flow::layered::Sugiyama;
use nn_flow::{EditCommand, EditorConfig, HostEvent, NeuralNetwork, NodeKind, Store};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_command(rng: &mut StdRng, nn: &NeuralNetwork) -> EditCommand {
    let hidden = nn.hidden_layers.len();
    match rng.gen_range(0..9) {
        0 => EditCommand::AddInputNode,
        1 => EditCommand::RemoveInputNode(rng.gen_range(0..nn.input_layer.len() + 1)),
        2 => EditCommand::AddOutputNode,
        3 => EditCommand::RemoveOutputNode(rng.gen_range(0..nn.output_layer.len() + 1)),
        4 if hidden < 3 => EditCommand::AddHiddenLayer,
        5 => EditCommand::RemoveHiddenLayer(rng.gen_range(0..hidden + 1)),
        6 => EditCommand::AddHiddenNode(rng.gen_range(0..hidden + 1)),
        7 => EditCommand::RemoveHiddenNode {
            layer: rng.gen_range(0..hidden + 1),
            node: rng.gen_range(0..4),
        },
        _ => EditCommand::SetInputValue {
            node: rng.gen_range(0..nn.input_layer.len()),
            value: rng.gen_range(-10.0..10.0),
        },
    }
}

#[test]
fn random_sessions_stay_valid_and_render() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut store = Store::new(NeuralNetwork::default(), EditorConfig::default()).unwrap();
    for _ in 0..300 {
        let command = random_command(&mut rng, store.network());
        let before = store.snapshot();
        let changed = store.dispatch(&command);
        if !changed {
            assert_eq!(*store.network(), *before);
        }
        assert_eq!(store.network().validate(), Ok(()));

        let scene = store.scene(&Sugiyama);
        assert_eq!(scene.layout.boxes.len(), scene.graph.nodes.len());
        let outputs = scene.graph.nodes.iter().filter(|n| n.kind == NodeKind::Output).count();
        assert_eq!(outputs, store.network().output_layer.len());
    }
}

#[test]
fn weight_edit_from_canvas_changes_output() {
    let mut store = Store::new(NeuralNetwork::default(), EditorConfig::default()).unwrap();
    let before = store.scene(&Sugiyama).graph.node(&"output-0".parse().unwrap()).unwrap().value;

    // input-1 has value 0.4; raising its weight to output-0 by 1.0 adds 0.4.
    let old = store.network().input_layer[1].weights[0];
    assert!(store.handle_host_event(HostEvent::ValueEdited {
        id: "w:input-1:output-0".into(),
        value: old + 1.0,
    }));
    let after = store.scene(&Sugiyama).graph.node(&"output-0".parse().unwrap()).unwrap().value;
    assert!((after - before - 0.4).abs() < 1e-9);
}

#[test]
fn persisted_state_survives_a_restart() {
    let mut store = Store::new(NeuralNetwork::default(), EditorConfig::default()).unwrap();
    store.dispatch(&EditCommand::AddHiddenLayer);
    store.dispatch(&EditCommand::AddOutputNode);
    let encoded = store.encode().unwrap();

    let restored = Store::from_persisted(Some(&encoded), EditorConfig::default());
    assert_eq!(restored.network(), store.network());
}
