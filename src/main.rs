use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};
use nn_flow::layered::Sugiyama;
use nn_flow::{EdgeId, EditCommand, EditorConfig, HostEvent, NodeId, NodeKind, Scene, Store};

const STATE_KEY: &str = "nn-flow-state";

#[derive(Parser, Debug)]
#[command(name = "nn-flow-visualizer", about = "Build a small weighted network and watch values flow through it")]
struct Args {
    /// JSON file overriding the default weight, hidden layer size and layout spacing
    #[arg(long)]
    config: Option<PathBuf>,
    /// Encoded network to start from instead of the saved one
    #[arg(long)]
    state: Option<String>,
    /// Log the encoded network after every change
    #[arg(long)]
    print_state: bool,
}

struct CodeEditor {
    text: String,
    error: Option<String>,
}

struct VisualizerApp {
    store: Store,
    scene: Scene,
    scene_revision: u64,
    print_state: bool,
    code: Option<CodeEditor>,

    // Zoom and pan state
    zoom: f32,
    pan: egui::Vec2,
    is_panning: bool,
    last_pan_pos: Option<egui::Pos2>,
}

impl VisualizerApp {
    fn new(cc: &eframe::CreationContext<'_>, args: Args, config: EditorConfig) -> Self {
        let saved = args
            .state
            .or_else(|| cc.storage.and_then(|s| s.get_string(STATE_KEY)));
        let store = Store::from_persisted(saved.as_deref(), config);
        let scene = store.scene(&Sugiyama);
        Self {
            scene_revision: store.revision(),
            store,
            scene,
            print_state: args.print_state,
            code: None,
            zoom: 0.5,
            pan: egui::vec2(20.0, 20.0),
            is_panning: false,
            last_pan_pos: None,
        }
    }

    /// Recomputes values, graph and layout after a commit and writes the new
    /// state through to storage right away.
    fn refresh(&mut self, frame: &mut eframe::Frame) {
        if self.scene_revision == self.store.revision() {
            return;
        }
        self.scene = self.store.scene(&Sugiyama);
        self.scene_revision = self.store.revision();
        let encoded = match self.store.encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                error!("cannot persist network: {err}");
                return;
            }
        };
        if self.print_state {
            info!("state: {encoded}");
        }
        if let Some(storage) = frame.storage_mut() {
            write_state(storage, encoded);
        }
    }

    fn node_color(&self, id: NodeId, kind: NodeKind) -> egui::Color32 {
        if self.store.selected() == Some(id) {
            return egui::Color32::from_rgb(240, 128, 128);
        }
        match kind {
            NodeKind::Input => egui::Color32::from_rgb(220, 235, 255),
            NodeKind::Hidden => egui::Color32::from_rgb(230, 230, 230),
            NodeKind::Output => egui::Color32::from_rgb(220, 255, 225),
            NodeKind::Weight => egui::Color32::from_rgb(255, 250, 220),
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("-").clicked() { self.zoom = (self.zoom * 0.9).max(0.1); }
            if ui.button("+").clicked() { self.zoom = (self.zoom * 1.1).min(3.0); }
            ui.label(format!("Zoom: {:.2}x", self.zoom));
            if ui.button("Reset View").clicked() { self.zoom = 0.5; self.pan = egui::vec2(20.0, 20.0); }
            ui.separator();
            if ui.button("Edit (Code)").clicked() && self.code.is_none() {
                match self.store.to_json_pretty() {
                    Ok(text) => self.code = Some(CodeEditor { text, error: None }),
                    Err(err) => error!("cannot serialize network: {err}"),
                }
            }
            if ui.button("Copy State").clicked() {
                match self.store.encode() {
                    Ok(encoded) => ui.ctx().copy_text(encoded),
                    Err(err) => error!("cannot encode network: {err}"),
                }
            }
        });
    }

    fn draw_structure_editor(&mut self, ui: &mut egui::Ui) {
        let nn = self.store.network();
        let mut commands = Vec::new();

        ui.heading("Input Layer");
        for (i, node) in nn.input_layer.iter().enumerate() {
            ui.horizontal(|ui| {
                let mut label = node.label.clone();
                if ui.text_edit_singleline(&mut label).changed() {
                    commands.push(EditCommand::SetInputLabel { node: i, label });
                }
                let mut value = node.value;
                if ui.add(egui::DragValue::new(&mut value).speed(0.05)).changed() {
                    commands.push(EditCommand::SetInputValue { node: i, value });
                }
                if ui.add_enabled(nn.input_layer.len() > 1, egui::Button::new("×")).clicked() {
                    commands.push(EditCommand::RemoveInputNode(i));
                }
            });
        }
        if ui.button("+ Add Input").clicked() {
            commands.push(EditCommand::AddInputNode);
        }
        ui.separator();

        ui.heading("Hidden Layers");
        if nn.hidden_layers.is_empty() {
            ui.label("No hidden layers.");
        }
        for (l, layer) in nn.hidden_layers.iter().enumerate() {
            egui::CollapsingHeader::new(format!("Hidden Layer {} ({} nodes)", l + 1, layer.len()))
                .id_salt(("hidden-layer", l))
                .default_open(true)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("+ Add Node").clicked() {
                            commands.push(EditCommand::AddHiddenNode(l));
                        }
                        if ui.button("Remove Layer").clicked() {
                            commands.push(EditCommand::RemoveHiddenLayer(l));
                        }
                    });
                    for node in 0..layer.len() {
                        ui.horizontal(|ui| {
                            ui.label(format!("Node {}", node + 1));
                            if ui.add_enabled(layer.len() > 1, egui::Button::new("×")).clicked() {
                                commands.push(EditCommand::RemoveHiddenNode { layer: l, node });
                            }
                        });
                    }
                });
        }
        if ui.button("+ Add Hidden Layer").clicked() {
            commands.push(EditCommand::AddHiddenLayer);
        }
        ui.separator();

        ui.heading("Output Layer");
        for (i, node) in nn.output_layer.iter().enumerate() {
            ui.horizontal(|ui| {
                let mut label = node.label.clone();
                if ui.text_edit_singleline(&mut label).changed() {
                    commands.push(EditCommand::SetOutputLabel { node: i, label });
                }
                if ui.add_enabled(nn.output_layer.len() > 1, egui::Button::new("×")).clicked() {
                    commands.push(EditCommand::RemoveOutputNode(i));
                }
            });
        }
        if ui.button("+ Add Output").clicked() {
            commands.push(EditCommand::AddOutputNode);
        }

        if let Some(selected) = self.store.selected() {
            ui.separator();
            let value = self.scene.graph.node(&selected).map(|n| n.value).unwrap_or_default();
            ui.label(format!("Selected: {selected}\nValue: {value:.4}"));
        }

        for command in &commands {
            self.store.dispatch(command);
        }
    }

    fn draw_code_editor(&mut self, ctx: &egui::Context) {
        let Some(code) = &mut self.code else {
            return;
        };
        let mut save = false;
        let mut close = false;
        egui::Window::new("Network Document").default_width(480.0).show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(480.0).show(ui, |ui| {
                ui.add(egui::TextEdit::multiline(&mut code.text).code_editor().desired_width(f32::INFINITY));
            });
            if let Some(err) = &code.error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }
            ui.horizontal(|ui| {
                save = ui.button("Save").clicked();
                close = ui.button("Close").clicked();
            });
        });
        if save {
            code.error = self.store.replace_from_json(&code.text).err().map(|err| err.to_string());
            if code.error.is_none() {
                close = true;
            }
        }
        if close {
            self.code = None;
        }
    }

    fn draw_network(&mut self, ui: &mut egui::Ui) {
        let rect = ui.available_rect_before_wrap();
        // Mouse wheel zoom
        if let Some(pos) = ui.input(|i| i.pointer.hover_pos()) {
            if rect.contains(pos) {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    let zoom_factor = 1.15_f32;
                    let old_zoom = self.zoom;
                    let new_zoom = (self.zoom * zoom_factor.powf(scroll.signum())).clamp(0.1, 3.0);
                    let before = (pos - rect.min - self.pan) / old_zoom;
                    self.zoom = new_zoom;
                    self.pan = pos - rect.min - before * self.zoom;
                }
            }
        }
        // Mouse drag pan, click on empty canvas clears the selection
        let resp = ui.interact(rect, egui::Id::new("pan"), egui::Sense::click_and_drag());
        if resp.drag_started() { self.is_panning = true; self.last_pan_pos = resp.interact_pointer_pos(); }
        if self.is_panning && resp.dragged() {
            if let (Some(last), Some(cur)) = (self.last_pan_pos, resp.interact_pointer_pos()) {
                self.pan += cur - last;
                self.last_pan_pos = Some(cur);
            }
        }
        if resp.drag_stopped() { self.is_panning = false; self.last_pan_pos = None; }

        let mut events = Vec::new();
        if resp.clicked() {
            events.push(HostEvent::ClearSelection);
        }

        let zoom = self.zoom;
        let origin = rect.min + self.pan;
        let to_screen = |x: f64, y: f64| origin + egui::vec2(x as f32, y as f32) * zoom;
        let painter = ui.painter_at(rect);

        let lt = rect.left_top();
        let rt = rect.right_top();
        let lb = rect.left_bottom();
        let rb = rect.right_bottom();
        let frame = egui::Stroke::new(2.0, egui::Color32::DARK_GRAY);
        painter.line_segment([lt, rt], frame);
        painter.line_segment([rt, rb], frame);
        painter.line_segment([rb, lb], frame);
        painter.line_segment([lb, lt], frame);

        let highlighted: HashSet<EdgeId> = self
            .store
            .selected()
            .map(|id| self.scene.graph.incident_edges(&id).map(|e| e.id).collect())
            .unwrap_or_default();
        let layout = &self.scene.layout;
        for edge in &self.scene.graph.edges {
            let (Some(from), Some(to)) = (layout.get(&edge.source), layout.get(&edge.target)) else {
                continue;
            };
            let a = to_screen(from.x + from.width, from.y + from.height / 2.0);
            let b = to_screen(to.x, to.y + to.height / 2.0);
            let stroke = if highlighted.contains(&edge.id) {
                egui::Stroke::new(8.0 * zoom, egui::Color32::from_rgb(240, 128, 128))
            } else {
                egui::Stroke::new(1.5, egui::Color32::from_rgb(120, 120, 220))
            };
            painter.line_segment([a, b], stroke);
        }

        let font = egui::FontId::proportional(14.0 * zoom);
        for node in &self.scene.graph.nodes {
            let Some(b) = layout.get(&node.id) else {
                continue;
            };
            let node_rect = egui::Rect::from_min_size(
                to_screen(b.x, b.y),
                egui::vec2(b.width as f32, b.height as f32) * zoom,
            );
            if !rect.intersects(node_rect) {
                continue;
            }
            painter.rect_filled(node_rect, 8.0 * zoom, self.node_color(node.id, node.kind));

            let id = node.id.to_string();
            if ui.interact(node_rect, egui::Id::new(("node", &id)), egui::Sense::click()).clicked() {
                events.push(HostEvent::Select(id.clone()));
            }

            let editable = matches!(node.kind, NodeKind::Input | NodeKind::Weight);
            if node.kind != NodeKind::Weight {
                painter.text(
                    node_rect.center_top() + egui::vec2(0.0, 8.0 * zoom),
                    egui::Align2::CENTER_TOP,
                    &node.label,
                    font.clone(),
                    egui::Color32::BLACK,
                );
            }
            if editable {
                let field = egui::Rect::from_center_size(
                    node_rect.center() + egui::vec2(0.0, if node.kind == NodeKind::Input { 20.0 * zoom } else { 0.0 }),
                    egui::vec2(node_rect.width() * 0.6, 20.0),
                );
                let mut value = node.value;
                let changed = ui
                    .push_id(("value", &id), |ui| ui.put(field, egui::DragValue::new(&mut value).speed(0.01)))
                    .inner
                    .changed();
                if changed {
                    events.push(HostEvent::ValueEdited { id, value });
                }
            } else {
                painter.text(
                    node_rect.center() + egui::vec2(0.0, 10.0 * zoom),
                    egui::Align2::CENTER_CENTER,
                    format!("{:.3}", node.value),
                    font.clone(),
                    egui::Color32::BLACK,
                );
            }
        }

        for event in events {
            self.store.handle_host_event(event);
        }
    }
}

impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.draw_toolbar(ui));
        egui::SidePanel::left("structure").resizable(true).show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.draw_structure_editor(ui));
        });
        self.refresh(frame);
        self.draw_code_editor(ctx);
        self.refresh(frame);
        egui::CentralPanel::default().show(ctx, |ui| self.draw_network(ui));
        self.refresh(frame);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.store.encode() {
            Ok(encoded) => storage.set_string(STATE_KEY, encoded),
            Err(err) => error!("cannot persist network: {err}"),
        }
    }
}

/// Stores and flushes the encoded network under [`STATE_KEY`].
fn write_state(storage: &mut dyn eframe::Storage, encoded: String) {
    storage.set_string(STATE_KEY, encoded);
    storage.flush();
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EditorConfig::load(path).unwrap_or_else(|err| {
            warn!("{err}; using the built-in defaults");
            EditorConfig::default()
        }),
        None => EditorConfig::default(),
    };

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "NN Flow Visualizer",
        options,
        Box::new(move |cc| Ok(Box::new(VisualizerApp::new(cc, args, config)))),
    )
}
