use tracing::{debug, trace};

use crate::history::{DEFAULT_HISTORY_LIMIT, History};
use crate::model::{
    ArrowType, Connector, EditRejected, LineStyle, Node, NodeKind, Point, Polarity, Rgba,
    Workspace,
};
use crate::tools::{KeyCommand, KeyInput, Tool, route_key};
use crate::viewport::{DEFAULT_WHEEL_SENSITIVITY, ZOOM_STEP, clamp_zoom};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeTemplate {
    pub width: f64,
    pub height: f64,
    pub color: Rgba,
    pub kind: NodeKind,
}

impl Default for NodeTemplate {
    fn default() -> Self {
        let node = Node::new("", "", 0.0, 0.0);
        Self {
            width: node.width,
            height: node.height,
            color: node.color,
            kind: node.kind,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConnectorTemplate {
    pub style: LineStyle,
    pub polarity: Polarity,
    pub arrow: ArrowType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    pub history_limit: usize,
    pub wheel_sensitivity: f64,
    pub node: NodeTemplate,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            wheel_sensitivity: DEFAULT_WHEEL_SENSITIVITY,
            node: NodeTemplate::default(),
        }
    }
}

/// Pointer interaction in progress. Nothing here reaches history until it completes.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        node: String,
        grab: Point,
        pending: Option<Point>,
        moved: bool,
    },
    Panning,
    Zooming,
    PendingConnector {
        from: String,
    },
}

pub struct Editor {
    history: History,
    live: Workspace,
    selection: Option<String>,
    tool: Tool,
    gesture: Gesture,
    active_layer: String,
    id_counter: u64,
    config: EditorConfig,
    pub connector_template: ConnectorTemplate,
    last_rejection: Option<EditRejected>,
}

impl Editor {
    pub fn new(workspace: Workspace, config: EditorConfig) -> Self {
        let workspace = normalize(workspace);
        let active_layer = first_layer(&workspace);
        Self {
            history: History::with_limit(workspace.clone(), config.history_limit),
            live: workspace,
            selection: None,
            tool: Tool::default(),
            gesture: Gesture::Idle,
            active_layer,
            id_counter: 1,
            config,
            connector_template: ConnectorTemplate::default(),
            last_rejection: None,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.live
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn pending_connector_source(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::PendingConnector { from } => Some(from),
            _ => None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_node_template(&mut self, template: NodeTemplate) {
        self.config.node = template;
    }

    pub fn set_wheel_sensitivity(&mut self, k: f64) {
        if k.is_finite() && k > 0.0 {
            self.config.wheel_sensitivity = k;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn take_rejection(&mut self) -> Option<EditRejected> {
        self.last_rejection.take()
    }

    pub fn active_layer(&self) -> &str {
        match self.live.layer(&self.active_layer) {
            Some(layer) => &layer.id,
            None => self
                .live
                .layers
                .first()
                .map_or(crate::model::DEFAULT_LAYER_ID, |l| l.id.as_str()),
        }
    }

    pub fn set_active_layer(&mut self, id: &str) {
        if self.live.layer(id).is_some() {
            self.active_layer = id.to_string();
        }
    }

    fn reject(&mut self, err: EditRejected) {
        debug!(%err, tool = ?self.tool, "edit rejected");
        self.last_rejection = Some(err);
    }

    fn commit(&mut self) {
        self.history.commit(self.live.clone());
        trace!(index = self.history.index(), "committed");
    }

    fn edit<T>(
        &mut self,
        op: impl FnOnce(&mut Workspace) -> Result<T, EditRejected>,
    ) -> Result<T, EditRejected> {
        match op(&mut self.live) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                self.reject(err.clone());
                Err(err)
            }
        }
    }

    fn revalidate_selection(&mut self) {
        self.selection = self
            .selection
            .take()
            .and_then(|id| self.live.select_node(&id));
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.selection = id.and_then(|id| self.live.select_node(id));
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.cancel_gesture();
        if self.tool != tool {
            debug!(from = ?self.tool, to = ?tool, "tool changed");
        }
        self.tool = tool;
    }

    /// Drops the gesture in progress. A half-finished drag snaps back to the committed
    /// position; history is never touched.
    pub fn cancel_gesture(&mut self) {
        if let Gesture::Dragging { node, .. } = std::mem::take(&mut self.gesture) {
            let committed = self.history.current().node(&node).map(Node::position);
            if let (Some(p), Some(idx)) = (committed, self.live.node_index(&node)) {
                self.live.nodes[idx].x = p.x;
                self.live.nodes[idx].y = p.y;
            }
        }
    }

    fn settle_pointer_gesture(&mut self) {
        if !matches!(self.gesture, Gesture::PendingConnector { .. }) {
            self.cancel_gesture();
        }
    }

    fn drop_orphaned_connector_source(&mut self) {
        let orphaned = self
            .pending_connector_source()
            .is_some_and(|from| self.live.node(from).is_none());
        if orphaned {
            self.gesture = Gesture::Idle;
        }
    }

    pub fn handle_key(&mut self, input: &KeyInput) -> bool {
        let Some(command) = route_key(input) else {
            return false;
        };
        match command {
            KeyCommand::SetTool(tool) => self.set_tool(tool),
            KeyCommand::Undo => {
                self.undo();
            }
            KeyCommand::Redo => {
                self.redo();
            }
            KeyCommand::Cancel => self.set_tool(Tool::Select),
            KeyCommand::DeleteSelection => {
                let _ = self.delete_selected();
            }
        }
        true
    }

    pub fn pointer_down(&mut self, at: Point, hit: Option<&str>) {
        match self.tool {
            Tool::Select => {
                self.select(hit);
                let Some(node) = self.selection.as_deref().and_then(|id| self.live.node(id))
                else {
                    self.gesture = Gesture::Idle;
                    return;
                };
                if self.live.is_layer_locked(&node.layer) {
                    debug!(node = %node.id, layer = %node.layer, "drag on locked layer ignored");
                    self.gesture = Gesture::Idle;
                    return;
                }
                self.gesture = Gesture::Dragging {
                    node: node.id.clone(),
                    grab: at - node.position(),
                    pending: None,
                    moved: false,
                };
            }
            Tool::Pan => self.gesture = Gesture::Panning,
            Tool::Zoom => self.gesture = Gesture::Zooming,
            Tool::AddNode | Tool::AddConnector => {}
        }
    }

    pub fn pointer_drag(&mut self, at: Point, screen_delta: Point) {
        let k = self.config.wheel_sensitivity;
        match &mut self.gesture {
            Gesture::Dragging { pending, .. } => *pending = Some(at),
            Gesture::Panning => self.live.viewport.pan_by_screen(screen_delta.x, screen_delta.y),
            Gesture::Zooming => self.live.viewport.apply_wheel(screen_delta.y, k),
            Gesture::Idle | Gesture::PendingConnector { .. } => {}
        }
    }

    /// Applies the latest buffered drag position. Call once per frame.
    pub fn flush_frame(&mut self) {
        let Gesture::Dragging {
            node,
            grab,
            pending,
            moved,
        } = &mut self.gesture
        else {
            return;
        };
        let Some(at) = pending.take() else {
            return;
        };
        let target = at - *grab;
        match self.live.move_node(node, target.x, target.y) {
            Ok(()) => *moved = true,
            Err(err) => {
                self.reject(err);
                self.cancel_gesture();
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.flush_frame();
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { node, moved, .. } => {
                let changed = self.history.current().node(&node).map(Node::position)
                    != self.live.node(&node).map(Node::position);
                if moved && changed {
                    debug!(%node, "node moved");
                    self.commit();
                }
            }
            pending @ Gesture::PendingConnector { .. } => self.gesture = pending,
            Gesture::Panning | Gesture::Zooming | Gesture::Idle => {}
        }
    }

    pub fn click(&mut self, at: Point, hit: Option<&str>) {
        match self.tool {
            Tool::Select => self.select(hit),
            Tool::Pan => {}
            Tool::Zoom => self.live.viewport.zoom_by(ZOOM_STEP),
            Tool::AddNode => match hit {
                Some(id) => self.select(Some(id)),
                None => {
                    let _ = self.place_node(at);
                }
            },
            Tool::AddConnector => self.pick_connector_end(hit),
        }
    }

    fn place_node(&mut self, at: Point) -> Result<String, EditRejected> {
        let id = self.live.next_free_id("node", &mut self.id_counter);
        let p = self.live.snap_point(at.x, at.y);
        let template = &self.config.node;
        let mut node = Node::new(id.clone(), self.active_layer(), p.x, p.y);
        node.label = format!("Variable {}", self.live.nodes.len() + 1);
        node.width = template.width;
        node.height = template.height;
        node.color = template.color;
        node.kind = template.kind;
        self.edit(|ws| ws.add_node(node))?;
        debug!(%id, x = p.x, y = p.y, "node added");
        self.selection = Some(id.clone());
        Ok(id)
    }

    fn pick_connector_end(&mut self, hit: Option<&str>) {
        let Some(hit) = hit else {
            if self.pending_connector_source().is_some() {
                debug!("pending connector cancelled");
            }
            self.gesture = Gesture::Idle;
            return;
        };
        let Some(from) = self.pending_connector_source().map(str::to_string) else {
            self.gesture = Gesture::PendingConnector {
                from: hit.to_string(),
            };
            return;
        };
        if from == hit {
            return;
        }
        self.gesture = Gesture::Idle;
        let id = self.live.next_free_id("link", &mut self.id_counter);
        let mut connector = Connector::new(id.clone(), from, hit, self.active_layer());
        connector.style = self.connector_template.style;
        connector.polarity = self.connector_template.polarity;
        connector.arrow = self.connector_template.arrow;
        if self.edit(|ws| ws.add_connector(connector)).is_ok() {
            debug!(%id, "connector added");
        }
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.live
            .viewport
            .apply_wheel(delta_y, self.config.wheel_sensitivity);
    }

    pub fn pan_view(&mut self, dx: f64, dy: f64) {
        self.live.viewport.pan_by_screen(dx, dy);
    }

    pub fn rotate_view(&mut self, dx: f64, dy: f64) {
        self.live.viewport.rotate_by_screen(dx, dy);
    }

    pub fn zoom_view(&mut self, factor: f64) {
        self.live.viewport.zoom_by(factor);
    }

    pub fn reset_view(&mut self) {
        self.live.viewport.reset();
    }

    /// Undo and redo restore the committed model but keep the current view.
    pub fn undo(&mut self) -> bool {
        self.settle_pointer_gesture();
        let Some(state) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(state);
        debug!(index = self.history.index(), "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        self.settle_pointer_gesture();
        let Some(state) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(state);
        debug!(index = self.history.index(), "redo");
        true
    }

    fn restore(&mut self, mut state: Workspace) {
        state.viewport = self.live.viewport;
        self.live = state;
        self.revalidate_selection();
        self.drop_orphaned_connector_source();
    }

    pub fn toggle_grid(&mut self) -> bool {
        let enabled = !self.live.snap_to_grid;
        self.live.set_snap_to_grid(enabled);
        self.commit();
        enabled
    }

    pub fn set_grid_size(&mut self, size: f64) -> Result<(), EditRejected> {
        self.edit(|ws| ws.set_grid_size(size))
    }

    pub fn relabel_selected(&mut self, label: &str) -> Result<(), EditRejected> {
        let Some(id) = self.selection.clone() else {
            return Ok(());
        };
        if self.live.node(&id).is_some_and(|n| n.label == label) {
            return Ok(());
        }
        self.edit(|ws| ws.relabel_node(&id, label))
    }

    pub fn delete_selected(&mut self) -> Result<(), EditRejected> {
        let Some(id) = self.selection.clone() else {
            return Ok(());
        };
        self.settle_pointer_gesture();
        self.edit(|ws| ws.delete_node(&id))?;
        debug!(%id, "node deleted");
        self.selection = None;
        self.drop_orphaned_connector_source();
        Ok(())
    }

    pub fn delete_connector(&mut self, id: &str) -> Result<(), EditRejected> {
        self.edit(|ws| ws.delete_connector(id))
    }

    pub fn add_layer(&mut self, name: &str) -> String {
        let id = self.live.add_layer(name);
        self.commit();
        debug!(%id, "layer added");
        self.active_layer = id.clone();
        id
    }

    pub fn rename_layer(&mut self, id: &str, name: &str) -> Result<(), EditRejected> {
        self.edit(|ws| ws.rename_layer(id, name))
    }

    pub fn toggle_layer_visible(&mut self, id: &str) -> Result<bool, EditRejected> {
        let visible = self.edit(|ws| ws.toggle_layer_visible(id))?;
        if !visible {
            self.hide_selection_on(id);
        }
        Ok(visible)
    }

    pub fn toggle_layer_locked(&mut self, id: &str) -> Result<bool, EditRejected> {
        self.edit(|ws| ws.toggle_layer_locked(id))
    }

    pub fn reorder_layers(&mut self, ids: &[String]) -> Result<(), EditRejected> {
        self.edit(|ws| ws.reorder_layers(ids))
    }

    pub fn move_layer(&mut self, id: &str, delta: i32) -> Result<(), EditRejected> {
        self.edit(|ws| ws.move_layer(id, delta))
    }

    pub fn remove_layer(&mut self, id: &str) -> Result<(), EditRejected> {
        let target = self
            .live
            .layers
            .iter()
            .filter(|l| l.id != id)
            .min_by_key(|l| l.locked)
            .map(|l| l.id.clone())
            .ok_or(EditRejected::LastLayer);
        let target = match target {
            Ok(target) => target,
            Err(err) => {
                self.reject(err.clone());
                return Err(err);
            }
        };
        self.edit(|ws| ws.remove_layer(id, &target))?;
        if self.active_layer == id {
            self.active_layer = target;
        }
        Ok(())
    }

    fn hide_selection_on(&mut self, layer: &str) {
        if self
            .selection
            .as_deref()
            .and_then(|id| self.live.node(id))
            .is_some_and(|n| n.layer == layer)
        {
            self.selection = None;
        }
    }

    pub fn load(&mut self, workspace: Workspace) {
        let workspace = normalize(workspace);
        self.active_layer = first_layer(&workspace);
        self.history.reset(workspace.clone());
        self.live = workspace;
        self.selection = None;
        self.gesture = Gesture::Idle;
        self.id_counter = 1;
    }
}

fn normalize(mut workspace: Workspace) -> Workspace {
    if workspace.layers.is_empty() {
        workspace.layers = Workspace::default().layers;
    }
    workspace.layers.sort_by_key(|l| l.order);
    workspace.viewport.zoom = clamp_zoom(workspace.viewport.zoom);
    if !(workspace.grid_size.is_finite() && workspace.grid_size > 0.0) {
        workspace.grid_size = crate::model::DEFAULT_GRID_SIZE;
    }
    workspace
}

fn first_layer(workspace: &Workspace) -> String {
    workspace
        .layers
        .first()
        .map(|l| l.id.clone())
        .unwrap_or_else(|| crate::model::DEFAULT_LAYER_ID.to_string())
}
