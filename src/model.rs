use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LAYER_ID: &str = "base";
pub const DEFAULT_GRID_SIZE: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Stock,
    Flow,
    #[default]
    Auxiliary,
    Connector,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Stock,
        NodeKind::Flow,
        NodeKind::Auxiliary,
        NodeKind::Connector,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Stock => "Stock",
            NodeKind::Flow => "Flow",
            NodeKind::Auxiliary => "Auxiliary",
            NodeKind::Connector => "Connector",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Reinforcing,
    Balancing,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArrowType {
    #[default]
    Single,
    Double,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub layer: String,
    #[serde(default)]
    pub label: String,
    pub width: f64,
    pub height: f64,
    pub color: Rgba,
    #[serde(default)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: impl Into<String>, layer: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            z: 0.0,
            layer: layer.into(),
            label: String::new(),
            width: 120.0,
            height: 60.0,
            color: Rgba::rgb(96, 165, 250),
            kind: NodeKind::default(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bend {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Connector {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub bends: Vec<Bend>,
    pub layer: String,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub arrow: ArrowType,
}

impl Connector {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            bends: Vec::new(),
            layer: layer.into(),
            style: LineStyle::default(),
            polarity: Polarity::default(),
            arrow: ArrowType::default(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.from == node_id || self.to == node_id
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub color: Rgba,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub order: i32,
}

fn default_true() -> bool {
    true
}

impl Layer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: Rgba::rgb(148, 163, 184),
            visible: true,
            locked: false,
            order,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            rotation: Rotation::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workspace {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
}

fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            nodes: vec![],
            connectors: vec![],
            layers: vec![Layer::new(DEFAULT_LAYER_ID, "Base", 0)],
            viewport: Viewport::default(),
            snap_to_grid: false,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EditRejected {
    #[error("node `{0}` does not exist")]
    UnknownNode(String),
    #[error("connector `{0}` does not exist")]
    UnknownConnector(String),
    #[error("layer `{0}` does not exist")]
    UnknownLayer(String),
    #[error("layer `{0}` is locked")]
    LayerLocked(String),
    #[error("id `{0}` is already in use")]
    DuplicateId(String),
    #[error("a connector cannot start and end at `{0}`")]
    SelfConnector(String),
    #[error("name cannot be blank")]
    BlankName,
    #[error("grid size must be a positive number, got {0}")]
    InvalidGridSize(f64),
    #[error("layer order must list every layer exactly once")]
    InvalidLayerOrder,
    #[error("the last layer cannot be removed")]
    LastLayer,
    #[error("position ({0}, {1}) is not a finite point")]
    NonFinitePosition(f64, f64),
}

/// Falls back to `value` when the grid is too fine for the quotient to stay finite.
pub fn snap_value(value: f64, grid: f64) -> f64 {
    let snapped = (value / grid).round() * grid;
    if snapped.is_finite() { snapped } else { value }
}

impl Workspace {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn is_layer_locked(&self, layer_id: &str) -> bool {
        self.layer(layer_id).is_some_and(|l| l.locked)
    }

    fn ensure_unlocked(&self, layer_id: &str) -> Result<(), EditRejected> {
        if self.is_layer_locked(layer_id) {
            return Err(EditRejected::LayerLocked(layer_id.to_string()));
        }
        Ok(())
    }

    fn ensure_layer(&self, layer_id: &str) -> Result<(), EditRejected> {
        if self.layer(layer_id).is_none() {
            return Err(EditRejected::UnknownLayer(layer_id.to_string()));
        }
        self.ensure_unlocked(layer_id)
    }

    pub fn snap_point(&self, x: f64, y: f64) -> Point {
        if !self.snap_to_grid || self.grid_size <= 0.0 {
            return Point::new(x, y);
        }
        Point::new(
            snap_value(x, self.grid_size),
            snap_value(y, self.grid_size),
        )
    }

    pub fn select_node(&self, id: &str) -> Option<String> {
        self.node(id).map(|n| n.id.clone())
    }

    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<(), EditRejected> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(EditRejected::NonFinitePosition(x, y));
        }
        let idx = self
            .node_index(id)
            .ok_or_else(|| EditRejected::UnknownNode(id.to_string()))?;
        self.ensure_unlocked(&self.nodes[idx].layer)?;
        let p = self.snap_point(x, y);
        let node = &mut self.nodes[idx];
        node.x = p.x;
        node.y = p.y;
        Ok(())
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), EditRejected> {
        if self.node(&node.id).is_some() {
            return Err(EditRejected::DuplicateId(node.id));
        }
        if !(node.x.is_finite() && node.y.is_finite()) {
            return Err(EditRejected::NonFinitePosition(node.x, node.y));
        }
        self.ensure_layer(&node.layer)?;
        self.nodes.push(node);
        Ok(())
    }

    pub fn relabel_node(&mut self, id: &str, label: &str) -> Result<(), EditRejected> {
        let idx = self
            .node_index(id)
            .ok_or_else(|| EditRejected::UnknownNode(id.to_string()))?;
        self.ensure_unlocked(&self.nodes[idx].layer)?;
        self.nodes[idx].label = label.to_string();
        Ok(())
    }

    /// Removes the node and every connector that references it.
    pub fn delete_node(&mut self, id: &str) -> Result<(), EditRejected> {
        let idx = self
            .node_index(id)
            .ok_or_else(|| EditRejected::UnknownNode(id.to_string()))?;
        self.ensure_unlocked(&self.nodes[idx].layer)?;
        for c in self.connectors.iter().filter(|c| c.touches(id)) {
            self.ensure_unlocked(&c.layer)?;
        }
        self.nodes.remove(idx);
        self.connectors.retain(|c| !c.touches(id));
        Ok(())
    }

    pub fn add_connector(&mut self, connector: Connector) -> Result<(), EditRejected> {
        if connector.from == connector.to {
            return Err(EditRejected::SelfConnector(connector.from));
        }
        for end in [&connector.from, &connector.to] {
            if self.node(end).is_none() {
                return Err(EditRejected::UnknownNode(end.clone()));
            }
        }
        if self.connector(&connector.id).is_some() {
            return Err(EditRejected::DuplicateId(connector.id));
        }
        self.ensure_layer(&connector.layer)?;
        self.connectors.push(connector);
        Ok(())
    }

    pub fn delete_connector(&mut self, id: &str) -> Result<(), EditRejected> {
        let idx = self
            .connectors
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| EditRejected::UnknownConnector(id.to_string()))?;
        self.ensure_unlocked(&self.connectors[idx].layer)?;
        self.connectors.remove(idx);
        Ok(())
    }

    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.snap_to_grid = enabled;
    }

    pub fn set_grid_size(&mut self, size: f64) -> Result<(), EditRejected> {
        if !size.is_finite() || size <= 0.0 {
            return Err(EditRejected::InvalidGridSize(size));
        }
        self.grid_size = size;
        Ok(())
    }

    pub fn next_free_id(&self, prefix: &str, counter: &mut u64) -> String {
        loop {
            let candidate = format!("{prefix}-{counter}");
            *counter += 1;
            let taken = self.nodes.iter().any(|n| n.id == candidate)
                || self.connectors.iter().any(|c| c.id == candidate)
                || self.layers.iter().any(|l| l.id == candidate);
            if !taken {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes() -> Workspace {
        let mut ws = Workspace::default();
        ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        ws.add_node(Node::new("b", DEFAULT_LAYER_ID, 4.0, 0.0)).unwrap();
        ws
    }

    #[test]
    fn snap_rounds_half_away_from_zero() {
        let mut ws = two_nodes();
        ws.snap_to_grid = true;
        ws.grid_size = 1.0;
        ws.move_node("a", 2.4, 2.6).unwrap();
        let a = ws.node("a").unwrap();
        assert_eq!((a.x, a.y), (2.0, 3.0));

        ws.move_node("a", 2.5, -2.5).unwrap();
        let a = ws.node("a").unwrap();
        assert_eq!((a.x, a.y), (3.0, -3.0));
    }

    #[test]
    fn snap_uses_grid_multiples() {
        let mut ws = two_nodes();
        ws.snap_to_grid = true;
        ws.grid_size = 10.0;
        ws.move_node("b", 14.9, 15.0).unwrap();
        let b = ws.node("b").unwrap();
        assert_eq!((b.x, b.y), (10.0, 20.0));
    }

    #[test]
    fn move_without_snap_keeps_raw_position() {
        let mut ws = two_nodes();
        ws.move_node("a", 2.4, 2.6).unwrap();
        let a = ws.node("a").unwrap();
        assert_eq!((a.x, a.y), (2.4, 2.6));
    }

    #[test]
    fn tiny_grid_keeps_saved_positions_finite() {
        let mut ws = two_nodes();
        ws.set_grid_size(1e-300).unwrap();
        ws.snap_to_grid = true;
        ws.move_node("a", 1e9, 0.0).unwrap();
        let a = ws.node("a").unwrap();
        assert_eq!((a.x, a.y), (1e9, 0.0));

        let json = serde_json::to_string(&ws).unwrap();
        let back: Workspace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ws);
    }

    #[test]
    fn non_finite_move_is_rejected() {
        let mut ws = two_nodes();
        let before = ws.clone();
        for (x, y) in [(f64::NAN, 0.0), (0.0, f64::INFINITY), (f64::NEG_INFINITY, 1.0)] {
            assert!(matches!(
                ws.move_node("a", x, y),
                Err(EditRejected::NonFinitePosition(..))
            ));
        }
        assert_eq!(ws, before);
    }

    #[test]
    fn move_unknown_node_is_rejected() {
        let mut ws = two_nodes();
        let before = ws.clone();
        assert_eq!(
            ws.move_node("missing", 1.0, 1.0),
            Err(EditRejected::UnknownNode("missing".into()))
        );
        assert_eq!(ws, before);
    }

    #[test]
    fn locked_layer_blocks_move() {
        let mut ws = two_nodes();
        ws.layers[0].locked = true;
        for (x, y) in [(100.0, -3.0), (0.5, 0.5), (-1e9, 1e9)] {
            assert!(matches!(
                ws.move_node("a", x, y),
                Err(EditRejected::LayerLocked(_))
            ));
            let a = ws.node("a").unwrap();
            assert_eq!((a.x, a.y), (0.0, 0.0));
        }
    }

    #[test]
    fn locked_layer_blocks_add_and_delete() {
        let mut ws = two_nodes();
        ws.layers[0].locked = true;
        assert!(ws.add_node(Node::new("c", DEFAULT_LAYER_ID, 1.0, 1.0)).is_err());
        assert!(ws.delete_node("a").is_err());
        assert!(ws.relabel_node("a", "Births").is_err());
        assert_eq!(ws.nodes.len(), 2);
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut ws = two_nodes();
        let result = ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 9.0, 9.0));
        assert_eq!(result, Err(EditRejected::DuplicateId("a".into())));
        assert_eq!(ws.nodes.len(), 2);
        assert_eq!(ws.node("a").unwrap().x, 0.0);
    }

    #[test]
    fn node_on_unknown_layer_is_rejected() {
        let mut ws = Workspace::default();
        let result = ws.add_node(Node::new("a", "ghost", 0.0, 0.0));
        assert_eq!(result, Err(EditRejected::UnknownLayer("ghost".into())));
        assert!(ws.nodes.is_empty());
    }

    #[test]
    fn self_connector_is_rejected() {
        let mut ws = two_nodes();
        let result = ws.add_connector(Connector::new("e1", "a", "a", DEFAULT_LAYER_ID));
        assert_eq!(result, Err(EditRejected::SelfConnector("a".into())));
        assert!(ws.connectors.is_empty());
    }

    #[test]
    fn connector_needs_existing_endpoints_and_fresh_id() {
        let mut ws = two_nodes();
        assert!(ws
            .add_connector(Connector::new("e1", "a", "zzz", DEFAULT_LAYER_ID))
            .is_err());
        ws.add_connector(Connector::new("e1", "a", "b", DEFAULT_LAYER_ID))
            .unwrap();
        assert_eq!(
            ws.add_connector(Connector::new("e1", "b", "a", DEFAULT_LAYER_ID)),
            Err(EditRejected::DuplicateId("e1".into()))
        );
        assert_eq!(ws.connectors.len(), 1);
    }

    #[test]
    fn delete_node_cascades_connectors() {
        let mut ws = two_nodes();
        ws.add_node(Node::new("c", DEFAULT_LAYER_ID, 8.0, 0.0)).unwrap();
        ws.add_connector(Connector::new("ab", "a", "b", DEFAULT_LAYER_ID))
            .unwrap();
        ws.add_connector(Connector::new("bc", "b", "c", DEFAULT_LAYER_ID))
            .unwrap();
        ws.add_connector(Connector::new("ca", "c", "a", DEFAULT_LAYER_ID))
            .unwrap();
        ws.delete_node("a").unwrap();
        let ids: Vec<&str> = ws.connectors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bc"]);
        assert!(ws.node("a").is_none());
    }

    #[test]
    fn delete_refused_when_cascade_hits_locked_layer() {
        let mut ws = two_nodes();
        ws.layers.push(Layer::new("notes", "Notes", 1));
        ws.add_connector(Connector::new("ab", "a", "b", "notes")).unwrap();
        ws.layers[1].locked = true;
        assert_eq!(
            ws.delete_node("a"),
            Err(EditRejected::LayerLocked("notes".into()))
        );
        assert_eq!(ws.nodes.len(), 2);
        assert_eq!(ws.connectors.len(), 1);
    }

    #[test]
    fn select_unknown_clears_selection() {
        let ws = two_nodes();
        assert_eq!(ws.select_node("a"), Some("a".to_string()));
        assert_eq!(ws.select_node("nope"), None);
    }

    #[test]
    fn grid_size_must_be_positive() {
        let mut ws = Workspace::default();
        assert!(ws.set_grid_size(0.0).is_err());
        assert!(ws.set_grid_size(f64::NAN).is_err());
        ws.set_grid_size(0.5).unwrap();
        assert_eq!(ws.grid_size, 0.5);
    }

    #[test]
    fn next_free_id_skips_taken_ids() {
        let mut ws = Workspace::default();
        ws.add_node(Node::new("node-1", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        let mut counter = 1;
        assert_eq!(ws.next_free_id("node", &mut counter), "node-2");
        assert_eq!(counter, 3);
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::rgb(255, 128, 0)));
        assert_eq!(Rgba::rgb(1, 2, 3).to_hex(), "#010203");
        assert_eq!(Rgba::from_hex("xyz"), None);
    }
}
