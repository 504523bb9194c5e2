use std::collections::HashSet;

use crate::model::{Connector, EditRejected, Layer, Node, Rgba, Workspace};

const LAYER_PALETTE: [Rgba; 6] = [
    Rgba::rgb(148, 163, 184),
    Rgba::rgb(96, 165, 250),
    Rgba::rgb(52, 211, 153),
    Rgba::rgb(251, 191, 36),
    Rgba::rgb(244, 114, 182),
    Rgba::rgb(167, 139, 250),
];

impl Workspace {
    fn layer_mut(&mut self, id: &str) -> Result<&mut Layer, EditRejected> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| EditRejected::UnknownLayer(id.to_string()))
    }

    fn sort_layers(&mut self) {
        self.layers.sort_by_key(|l| l.order);
    }

    pub fn add_layer(&mut self, name: &str) -> String {
        let mut counter = self.layers.len() as u64 + 1;
        let id = self.next_free_id("layer", &mut counter);
        let name = match name.trim() {
            "" => format!("Layer {}", self.layers.len() + 1),
            trimmed => trimmed.to_string(),
        };
        let order = self.layers.iter().map(|l| l.order).max().map_or(0, |m| m + 1);
        let mut layer = Layer::new(id.clone(), name, order);
        layer.color = LAYER_PALETTE[self.layers.len() % LAYER_PALETTE.len()];
        self.layers.push(layer);
        self.sort_layers();
        id
    }

    pub fn toggle_layer_visible(&mut self, id: &str) -> Result<bool, EditRejected> {
        let layer = self.layer_mut(id)?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    pub fn toggle_layer_locked(&mut self, id: &str) -> Result<bool, EditRejected> {
        let layer = self.layer_mut(id)?;
        layer.locked = !layer.locked;
        Ok(layer.locked)
    }

    pub fn rename_layer(&mut self, id: &str, name: &str) -> Result<(), EditRejected> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditRejected::BlankName);
        }
        self.layer_mut(id)?.name = name.to_string();
        Ok(())
    }

    pub fn reorder_layers(&mut self, ids: &[String]) -> Result<(), EditRejected> {
        let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let complete = unique.len() == ids.len()
            && ids.len() == self.layers.len()
            && ids.iter().all(|id| self.layer(id).is_some());
        if !complete {
            return Err(EditRejected::InvalidLayerOrder);
        }
        for (order, id) in ids.iter().enumerate() {
            self.layer_mut(id)?.order = order as i32;
        }
        self.sort_layers();
        Ok(())
    }

    pub fn move_layer(&mut self, id: &str, delta: i32) -> Result<(), EditRejected> {
        let mut ids: Vec<String> = self.layers.iter().map(|l| l.id.clone()).collect();
        let from = ids
            .iter()
            .position(|l| l == id)
            .ok_or_else(|| EditRejected::UnknownLayer(id.to_string()))?;
        let to = (from as i64 + delta as i64).clamp(0, ids.len() as i64 - 1) as usize;
        let moved = ids.remove(from);
        ids.insert(to, moved);
        self.reorder_layers(&ids)
    }

    pub fn remove_layer(&mut self, id: &str, reassign_to: &str) -> Result<(), EditRejected> {
        if self.layers.len() <= 1 {
            return Err(EditRejected::LastLayer);
        }
        if self.layer(id).is_none() {
            return Err(EditRejected::UnknownLayer(id.to_string()));
        }
        if id == reassign_to || self.layer(reassign_to).is_none() {
            return Err(EditRejected::UnknownLayer(reassign_to.to_string()));
        }
        for layer in [id, reassign_to] {
            if self.is_layer_locked(layer) {
                return Err(EditRejected::LayerLocked(layer.to_string()));
            }
        }
        for node in self.nodes.iter_mut().filter(|n| n.layer == id) {
            node.layer = reassign_to.to_string();
        }
        for connector in self.connectors.iter_mut().filter(|c| c.layer == id) {
            connector.layer = reassign_to.to_string();
        }
        self.layers.retain(|l| l.id != id);
        Ok(())
    }

    pub fn is_layer_visible(&self, layer_id: &str) -> bool {
        self.layer(layer_id).is_none_or(|l| l.visible)
    }

    pub fn visible_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| self.is_layer_visible(&n.layer))
            .collect()
    }

    pub fn visible_connectors(&self) -> Vec<&Connector> {
        let shown: HashSet<&str> = self.visible_nodes().iter().map(|n| n.id.as_str()).collect();
        self.connectors
            .iter()
            .filter(|c| self.is_layer_visible(&c.layer))
            .filter(|c| shown.contains(c.from.as_str()) && shown.contains(c.to.as_str()))
            .collect()
    }

    pub fn layer_rank(&self, layer_id: &str) -> usize {
        self.layers
            .iter()
            .position(|l| l.id == layer_id)
            .unwrap_or(self.layers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_LAYER_ID;

    fn layered() -> (Workspace, String) {
        let mut ws = Workspace::default();
        let notes = ws.add_layer("Notes");
        ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 0.0, 0.0)).unwrap();
        ws.add_node(Node::new("b", notes.clone(), 3.0, 0.0)).unwrap();
        ws.add_node(Node::new("c", DEFAULT_LAYER_ID, 6.0, 0.0)).unwrap();
        ws.add_connector(Connector::new("ab", "a", "b", DEFAULT_LAYER_ID))
            .unwrap();
        ws.add_connector(Connector::new("ac", "a", "c", notes.clone()))
            .unwrap();
        (ws, notes)
    }

    fn node_ids(nodes: &[&Node]) -> Vec<String> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    fn connector_ids(connectors: &[&Connector]) -> Vec<String> {
        connectors.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn add_layer_appends_with_next_order() {
        let mut ws = Workspace::default();
        let id = ws.add_layer("  Feedback  ");
        let layer = ws.layer(&id).unwrap();
        assert_eq!(layer.name, "Feedback");
        assert_eq!(layer.order, 1);
        assert!(layer.visible && !layer.locked);
        assert_eq!(ws.layers.last().unwrap().id, id);
    }

    #[test]
    fn blank_layer_name_gets_generated() {
        let mut ws = Workspace::default();
        let id = ws.add_layer("   ");
        assert_eq!(ws.layer(&id).unwrap().name, "Layer 2");
    }

    #[test]
    fn rename_rejects_blank_names() {
        let (mut ws, notes) = layered();
        assert_eq!(ws.rename_layer(&notes, " \t"), Err(EditRejected::BlankName));
        assert_eq!(ws.layer(&notes).unwrap().name, "Notes");
        ws.rename_layer(&notes, "Annotations").unwrap();
        assert_eq!(ws.layer(&notes).unwrap().name, "Annotations");
    }

    #[test]
    fn hidden_layer_filters_nodes_and_connectors() {
        let (mut ws, notes) = layered();
        assert_eq!(ws.toggle_layer_visible(&notes), Ok(false));

        let nodes = ws.visible_nodes();
        assert_eq!(node_ids(&nodes), vec!["a", "c"]);
        // "ab" lives on a visible layer but its endpoint "b" is hidden.
        assert!(ws.visible_connectors().is_empty());
        assert_eq!(ws.nodes.len(), 3);
    }

    #[test]
    fn visibility_filter_is_idempotent() {
        let (mut ws, notes) = layered();
        ws.toggle_layer_visible(&notes).unwrap();
        let first = node_ids(&ws.visible_nodes());
        let second = node_ids(&ws.visible_nodes());
        assert_eq!(first, second);
        let first = connector_ids(&ws.visible_connectors());
        let second = connector_ids(&ws.visible_connectors());
        assert_eq!(first, second);
    }

    #[test]
    fn missing_layer_counts_as_visible() {
        let mut ws = Workspace::default();
        ws.nodes.push(Node::new("orphan", "gone", 0.0, 0.0));
        assert_eq!(ws.visible_nodes().len(), 1);
    }

    #[test]
    fn toggle_lock_flips_flag() {
        let (mut ws, notes) = layered();
        assert_eq!(ws.toggle_layer_locked(&notes), Ok(true));
        assert!(ws.move_node("b", 9.0, 9.0).is_err());
        assert_eq!(ws.toggle_layer_locked(&notes), Ok(false));
        ws.move_node("b", 9.0, 9.0).unwrap();
        assert!(ws.toggle_layer_locked("nope").is_err());
    }

    #[test]
    fn reorder_sets_positions() {
        let (mut ws, notes) = layered();
        ws.reorder_layers(&[notes.clone(), DEFAULT_LAYER_ID.to_string()])
            .unwrap();
        assert_eq!(ws.layers[0].id, notes);
        assert_eq!(ws.layers[0].order, 0);
        assert_eq!(ws.layers[1].order, 1);
        assert_eq!(ws.layer_rank(DEFAULT_LAYER_ID), 1);
    }

    #[test]
    fn reorder_requires_permutation() {
        let (mut ws, notes) = layered();
        let before = ws.layers.clone();
        assert!(ws.reorder_layers(&[notes.clone()]).is_err());
        assert!(ws.reorder_layers(&[notes.clone(), notes.clone()]).is_err());
        assert!(ws
            .reorder_layers(&[notes.clone(), "ghost".to_string()])
            .is_err());
        assert_eq!(ws.layers, before);
    }

    #[test]
    fn move_layer_clamps_at_ends() {
        let (mut ws, notes) = layered();
        ws.move_layer(&notes, -5).unwrap();
        assert_eq!(ws.layers[0].id, notes);
        ws.move_layer(&notes, 10).unwrap();
        assert_eq!(ws.layers[1].id, notes);
    }

    #[test]
    fn remove_layer_reassigns_members() {
        let (mut ws, notes) = layered();
        ws.remove_layer(&notes, DEFAULT_LAYER_ID).unwrap();
        assert!(ws.layer(&notes).is_none());
        assert!(ws.nodes.iter().all(|n| n.layer == DEFAULT_LAYER_ID));
        assert!(ws.connectors.iter().all(|c| c.layer == DEFAULT_LAYER_ID));
    }

    #[test]
    fn remove_layer_guards() {
        let mut ws = Workspace::default();
        assert_eq!(
            ws.remove_layer(DEFAULT_LAYER_ID, DEFAULT_LAYER_ID),
            Err(EditRejected::LastLayer)
        );
        let (mut ws, notes) = layered();
        assert!(ws.remove_layer(&notes, &notes).is_err());
        ws.toggle_layer_locked(&notes).unwrap();
        assert_eq!(
            ws.remove_layer(&notes, DEFAULT_LAYER_ID),
            Err(EditRejected::LayerLocked(notes.clone()))
        );
        assert_eq!(ws.layers.len(), 2);
    }
}
