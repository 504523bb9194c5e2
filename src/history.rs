use crate::model::Workspace;

pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Committed workspace snapshots with a cursor.
///
/// `states[index]` is the current committed state. Committing after an undo drops
/// everything past the cursor, so the discarded future can't be redone.
#[derive(Clone, Debug)]
pub struct History {
    states: Vec<Workspace>,
    index: usize,
    limit: usize,
}

impl History {
    pub fn with_limit(initial: Workspace, limit: usize) -> Self {
        Self {
            states: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    pub fn current(&self) -> &Workspace {
        &self.states[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.states.len()
    }

    pub fn commit(&mut self, workspace: Workspace) {
        self.states.truncate(self.index + 1);
        self.states.push(workspace);
        if self.states.len() > self.limit {
            let overflow = self.states.len() - self.limit;
            self.states.drain(0..overflow);
        }
        self.index = self.states.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&Workspace> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(&self.states[self.index])
    }

    pub fn redo(&mut self) -> Option<&Workspace> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(&self.states[self.index])
    }

    pub fn reset(&mut self, workspace: Workspace) {
        self.states.clear();
        self.states.push(workspace);
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_LAYER_ID, Node};
    use proptest::prelude::*;

    fn fresh(initial: Workspace) -> History {
        History::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    fn with_nodes(n: usize) -> Workspace {
        let mut ws = Workspace::default();
        for i in 0..n {
            ws.add_node(Node::new(format!("n{i}"), DEFAULT_LAYER_ID, i as f64, 0.0))
                .unwrap();
        }
        ws
    }

    #[test]
    fn undo_and_redo_are_noops_at_the_ends() {
        let mut h = fresh(Workspace::default());
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn commit_after_undo_discards_future() {
        let mut h = fresh(with_nodes(0));
        h.commit(with_nodes(1));
        h.commit(with_nodes(2));
        h.undo();
        assert_eq!(h.index(), 1);

        h.commit(with_nodes(5));
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        assert!(h.redo().is_none());
        assert_eq!(h.current().nodes.len(), 5);
    }

    #[test]
    fn limit_drops_oldest_snapshots() {
        let mut h = History::with_limit(with_nodes(0), 3);
        for i in 1..=5 {
            h.commit(with_nodes(i));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        h.undo();
        h.undo();
        assert!(h.undo().is_none());
        assert_eq!(h.current().nodes.len(), 3);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut h = fresh(with_nodes(0));
        h.commit(with_nodes(1));
        h.reset(with_nodes(4));
        assert_eq!(h.len(), 1);
        assert!(!h.can_undo());
        assert_eq!(h.current().nodes.len(), 4);
    }

    proptest! {
        #[test]
        fn undo_all_then_redo_all_returns_to_last_commit(n in 1usize..30) {
            let mut h = fresh(with_nodes(0));
            for i in 1..=n {
                h.commit(with_nodes(i));
            }
            let last = h.current().clone();
            for _ in 0..n {
                prop_assert!(h.undo().is_some());
            }
            prop_assert_eq!(h.current().nodes.len(), 0);
            for _ in 0..n {
                prop_assert!(h.redo().is_some());
            }
            prop_assert_eq!(h.current(), &last);
        }
    }
}
