//! Recording renderer.

use std::{cell::RefCell, rc::Rc};

use liftbank_core::{Renderer, SceneUpdate};

/// Renderer that records every scene update.
///
/// Clones share one record: install a clone with `enable_renderer` and read
/// the original after the run.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    updates: Rc<RefCell<Vec<SceneUpdate>>>,
}

impl Transcript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates recorded so far, in order.
    pub fn updates(&self) -> Vec<SceneUpdate> {
        self.updates.borrow().clone()
    }

    /// Number of updates recorded.
    pub fn len(&self) -> usize {
        self.updates.borrow().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.updates.borrow().is_empty()
    }
}

impl Renderer for Transcript {
    fn render(&mut self, update: &SceneUpdate) {
        self.updates.borrow_mut().push(update.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_record() {
        let transcript = Transcript::new();
        let mut installed = transcript.clone();
        installed.render(&SceneUpdate::DoorsOpened { elevator: 0 });
        installed.render(&SceneUpdate::DoorsClosed { elevator: 0 });

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.updates()[0], SceneUpdate::DoorsOpened { elevator: 0 });
    }
}
