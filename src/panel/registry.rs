use super::{Panel, PanelMetadata};

/// Ordered panels of one wizard run. Positions never change after
/// construction.
#[derive(Default)]
pub struct PanelRegistry {
    panels: Vec<Box<dyn Panel>>,
}

impl PanelRegistry {
    pub fn new(panels: Vec<Box<dyn Panel>>) -> Self {
        Self { panels }
    }

    pub fn push(&mut self, panel: Box<dyn Panel>) -> usize {
        self.panels.push(panel);
        self.panels.len() - 1
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Panel> {
        self.panels.get(index).map(|p| p.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Panel>> {
        self.panels.get_mut(index)
    }

    pub fn metadata(&self, index: usize) -> Option<&PanelMetadata> {
        self.get(index).map(|p| p.metadata())
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.panels.iter().position(|p| p.metadata().id == id)
    }

    /// Whether the panel counts toward the step indicator
    pub fn is_visible(&self, index: usize) -> bool {
        self.metadata(index).is_some_and(|m| m.visible)
    }

    pub fn is_last(&self, index: usize) -> bool {
        !self.panels.is_empty() && index == self.panels.len() - 1
    }

    pub fn first_visible(&self) -> Option<usize> {
        self.panels.iter().position(|p| p.metadata().visible)
    }

    /// Number of counted panels before `index`
    pub fn visibility_number(&self, index: usize) -> usize {
        self.panels
            .iter()
            .take(index)
            .filter(|p| p.metadata().visible)
            .count()
    }

    pub fn visible_count(&self) -> usize {
        self.panels.iter().filter(|p| p.metadata().visible).count()
    }
}

impl std::fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.panels.iter().map(|p| &p.metadata().id))
            .finish()
    }
}
