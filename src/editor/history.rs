// editor/history.rs

/// Linear undo/redo history of document text.
///
/// Pushing after an undo discards the redo branch. The oldest entries are
/// dropped once `limit` is reached.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    index: Option<usize>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, text: &str) {
        if self.current() == Some(text) {
            return;
        }
        let keep = self.index.map_or(0, |index| index + 1);
        self.entries.truncate(keep);
        self.entries.push(text.to_string());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.index = Some(self.entries.len() - 1);
    }

    pub fn current(&self) -> Option<&str> {
        self.index.map(|index| self.entries[index].as_str())
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|index| index > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index
            .is_some_and(|index| index + 1 < self.entries.len())
    }

    pub fn undo(&mut self) -> Option<&str> {
        let index = self.index.filter(|&index| index > 0)? - 1;
        self.index = Some(index);
        Some(self.entries[index].as_str())
    }

    pub fn redo(&mut self) -> Option<&str> {
        let index = self.index? + 1;
        let entry = self.entries.get(index)?;
        self.index = Some(index);
        Some(entry.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
