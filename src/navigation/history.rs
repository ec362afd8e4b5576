//! Browser-style history stack.

/// Ordered visited URLs with a cursor.
///
/// Pushing while the cursor is not at the tail drops every entry after it.
/// Moving back or forward only moves the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: impl Into<String>) {
        if let Some(index) = self.index {
            self.entries.truncate(index + 1);
        }
        self.entries.push(url.into());
        self.index = Some(self.entries.len() - 1);
    }

    pub fn back(&mut self) -> Option<&str> {
        match self.index {
            Some(index) if index > 0 => {
                self.index = Some(index - 1);
                self.current()
            }
            _ => None,
        }
    }

    pub fn forward(&mut self) -> Option<&str> {
        match self.index {
            Some(index) if index + 1 < self.entries.len() => {
                self.index = Some(index + 1);
                self.current()
            }
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.index
            .and_then(|index| self.entries.get(index))
            .map(String::as_str)
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.index, Some(index) if index > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.index, Some(index) if index + 1 < self.entries.len())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
