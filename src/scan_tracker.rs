use std::collections::HashSet;

/// Remembers which message identities were already scored.
///
/// The engine itself keeps no state; callers that see the same message more
/// than once (re-rendered views, duplicated batch input) ask here first.
#[derive(Debug, Default)]
pub struct ScanTracker {
    seen: HashSet<String>,
}

impl ScanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `id` is offered. Messages without identity always pass.
    pub fn first_sighting(&mut self, id: Option<&str>) -> bool {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.seen.insert(id.to_string()),
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
