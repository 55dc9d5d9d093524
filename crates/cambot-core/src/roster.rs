//! Roster of filmable subjects and the rotation queue derived from it.

/// Subjects known to be online, in arrival order. Never contains the
/// controlled avatar.
#[derive(Debug, Clone)]
pub struct Roster {
    own_name: String,
    names: Vec<String>,
}

impl Roster {
    pub fn new(own_name: impl Into<String>) -> Self {
        Self {
            own_name: own_name.into(),
            names: Vec::new(),
        }
    }

    pub fn own_name(&self) -> &str {
        &self.own_name
    }

    /// Adds a subject. Returns `false` for the avatar itself, empty names
    /// and names already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || name == self.own_name || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let initial_len = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() < initial_len
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Rotation over a roster snapshot with a current position.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: Vec<String>,
    index: usize,
}

impl Queue {
    /// Replaces the entries from `roster`.
    ///
    /// If the subject under the cursor survives the rebuild the cursor
    /// follows it; otherwise the cursor keeps its position, which now
    /// holds the removed subject's successor, and wraps to `0` when it
    /// falls off the end.
    pub fn rebuild(&mut self, roster: &Roster) {
        let cursor = self.current().map(str::to_string);
        self.entries = roster
            .iter()
            .filter(|name| *name != roster.own_name())
            .map(str::to_string)
            .collect();

        if let Some(cursor) = cursor
            && let Some(position) = self.entries.iter().position(|n| *n == cursor)
        {
            self.index = position;
        }
        if self.index >= self.entries.len() {
            self.index = 0;
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.index).map(String::as_str)
    }

    /// Moves the cursor to the next entry, wrapping around.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.entries.len().max(1);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|n| n == name)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Roster {
        let mut roster = Roster::new("cambot");
        for name in names {
            roster.insert(name);
        }
        roster
    }

    #[test]
    fn test_roster_rejects_self_and_duplicates() {
        let mut roster = Roster::new("cambot");
        assert!(roster.insert("alex"));
        assert!(!roster.insert("alex"));
        assert!(!roster.insert("cambot"));
        assert!(!roster.insert(""));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_remove() {
        let mut roster = roster(&["alex", "steve"]);
        assert!(roster.remove("alex"));
        assert!(!roster.remove("alex"));
        assert_eq!(roster.iter().collect::<Vec<_>>(), vec!["steve"]);
    }

    #[test]
    fn test_queue_never_contains_self() {
        let roster = roster(&["alex", "cambot", "steve"]);
        let mut queue = Queue::default();
        queue.rebuild(&roster);
        assert!(!queue.contains("cambot"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_queue_advance_wraps() {
        let roster = roster(&["a", "b", "c"]);
        let mut queue = Queue::default();
        queue.rebuild(&roster);
        assert_eq!(queue.current(), Some("a"));
        queue.advance();
        queue.advance();
        assert_eq!(queue.current(), Some("c"));
        queue.advance();
        assert_eq!(queue.current(), Some("a"));
    }

    #[test]
    fn test_advance_on_empty_queue_stays_at_zero() {
        let mut queue = Queue::default();
        queue.advance();
        assert_eq!(queue.index(), 0);
        assert_eq!(queue.current(), None);
    }

    #[test]
    fn test_rebuild_follows_cursor_subject() {
        let mut roster = roster(&["a", "b", "c"]);
        let mut queue = Queue::default();
        queue.rebuild(&roster);
        queue.advance(); // b

        roster.remove("a");
        queue.rebuild(&roster);
        assert_eq!(queue.current(), Some("b"));
    }

    #[test]
    fn test_rebuild_after_removing_cursor_points_at_successor() {
        let mut roster = roster(&["a", "b", "c"]);
        let mut queue = Queue::default();
        queue.rebuild(&roster);
        queue.advance(); // b

        roster.remove("b");
        queue.rebuild(&roster);
        assert_eq!(queue.current(), Some("c"));

        roster.remove("c");
        queue.rebuild(&roster);
        assert_eq!(queue.index(), 0);
        assert_eq!(queue.current(), Some("a"));
    }

    #[test]
    fn test_rebuild_to_empty_resets_index() {
        let mut roster = roster(&["a", "b"]);
        let mut queue = Queue::default();
        queue.rebuild(&roster);
        queue.advance();
        roster.remove("a");
        roster.remove("b");
        queue.rebuild(&roster);
        assert!(queue.is_empty());
        assert_eq!(queue.index(), 0);
    }
}
