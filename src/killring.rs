//! Provides the ring buffer of killed text

use std::collections::VecDeque;

/// Default number of kill ring slots
pub const DEFAULT_KILL_RING_SIZE: usize = 60;

/// Holds killed text in a bounded ring.
///
/// The most recent kill occupies the front slot. Consecutive kill
/// operations merge into a single slot: forward kills append to it and
/// backward kills prepend. Yanking establishes a slot pointer that
/// `yank_pop` rotates toward older slots, wrapping around.
#[derive(Clone, Debug)]
pub struct KillRing {
    slots: VecDeque<String>,
    max_size: usize,
    index: usize,
    last_kill: bool,
    last_yank: bool,
}

impl Default for KillRing {
    fn default() -> KillRing {
        KillRing::new()
    }
}

impl KillRing {
    /// Creates an empty kill ring with the default number of slots.
    pub fn new() -> KillRing {
        KillRing::with_max_size(DEFAULT_KILL_RING_SIZE)
    }

    /// Creates an empty kill ring holding at most `max_size` slots.
    pub fn with_max_size(max_size: usize) -> KillRing {
        KillRing{
            slots: VecDeque::new(),
            max_size,
            index: 0,
            last_kill: false,
            last_yank: false,
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the ring holds no killed text.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Records a forward kill.
    ///
    /// If the previous operation was also a kill, the text is appended to
    /// the most recent slot; otherwise a new slot is created.
    pub fn add(&mut self, s: String) {
        if self.last_kill {
            if let Some(slot) = self.slots.front_mut() {
                slot.push_str(&s);
                return;
            }
        }

        self.push_slot(s);
    }

    /// Records a backward kill.
    ///
    /// If the previous operation was also a kill, the text is prepended to
    /// the most recent slot; otherwise a new slot is created.
    pub fn add_backwards(&mut self, s: String) {
        if self.last_kill {
            if let Some(slot) = self.slots.front_mut() {
                slot.insert_str(0, &s);
                return;
            }
        }

        self.push_slot(s);
    }

    fn push_slot(&mut self, s: String) {
        if self.max_size == 0 {
            return;
        }

        if self.slots.len() == self.max_size {
            self.slots.pop_back();
        }

        self.slots.push_front(s);
        self.last_kill = true;
    }

    /// Returns the text at the current slot pointer, marking the operation
    /// as a yank.
    ///
    /// When the previous operation was not a yank, the pointer is first
    /// reset to the most recent slot.
    pub fn yank(&mut self) -> Option<String> {
        if !self.last_yank {
            self.index = 0;
        }

        let s = self.slots.get(self.index).cloned();
        self.last_yank = s.is_some();
        s
    }

    /// Rotates the slot pointer to the next older slot and returns its
    /// text.
    ///
    /// Returns `None` unless the previous operation was a yank.
    pub fn yank_pop(&mut self) -> Option<String> {
        if !self.last_yank || self.slots.is_empty() {
            return None;
        }

        self.index = (self.index + 1) % self.slots.len();
        self.slots.get(self.index).cloned()
    }

    /// Returns whether the previous operation was a yank.
    pub fn last_yank(&self) -> bool {
        self.last_yank
    }

    /// Forgets that the previous operation was a yank.
    ///
    /// Called by dispatch when any non-yank operation intervenes.
    pub fn reset_last_yank(&mut self) {
        self.last_yank = false;
    }

    /// Forgets that the previous operation was a kill.
    ///
    /// Called by dispatch when any non-kill operation intervenes.
    pub fn reset_last_kill(&mut self) {
        self.last_kill = false;
    }
}

#[cfg(test)]
mod test {
    use super::KillRing;

    #[test]
    fn test_consecutive_kills_merge() {
        let mut ring = KillRing::new();

        ring.add("foo".to_owned());
        ring.add(" bar".to_owned());
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.yank().as_deref(), Some("foo bar"));

        let mut ring = KillRing::new();

        ring.add_backwards("bar".to_owned());
        ring.add_backwards("foo ".to_owned());
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.yank().as_deref(), Some("foo bar"));
    }

    #[test]
    fn test_separate_kills() {
        let mut ring = KillRing::new();

        ring.add("one".to_owned());
        ring.reset_last_kill();
        ring.add("two".to_owned());

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.yank().as_deref(), Some("two"));
    }

    #[test]
    fn test_yank_pop_cycles() {
        let mut ring = KillRing::new();

        ring.add("x".to_owned());
        ring.reset_last_kill();
        ring.add("y".to_owned());
        ring.reset_last_kill();

        assert_eq!(ring.yank().as_deref(), Some("y"));
        assert_eq!(ring.yank_pop().as_deref(), Some("x"));
        assert_eq!(ring.yank_pop().as_deref(), Some("y"));
        assert_eq!(ring.yank_pop().as_deref(), Some("x"));
    }

    #[test]
    fn test_yank_pop_requires_yank() {
        let mut ring = KillRing::new();

        assert_eq!(ring.yank(), None);
        assert_eq!(ring.yank_pop(), None);

        ring.add("kill".to_owned());
        assert_eq!(ring.yank_pop(), None);

        assert_eq!(ring.yank().as_deref(), Some("kill"));
        ring.reset_last_yank();
        assert_eq!(ring.yank_pop(), None);
    }

    #[test]
    fn test_bounded() {
        let mut ring = KillRing::with_max_size(2);

        for s in &["a", "b", "c"] {
            ring.add((*s).to_owned());
            ring.reset_last_kill();
        }

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.yank().as_deref(), Some("c"));
        assert_eq!(ring.yank_pop().as_deref(), Some("b"));
        assert_eq!(ring.yank_pop().as_deref(), Some("c"));
    }
}
