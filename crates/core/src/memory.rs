//! Conversation memory: a bounded window of recent exchanges.
//!
//! The window retains the most recent K user/assistant exchange pairs
//! (at most 2K turns) in arrival order. Oldest turns are evicted first
//! when the bound is exceeded. The model context is rebuilt from a
//! snapshot on every call, which keeps the model itself stateless.

use crate::message::Message;
use std::collections::VecDeque;

/// Default number of exchanges retained.
pub const DEFAULT_WINDOW_EXCHANGES: usize = 10;

/// A bounded, ordered buffer of conversation turns.
#[derive(Debug)]
pub struct ConversationWindow {
    turns: VecDeque<Message>,
    max_exchanges: usize,
}

impl ConversationWindow {
    /// Create a window retaining at most `max_exchanges` exchange pairs.
    /// A `max_exchanges` of 0 is clamped to 1.
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_exchanges: max_exchanges.max(1),
        }
    }

    /// Record one completed exchange as a (human, assistant) turn pair.
    ///
    /// Evicts the oldest turns once the configured window is exceeded.
    pub fn push_exchange(&mut self, user: Message, assistant: Message) {
        self.turns.push_back(user);
        self.turns.push_back(assistant);
        while self.turns.len() > self.max_exchanges * 2 {
            self.turns.pop_front();
        }
    }

    /// The ordered turns currently retained, oldest first.
    ///
    /// Returns a fresh, independent sequence; callers cannot mutate the
    /// buffer through the result.
    pub fn snapshot(&self) -> Vec<Message> {
        self.turns.iter().cloned().collect()
    }

    /// Empty the buffer. Idempotent.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of turns (not exchanges) retained.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_EXCHANGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    fn exchange(i: usize) -> (Message, Message) {
        (
            Message::user(format!("question {i}")),
            Message::assistant(format!("answer {i}")),
        )
    }

    #[test]
    fn window_bounds_to_most_recent_exchanges() {
        let mut window = ConversationWindow::new(3);
        for i in 0..10 {
            let (u, a) = exchange(i);
            window.push_exchange(u, a);
        }

        let snap = window.snapshot();
        assert_eq!(snap.len(), 6);
        // Oldest retained exchange is #7, oldest-first order
        assert_eq!(snap[0].content, "question 7");
        assert_eq!(snap[0].role, Role::User);
        assert_eq!(snap[5].content, "answer 9");
        assert_eq!(snap[5].role, Role::Assistant);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut window = ConversationWindow::new(2);
        let (u, a) = exchange(0);
        window.push_exchange(u, a);

        let mut snap = window.snapshot();
        snap.clear();
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut window = ConversationWindow::new(2);
        let (u, a) = exchange(0);
        window.push_exchange(u, a);

        window.clear();
        assert!(window.is_empty());
        window.clear();
        assert!(window.is_empty());
    }

    #[test]
    fn zero_window_clamps_to_one_exchange() {
        let mut window = ConversationWindow::new(0);
        for i in 0..3 {
            let (u, a) = exchange(i);
            window.push_exchange(u, a);
        }
        assert_eq!(window.len(), 2);
        assert_eq!(window.snapshot()[0].content, "question 2");
    }
}
