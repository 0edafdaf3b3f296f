use crate::messages::Turn;

/// Sliding window of conversation turns.
///
/// Turns are kept in chronological order. Once the window grows past
/// `max_items` the oldest question/answer pair is dropped.
#[derive(Debug, Clone)]
pub struct MessageStore {
    turns: Vec<Turn>,
    max_items: usize,
}

impl MessageStore {
    pub fn new(max_items: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_items,
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Removes the newest turn.
    pub fn pop(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    /// Evicts the oldest pairs until the window fits, returning how many turns
    /// were removed.
    pub fn trim_if_needed(&mut self) -> usize {
        let mut evicted = 0;
        while self.turns.len() > self.max_items {
            let count = self.turns.len().min(2);
            self.turns.drain(..count);
            evicted += count;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }
}
