//! Bounded conversation memory

use std::collections::VecDeque;

/// One question and the answer the model gave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Keeps the most recent `capacity` turns
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Remembered turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        self.turns.as_slices().0
    }

    /// Append a turn, forgetting the oldest when full
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn {
            question: question.into(),
            answer: answer.into(),
        });
        self.turns.make_contiguous();
    }
}
