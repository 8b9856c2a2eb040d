//! Bounded, insertion-ordered message cache

use std::collections::{HashMap, VecDeque};

use guilded_core::Message;

/// Message cache keeping at most `capacity` messages.
///
/// Replacing a cached message (an edit) keeps its original position.
/// A capacity of `0` disables caching entirely.
#[derive(Debug)]
pub struct MessageCache {
    capacity: usize,
    messages: HashMap<String, Message>,
    order: VecDeque<String>,
}

impl MessageCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Insert or replace a message. Returns the message evicted to make room, if any.
    pub fn insert(&mut self, message: Message) -> Option<Message> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(existing) = self.messages.get_mut(&message.id) {
            *existing = message;
            return None;
        }

        self.order.push_back(message.id.clone());
        self.messages.insert(message.id.clone(), message);

        if self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            return self.messages.remove(&oldest);
        }
        None
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Message> {
        let message = self.messages.remove(id)?;
        self.order.retain(|cached| cached != id);
        Some(message)
    }

    /// Cached messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.order.iter().filter_map(|id| self.messages.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.order.clear();
    }
}
