//! Conversation log - every conversation ever started, in start order

use ahash::AHashMap;

use crate::core::types::ConversationId;
use crate::entity::conversation::Conversation;

#[derive(Debug, Default)]
pub struct ConversationLog {
    order: Vec<ConversationId>,
    conversations: AHashMap<ConversationId, Conversation>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, conversation: Conversation) {
        if !self.conversations.contains_key(&conversation.id) {
            self.order.push(conversation.id.clone());
        }
        self.conversations.insert(conversation.id.clone(), conversation);
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn get_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.get_mut(id)
    }

    pub fn all(&self) -> Vec<Conversation> {
        self.order
            .iter()
            .filter_map(|id| self.conversations.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
