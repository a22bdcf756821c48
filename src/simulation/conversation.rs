//! Conversation state machine
//!
//! A run alternates speakers for a fixed number of turns, starting with the
//! initiator. The scheduler drives it one turn at a time, so partial progress
//! is always visible in the stored conversation.

use crate::core::config::SamplingParams;
use crate::core::types::ConversationId;
use crate::entity::agent::Agent;
use crate::entity::conversation::{Conversation, ConversationStatus};
use crate::llm::gateway::{ChatMessage, ChatRequest};
use crate::llm::prompts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Speaking { turn: usize },
    Completed,
    Aborted { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConversationRun {
    pub conversation_id: ConversationId,
    /// Initiator first
    pub speakers: [Agent; 2],
    pub topic: String,
    pub max_turns: usize,
    state: RunState,
}

impl ConversationRun {
    pub fn new(conversation: &Conversation, initiator: Agent, partner: Agent, max_turns: usize) -> Self {
        let state = if max_turns == 0 {
            RunState::Completed
        } else {
            RunState::Speaking { turn: 0 }
        };
        Self {
            conversation_id: conversation.id.clone(),
            speakers: [initiator, partner],
            topic: conversation.topic.clone(),
            max_turns,
            state,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, RunState::Speaking { .. })
    }

    pub fn turn(&self) -> Option<usize> {
        match self.state {
            RunState::Speaking { turn } => Some(turn),
            _ => None,
        }
    }

    /// Agent due to speak, if the run is still going
    pub fn current_speaker(&self) -> Option<&Agent> {
        self.turn().map(|turn| &self.speakers[turn % 2])
    }

    /// Gateway request for the current turn
    ///
    /// The speaker's earlier messages are its own (`assistant`); everything
    /// the partner said is `user`.
    pub fn build_request(&self, conversation: &Conversation, sampling: SamplingParams) -> Option<ChatRequest> {
        let turn = self.turn()?;
        let speaker = &self.speakers[turn % 2];
        let listener = &self.speakers[(turn + 1) % 2];

        let mut messages = Vec::with_capacity(conversation.messages.len() + 2);
        messages.push(ChatMessage::system(prompts::persona_prompt(speaker)));
        for message in &conversation.messages {
            if message.sender_id == speaker.id {
                messages.push(ChatMessage::assistant(message.content.clone()));
            } else {
                messages.push(ChatMessage::user(message.content.clone()));
            }
        }

        let turn_prompt = match conversation.last_message() {
            Some(last) if turn > 0 => prompts::reply_prompt(listener, &last.content),
            _ => prompts::opening_prompt(listener, &self.topic),
        };
        messages.push(ChatMessage::user(turn_prompt));

        Some(ChatRequest::new(messages, sampling))
    }

    /// Move past a spoken turn
    pub fn advance(&mut self) {
        if let RunState::Speaking { turn } = self.state {
            let next = turn + 1;
            self.state = if next >= self.max_turns {
                RunState::Completed
            } else {
                RunState::Speaking { turn: next }
            };
        }
    }

    /// Stop early; turns already spoken are kept
    pub fn abort(&mut self, reason: impl Into<String>) {
        if !self.is_finished() {
            self.state = RunState::Aborted { reason: reason.into() };
        }
    }

    /// Status to record on the stored conversation
    pub fn status(&self) -> ConversationStatus {
        match &self.state {
            RunState::Speaking { turn } => ConversationStatus::Active { turn: *turn },
            RunState::Completed => ConversationStatus::Completed,
            RunState::Aborted { reason } => ConversationStatus::Aborted { reason: reason.clone() },
        }
    }
}
