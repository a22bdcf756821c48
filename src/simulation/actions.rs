//! Behavior execution
//!
//! Each behavior mutates the stores through the `Nation` context and
//! publishes what changed. Gateway failures are logged and swallowed: a
//! failed call simply has no effect.

use crate::core::types::{AgentId, ConversationId, FragmentId, RuleId};
use crate::entity::agent::{Agent, AgentAction};
use crate::entity::conversation::{Conversation, ConversationStatus};
use crate::entity::fragment::{Fragment, FragmentType, Rule};
use crate::events::bus::ConversationStarted;
use crate::events::NationEvent;
use crate::llm::analysis::{analyze_fragment, FragmentAnalysis};
use crate::llm::gateway::{ChatGateway, ChatMessage, ChatRequest};
use crate::llm::prompts;
use crate::simulation::conversation::ConversationRun;
use crate::simulation::movement::plan_wander;
use crate::simulation::nation::Nation;
use crate::simulation::synthesis::synthesis_window;
use crate::spatial::proximity::nearby_agents;

async fn dwell(duration: std::time::Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

impl Nation {
    /// Take one wander step; returns false for an unknown agent
    pub async fn wander(&self, agent_id: &AgentId) -> bool {
        let Some(agent) = self.get_agent(agent_id).await else {
            return false;
        };

        let (min, max) = (self.config.wander_min_distance, self.config.wander_max_distance);
        let step = self
            .with_rng(|rng| plan_wander(agent.position, rng, min, max))
            .await;

        tracing::debug!(
            agent = %agent_id,
            shape = ?step.shape,
            distance = step.distance,
            "Wandering"
        );

        self.update_agent(agent_id, |a| {
            a.position = step.new_position;
            a.rotation = step.new_rotation;
            a.action = AgentAction::Walking;
        })
        .await
        .is_some()
    }

    /// Think for a while, maybe creating a fragment, then go idle
    pub async fn think(&self, agent_id: &AgentId) {
        if self
            .update_agent(agent_id, |a| a.action = AgentAction::Thinking)
            .await
            .is_none()
        {
            return;
        }

        dwell(self.config.think_dwell()).await;

        if self.roll().await < self.config.think_create_probability {
            self.create_fragment(agent_id).await;
        }

        self.update_agent(agent_id, |a| a.action = AgentAction::Idle).await;
    }

    /// Look around the wider neighbourhood, maybe striking up a conversation
    pub async fn observe(&self, agent_id: &AgentId) {
        let Some(agent) = self.get_agent(agent_id).await else {
            return;
        };
        let everyone = self.list_agents().await;
        let seen = nearby_agents(&agent, &everyone, self.config.observe_radius);
        if seen.is_empty() {
            return;
        }

        tracing::debug!(agent = %agent_id, seen = seen.len(), "Observing");
        self.update_agent(agent_id, |a| a.action = AgentAction::Thinking).await;

        dwell(self.config.observe_dwell()).await;

        if self.roll().await < self.config.observe_converse_probability {
            self.converse(agent_id, &seen).await;
        }

        self.update_agent(agent_id, |a| a.action = AgentAction::Idle).await;
    }

    /// Hold a conversation with one of `candidates`
    ///
    /// The conversation is stored and announced once its first message is
    /// spoken. Returns its id from then on, whether it completed or was
    /// aborted later; a failed opening turn leaves nothing behind.
    pub async fn converse(&self, initiator_id: &AgentId, candidates: &[Agent]) -> Option<ConversationId> {
        if candidates.is_empty() {
            return None;
        }

        let initiator = self.get_agent(initiator_id).await?;
        let chosen = &candidates[self.pick(candidates.len()).await];
        let partner = self.get_agent(&chosen.id).await?;
        if partner.id == initiator.id {
            return None;
        }

        let topic = prompts::CONVERSATION_TOPICS[self.pick(prompts::CONVERSATION_TOPICS.len()).await];
        let conversation = Conversation::new(initiator.id.clone(), partner.id.clone(), topic);
        let conversation_id = conversation.id.clone();

        tracing::debug!(
            conversation = %conversation_id,
            initiator = %initiator.name,
            partner = %partner.name,
            topic,
            "Opening conversation"
        );

        let mut run = ConversationRun::new(&conversation, initiator, partner, self.config.conversation_turns);
        // Held here until the opening line exists
        let mut unsaved = Some(conversation);
        let mut stored = false;

        while let Some(speaker) = run.current_speaker().cloned() {
            if run.turn().unwrap_or(0) > 0 {
                dwell(self.config.turn_delay()).await;
            }

            let sampling = self.config.sampling.conversation;
            let request = match &unsaved {
                Some(conversation) => run.build_request(conversation, sampling),
                None => {
                    let log = self.conversations.read().await;
                    log.get(&conversation_id)
                        .and_then(|conversation| run.build_request(conversation, sampling))
                }
            };
            let Some(request) = request else {
                break;
            };

            let text = match self.gateway.chat(request).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        conversation = %conversation_id,
                        speaker = %speaker.name,
                        error = %e,
                        "Conversation turn failed, aborting"
                    );
                    run.abort(e.to_string());
                    break;
                }
            };

            let pushed = match unsaved.take() {
                Some(mut conversation) => {
                    let pushed = conversation.push_message(&speaker.id, text);
                    if pushed.is_ok() {
                        self.events.publish(NationEvent::ConversationStarted(ConversationStarted {
                            conversation_id: conversation_id.clone(),
                            participants: conversation.participants.clone(),
                            topic: conversation.topic.clone(),
                            messages: conversation.messages.clone(),
                        }));
                        self.conversations.write().await.insert(conversation);
                        stored = true;
                        tracing::info!(conversation = %conversation_id, topic = %run.topic, "Conversation started");
                    }
                    pushed
                }
                None => match self.conversations.write().await.get_mut(&conversation_id) {
                    Some(conversation) => conversation.push_message(&speaker.id, text),
                    None => break,
                },
            };
            if let Err(e) = pushed {
                tracing::warn!(conversation = %conversation_id, error = %e, "Rejected message");
                run.abort(e.to_string());
                break;
            }

            self.update_agent(&speaker.id, |a| a.action = AgentAction::Interacting).await;
            run.advance();
        }

        let status = run.status();
        if let Some(conversation) = self.conversations.write().await.get_mut(&conversation_id) {
            conversation.status = status.clone();
        }

        let [first, second] = &run.speakers;
        let completed = stored && status == ConversationStatus::Completed;
        let capacity = self.config.max_memories;
        for (agent, partner) in [(first, second), (second, first)] {
            let memory = prompts::conversation_memory(partner, &run.topic);
            self.update_agent(&agent.id, |a| {
                a.action = AgentAction::Idle;
                if completed {
                    a.remember(memory, capacity);
                }
            })
            .await;
        }

        if !stored {
            tracing::warn!(conversation = %conversation_id, "Conversation dropped before its first message");
            return None;
        }

        tracing::info!(conversation = %conversation_id, status = ?status, "Conversation finished");
        Some(conversation_id)
    }

    /// Ask the gateway for a fragment on the agent's behalf
    pub async fn create_fragment(&self, agent_id: &AgentId) -> Option<FragmentId> {
        let agent = self.get_agent(agent_id).await?;

        let fragment_type = FragmentType::ALL[self.pick(FragmentType::ALL.len()).await];
        let rolled_strength = 0.7 + self.roll().await as f32 * 0.3;

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(prompts::persona_prompt(&agent)),
                ChatMessage::user(prompts::fragment_instruction(fragment_type)),
            ],
            self.config.sampling.fragment,
        );

        let content = match self.gateway.chat(request).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(agent = %agent_id, error = %e, "Fragment creation failed");
                return None;
            }
        };

        let analysis = if self.config.analyze_fragments {
            match analyze_fragment(&self.gateway, &content, self.config.sampling.analysis, rolled_strength).await {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    tracing::warn!(agent = %agent_id, error = %e, "Fragment analysis failed");
                    Some(FragmentAnalysis::fallback(rolled_strength))
                }
            }
        } else {
            None
        };

        let mut fragment = Fragment::new(
            agent.id.clone(),
            fragment_type,
            content,
            rolled_strength,
            prompts::fragment_reasoning(&agent),
        );
        if let Some(analysis) = analysis {
            fragment.strength = analysis.strength;
            fragment = fragment.with_tags(analysis.tags);
        }
        let fragment_id = fragment.id.clone();

        // The owner may have been replaced meanwhile, never removed
        self.content.write().await.push_fragment(fragment.clone());
        self.update_agent(agent_id, |a| a.action = AgentAction::Building).await;
        self.events.publish(NationEvent::FragmentCreated(fragment));

        tracing::info!(
            agent = %agent.name,
            fragment = %fragment_id,
            kind = fragment_type.as_str(),
            "Fragment created"
        );
        Some(fragment_id)
    }

    /// Derive a rule from the most recent fragments, once there are enough
    pub async fn synthesize_rule(&self) -> Option<RuleId> {
        let (prompt, sources) = {
            let content = self.content.read().await;
            let window = synthesis_window(
                content.fragments(),
                self.config.rule_min_fragments,
                self.config.rule_window,
                self.config.rule_sources,
            )?;
            (prompts::rule_user_prompt(window.fragments), window.sources)
        };

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(prompts::RULE_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            self.config.sampling.rule,
        );

        let text = match self.gateway.chat(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Rule synthesis failed");
                return None;
            }
        };

        let consensus = 0.8 + self.roll().await as f32 * 0.2;
        let rule = Rule::new(text.trim(), sources, consensus);
        let rule_id = rule.id.clone();

        if let Err(e) = self.content.write().await.push_rule(rule.clone()) {
            tracing::warn!(error = %e, "Rule rejected");
            return None;
        }
        self.events.publish(NationEvent::RuleCreated(rule));

        tracing::info!(rule = %rule_id, consensus, "Rule created");
        Some(rule_id)
    }
}
