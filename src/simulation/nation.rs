//! The simulation context
//!
//! One `Nation` owns every store, the gateway and the event bus. It is meant
//! to be held in an `Arc` and shared between the tick loop and any callers
//! querying or seeding it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{Mutex, Notify, RwLock};

use crate::core::config::SimulationConfig;
use crate::core::error::{NationError, Result};
use crate::core::types::{AgentId, ConversationId};
use crate::entity::agent::Agent;
use crate::entity::conversation::Conversation;
use crate::entity::fragment::{Fragment, Rule};
use crate::events::{EventBus, EventSubscription, NationEvent};
use crate::llm::gateway::{ChatGateway, TimeoutGateway};
use crate::world::{AgentRegistry, ContentStore, ConversationLog};

pub struct Nation {
    pub(crate) config: SimulationConfig,
    pub(crate) agents: RwLock<AgentRegistry>,
    pub(crate) content: RwLock<ContentStore>,
    pub(crate) conversations: RwLock<ConversationLog>,
    pub(crate) gateway: TimeoutGateway,
    pub(crate) events: EventBus,
    rng: Mutex<ChaCha8Rng>,
    pub(crate) running: AtomicBool,
    /// Bumped on every start; a loop exits once it no longer owns the latest
    pub(crate) generation: AtomicU64,
    pub(crate) wake: Notify,
    pub(crate) ticks: AtomicU64,
}

impl Nation {
    pub fn new(config: SimulationConfig, gateway: Arc<dyn ChatGateway>) -> Result<Self> {
        config.validate().map_err(NationError::Config)?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            gateway: TimeoutGateway::new(gateway, config.gateway_timeout()),
            events: EventBus::new(config.event_capacity),
            agents: RwLock::new(AgentRegistry::new()),
            content: RwLock::new(ContentStore::new()),
            conversations: RwLock::new(ConversationLog::new()),
            rng: Mutex::new(rng),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            wake: Notify::new(),
            ticks: AtomicU64::new(0),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Insert or replace an agent
    pub async fn add_agent(&self, agent: Agent) -> Result<()> {
        tracing::debug!(agent = %agent.id, name = %agent.name, "Adding agent");
        self.agents.write().await.upsert(agent)
    }

    pub async fn get_agent(&self, id: &AgentId) -> Option<Agent> {
        self.agents.read().await.get(id).cloned()
    }

    pub async fn list_agents(&self) -> Vec<Agent> {
        self.agents.read().await.all()
    }

    pub async fn list_fragments(&self) -> Vec<Fragment> {
        self.content.read().await.fragments().to_vec()
    }

    pub async fn list_rules(&self) -> Vec<Rule> {
        self.content.read().await.rules().to_vec()
    }

    pub async fn list_conversations(&self) -> Vec<Conversation> {
        self.conversations.read().await.all()
    }

    pub async fn get_conversation(&self, id: &ConversationId) -> Option<Conversation> {
        self.conversations.read().await.get(id).cloned()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    /// Ticks completed so far
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Uniform draw in [0, 1)
    pub(crate) async fn roll(&self) -> f64 {
        self.rng.lock().await.gen::<f64>()
    }

    /// Uniform index in [0, len); `len` must be non-zero
    pub(crate) async fn pick(&self, len: usize) -> usize {
        self.rng.lock().await.gen_range(0..len)
    }

    pub(crate) async fn with_rng<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
        let mut rng = self.rng.lock().await;
        f(&mut rng)
    }

    /// Mutate one agent and publish its new action and position
    pub(crate) async fn update_agent(&self, id: &AgentId, f: impl FnOnce(&mut Agent)) -> Option<Agent> {
        let updated = {
            let mut agents = self.agents.write().await;
            if !agents.update(id, f) {
                return None;
            }
            agents.get(id).cloned()
        }?;

        self.events.publish(NationEvent::avatar_update(
            updated.id.clone(),
            updated.action,
            updated.position,
        ));
        Some(updated)
    }
}
