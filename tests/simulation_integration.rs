//! Behavior simulation integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use ideal_nation::core::config::SimulationConfig;
use ideal_nation::core::error::{NationError, Result};
use ideal_nation::core::types::Vec3;
use ideal_nation::entity::{Agent, AgentAction, ConversationStatus};
use ideal_nation::events::{EventKind, NationEvent};
use ideal_nation::llm::{CannedGateway, ChatGateway, ChatRequest, ChatRole};
use ideal_nation::simulation::{default_population, Nation};

/// Answers the first `successes` calls, fails every one after
struct ScriptedGateway {
    successes: usize,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedGateway {
    fn new(successes: usize) -> Self {
        Self {
            successes,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.successes {
            Ok(format!("第{}句话", call + 1))
        } else {
            Err(NationError::Gateway("connection refused".into()))
        }
    }
}

struct SlowGateway;

#[async_trait]
impl ChatGateway for SlowGateway {
    async fn chat(&self, _request: ChatRequest) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("too late".into())
    }
}

/// Answers every call after a short pause
struct DelayedGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatGateway for DelayedGateway {
    async fn chat(&self, _request: ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok("慢慢来".into())
    }
}

fn fast_config() -> SimulationConfig {
    SimulationConfig {
        seed: Some(2024),
        think_dwell_ms: 0,
        observe_dwell_ms: 0,
        turn_delay_ms: 0,
        tick_interval_ms: 60_000,
        ..SimulationConfig::default()
    }
}

async fn pair(gateway: Arc<dyn ChatGateway>) -> Nation {
    let nation = Nation::new(fast_config(), gateway).unwrap();
    nation
        .add_agent(Agent::new("twin-1", "智慧守护者", "睿智").with_position(Vec3::new(0.0, 0.0, 0.0)))
        .await
        .unwrap();
    nation
        .add_agent(Agent::new("twin-2", "创意先锋", "活泼").with_position(Vec3::new(1.0, 0.0, 1.0)))
        .await
        .unwrap();
    nation
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_conversation_shape_and_ordering() {
    let gateway = Arc::new(ScriptedGateway::new(usize::MAX));
    let nation = pair(gateway.clone()).await;
    let mut events = nation.subscribe();

    let partner = nation.get_agent(&"twin-2".into()).await.unwrap();
    let id = nation.converse(&"twin-1".into(), &[partner]).await.unwrap();

    let conversation = nation.get_conversation(&id).await.unwrap();
    assert_eq!(conversation.participants[0].as_str(), "twin-1");
    assert_eq!(conversation.messages.len(), 3);
    let senders: Vec<_> = conversation.messages.iter().map(|m| m.sender_id.as_str()).collect();
    assert_eq!(senders, vec!["twin-1", "twin-2", "twin-1"]);
    assert!(conversation
        .messages
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(conversation.status, ConversationStatus::Completed);

    // Third turn: twin-1 speaks again and sees its own first line as assistant
    let requests = gateway.requests();
    assert_eq!(requests.len(), 3);
    let third = &requests[2];
    assert!(third.system_prompt().unwrap().contains("智慧守护者"));
    assert_eq!(third.messages[1].role, ChatRole::Assistant);
    assert_eq!(third.messages[2].role, ChatRole::User);
    assert!(third.messages.last().unwrap().content.contains("第2句话"));
    assert_eq!(third.temperature, 0.8);
    assert_eq!(third.max_tokens, 200);

    // Started first, then one update per turn, then both go idle
    let mut kinds = Vec::new();
    let mut actions = Vec::new();
    while let Some(event) = events.try_recv() {
        kinds.push(event.kind());
        if let NationEvent::AvatarUpdate(update) = event {
            actions.push(update.updates.action);
        }
    }
    assert_eq!(kinds[0], EventKind::ConversationStarted);
    assert_eq!(
        actions,
        vec![
            AgentAction::Interacting,
            AgentAction::Interacting,
            AgentAction::Interacting,
            AgentAction::Idle,
            AgentAction::Idle,
        ]
    );
}

#[tokio::test]
async fn test_gateway_failure_aborts_remaining_turns() {
    let gateway = Arc::new(ScriptedGateway::new(1));
    let nation = pair(gateway.clone()).await;

    let partner = nation.get_agent(&"twin-2".into()).await.unwrap();
    let id = nation.converse(&"twin-1".into(), &[partner]).await.unwrap();

    let conversation = nation.get_conversation(&id).await.unwrap();
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(conversation.messages[0].content, "第1句话");
    assert!(matches!(conversation.status, ConversationStatus::Aborted { .. }));
    assert_eq!(gateway.requests().len(), 2);

    for id in ["twin-1", "twin-2"] {
        let agent = nation.get_agent(&id.into()).await.unwrap();
        assert_eq!(agent.action, AgentAction::Idle);
        assert!(agent.memories.is_empty());
    }
}

#[tokio::test]
async fn test_failed_opening_turn_stores_nothing() {
    let gateway = Arc::new(ScriptedGateway::new(0));
    let nation = pair(gateway.clone()).await;
    let mut started = nation.events().subscribe_to(&[EventKind::ConversationStarted]);

    let partner = nation.get_agent(&"twin-2".into()).await.unwrap();
    assert!(nation.converse(&"twin-1".into(), &[partner]).await.is_none());

    assert_eq!(gateway.requests().len(), 1);
    assert!(nation.list_conversations().await.is_empty());
    assert!(started.try_recv().is_none());
    for id in ["twin-1", "twin-2"] {
        let agent = nation.get_agent(&id.into()).await.unwrap();
        assert_eq!(agent.action, AgentAction::Idle);
        assert!(agent.memories.is_empty());
    }
}

#[tokio::test]
async fn test_failed_fragment_leaves_agent_untouched() {
    let nation = pair(Arc::new(ScriptedGateway::new(0))).await;
    let before = nation.get_agent(&"twin-1".into()).await.unwrap();

    assert!(nation.create_fragment(&"twin-1".into()).await.is_none());

    assert!(nation.list_fragments().await.is_empty());
    assert_eq!(nation.get_agent(&"twin-1".into()).await.unwrap(), before);
}

#[tokio::test]
async fn test_gateway_timeout_is_a_failure() {
    let config = SimulationConfig {
        gateway_timeout_ms: 20,
        ..fast_config()
    };
    let nation = Nation::new(config, Arc::new(SlowGateway)).unwrap();
    nation.add_agent(Agent::new("twin-1", "A", "p")).await.unwrap();

    assert!(nation.create_fragment(&"twin-1".into()).await.is_none());
    assert!(nation.list_fragments().await.is_empty());
}

#[tokio::test]
async fn test_synthesis_boundaries() {
    let nation = pair(Arc::new(CannedGateway::new("共享与尊重"))).await;

    for _ in 0..4 {
        nation.create_fragment(&"twin-1".into()).await.unwrap();
    }
    assert!(nation.synthesize_rule().await.is_none());
    assert!(nation.list_rules().await.is_empty());

    nation.create_fragment(&"twin-2".into()).await.unwrap();
    assert!(nation.synthesize_rule().await.is_some());

    for _ in 0..7 {
        nation.create_fragment(&"twin-2".into()).await.unwrap();
    }
    let rule_id = nation.synthesize_rule().await.unwrap();

    let fragments = nation.list_fragments().await;
    assert_eq!(fragments.len(), 12);
    let rules = nation.list_rules().await;
    let rule = rules.iter().find(|r| r.id == rule_id).unwrap();
    let expected: Vec<_> = fragments[7..].iter().map(|f| f.id.clone()).collect();
    assert_eq!(rule.source_fragments, expected);
    assert_eq!(rule.content, "共享与尊重");
}

#[tokio::test]
async fn test_rule_synthesis_publishes() {
    let nation = pair(Arc::new(CannedGateway::new("共享与尊重"))).await;
    let mut rules = nation.events().subscribe_to(&[EventKind::RuleCreated]);

    for _ in 0..5 {
        nation.create_fragment(&"twin-1".into()).await.unwrap();
    }
    nation.synthesize_rule().await.unwrap();

    match rules.try_recv() {
        Some(NationEvent::RuleCreated(rule)) => assert_eq!(rule.source_fragments.len(), 5),
        other => panic!("expected rule_created, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_is_idempotent_and_stop_suppresses_ticks() {
    let nation = Arc::new(Nation::new(fast_config(), Arc::new(CannedGateway::new("嗯"))).unwrap());

    assert!(nation.start());
    assert!(!nation.start());
    assert!(nation.is_running());

    let watched = Arc::clone(&nation);
    wait_for(move || watched.tick_count() >= 1).await;

    nation.stop();
    assert!(!nation.is_running());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(nation.tick_count(), 1);
}

#[tokio::test]
async fn test_stop_during_a_tick_lets_it_finish_and_runs_no_more() {
    let config = SimulationConfig {
        tick_interval_ms: 0,
        injection_probability: 1.0,
        ..fast_config()
    };
    let gateway = Arc::new(DelayedGateway { calls: AtomicUsize::new(0) });
    let nation = Arc::new(Nation::new(config, gateway.clone()).unwrap());
    nation.add_agent(Agent::new("twin-1", "智慧守护者", "睿智")).await.unwrap();

    assert!(nation.start());
    // Every tick injects a fragment, so the first call is inside tick 0
    let watched = Arc::clone(&gateway);
    wait_for(move || watched.calls.load(Ordering::SeqCst) >= 1).await;
    assert_eq!(nation.tick_count(), 0);

    nation.stop();
    assert!(!nation.is_running());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(nation.tick_count(), 1);
    assert!(!nation.is_running());
}

#[tokio::test]
async fn test_restart_never_runs_two_loops() {
    let nation = Arc::new(Nation::new(fast_config(), Arc::new(CannedGateway::new("嗯"))).unwrap());

    assert!(nation.start());
    let watched = Arc::clone(&nation);
    wait_for(move || watched.tick_count() >= 1).await;

    nation.stop();
    assert!(nation.start());
    let watched = Arc::clone(&nation);
    wait_for(move || watched.tick_count() >= 2).await;

    // The old loop was woken by stop and must have exited
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(nation.tick_count(), 2);
    nation.stop();
}

#[tokio::test]
async fn test_default_population_runs_offline() {
    let nation = Nation::new(fast_config(), Arc::new(CannedGateway::new("理想国"))).unwrap();
    for agent in default_population() {
        nation.add_agent(agent).await.unwrap();
    }

    for _ in 0..5 {
        let report = nation.tick().await;
        assert_eq!(report.decisions.len(), 5);
    }

    assert_eq!(nation.tick_count(), 5);
    for fragment in nation.list_fragments().await {
        assert!(nation.get_agent(&fragment.owner).await.is_some());
    }
    for conversation in nation.list_conversations().await {
        assert!(conversation.status.is_terminal());
        for participant in &conversation.participants {
            assert!(nation.get_agent(participant).await.is_some());
        }
    }
    let fragment_ids: Vec<_> = nation.list_fragments().await.into_iter().map(|f| f.id).collect();
    for rule in nation.list_rules().await {
        assert!(rule.source_fragments.iter().all(|id| fragment_ids.contains(id)));
    }
}
