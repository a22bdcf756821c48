//! Best-effort event broadcast
//!
//! Every state change the simulation makes is published here. Nobody has to
//! listen: publishing into an empty bus is fine, and a subscriber that falls
//! behind skips what it missed rather than blocking the loop.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::core::types::{AgentId, ConversationId, Vec3};
use crate::entity::agent::AgentAction;
use crate::entity::conversation::ConversationMessage;
use crate::entity::fragment::{Fragment, Rule};

/// Changed fields of an agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpdates {
    pub action: AgentAction,
    pub position: Vec3,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpdate {
    pub avatar_id: AgentId,
    pub updates: AvatarUpdates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStarted {
    pub conversation_id: ConversationId,
    pub participants: [AgentId; 2],
    pub topic: String,
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NationEvent {
    AvatarUpdate(AvatarUpdate),
    ConversationStarted(ConversationStarted),
    FragmentCreated(Fragment),
    RuleCreated(Rule),
}

impl NationEvent {
    pub fn avatar_update(avatar_id: AgentId, action: AgentAction, position: Vec3) -> Self {
        NationEvent::AvatarUpdate(AvatarUpdate {
            avatar_id,
            updates: AvatarUpdates {
                action,
                position,
                timestamp: Utc::now(),
            },
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            NationEvent::AvatarUpdate(_) => EventKind::AvatarUpdate,
            NationEvent::ConversationStarted(_) => EventKind::ConversationStarted,
            NationEvent::FragmentCreated(_) => EventKind::FragmentCreated,
            NationEvent::RuleCreated(_) => EventKind::RuleCreated,
        }
    }
}

/// Discriminant used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AvatarUpdate,
    ConversationStarted,
    FragmentCreated,
    RuleCreated,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<NationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(16));
        Self { tx }
    }

    /// Deliver to whoever is listening; returns the number of receivers
    pub fn publish(&self, event: NationEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            kinds: None,
        }
    }

    /// Subscribe to the given kinds only
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            kinds: Some(kinds.to_vec()),
        }
    }
}

pub struct EventSubscription {
    rx: broadcast::Receiver<NationEvent>,
    kinds: Option<Vec<EventKind>>,
}

impl EventSubscription {
    fn wants(&self, event: &NationEvent) -> bool {
        self.kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&event.kind()))
    }

    /// Next matching event; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<NationEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already buffered, without waiting
    pub fn try_recv(&mut self) -> Option<NationEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fragment::FragmentType;

    fn fragment() -> Fragment {
        Fragment::new("twin-1".into(), FragmentType::Vision, "共同的未来", 0.8, "r")
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(NationEvent::FragmentCreated(fragment())), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();

        bus.publish(NationEvent::avatar_update("twin-1".into(), AgentAction::Walking, Vec3::ZERO));
        bus.publish(NationEvent::FragmentCreated(fragment()));

        assert_eq!(sub.recv().await.unwrap().kind(), EventKind::AvatarUpdate);
        assert_eq!(sub.recv().await.unwrap().kind(), EventKind::FragmentCreated);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_filtered_subscription_skips_other_kinds() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe_to(&[EventKind::FragmentCreated]);

        bus.publish(NationEvent::avatar_update("twin-1".into(), AgentAction::Idle, Vec3::ZERO));
        bus.publish(NationEvent::FragmentCreated(fragment()));

        assert_eq!(sub.recv().await.unwrap().kind(), EventKind::FragmentCreated);
    }

    #[test]
    fn test_lagging_subscriber_skips_ahead() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();
        for _ in 0..40 {
            bus.publish(NationEvent::avatar_update("twin-1".into(), AgentAction::Idle, Vec3::ZERO));
        }
        bus.publish(NationEvent::FragmentCreated(fragment()));

        let mut last = None;
        while let Some(event) = sub.try_recv() {
            last = Some(event.kind());
        }
        assert_eq!(last, Some(EventKind::FragmentCreated));
    }

    #[test]
    fn test_event_json_shape() {
        let event = NationEvent::avatar_update("twin-3".into(), AgentAction::Building, Vec3::new(1.0, 0.0, 2.0));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "avatar_update");
        assert_eq!(json["data"]["avatarId"], "twin-3");
        assert_eq!(json["data"]["updates"]["action"], "building");
        assert_eq!(json["data"]["updates"]["position"][2], 2.0);
    }
}
