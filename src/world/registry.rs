//! Agent registry - current mutable state of every agent

use ahash::AHashMap;

use crate::core::error::{NationError, Result};
use crate::core::types::AgentId;
use crate::entity::agent::Agent;

/// Agents keyed by id, iterated in insertion order
#[derive(Debug, Default)]
pub struct AgentRegistry {
    order: Vec<AgentId>,
    agents: AHashMap<AgentId, Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an agent. Replacing keeps the original position in
    /// the iteration order.
    pub fn upsert(&mut self, agent: Agent) -> Result<()> {
        if agent.id.as_str().is_empty() {
            return Err(NationError::InvalidAgent("agent id must not be empty".into()));
        }
        if !self.agents.contains_key(&agent.id) {
            self.order.push(agent.id.clone());
        }
        self.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Mutate one agent in place. Returns false if the id is unknown.
    pub fn update(&mut self, id: &AgentId, f: impl FnOnce(&mut Agent)) -> bool {
        match self.agents.get_mut(id) {
            Some(agent) => {
                f(agent);
                true
            }
            None => false,
        }
    }

    /// Snapshot of all agents in insertion order
    pub fn all(&self) -> Vec<Agent> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::agent::AgentAction;

    #[test]
    fn test_upsert_and_get() {
        let mut registry = AgentRegistry::new();
        registry.upsert(Agent::new("twin-1", "A", "calm")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"twin-1".into()).unwrap().name, "A");
        assert!(registry.get(&"missing".into()).is_none());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut registry = AgentRegistry::new();
        let err = registry.upsert(Agent::new("", "A", "calm")).unwrap_err();
        assert!(matches!(err, NationError::InvalidAgent(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_keeps_insertion_order_across_replace() {
        let mut registry = AgentRegistry::new();
        for id in ["c", "a", "b"] {
            registry.upsert(Agent::new(id, id, "p")).unwrap();
        }
        registry.upsert(Agent::new("a", "renamed", "p")).unwrap();

        let ids: Vec<_> = registry.all().into_iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(registry.get(&"a".into()).unwrap().name, "renamed");
    }

    #[test]
    fn test_update_in_place() {
        let mut registry = AgentRegistry::new();
        registry.upsert(Agent::new("twin-1", "A", "p")).unwrap();

        assert!(registry.update(&"twin-1".into(), |a| a.action = AgentAction::Walking));
        assert!(!registry.update(&"ghost".into(), |a| a.action = AgentAction::Walking));
        assert_eq!(registry.get(&"twin-1".into()).unwrap().action, AgentAction::Walking);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut registry = AgentRegistry::new();
        registry.upsert(Agent::new("twin-1", "A", "p")).unwrap();
        let mut snapshot = registry.all();
        snapshot[0].name = "changed".into();
        assert_eq!(registry.get(&"twin-1".into()).unwrap().name, "A");
    }
}
