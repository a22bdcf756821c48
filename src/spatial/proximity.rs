//! Proximity queries on the ground plane

use crate::entity::agent::Agent;

/// Agents strictly within `radius` of `observer` on the x/z plane,
/// excluding the observer itself. Keeps the order of `agents`.
pub fn nearby_agents(observer: &Agent, agents: &[Agent], radius: f32) -> Vec<Agent> {
    agents
        .iter()
        .filter(|other| other.id != observer.id)
        .filter(|other| observer.position.horizontal_distance(&other.position) < radius)
        .cloned()
        .collect()
}
