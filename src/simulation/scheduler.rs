//! Tick loop
//!
//! One tick: every agent decides and acts in turn, then maybe one random
//! agent is nudged into creating a fragment, then rule synthesis runs.
//! The loop ticks, sleeps `tick_interval`, and repeats until stopped.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::core::types::{AgentId, RuleId};
use crate::simulation::nation::Nation;
use crate::simulation::policy::{choose_behavior, Behavior};
use crate::spatial::proximity::nearby_agents;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// One decision per agent, in registry order
    pub decisions: Vec<(AgentId, Behavior)>,
    /// Agent picked for the extra fragment, if the injection fired
    pub injected: Option<AgentId>,
    pub rule: Option<RuleId>,
}

impl Nation {
    /// Run a single tick
    pub async fn tick(&self) -> TickReport {
        let tick = self.ticks.load(Ordering::SeqCst);
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        let roster: Vec<AgentId> = self.list_agents().await.into_iter().map(|a| a.id).collect();
        for agent_id in roster {
            // Positions change as earlier agents act, so look again for each
            let everyone = self.list_agents().await;
            let Some(agent) = everyone.iter().find(|a| a.id == agent_id) else {
                continue;
            };
            let nearby = nearby_agents(agent, &everyone, self.config.proximity_radius);

            let behavior = choose_behavior(self.roll().await, !nearby.is_empty(), &self.config);
            tracing::debug!(tick, agent = %agent_id, behavior = behavior.as_str(), "Decision");

            match behavior {
                Behavior::Converse => {
                    self.converse(&agent_id, &nearby).await;
                }
                Behavior::Wander => {
                    self.wander(&agent_id).await;
                }
                Behavior::Think => self.think(&agent_id).await,
                Behavior::Observe => self.observe(&agent_id).await,
                Behavior::CreateFragment => {
                    self.create_fragment(&agent_id).await;
                }
            }
            report.decisions.push((agent_id, behavior));
        }

        if self.roll().await < self.config.injection_probability {
            let agents = self.list_agents().await;
            if !agents.is_empty() {
                let chosen = agents[self.pick(agents.len()).await].id.clone();
                tracing::debug!(tick, agent = %chosen, "Injected fragment creation");
                self.create_fragment(&chosen).await;
                report.injected = Some(chosen);
            }
        }

        report.rule = self.synthesize_rule().await;

        self.ticks.fetch_add(1, Ordering::SeqCst);
        report
    }

    /// Spawn the tick loop; false if one is already running
    pub fn start(self: &Arc<Self>) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(generation, "Simulation started");

        let nation = Arc::clone(self);
        tokio::spawn(async move {
            nation.run_loop(generation).await;
        });
        true
    }

    /// Suppress future ticks and wake a sleeping loop. The tick in progress
    /// runs to completion.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!(ticks = self.tick_count(), "Simulation stopped");
        }
        self.wake.notify_waiters();
    }

    fn owns_loop(&self, generation: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_loop(&self, generation: u64) {
        while self.owns_loop(generation) {
            let report = self.tick().await;
            tracing::debug!(
                tick = report.tick,
                agents = report.decisions.len(),
                rule = report.rule.is_some(),
                "Tick complete"
            );

            // Register before checking so a stop in between still wakes us
            let wake = self.wake.notified();
            if !self.owns_loop(generation) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.tick_interval()) => {}
                _ = wake => {}
            }
        }
        tracing::debug!(generation, "Tick loop exited");
    }
}
