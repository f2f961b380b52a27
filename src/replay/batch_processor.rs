//! Batch replay with actor-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which replays a batch of
//! script steps concurrently while keeping the outcome identical to a
//! sequential replay.
//!
//! # Design
//!
//! A batch is cut into segments at every global step (signup, login, admin
//! operations, steps without an actor). Within a segment of actor-scoped steps
//! the steps are partitioned by actor: different actors run in parallel tokio
//! tasks, each actor's steps in script order. A global step runs alone after
//! the preceding segment has finished.
//!
//! ```text
//! batch:    a1 b1 a2 | G | b2 c1
//! segment 1: [a1 a2] || [b1]
//! then:      G
//! segment 2: [b2] || [c1]
//! ```
//!
//! Actor-scoped steps only move their actor's own balance, so running actors
//! in parallel cannot change any final balance.

use crate::io::script_format::{ScriptStep, StepScope};
use crate::replay::runner::{ScriptRunner, StepOutcome};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BatchProcessor {
    runner: Arc<ScriptRunner>,
}

impl BatchProcessor {
    pub fn new(runner: Arc<ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Partition actor-scoped steps by actor, keeping each actor's order
    pub fn partition_by_actor(&self, steps: Vec<ScriptStep>) -> HashMap<String, Vec<ScriptStep>> {
        let mut actor_steps: HashMap<String, Vec<ScriptStep>> = HashMap::new();

        for step in steps {
            let actor = step.actor.clone().unwrap_or_default();
            actor_steps.entry(actor).or_default().push(step);
        }

        actor_steps
    }

    /// Run one actor's steps sequentially
    pub async fn process_actor_steps(&self, steps: Vec<ScriptStep>) -> Vec<StepOutcome> {
        steps.iter().map(|step| self.runner.run_step(step)).collect()
    }

    /// Replay a batch
    ///
    /// Returns every step's outcome. Outcomes of concurrently replayed steps
    /// may appear in any order.
    pub async fn process_batch(&self, batch: Vec<ScriptStep>) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut segment = Vec::new();

        for step in batch {
            match step.scope() {
                StepScope::Actor(_) => segment.push(step),
                StepScope::Global => {
                    outcomes.extend(self.process_segment(std::mem::take(&mut segment)).await);
                    outcomes.push(self.runner.run_step(&step));
                }
            }
        }
        outcomes.extend(self.process_segment(segment).await);

        outcomes
    }

    async fn process_segment(&self, segment: Vec<ScriptStep>) -> Vec<StepOutcome> {
        if segment.is_empty() {
            return Vec::new();
        }

        let tasks: Vec<_> = self
            .partition_by_actor(segment)
            .into_values()
            .map(|steps| {
                let processor = self.clone();
                tokio::spawn(async move { processor.process_actor_steps(steps).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for result in join_all(tasks).await {
            match result {
                Ok(actor_outcomes) => outcomes.extend(actor_outcomes),
                Err(e) => warn!("replay task failed: {}", e),
            }
        }

        outcomes
    }
}
