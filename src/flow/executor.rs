// SPDX-License-Identifier: MIT

//! Graph executor
//!
//! Drives a [GraphDef]: nodes whose dependencies complete become runnable,
//! fan-out targets run concurrently on a JoinSet, and each completion
//! merges its partial update and routes onward under a single lock. That
//! lock is what makes merge + route + entry bookkeeping atomic with respect
//! to concurrent specialist completions: a conditional target is entered
//! exactly once even when two arrivals observe the full completion set
//! near-simultaneously.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::graph::{GraphDef, END};
use super::state::WorkflowState;
use crate::error::{FlowError, TripflowError};

/// Safety cap on total node executions per invocation
const MAX_NODE_RUNS: u32 = 100;

struct Shared {
    state: WorkflowState,
    /// Conditional-edge targets already entered (compare-and-swap guard)
    entered: HashSet<String>,
    reached_end: bool,
    runs: u32,
}

/// Executes a compiled graph against a workflow state
pub struct Executor {
    graph: Arc<GraphDef>,
}

impl Executor {
    pub fn new(graph: GraphDef) -> Result<Self, FlowError> {
        graph.validate()?;
        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    /// Run the graph to completion and return the final state.
    ///
    /// A node error aborts the whole invocation: no retry, no partial
    /// results salvaged.
    pub async fn run(&self, initial: WorkflowState) -> Result<WorkflowState, TripflowError> {
        let shared = Arc::new(Mutex::new(Shared {
            state: initial,
            entered: HashSet::new(),
            reached_end: false,
            runs: 0,
        }));

        let mut tasks: JoinSet<Result<Vec<String>, TripflowError>> = JoinSet::new();

        let seeds: Vec<String> = self.graph.successors(super::graph::START).to_vec();
        for name in seeds {
            self.spawn_node(&mut tasks, name, shared.clone()).await?;
        }

        while let Some(joined) = tasks.join_next().await {
            let next = joined
                .map_err(|e| TripflowError::Flow(FlowError::Panicked(e.to_string())))??;

            for name in next {
                self.spawn_node(&mut tasks, name, shared.clone()).await?;
            }
        }

        let shared = shared.lock().await;
        if shared.reached_end {
            Ok(shared.state.clone())
        } else {
            Err(FlowError::Stalled.into())
        }
    }

    async fn spawn_node(
        &self,
        tasks: &mut JoinSet<Result<Vec<String>, TripflowError>>,
        name: String,
        shared: Arc<Mutex<Shared>>,
    ) -> Result<(), TripflowError> {
        let node = self
            .graph
            .node(&name)
            .ok_or_else(|| FlowError::UnknownNode(name.clone()))?
            .clone();
        let graph = self.graph.clone();

        {
            let mut guard = shared.lock().await;
            guard.runs += 1;
            if guard.runs > MAX_NODE_RUNS {
                return Err(FlowError::MaxIterations(MAX_NODE_RUNS).into());
            }
        }

        tasks.spawn(async move {
            log::info!("Executing node: {}", name);

            // Snapshot so the node never suspends while holding the lock
            let snapshot = { shared.lock().await.state.clone() };

            let update = node.run(&snapshot).await.map_err(|e| {
                log::error!("Node {} failed: {}", name, e);
                FlowError::NodeFailed {
                    node: name.clone(),
                    source: Box::new(e),
                }
            })?;

            // Merge, then route on the merged state, atomically
            let mut guard = shared.lock().await;
            guard.state.apply(update);

            let mut next = Vec::new();

            for target in graph.successors(&name) {
                if target == END {
                    guard.reached_end = true;
                } else {
                    next.push(target.clone());
                }
            }

            if let Some(router) = graph.router(&name) {
                let target = router(&guard.state);
                if target == name {
                    // Self-loop: wait for the next arrival to re-evaluate
                    log::debug!("Node {} waiting for more arrivals", name);
                } else if target == END {
                    guard.reached_end = true;
                } else if guard.entered.insert(target.clone()) {
                    next.push(target);
                } else {
                    // A concurrent arrival won the transition; this one is a no-op
                    log::debug!("Node {} already entered, skipping", target);
                }
            }

            log::info!("Node {} completed", name);
            Ok(next)
        });

        Ok(())
    }
}
