// SPDX-License-Identifier: MIT

//! Graph definition: nodes, static edges, and conditional routing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::state::{StateUpdate, WorkflowState};
use crate::error::{FlowError, TripflowError};

/// Implicit entry node
pub const START: &str = "start";
/// Implicit terminal node
pub const END: &str = "end";

/// One workflow step: a pure function from state to a partial update.
///
/// Nodes receive a snapshot of the state (never the live store) so they can
/// suspend on external calls without holding any lock.
#[async_trait]
pub trait Node: Send + Sync {
    /// Returns the node name (unique within a graph)
    fn name(&self) -> &str;

    /// Run the step against a state snapshot
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, TripflowError>;
}

/// Routing function for a conditional edge. Returns the name of the next
/// node; returning the source node itself means "wait for more arrivals".
pub type Router = Arc<dyn Fn(&WorkflowState) -> String + Send + Sync>;

/// A static description of the workflow graph
#[derive(Default)]
pub struct GraphDef {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Vec<String>>,
    routers: HashMap<String, Router>,
}

impl GraphDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    /// Add a static edge; `from` may be [START] and `to` may be [END]
    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        self
    }

    /// Attach the conditional edge evaluated after `from` completes
    pub fn add_conditional_edge(
        mut self,
        from: &str,
        router: impl Fn(&WorkflowState) -> String + Send + Sync + 'static,
    ) -> Self {
        self.routers.insert(from.to_string(), Arc::new(router));
        self
    }

    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    pub fn successors(&self, name: &str) -> &[String] {
        self.edges.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn router(&self, name: &str) -> Option<&Router> {
        self.routers.get(name)
    }

    /// Check that every edge endpoint names a defined node (or START/END)
    pub fn validate(&self) -> Result<(), FlowError> {
        let known = |name: &str| name == START || name == END || self.nodes.contains_key(name);

        for (from, targets) in &self.edges {
            if !known(from) {
                return Err(FlowError::UnknownNode(from.clone()));
            }
            for to in targets {
                if !known(to) {
                    return Err(FlowError::UnknownNode(to.clone()));
                }
            }
        }
        for from in self.routers.keys() {
            if !known(from) {
                return Err(FlowError::UnknownNode(from.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NoopNode {
        name: String,
    }

    #[async_trait]
    impl Node for NoopNode {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _state: &WorkflowState) -> Result<StateUpdate, TripflowError> {
            Ok(StateUpdate::new())
        }
    }

    fn noop(name: &str) -> Arc<dyn Node> {
        Arc::new(NoopNode {
            name: name.to_string(),
        })
    }

    #[test]
    fn test_successors_of_fanout_node() {
        let graph = GraphDef::new()
            .add_node(noop("plan"))
            .add_node(noop("a"))
            .add_node(noop("b"))
            .add_edge(START, "plan")
            .add_edge("plan", "a")
            .add_edge("plan", "b");

        assert_eq!(graph.successors("plan"), &["a", "b"]);
        assert_eq!(graph.successors(START), &["plan"]);
        assert!(graph.successors("b").is_empty());
    }

    #[test]
    fn test_validate_rejects_unknown_edge_target() {
        let graph = GraphDef::new()
            .add_node(noop("plan"))
            .add_edge("plan", "ghost");

        assert!(matches!(
            graph.validate(),
            Err(FlowError::UnknownNode(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_validate_accepts_start_and_end() {
        let graph = GraphDef::new()
            .add_node(noop("only"))
            .add_edge(START, "only")
            .add_edge("only", END);

        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_router_is_evaluated_against_state() {
        let graph = GraphDef::new()
            .add_node(noop("collector"))
            .add_conditional_edge("collector", |state: &WorkflowState| {
                if state.get("done") == Some(&json!(true)) {
                    "summarize".to_string()
                } else {
                    "collector".to_string()
                }
            });

        let router = graph.router("collector").unwrap();

        let mut state = WorkflowState::empty();
        assert_eq!(router(&state), "collector");

        state.apply(StateUpdate::new().set("done", json!(true)));
        assert_eq!(router(&state), "summarize");
    }
}
