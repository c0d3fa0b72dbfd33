// SPDX-License-Identifier: MIT

//! The planning entry point
//!
//! Wires the workflow graph, runs it, and recovers the final plan from the
//! summarizer's raw output. `plan_trip` never fails: every internal error,
//! including deadline expiry, resolves to the deterministic fallback plan.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::config::Settings;
use crate::error::TripflowError;
use crate::flow::{Executor, GraphDef, Reducer, StateUpdate, WorkflowState, END, START};
use crate::model::{Model, OpenAiModel};
use crate::tool::ToolAdapter;
use crate::trip::fallback::fallback_plan;
use crate::trip::nodes::{
    collector_router, request_from_state, CollectorNode, PlanNode, Specialty, SpecialistNode,
    SummarizeNode, AGENT_RESULTS, COMPLETED_TASKS, FINAL_PLAN, MESSAGES, REQUEST,
};
use crate::trip::recovery::recover_plan;
use crate::trip::tools::{AttractionSearchTool, HotelSearchTool, WeatherTool};
use crate::trip::types::{TripPlan, TripRequest};

/// Multi-agent trip planner
pub struct TripPlanner {
    model: Arc<dyn Model>,
    tools: ToolAdapter,
    deadline: Option<Duration>,
}

impl TripPlanner {
    pub fn new(model: Arc<dyn Model>, tools: ToolAdapter) -> Self {
        Self {
            model,
            tools,
            deadline: None,
        }
    }

    /// Bound the whole invocation; expiry resolves to the fallback plan
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build a planner from process settings: OpenAI-compatible model plus
    /// the three AMap data tools.
    pub async fn from_settings(settings: &Settings) -> Result<Self, TripflowError> {
        let model = OpenAiModel::new(
            settings.llm_api_key.clone(),
            settings.llm_base_url.clone(),
            settings.llm_model.clone(),
        )?;

        let tools = ToolAdapter::new();
        tools
            .register(Arc::new(AttractionSearchTool::new(
                settings.amap_api_key.clone(),
            )))
            .await;
        tools
            .register(Arc::new(WeatherTool::new(settings.amap_api_key.clone())))
            .await;
        tools
            .register(Arc::new(HotelSearchTool::new(
                settings.amap_api_key.clone(),
            )))
            .await;

        let mut planner = Self::new(Arc::new(model), tools);
        planner.deadline = settings.plan_deadline;
        Ok(planner)
    }

    /// Fixed topology: plan fans out to the three specialists, which fan in
    /// at the collector; the collector routes to summarize once every task
    /// token has arrived.
    fn build_graph(&self) -> GraphDef {
        let mut graph = GraphDef::new()
            .add_node(Arc::new(PlanNode::new(self.model.clone())))
            .add_node(Arc::new(CollectorNode))
            .add_node(Arc::new(SummarizeNode::new(self.model.clone())))
            .add_edge(START, "plan")
            .add_conditional_edge("collector", collector_router)
            .add_edge("summarize", END);

        for specialty in Specialty::ALL {
            graph = graph
                .add_node(Arc::new(SpecialistNode::new(specialty, self.tools.clone())))
                .add_edge("plan", specialty.node_name())
                .add_edge(specialty.node_name(), "collector");
        }

        graph
    }

    fn initial_state(request: &TripRequest) -> Result<WorkflowState, TripflowError> {
        let mut state = WorkflowState::with_reducers(&[
            (MESSAGES, Reducer::Append),
            (AGENT_RESULTS, Reducer::Merge),
            (COMPLETED_TASKS, Reducer::Append),
        ]);
        state.apply(StateUpdate::new().set(REQUEST, serde_json::to_value(request)?));
        state.apply(StateUpdate::new().set(MESSAGES, json!([])));
        Ok(state)
    }

    async fn run_workflow(&self, request: &TripRequest) -> Result<TripPlan, TripflowError> {
        let executor = Executor::new(self.build_graph())?;
        let state = executor.run(Self::initial_state(request)?).await?;

        // The final state still carries the request; use the merged copy so
        // backfill sees exactly what the nodes saw
        let request = request_from_state(&state)?;

        let raw = state
            .get_str(FINAL_PLAN)
            .ok_or_else(|| TripflowError::config("workflow produced no final plan"))?;

        Ok(recover_plan(raw, &request)?)
    }

    /// Plan a trip. Never fails: workflow errors, unrecoverable model
    /// output, and deadline expiry all yield the fallback plan.
    pub async fn plan_trip(&self, request: &TripRequest) -> TripPlan {
        log::info!(
            "Planning {}-day trip to {}",
            request.travel_days,
            request.city
        );

        let attempt = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout(deadline, self.run_workflow(request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(TripflowError::config(format!(
                            "planning exceeded deadline of {:?}",
                            deadline
                        )))
                    }),
                None => self.run_workflow(request).await,
            }
        };

        match attempt.await {
            Ok(plan) => plan,
            Err(e) => {
                log::warn!("Workflow failed, using fallback plan: {}", e);
                fallback_plan(request)
            }
        }
    }
}
