// SPDX-License-Identifier: MIT

//! The trip-planning workflow nodes
//!
//! Topology: start -> plan -> [attraction_agent, weather_agent, hotel_agent]
//! (parallel) -> collector -> (all tasks done?) -> summarize -> end.
//!
//! The plan and summarize nodes call the text-generation capability; the
//! three specialists call their data tool directly and never touch the LLM.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::TripflowError;
use crate::flow::{Node, StateUpdate, WorkflowState};
use crate::model::{ChatMessage, Model};
use crate::tool::ToolAdapter;
use crate::trip::types::TripRequest;

// State field names
pub const MESSAGES: &str = "messages";
pub const REQUEST: &str = "request";
pub const TASK_PLAN: &str = "task_plan";
pub const AGENT_RESULTS: &str = "agent_results";
pub const COMPLETED_TASKS: &str = "completed_tasks";
pub const FINAL_PLAN: &str = "final_plan";
pub const CURRENT_STEP: &str = "current_step";

const SCHEDULER_PROMPT: &str = "\
You are a travel planning coordinator. Your job is to:
1. Analyze the user's travel requirements
2. Produce a task plan naming the information that must be collected
3. Coordinate the specialist agents that carry out each task

Given the requirements, output a clear task plan stating:
- what kind of attractions to search for
- which city's weather to look up
- what kind of hotel to search for

Format:
```
Task plan:
1. Attraction search: [keywords] - [city]
2. Weather lookup: [city]
3. Hotel search: [hotel type] - [city]
```";

const SUMMARIZER_PROMPT: &str = r#"You are an itinerary planning expert. Using the attraction, weather and hotel data provided, produce a detailed trip plan.

**Important: return complete JSON, never truncated. If the content is long, shorten descriptions rather than dropping structure.**

Return the plan strictly in this JSON format:
```json
{
  "city": "city name",
  "start_date": "YYYY-MM-DD",
  "end_date": "YYYY-MM-DD",
  "days": [
    {
      "date": "YYYY-MM-DD",
      "day_index": 0,
      "description": "short day summary (under 20 words)",
      "transportation": "mode of transport",
      "accommodation": "accommodation type",
      "hotel": {
        "name": "hotel name",
        "address": "short address",
        "location": {"longitude": 116.39, "latitude": 39.91},
        "price_range": "300-500",
        "rating": "4.5",
        "type": "hotel type"
      },
      "attractions": [
        {
          "name": "attraction name",
          "address": "short address",
          "location": {"longitude": 116.39, "latitude": 39.91},
          "visit_duration": 120,
          "description": "short description (under 30 words)",
          "category": "category"
        }
      ],
      "meals": [
        {"type": "breakfast", "name": "Breakfast", "description": "short description"},
        {"type": "lunch", "name": "Lunch", "description": "short description"},
        {"type": "dinner", "name": "Dinner", "description": "short description"}
      ]
    }
  ],
  "weather_info": [{"date": "YYYY-MM-DD", "day_weather": "sunny", "night_weather": "cloudy", "day_temp": 25, "night_temp": 15}],
  "overall_suggestions": "short advice (under 50 words)",
  "budget": {"total": 2000}
}
```

**Requirements:**
1. Keep every description short; avoid long text
2. Temperatures must be plain numbers
3. Schedule 2-3 attractions per day
4. The JSON must close completely; every bracket must be paired
5. Do not add comments or extra commentary"#;

/// Deserialize the immutable request snapshot out of the state
pub fn request_from_state(state: &WorkflowState) -> Result<TripRequest, TripflowError> {
    let value = state
        .get(REQUEST)
        .cloned()
        .ok_or_else(|| TripflowError::config("workflow state is missing the request"))?;
    Ok(serde_json::from_value(value)?)
}

fn describe_request(request: &TripRequest) -> String {
    format!(
        "- City: {}\n- Dates: {} to {}\n- Days: {}\n- Transportation: {}\n- Accommodation: {}\n- Preferences: {}",
        request.city,
        request.start_date,
        request.end_date,
        request.travel_days,
        request.transportation,
        request.accommodation,
        if request.preferences.is_empty() {
            "none".to_string()
        } else {
            request.preferences.join(", ")
        }
    )
}

fn messages_to_json(messages: &[ChatMessage]) -> Value {
    serde_json::to_value(messages).unwrap_or_else(|_| json!([]))
}

/// Planning node: asks the model for a short task breakdown
pub struct PlanNode {
    model: Arc<dyn Model>,
}

impl PlanNode {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node for PlanNode {
    fn name(&self) -> &str {
        "plan"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, TripflowError> {
        let request = request_from_state(state)?;

        let query = format!(
            "Analyze the following travel requirements and produce a task plan:\n\n**Requirements:**\n{}\n\nProduce the task plan.",
            describe_request(&request)
        );

        let mut messages = vec![
            ChatMessage::system(SCHEDULER_PROMPT),
            ChatMessage::user(query),
        ];

        let response = self.model.generate(&messages).await?;
        log::info!("Task plan: {:.120}", response);
        messages.push(ChatMessage::assistant(response.clone()));

        Ok(StateUpdate::new()
            .set(MESSAGES, messages_to_json(&messages))
            .set(TASK_PLAN, json!(response))
            .set(CURRENT_STEP, json!("planning")))
    }
}

/// What a specialist collects and which tool it calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialty {
    Attraction,
    Weather,
    Hotel,
}

impl Specialty {
    pub const ALL: [Specialty; 3] = [Specialty::Attraction, Specialty::Weather, Specialty::Hotel];

    /// Node name in the graph
    pub fn node_name(self) -> &'static str {
        match self {
            Specialty::Attraction => "attraction_agent",
            Specialty::Weather => "weather_agent",
            Specialty::Hotel => "hotel_agent",
        }
    }

    /// Token appended to `completed_tasks`
    pub fn task(self) -> &'static str {
        match self {
            Specialty::Attraction => "attraction",
            Specialty::Weather => "weather",
            Specialty::Hotel => "hotel",
        }
    }

    /// Key under `agent_results`
    pub fn result_key(self) -> &'static str {
        match self {
            Specialty::Attraction => "attractions",
            Specialty::Weather => "weather",
            Specialty::Hotel => "hotels",
        }
    }

    fn tool_name(self) -> &'static str {
        match self {
            Specialty::Attraction => "search_attractions",
            Specialty::Weather => "search_weather",
            Specialty::Hotel => "search_hotels",
        }
    }

    fn tool_args(self, request: &TripRequest) -> Value {
        match self {
            Specialty::Attraction => {
                let keywords = request
                    .preferences
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "attractions".to_string());
                json!({ "keywords": keywords, "city": request.city })
            }
            Specialty::Weather => json!({ "city": request.city }),
            Specialty::Hotel => json!({
                "city": request.city,
                "hotel_type": request.accommodation
            }),
        }
    }
}

/// Specialist node: one synchronous tool call, no LLM.
///
/// Tool errors propagate unmodified so the workflow-level fallback handles
/// them uniformly.
pub struct SpecialistNode {
    specialty: Specialty,
    tools: ToolAdapter,
}

impl SpecialistNode {
    pub fn new(specialty: Specialty, tools: ToolAdapter) -> Self {
        Self { specialty, tools }
    }
}

#[async_trait]
impl Node for SpecialistNode {
    fn name(&self) -> &str {
        self.specialty.node_name()
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, TripflowError> {
        let request = request_from_state(state)?;
        let args = self.specialty.tool_args(&request);

        let result = self.tools.call(self.specialty.tool_name(), args).await?;
        log::info!("{} collected {} bytes", self.name(), result.len());

        Ok(StateUpdate::new()
            .set(AGENT_RESULTS, json!({ self.specialty.result_key(): result }))
            .set(COMPLETED_TASKS, json!([self.specialty.task()])))
    }
}

/// Synchronization point; mutates nothing
pub struct CollectorNode;

#[async_trait]
impl Node for CollectorNode {
    fn name(&self) -> &str {
        "collector"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, TripflowError> {
        let completed = state
            .get(COMPLETED_TASKS)
            .cloned()
            .unwrap_or_else(|| json!([]));
        log::info!("Collector: completed tasks {}", completed);
        Ok(StateUpdate::new())
    }
}

/// Routing function for the collector's conditional edge: proceed to
/// summarize once every required task token is present. Subset-based and
/// idempotent, so duplicate completion signals are harmless.
pub fn collector_router(state: &WorkflowState) -> String {
    let completed: HashSet<&str> = state
        .get(COMPLETED_TASKS)
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let ready = Specialty::ALL.iter().all(|s| completed.contains(s.task()));

    if ready {
        "summarize".to_string()
    } else {
        "collector".to_string()
    }
}

/// Summarization node: embeds the specialists' raw results in one prompt
/// and asks the model for the final JSON plan
pub struct SummarizeNode {
    model: Arc<dyn Model>,
}

impl SummarizeNode {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node for SummarizeNode {
    fn name(&self) -> &str {
        "summarize"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, TripflowError> {
        let request = request_from_state(state)?;

        let results = state.get(AGENT_RESULTS).cloned().unwrap_or_else(|| json!({}));
        let section = |key: &str| {
            results
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let query = format!(
            "Using the information collected below, produce the {}-day trip plan for {}:\n\n\
             **Basics:**\n{}\n\n\
             **Attractions:**\n{}\n\n\
             **Weather:**\n{}\n\n\
             **Hotels:**\n{}\n\n\
             Return the complete trip plan as JSON.",
            request.travel_days,
            request.city,
            describe_request(&request),
            section(Specialty::Attraction.result_key()),
            section(Specialty::Weather.result_key()),
            section(Specialty::Hotel.result_key()),
        );

        let mut messages = vec![
            ChatMessage::system(SUMMARIZER_PROMPT),
            ChatMessage::user(query),
        ];

        let response = self.model.generate(&messages).await?;
        log::info!("Final plan generated ({} bytes)", response.len());
        messages.push(ChatMessage::assistant(response.clone()));

        Ok(StateUpdate::new()
            .set(MESSAGES, messages_to_json(&messages))
            .set(FINAL_PLAN, json!(response))
            .set(CURRENT_STEP, json!("done")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, ToolError};
    use crate::flow::Reducer;
    use crate::tool::Tool;
    use once_cell::sync::Lazy;

    struct ScriptedModel {
        response: String,
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
            Ok(self.response.clone())
        }
    }

    static EMPTY_SCHEMA: Lazy<Value> = Lazy::new(|| json!({"type": "object"}));

    struct StubTool {
        name: String,
        result: Result<Value, String>,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "stub"
        }

        fn schema(&self) -> &Value {
            &EMPTY_SCHEMA
        }

        async fn execute(&self, _input: Value) -> Result<Value, ToolError> {
            self.result
                .clone()
                .map_err(|m| ToolError::api("stub", m))
        }
    }

    fn request() -> TripRequest {
        TripRequest {
            city: "Beijing".to_string(),
            start_date: "2026-05-01".to_string(),
            end_date: "2026-05-03".to_string(),
            travel_days: 3,
            transportation: "metro".to_string(),
            accommodation: "budget hotel".to_string(),
            preferences: vec!["history".to_string()],
        }
    }

    fn state_with_request() -> WorkflowState {
        let mut state = WorkflowState::with_reducers(&[
            (MESSAGES, Reducer::Append),
            (AGENT_RESULTS, Reducer::Merge),
            (COMPLETED_TASKS, Reducer::Append),
        ]);
        state.apply(
            StateUpdate::new().set(REQUEST, serde_json::to_value(request()).unwrap()),
        );
        state
    }

    #[tokio::test]
    async fn test_plan_node_sets_task_plan() {
        let node = PlanNode::new(Arc::new(ScriptedModel {
            response: "1. search history attractions".to_string(),
        }));

        let mut state = state_with_request();
        let update = node.run(&state).await.unwrap();
        state.apply(update);

        assert_eq!(
            state.get_str(TASK_PLAN),
            Some("1. search history attractions")
        );
        assert_eq!(state.get_str(CURRENT_STEP), Some("planning"));

        // Conversation grows: system + user + assistant
        let messages = state.get(MESSAGES).unwrap().as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_specialist_records_result_and_task() {
        let tools = ToolAdapter::new();
        tools
            .register(Arc::new(StubTool {
                name: "search_weather".to_string(),
                result: Ok(json!({"forecasts": []})),
            }))
            .await;

        let node = SpecialistNode::new(Specialty::Weather, tools);
        let mut state = state_with_request();
        let update = node.run(&state).await.unwrap();
        state.apply(update);

        let results = state.get(AGENT_RESULTS).unwrap();
        assert!(results["weather"].as_str().unwrap().contains("forecasts"));
        assert_eq!(state.get(COMPLETED_TASKS), Some(&json!(["weather"])));
    }

    #[tokio::test]
    async fn test_specialist_uses_first_preference_as_keywords() {
        struct CapturingTool {
            captured: Arc<tokio::sync::Mutex<Option<Value>>>,
        }

        #[async_trait]
        impl Tool for CapturingTool {
            fn name(&self) -> &str {
                "search_attractions"
            }

            fn description(&self) -> &str {
                "capture"
            }

            fn schema(&self) -> &Value {
                &EMPTY_SCHEMA
            }

            async fn execute(&self, input: Value) -> Result<Value, ToolError> {
                *self.captured.lock().await = Some(input);
                Ok(json!("ok"))
            }
        }

        let captured = Arc::new(tokio::sync::Mutex::new(None));
        let tools = ToolAdapter::new();
        tools
            .register(Arc::new(CapturingTool {
                captured: captured.clone(),
            }))
            .await;

        let node = SpecialistNode::new(Specialty::Attraction, tools);
        node.run(&state_with_request()).await.unwrap();

        let args = captured.lock().await.clone().unwrap();
        assert_eq!(args["keywords"], "history");
        assert_eq!(args["city"], "Beijing");
    }

    #[tokio::test]
    async fn test_specialist_propagates_tool_error() {
        let tools = ToolAdapter::new();
        tools
            .register(Arc::new(StubTool {
                name: "search_hotels".to_string(),
                result: Err("provider down".to_string()),
            }))
            .await;

        let node = SpecialistNode::new(Specialty::Hotel, tools);
        let err = node.run(&state_with_request()).await.unwrap_err();
        assert!(matches!(err, TripflowError::Tool(_)));
    }

    #[test]
    fn test_collector_router_waits_until_all_tasks_done() {
        let mut state = state_with_request();
        assert_eq!(collector_router(&state), "collector");

        state.apply(StateUpdate::new().set(COMPLETED_TASKS, json!(["weather", "hotel"])));
        assert_eq!(collector_router(&state), "collector");

        state.apply(StateUpdate::new().set(COMPLETED_TASKS, json!(["attraction"])));
        assert_eq!(collector_router(&state), "summarize");
    }

    #[test]
    fn test_collector_router_tolerates_duplicates() {
        let mut state = state_with_request();
        state.apply(StateUpdate::new().set(
            COMPLETED_TASKS,
            json!(["weather", "weather", "hotel", "attraction", "hotel"]),
        ));
        assert_eq!(collector_router(&state), "summarize");
    }

    #[tokio::test]
    async fn test_summarize_embeds_agent_results() {
        struct EchoModel {
            last_prompt: Arc<tokio::sync::Mutex<String>>,
        }

        #[async_trait]
        impl Model for EchoModel {
            async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
                *self.last_prompt.lock().await = messages.last().unwrap().content.clone();
                Ok("{}".to_string())
            }
        }

        let last_prompt = Arc::new(tokio::sync::Mutex::new(String::new()));
        let node = SummarizeNode::new(Arc::new(EchoModel {
            last_prompt: last_prompt.clone(),
        }));

        let mut state = state_with_request();
        state.apply(StateUpdate::new().set(
            AGENT_RESULTS,
            json!({
                "attractions": "ATTRACTION-DATA",
                "weather": "WEATHER-DATA",
                "hotels": "HOTEL-DATA"
            }),
        ));

        let update = node.run(&state).await.unwrap();
        state.apply(update);

        let prompt = last_prompt.lock().await.clone();
        assert!(prompt.contains("ATTRACTION-DATA"));
        assert!(prompt.contains("WEATHER-DATA"));
        assert!(prompt.contains("HOTEL-DATA"));
        assert_eq!(state.get_str(FINAL_PLAN), Some("{}"));
        assert_eq!(state.get_str(CURRENT_STEP), Some("done"));
    }
}
