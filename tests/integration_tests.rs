//! Integration tests for the trip-planning workflow
//!
//! These tests run the whole pipeline end to end using mock components:
//! graph execution, the fan-in barrier, response recovery, and the
//! fallback path.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tripflow_rs::error::{ModelError, ToolError};
use tripflow_rs::model::{ChatMessage, Model};
use tripflow_rs::tool::{Tool, ToolAdapter};
use tripflow_rs::trip::{PhotoService, PhotoSource, TripPlanner, TripRequest};

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that returns predefined responses in call order
struct MockModel {
    responses: Vec<String>,
    response_index: AtomicUsize,
}

impl MockModel {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            response_index: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.response_index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
        let idx = self.response_index.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(idx)
            .cloned()
            .ok_or_else(|| ModelError::Api("max responses reached".to_string()))
    }
}

/// Static schema for MockTool
static MOCK_TOOL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "city": {"type": "string"}
        }
    })
});

/// Mock tool with a configurable delay and failure mode
struct MockTool {
    name: String,
    description: String,
    response: Result<Value, String>,
    delay_ms: u64,
}

impl MockTool {
    fn new(name: &str, response: Value) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Mock tool: {}", name),
            response: Ok(response),
            delay_ms: 0,
        }
    }

    fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Mock tool: {}", name),
            response: Err(message.to_string()),
            delay_ms: 0,
        }
    }

    fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &MOCK_TOOL_SCHEMA
    }

    async fn execute(&self, _input: Value) -> Result<Value, ToolError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.response
            .clone()
            .map_err(|message| ToolError::Api {
                provider: "mock".to_string(),
                message,
            })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

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

async fn mock_tools(delays: [u64; 3]) -> ToolAdapter {
    let tools = ToolAdapter::new();
    tools
        .register(Arc::new(
            MockTool::new(
                "search_attractions",
                json!([{"name": "Forbidden City", "address": "4 Jingshan Front St"}]),
            )
            .with_delay(delays[0]),
        ))
        .await;
    tools
        .register(Arc::new(
            MockTool::new(
                "search_weather",
                json!({"city": "Beijing", "forecasts": [{"date": "2026-05-01", "dayweather": "sunny"}]}),
            )
            .with_delay(delays[1]),
        ))
        .await;
    tools
        .register(Arc::new(
            MockTool::new(
                "search_hotels",
                json!([{"name": "Hutong Inn", "address": "Dongcheng"}]),
            )
            .with_delay(delays[2]),
        ))
        .await;
    tools
}

const COMPLETE_PLAN: &str = r#"```json
{
  "city": "Beijing",
  "start_date": "2026-05-01",
  "end_date": "2026-05-03",
  "days": [
    {
      "date": "2026-05-01",
      "day_index": 0,
      "description": "Imperial Beijing",
      "transportation": "metro",
      "accommodation": "budget hotel",
      "hotel": {"name": "Hutong Inn", "type": "budget hotel"},
      "attractions": [
        {"name": "Forbidden City", "visit_duration": 180}
      ],
      "meals": [
        {"type": "breakfast", "name": "Breakfast", "description": "jianbing"},
        {"type": "lunch", "name": "Lunch", "description": "noodles"},
        {"type": "dinner", "name": "Dinner", "description": "roast duck"}
      ]
    },
    {"date": "2026-05-02", "day_index": 1, "attractions": [], "meals": []},
    {"date": "2026-05-03", "day_index": 2, "attractions": [], "meals": []}
  ],
  "weather_info": [
    {"date": "2026-05-01", "day_weather": "sunny", "night_weather": "clear", "day_temp": 25, "night_temp": 14}
  ],
  "overall_suggestions": "Book the Forbidden City in advance",
  "budget": {"total": 2400}
}
```"#;

// ============================================================================
// Workflow Tests
// ============================================================================

#[tokio::test]
async fn test_plan_trip_end_to_end() {
    let planner = TripPlanner::new(
        Arc::new(MockModel::new(vec!["1. collect everything", COMPLETE_PLAN])),
        mock_tools([0, 0, 0]).await,
    );

    let plan = planner.plan_trip(&request()).await;

    assert_eq!(plan.city, "Beijing");
    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.days[0].date, "2026-05-01");
    assert_eq!(plan.days[0].attractions[0].name, "Forbidden City");
    assert_eq!(plan.days[0].meals.len(), 3);
    assert_eq!(plan.budget.as_ref().unwrap().total, 2400.0);
}

#[tokio::test]
async fn test_summarize_runs_exactly_once_for_any_completion_order() {
    // Vary specialist completion order; the barrier must reach summarize
    // exactly once per run and never deadlock
    let schedules: [[u64; 3]; 6] = [
        [1, 5, 9],
        [9, 5, 1],
        [5, 9, 1],
        [1, 1, 1],
        [0, 0, 0],
        [9, 1, 5],
    ];

    for delays in schedules {
        let model = Arc::new(MockModel::new(vec!["plan", COMPLETE_PLAN]));
        let planner = TripPlanner::new(model.clone(), mock_tools(delays).await);

        let plan = planner.plan_trip(&request()).await;

        // Exactly two generate calls: one from plan, one from summarize
        assert_eq!(model.calls(), 2, "delays {:?}", delays);
        assert_eq!(plan.days.len(), 3, "delays {:?}", delays);
    }
}

#[tokio::test]
async fn test_truncated_model_output_is_recovered() {
    let planner = TripPlanner::new(
        Arc::new(MockModel::new(vec![
            "plan",
            "Sure! ```json\n{\"city\": \"Beijing\", \"days\": [{",
        ])),
        mock_tools([0, 0, 0]).await,
    );

    let plan = planner.plan_trip(&request()).await;

    // Recovered and backfilled, not the synthetic fallback
    assert_eq!(plan.city, "Beijing");
    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.days[0].date, "2026-05-01");
    assert!(plan.days[0].attractions.is_empty());
}

#[tokio::test]
async fn test_weather_tool_error_resolves_to_fallback() {
    let tools = ToolAdapter::new();
    tools
        .register(Arc::new(MockTool::new("search_attractions", json!([]))))
        .await;
    tools
        .register(Arc::new(MockTool::failing("search_weather", "quota exceeded")))
        .await;
    tools
        .register(Arc::new(MockTool::new("search_hotels", json!([]))))
        .await;

    let planner = TripPlanner::new(
        Arc::new(MockModel::new(vec!["plan", COMPLETE_PLAN])),
        tools,
    );

    let plan = planner.plan_trip(&request()).await;

    // Fallback shape: requested day count, two synthetic attractions per day
    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.days[0].date, "2026-05-01");
    for day in &plan.days {
        assert_eq!(day.attractions.len(), 2);
        assert_eq!(day.meals.len(), 3);
    }
}

#[tokio::test]
async fn test_model_failure_resolves_to_fallback() {
    // No scripted responses at all: the plan node's generate() call fails
    let planner = TripPlanner::new(
        Arc::new(MockModel::new(vec![])),
        mock_tools([0, 0, 0]).await,
    );

    let plan = planner.plan_trip(&request()).await;

    assert_eq!(plan.city, "Beijing");
    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.days[0].attractions.len(), 2);
}

#[tokio::test]
async fn test_unparseable_summary_resolves_to_fallback() {
    let planner = TripPlanner::new(
        Arc::new(MockModel::new(vec![
            "plan",
            "I could not produce a plan, sorry.",
        ])),
        mock_tools([0, 0, 0]).await,
    );

    let plan = planner.plan_trip(&request()).await;
    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.days[0].attractions.len(), 2);
}

// ============================================================================
// Photo Batch Tests
// ============================================================================

/// Photo source where lookups for some names fail
struct FlakySource;

#[async_trait]
impl PhotoSource for FlakySource {
    async fn search_photo(&self, query: &str) -> Result<Option<String>, ToolError> {
        if query.contains("unreachable") {
            return Err(ToolError::Api {
                provider: "mock".to_string(),
                message: "timed out".to_string(),
            });
        }
        Ok(Some(format!("https://img.test/{}", query.replace(' ', "-"))))
    }
}

#[tokio::test]
async fn test_photo_batch_keeps_every_name_despite_failures() {
    let service = PhotoService::new(Arc::new(FlakySource));

    let names: Vec<String> = vec![
        "Forbidden City".to_string(),
        "unreachable tower".to_string(),
        "Temple of Heaven".to_string(),
        "Summer Palace".to_string(),
        "unreachable gate".to_string(),
    ];

    let urls = service.batch_photo_urls(&names).await;

    assert_eq!(urls.len(), 5);
    for name in &names {
        assert!(urls.contains_key(name), "missing key {}", name);
    }
    assert!(urls["Forbidden City"].is_some());
    assert!(urls["unreachable tower"].is_none());
    assert!(urls["unreachable gate"].is_none());
}
