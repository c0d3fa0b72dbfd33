// SPDX-License-Identifier: MIT

//! Environment-backed configuration

use std::env;
use std::time::Duration;

use crate::error::TripflowError;

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the OpenAI-compatible chat endpoint
    pub llm_api_key: String,
    /// Base URL for the chat endpoint
    pub llm_base_url: String,
    /// Model identifier
    pub llm_model: String,
    /// AMap key for POI and weather lookups
    pub amap_api_key: String,
    /// Unsplash access key for photo lookups
    pub unsplash_access_key: Option<String>,
    /// Overall deadline for one planning invocation; None disables it
    pub plan_deadline: Option<Duration>,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `LLM_API_KEY` (or `OPENAI_API_KEY`) and `AMAP_API_KEY` are required;
    /// everything else has a default.
    pub fn from_env() -> Result<Self, TripflowError> {
        let llm_api_key = env::var("LLM_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| TripflowError::config("LLM_API_KEY must be set"))?;

        let llm_base_url = env::var("LLM_BASE_URL")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let llm_model = env::var("LLM_MODEL_ID")
            .or_else(|_| env::var("OPENAI_MODEL"))
            .unwrap_or_else(|_| "gpt-4".to_string());

        let amap_api_key =
            env::var("AMAP_API_KEY").map_err(|_| TripflowError::config("AMAP_API_KEY must be set"))?;

        let unsplash_access_key = env::var("UNSPLASH_ACCESS_KEY").ok();

        let plan_deadline = env::var("PLAN_DEADLINE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        Ok(Self {
            llm_api_key,
            llm_base_url,
            llm_model,
            amap_api_key,
            unsplash_access_key,
            plan_deadline,
        })
    }
}
