// SPDX-License-Identifier: MIT

//! Trip request and plan types
//!
//! Wire names follow the JSON schema the summarizer is instructed to emit,
//! so a recovered model payload deserializes directly into [TripPlan].

use serde::{Deserialize, Serialize};

fn default_transportation() -> String {
    "public transit".to_string()
}

fn default_accommodation() -> String {
    "budget hotel".to_string()
}

/// The immutable trip request snapshot; set once at workflow start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub city: String,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub end_date: String,
    pub travel_days: u32,
    #[serde(default = "default_transportation")]
    pub transportation: String,
    #[serde(default = "default_accommodation")]
    pub accommodation: String,
    /// Preference tags, e.g. "history", "parks", "food"
    #[serde(default)]
    pub preferences: Vec<String>,
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

/// One attraction on a day plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Location,
    /// Visit duration in minutes
    #[serde(default)]
    pub visit_duration: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

/// Recommended hotel for a day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub price_range: String,
    #[serde(default)]
    pub rating: String,
    #[serde(rename = "type", default)]
    pub category: String,
}

/// Meal slot tag; any other tag is a schema violation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

/// A planned meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Weather record for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub date: String,
    #[serde(default)]
    pub day_weather: String,
    #[serde(default)]
    pub night_weather: String,
    #[serde(default)]
    pub day_temp: f64,
    #[serde(default)]
    pub night_temp: f64,
}

/// Estimated budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub total: f64,
}

/// Itinerary for a single day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: String,
    /// Zero-based index into the trip
    pub day_index: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transportation: String,
    #[serde(default)]
    pub accommodation: String,
    #[serde(default)]
    pub hotel: Option<Hotel>,
    #[serde(default)]
    pub attractions: Vec<Attraction>,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

/// The output artifact: constructed once, never mutated, returned to the
/// caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripPlan {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub weather_info: Vec<WeatherInfo>,
    #[serde(default)]
    pub overall_suggestions: String,
    #[serde(default)]
    pub budget: Option<Budget>,
}
