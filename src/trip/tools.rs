// SPDX-License-Identifier: MIT

//! AMap-backed data-source tools: POI search (attractions, hotels) and
//! weather forecasts

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::Tool;
use crate::trip::types::Location;

const PLACE_URL: &str = "https://restapi.amap.com/v3/place/text";
const WEATHER_URL: &str = "https://restapi.amap.com/v3/weather/weatherInfo";

// --- Static schemas ---

static ATTRACTION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "keywords": {
                "type": "string",
                "description": "Search keywords, e.g. \"history\", \"parks\", \"food\""
            },
            "city": {
                "type": "string",
                "description": "City name"
            }
        },
        "required": ["keywords", "city"]
    })
});

static WEATHER_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "city": {
                "type": "string",
                "description": "City name"
            }
        },
        "required": ["city"]
    })
});

static HOTEL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "city": {
                "type": "string",
                "description": "City name"
            },
            "hotel_type": {
                "type": "string",
                "description": "Hotel category, e.g. \"budget hotel\", \"luxury hotel\""
            }
        },
        "required": ["city"]
    })
});

// --- Shared POI shaping ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PoiRecord {
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub category: String,
    pub tel: String,
    pub location: Location,
}

fn shape_pois(body: &Value, limit: usize) -> Vec<PoiRecord> {
    let pois = body
        .get("pois")
        .and_then(|p| p.as_array())
        .cloned()
        .unwrap_or_default();

    pois.iter()
        .take(limit)
        .map(|poi| {
            // AMap encodes coordinates as "lon,lat"
            let coords: Vec<f64> = poi
                .get("location")
                .and_then(|l| l.as_str())
                .map(|s| s.split(',').filter_map(|p| p.parse().ok()).collect())
                .unwrap_or_default();

            PoiRecord {
                name: poi["name"].as_str().unwrap_or_default().to_string(),
                address: poi["address"].as_str().unwrap_or_default().to_string(),
                category: poi["type"].as_str().unwrap_or_default().to_string(),
                tel: poi["tel"].as_str().unwrap_or_default().to_string(),
                location: Location {
                    longitude: coords.first().copied().unwrap_or(0.0),
                    latitude: coords.get(1).copied().unwrap_or(0.0),
                },
            }
        })
        .collect()
}

async fn fetch_amap(client: &Client, url: &str, params: &[(&str, &str)]) -> Result<Value, ToolError> {
    let resp = client.get(url).query(params).send().await?;

    if !resp.status().is_success() {
        let text = resp.text().await?;
        return Err(ToolError::api("amap", text));
    }

    let body: Value = resp.json().await?;
    if body["status"].as_str() != Some("1") {
        return Err(ToolError::api(
            "amap",
            body["info"].as_str().unwrap_or("request rejected").to_string(),
        ));
    }
    Ok(body)
}

// --- Attractions ---

#[derive(Debug, Deserialize)]
struct AttractionArgs {
    keywords: String,
    city: String,
}

pub struct AttractionSearchTool {
    client: Client,
    api_key: String,
}

impl AttractionSearchTool {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Tool for AttractionSearchTool {
    fn name(&self) -> &str {
        "search_attractions"
    }

    fn description(&self) -> &str {
        "Searches points of interest in a city by keyword. Returns attraction names, addresses and coordinates."
    }

    fn schema(&self) -> &Value {
        &ATTRACTION_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: AttractionArgs = serde_json::from_value(input).map_err(|e| {
            ToolError::InvalidArgs {
                name: "search_attractions".to_string(),
                message: e.to_string(),
            }
        })?;

        let body = fetch_amap(
            &self.client,
            PLACE_URL,
            &[
                ("key", self.api_key.as_str()),
                ("keywords", &args.keywords),
                ("city", &args.city),
                ("citylimit", "true"),
                ("offset", "20"),
                ("extensions", "all"),
            ],
        )
        .await?;

        let records = shape_pois(&body, 10);
        if records.is_empty() {
            return Err(ToolError::api(
                "amap",
                format!("no attractions found for '{}' in {}", args.keywords, args.city),
            ));
        }
        Ok(serde_json::to_value(records).unwrap_or_default())
    }
}

// --- Weather ---

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    city: String,
}

#[derive(Debug, Serialize)]
struct WeatherReport {
    city: String,
    province: String,
    forecasts: Vec<Value>,
}

pub struct WeatherTool {
    client: Client,
    api_key: String,
}

impl WeatherTool {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "search_weather"
    }

    fn description(&self) -> &str {
        "Fetches the multi-day weather forecast for a city."
    }

    fn schema(&self) -> &Value {
        &WEATHER_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: WeatherArgs = serde_json::from_value(input).map_err(|e| {
            ToolError::InvalidArgs {
                name: "search_weather".to_string(),
                message: e.to_string(),
            }
        })?;

        let body = fetch_amap(
            &self.client,
            WEATHER_URL,
            &[
                ("key", self.api_key.as_str()),
                ("city", &args.city),
                ("extensions", "all"),
            ],
        )
        .await?;

        let forecast = body
            .get("forecasts")
            .and_then(|f| f.as_array())
            .and_then(|f| f.first())
            .ok_or_else(|| ToolError::api("amap", format!("no forecast for {}", args.city)))?;

        let report = WeatherReport {
            city: forecast["city"].as_str().unwrap_or(&args.city).to_string(),
            province: forecast["province"].as_str().unwrap_or_default().to_string(),
            forecasts: forecast
                .get("casts")
                .and_then(|c| c.as_array())
                .cloned()
                .unwrap_or_default(),
        };

        Ok(serde_json::to_value(report).unwrap_or_default())
    }
}

// --- Hotels ---

fn default_hotel_type() -> String {
    "hotel".to_string()
}

#[derive(Debug, Deserialize)]
struct HotelArgs {
    city: String,
    #[serde(default = "default_hotel_type")]
    hotel_type: String,
}

pub struct HotelSearchTool {
    client: Client,
    api_key: String,
}

impl HotelSearchTool {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Tool for HotelSearchTool {
    fn name(&self) -> &str {
        "search_hotels"
    }

    fn description(&self) -> &str {
        "Searches hotels in a city by accommodation type. Returns hotel names, addresses and coordinates."
    }

    fn schema(&self) -> &Value {
        &HOTEL_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: HotelArgs = serde_json::from_value(input).map_err(|e| ToolError::InvalidArgs {
            name: "search_hotels".to_string(),
            message: e.to_string(),
        })?;

        let body = fetch_amap(
            &self.client,
            PLACE_URL,
            &[
                ("key", self.api_key.as_str()),
                ("keywords", &args.hotel_type),
                ("city", &args.city),
                ("citylimit", "true"),
                // Accommodation services POI class
                ("types", "100000"),
                ("offset", "10"),
                ("extensions", "all"),
            ],
        )
        .await?;

        let records = shape_pois(&body, 8);
        if records.is_empty() {
            return Err(ToolError::api(
                "amap",
                format!("no hotels found in {}", args.city),
            ));
        }
        Ok(serde_json::to_value(records).unwrap_or_default())
    }
}
