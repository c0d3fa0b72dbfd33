// SPDX-License-Identifier: MIT

//! Response recovery pipeline
//!
//! Model output is free text that is supposed to contain one JSON trip
//! plan, and is frequently truncated mid-structure. Recovery runs four
//! steps: extract a JSON-looking span, repair unbalanced brackets, backfill
//! required fields from the original request, then construct the typed
//! plan. Any failure surfaces as a [RecoveryError] and the caller resolves
//! it with the deterministic fallback plan.
//!
//! The cut-point heuristics in the repair step are advisory pattern
//! matching; the closing-sequence computation is exact, and schema
//! validation at construction remains the safety net.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::RecoveryError;
use crate::trip::types::{TripPlan, TripRequest};

static ELLIPSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}\s*$").unwrap());

/// Cut-point heuristics, in preference order: (a) complete value followed
/// by a dangling key with its separator, (b) complete value followed by a
/// dangling key without one, (c) the last closing brace/bracket anywhere.
static CUT_POINT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?s)^(.*[\}\]])\s*,?\s*"[^"]*"\s*:\s*[^\}\]]*$"#).unwrap(),
        Regex::new(r#"(?s)^(.*(?:true|false|null|\d|"[^"]*"))\s*,\s*"[^"]*"\s*:?\s*[^\}\]]*$"#)
            .unwrap(),
        Regex::new(r"(?s)^(.*[\}\]])[^\}\]]*$").unwrap(),
    ]
});

static TRAILING_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*$").unwrap());

/// Run the full pipeline: extract, repair, backfill, construct.
pub fn recover_plan(raw: &str, request: &TripRequest) -> Result<TripPlan, RecoveryError> {
    let payload = extract_payload(raw)?;
    let repaired = repair(&payload);

    let mut data: Value = serde_json::from_str(&repaired)
        .map_err(|e| RecoveryError::Repair(e.to_string()))?;

    backfill(&mut data, request)?;

    serde_json::from_value(data).map_err(|e| RecoveryError::Schema(e.to_string()))
}

/// Step 1: locate a JSON document in the raw text.
///
/// Tries, in order: a fenced block tagged `json`, any fenced block
/// (skipping a short leading language tag line), and the span from the
/// first `{` to the last `}`.
pub fn extract_payload(text: &str) -> Result<String, RecoveryError> {
    if let Some(tagged) = text.find("```json") {
        let start = tagged + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim().to_string());
        }
    }

    if let Some(fence) = text.find("```") {
        let mut start = fence + 3;
        // Skip a language identifier line if it is short
        if let Some(newline) = text[start..].find('\n') {
            if newline < 20 {
                start += newline + 1;
            }
        }
        if let Some(end) = text[start..].find("```") {
            let span = text[start..start + end].trim();
            if !span.is_empty() {
                return Ok(span.to_string());
            }
        }
    }

    if let Some(open) = text.find('{') {
        let close = text.rfind('}').filter(|&c| c > open);
        let end = close.map(|c| c + 1).unwrap_or(text.len());
        return Ok(text[open..end].to_string());
    }

    Err(RecoveryError::Extraction)
}

fn is_balanced(text: &str) -> bool {
    let count = |c: char| text.matches(c).count();
    count('{') == count('}') && count('[') == count(']')
}

/// Step 2: strip trailing ellipsis markers and re-balance truncated
/// brackets. Already-balanced text is returned unchanged apart from edge
/// whitespace.
pub fn repair(text: &str) -> String {
    let text = ELLIPSIS_RE.replace(text.trim(), "").into_owned();

    if is_balanced(&text) {
        return text;
    }

    log::warn!("Model output looks truncated, attempting bracket repair");

    let truncated = truncate_to_valid_point(&text);
    let closing = closing_sequence(&truncated);

    if !closing.is_empty() {
        log::info!("Appending closers: {}", closing);
    }

    format!("{}{}", truncated, closing)
}

/// Find the last structurally valid cut point. Best effort: when no
/// heuristic matches, the text is only stripped of a trailing comma.
fn truncate_to_valid_point(text: &str) -> String {
    for re in CUT_POINT_RES.iter() {
        if let Some(caps) = re.captures(text) {
            let cut = caps[1].trim_end_matches([' ', ',', '\n', '\t']);
            if !cut.is_empty() {
                return TRAILING_COMMA_RE.replace(cut, "").into_owned();
            }
        }
    }

    TRAILING_COMMA_RE
        .replace(text.trim_end_matches([' ', ',', '\n', '\t']), "")
        .into_owned()
}

/// Replay the text through a bracket stack; the remaining stack, reversed,
/// is the exact sequence of closers needed to re-balance it.
fn closing_sequence(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();

    for ch in text.chars() {
        match ch {
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    stack.into_iter().rev().collect()
}

fn day_date(start: NaiveDate, index: u64) -> String {
    start
        .checked_add_days(Days::new(index))
        .unwrap_or(start)
        .format("%Y-%m-%d")
        .to_string()
}

fn synthesize_day(start: NaiveDate, index: usize, request: &TripRequest) -> Value {
    json!({
        "date": day_date(start, index as u64),
        "day_index": index,
        "description": format!("Day {} itinerary", index + 1),
        "transportation": request.transportation,
        "accommodation": request.accommodation,
        "attractions": [],
        "meals": []
    })
}

/// Step 3: fill in required fields the model omitted, deriving per-day
/// values from the request. Idempotent: a complete structure is unchanged.
pub fn backfill(data: &mut Value, request: &TripRequest) -> Result<(), RecoveryError> {
    let start = NaiveDate::parse_from_str(&request.start_date, "%Y-%m-%d")
        .map_err(|e| RecoveryError::Schema(format!("invalid start date: {}", e)))?;

    let obj = data
        .as_object_mut()
        .ok_or_else(|| RecoveryError::Schema("payload is not a JSON object".to_string()))?;

    obj.entry("city").or_insert_with(|| json!(request.city));
    obj.entry("start_date")
        .or_insert_with(|| json!(request.start_date));
    obj.entry("end_date")
        .or_insert_with(|| json!(request.end_date));
    obj.entry("overall_suggestions")
        .or_insert_with(|| json!(format!("Have a wonderful trip to {}!", request.city)));
    obj.entry("weather_info").or_insert_with(|| json!([]));

    if !obj.get("days").map(Value::is_array).unwrap_or(false) {
        obj.insert("days".to_string(), json!([]));
    }
    let days = match obj.get_mut("days").and_then(Value::as_array_mut) {
        Some(days) => days,
        None => return Err(RecoveryError::Schema("days is not an array".to_string())),
    };

    // Synthesize missing trailing days
    while days.len() < request.travel_days as usize {
        let idx = days.len();
        days.push(synthesize_day(start, idx, request));
    }

    // Backfill per-day fields, pre-existing entries included
    for (i, day) in days.iter_mut().enumerate() {
        let day = day
            .as_object_mut()
            .ok_or_else(|| RecoveryError::Schema(format!("day {} is not an object", i)))?;

        day.entry("date").or_insert_with(|| json!(day_date(start, i as u64)));
        day.entry("day_index").or_insert_with(|| json!(i));
        day.entry("description")
            .or_insert_with(|| json!(format!("Day {} itinerary", i + 1)));
        day.entry("transportation")
            .or_insert_with(|| json!(request.transportation));
        day.entry("accommodation")
            .or_insert_with(|| json!(request.accommodation));
        day.entry("attractions").or_insert_with(|| json!([]));
        day.entry("meals").or_insert_with(|| json!([]));
    }

    Ok(())
}
