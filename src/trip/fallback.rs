// SPDX-License-Identifier: MIT

//! Deterministic fallback plan
//!
//! Synthesized whenever the workflow throws or recovery cannot produce a
//! valid plan. The caller contract has no degraded variant, so this must
//! never fail.

use chrono::{Days, NaiveDate};

use crate::trip::types::{Attraction, DayPlan, Location, Meal, MealType, TripPlan, TripRequest};

const BASE_LONGITUDE: f64 = 116.4;
const BASE_LATITUDE: f64 = 39.9;

fn synthetic_attraction(request: &TripRequest, day: u32, slot: u32) -> Attraction {
    // Perturb coordinates by day and slot so markers never collide
    let offset = day as f64 * 0.01 + slot as f64 * 0.005;

    Attraction {
        name: format!("{} attraction {}", request.city, slot + 1),
        address: request.city.clone(),
        location: Location {
            longitude: BASE_LONGITUDE + offset,
            latitude: BASE_LATITUDE + offset,
        },
        visit_duration: 120,
        description: format!("A well-known sight in {}", request.city),
        category: "attraction".to_string(),
    }
}

fn synthetic_meals(day: u32) -> Vec<Meal> {
    [
        (MealType::Breakfast, "breakfast", "Local breakfast specialties"),
        (MealType::Lunch, "lunch", "Lunch recommendation"),
        (MealType::Dinner, "dinner", "Dinner recommendation"),
    ]
    .into_iter()
    .map(|(meal_type, slot, description)| Meal {
        meal_type,
        name: format!("Day {} {}", day + 1, slot),
        description: description.to_string(),
    })
    .collect()
}

/// Build a minimal valid plan straight from the request: one day per
/// `travel_days`, two synthetic attractions and three meals each.
pub fn fallback_plan(request: &TripRequest) -> TripPlan {
    let start = NaiveDate::parse_from_str(&request.start_date, "%Y-%m-%d").unwrap_or_default();

    let days = (0..request.travel_days)
        .map(|i| DayPlan {
            date: start
                .checked_add_days(Days::new(i as u64))
                .unwrap_or(start)
                .format("%Y-%m-%d")
                .to_string(),
            day_index: i,
            description: format!("Day {} itinerary", i + 1),
            transportation: request.transportation.clone(),
            accommodation: request.accommodation.clone(),
            hotel: None,
            attractions: (0..2).map(|j| synthetic_attraction(request, i, j)).collect(),
            meals: synthetic_meals(i),
        })
        .collect();

    TripPlan {
        city: request.city.clone(),
        start_date: request.start_date.clone(),
        end_date: request.end_date.clone(),
        days,
        weather_info: vec![],
        overall_suggestions: format!(
            "A {}-day itinerary for {}. Check attraction opening hours before you go.",
            request.travel_days, request.city
        ),
        budget: None,
    }
}
