// SPDX-License-Identifier: MIT

//! tripflow-rs: a multi-agent trip planner.
//!
//! A planning workflow runs as a directed graph: a plan node fans out to
//! three specialist agents (attractions, weather, hotels) that collect data
//! concurrently, a collector barrier waits for all of them, and a summarize
//! node asks the model for the final JSON itinerary. Model output goes
//! through a recovery pipeline; anything unrecoverable resolves to a
//! deterministic fallback plan, so `plan_trip` never fails.

pub mod config;
pub mod error;
pub mod flow;
pub mod model;
pub mod server;
pub mod tool;
pub mod trip;
