// SPDX-License-Identifier: MIT

//! Trip planning: the workflow nodes, data tools, response recovery, and
//! the planner entry point

pub mod fallback;
pub mod nodes;
pub mod photos;
pub mod planner;
pub mod recovery;
pub mod tools;
pub mod types;

pub use fallback::fallback_plan;
pub use photos::{PhotoService, PhotoSource, UnsplashSource};
pub use planner::TripPlanner;
pub use types::{TripPlan, TripRequest};
