// SPDX-License-Identifier: MIT

//! Directed-graph workflow engine: mergeable state, nodes, and the executor

pub mod executor;
pub mod graph;
pub mod state;

pub use executor::Executor;
pub use graph::{GraphDef, Node, END, START};
pub use state::{Reducer, StateUpdate, WorkflowState};
