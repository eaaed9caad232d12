//! Swimlane workflow diagrams on a 2D canvas.

mod component;
mod config;
mod controller;
mod controls;
pub mod data;
mod geometry;
mod history;
mod layout;
mod pain_point;
mod panel;
mod render;
mod routing;
mod state;
mod style;
mod tools;
mod types;
mod validate;

pub use component::{DiagramHandle, SwimlaneCanvas};
pub use config::DiagramConfig;
pub use controller::HistoryState;
pub use controls::ControlPanel;
pub use pain_point::{PainPointDetector, PainPointScan, SCAN_TICK_MS};
pub use panel::NodeDetailPanel;
pub use state::Selection;
pub use tools::{ToolAction, ToolGroup, ToolsPanel};
pub use types::{NodeKey, WorkflowData};
