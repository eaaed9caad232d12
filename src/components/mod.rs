pub mod swimlane;
