pub mod tracker;
pub mod ui;

pub use tracker::JobTracker;
pub use ui::{ui_lane, UiLane, UiLaneRunner};
