//! Layout state machine over the four composition modes

pub mod controller;

pub use controller::{
    CompositionState, Corner, LayoutController, LayoutMode, LayoutState, PipSettings,
};
