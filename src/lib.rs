//! Retained-mode element tree for rfgui.
//!
//! A [`Panel`] owns one element tree together with the dispatcher state, focus
//! controller and scheduler that drive it. Raw platform input enters through
//! [`Panel::send_input`], is routed through capture/target/bubble phases, and
//! any resulting style or geometry change is validated lazily before the next
//! pick or paint.

pub mod config;
pub mod error;
pub mod schedule;
pub mod style;
pub mod ui;
pub mod view;

pub use config::*;
pub use error::*;
pub use schedule::*;
pub use style::*;
pub use ui::*;
pub use view::*;
