pub(crate) mod base_component;
pub mod components;
mod dirty;
mod layout_engine;
mod panel;
mod persistence;
mod picking;
mod query;
pub mod render_backend;
mod tree;
mod validation;

pub use base_component::*;
pub use components::*;
pub use dirty::*;
pub use layout_engine::*;
pub use panel::*;
pub use persistence::*;
pub use query::*;
pub use render_backend::*;
pub use tree::*;
pub use validation::*;
