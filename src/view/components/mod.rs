mod button;
mod label;
mod scroll_view;
mod slider;
mod toggle;

pub use button::*;
pub use label::*;
pub use scroll_view::*;
pub use slider::*;
pub use toggle::*;
