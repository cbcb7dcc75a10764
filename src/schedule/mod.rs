mod easing;
mod scheduler;
mod time_source;

pub use easing::*;
pub use scheduler::*;
pub use time_source::*;
