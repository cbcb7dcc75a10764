mod dispatcher;
mod event;
mod focus;
mod input;
mod listener;
mod pool;

pub use dispatcher::*;
pub use event::*;
pub use focus::*;
pub use input::*;
pub use listener::*;
pub use pool::*;
