//! Request handlers.

pub mod annotations;
pub mod dashboard;
pub mod events;
pub mod health;

pub use annotations::*;
pub use dashboard::*;
pub use events::*;
pub use health::*;
