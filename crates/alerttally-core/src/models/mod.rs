//! Data models for alerttally

mod alert;
mod query;
mod window;

pub use alert::*;
pub use query::*;
pub use window::*;
