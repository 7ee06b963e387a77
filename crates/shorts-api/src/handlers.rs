//! Request handlers.

pub mod health;
pub mod shorts;

pub use health::*;
pub use shorts::*;
