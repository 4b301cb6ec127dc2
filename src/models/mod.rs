//! Data models

mod message;
mod organization;
mod user;

pub use message::*;
pub use organization::*;
pub use user::*;
