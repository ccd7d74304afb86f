//! Request handlers.

pub mod health;
pub mod invites;
pub mod users;
