//! Business logic behind the request handlers.

pub mod authz;
pub mod invites;
