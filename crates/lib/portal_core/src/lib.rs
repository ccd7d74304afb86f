//! # portal_core
//!
//! Core domain logic for the Omniflow client portal: the identity-provider
//! client, the invite/profile store, the recovery-link router, the password
//! policy, and the persisted session context.

pub mod db;
pub mod identity;
pub mod migrate;
pub mod models;
pub mod password;
pub mod recovery;
pub mod session;
pub mod store;
pub mod uuid;
