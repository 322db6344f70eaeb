//! `gotham-core`: identifiers shared by the auth core and its adapters.
//!
//! This crate carries no behaviour beyond parsing and formatting ids.

pub mod error;
pub mod id;

pub use error::IdError;
pub use id::{RoleId, SessionId, UserId};
