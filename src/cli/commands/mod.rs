//! CLI command implementations

pub mod health;
pub mod init;
pub mod search;
pub mod validate;
