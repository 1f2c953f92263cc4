//! In-process persistence for the VaultMesh trust core.
//!
//! Stands in for "a single relational database with the following table
//! families": each family lives behind its own async read-write
//! lock in [`Store`], and one repo struct per family exposes the CRUD and
//! atomic-upsert operations higher layers need.

pub mod error;
pub mod models;
pub mod repos;
mod store;

pub use error::{DbError, DbResult};
pub use repos::{
    ChannelRepo, ConsumeBindings, EngagementKeyRepo, InboxRepo, PowRepo, SecretUpdateRepo,
    SessionRepo, VaultRepo,
};
pub use store::Store;
