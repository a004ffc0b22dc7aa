//! Taskdeck Data Layer
//!
//! Persistence for users, boards, memberships and tasks behind one async
//! [`Store`] trait. Two backends are provided: [`MemoryStore`] for tests and
//! single-process deployments, and [`RedisStore`] for shared storage.

pub mod client;
pub mod memory;
pub mod queries;
pub mod rows;
pub mod store;

pub use client::{init_pool, DbError, DbResult, RedisPool, RedisStore};
pub use memory::MemoryStore;
pub use rows::{BoardRow, MembershipRow, TaskRow, UserRow};
pub use store::{SharedStore, Store};
