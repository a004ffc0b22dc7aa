//! Route handlers.

pub mod boards;
pub mod collaborators;
pub mod health;
pub mod tasks;
pub mod users;
