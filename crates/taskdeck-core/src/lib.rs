//! Taskdeck Core Library
//!
//! Domain rules for the task-board backend: the role hierarchy, the
//! collaboration directory, board/task/user services, and the realtime hub
//! that fans task events out to live connections.

pub mod board;
pub mod directory;
pub mod error;
pub mod realtime;
pub mod role;
pub mod task;
pub mod user;

pub use error::{CoreError, CoreResult, ErrorKind};
pub use role::{satisfies, Permission, Requirement, Role};
