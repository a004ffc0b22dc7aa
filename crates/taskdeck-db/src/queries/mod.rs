//! Redis query modules, one per entity.
//!
//! Key layout:
//!
//! | key                                  | type   | contents                    |
//! |--------------------------------------|--------|-----------------------------|
//! | `taskdeck:user:{id}`                 | hash   | `data` → user JSON          |
//! | `taskdeck:email:{email}`             | string | user id (uniqueness claim)  |
//! | `taskdeck:user:{id}:boards`          | set    | board ids the user is in    |
//! | `taskdeck:board:{id}`                | hash   | `data` → board JSON         |
//! | `taskdeck:board:{id}:members`        | hash   | user id → membership JSON   |
//! | `taskdeck:board:{id}:tasks`          | zset   | task ids by creation time   |
//! | `taskdeck:task:{id}`                 | hash   | `data` → task JSON          |

pub mod boards;
pub mod memberships;
pub mod tasks;
pub mod users;

pub(crate) fn user_key(id: &str) -> String {
    format!("taskdeck:user:{}", id)
}

pub(crate) fn email_key(email: &str) -> String {
    format!("taskdeck:email:{}", email)
}

pub(crate) fn user_boards_key(user_id: &str) -> String {
    format!("taskdeck:user:{}:boards", user_id)
}

pub(crate) fn board_key(id: &str) -> String {
    format!("taskdeck:board:{}", id)
}

pub(crate) fn members_key(board_id: &str) -> String {
    format!("taskdeck:board:{}:members", board_id)
}

pub(crate) fn board_tasks_key(board_id: &str) -> String {
    format!("taskdeck:board:{}:tasks", board_id)
}

pub(crate) fn task_key(id: &str) -> String {
    format!("taskdeck:task:{}", id)
}

/// Sort score for an RFC 3339 timestamp (milliseconds since the epoch).
pub(crate) fn timestamp_score(rfc3339: &str) -> i64 {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(board_key("b1"), "taskdeck:board:b1");
        assert_eq!(members_key("b1"), "taskdeck:board:b1:members");
        assert_eq!(user_boards_key("u1"), "taskdeck:user:u1:boards");
    }

    #[test]
    fn test_timestamp_score() {
        assert_eq!(timestamp_score("1970-01-01T00:00:01+00:00"), 1000);
        assert_eq!(timestamp_score("not a date"), 0);
    }
}
