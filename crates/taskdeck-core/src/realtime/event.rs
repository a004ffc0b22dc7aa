//! Task mutation events and their wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What happened to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "create")]
    Created,
    #[serde(rename = "update")]
    Updated,
    #[serde(rename = "delete")]
    Deleted,
}

/// A task mutation, serialized as `{"type": ..., "data": ...}`.
///
/// `board_id` only routes the event to board-scoped connections and never
/// appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: Value,
    #[serde(skip)]
    pub board_id: Option<String>,
}

impl Event {
    /// An event delivered to every connection regardless of scope.
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self {
            kind,
            data,
            board_id: None,
        }
    }

    pub fn for_board(kind: EventKind, board_id: impl Into<String>, data: Value) -> Self {
        Self {
            kind,
            data,
            board_id: Some(board_id.into()),
        }
    }

    pub fn created(board_id: impl Into<String>, task: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self::for_board(
            EventKind::Created,
            board_id,
            serde_json::to_value(task)?,
        ))
    }

    pub fn updated(board_id: impl Into<String>, task: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self::for_board(
            EventKind::Updated,
            board_id,
            serde_json::to_value(task)?,
        ))
    }

    /// Deletions carry only the task id.
    pub fn deleted(board_id: impl Into<String>, task_id: &str) -> Self {
        Self::for_board(
            EventKind::Deleted,
            board_id,
            serde_json::json!({ "id": task_id }),
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let event = Event::for_board(EventKind::Updated, "b1", json!({ "id": "t1" }));
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"type":"update","data":{"id":"t1"}}"#
        );

        let deleted = Event::deleted("b1", "t9");
        assert_eq!(
            deleted.to_json().unwrap(),
            r#"{"type":"delete","data":{"id":"t9"}}"#
        );
    }

    #[test]
    fn test_created_wraps_payload() {
        #[derive(Serialize)]
        struct Payload {
            id: &'static str,
            title: &'static str,
        }

        let event = Event::created("b1", &Payload { id: "t1", title: "Docs" }).unwrap();
        assert_eq!(event.kind, EventKind::Created);
        assert_eq!(event.data, json!({ "id": "t1", "title": "Docs" }));
        assert_eq!(event.board_id.as_deref(), Some("b1"));
    }
}
