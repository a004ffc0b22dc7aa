//! Task management.
//!
//! Every mutation is gated through the collaboration directory and, once the
//! store write has succeeded, published to the realtime hub.

pub mod model;

pub use model::{Task, TaskInput, TaskPatch, TaskPriority, TaskStatus};

use taskdeck_db::Store;
use tracing::{info, warn};
use uuid::Uuid;

use crate::directory::authorize;
use crate::error::{CoreError, CoreResult};
use crate::realtime::{Event, Hub};
use crate::role::Permission;

/// Create a task on a board. Requires `Create`.
pub async fn create_task(
    store: &dyn Store,
    hub: &Hub,
    actor_id: &str,
    board_id: &str,
    input: &TaskInput,
) -> CoreResult<Task> {
    authorize(store, board_id, actor_id, Permission::Create).await?;
    input.validate()?;

    let now = chrono::Utc::now().to_rfc3339();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        board_id: board_id.to_string(),
        title: input.title.trim().to_string(),
        description: input.description.clone(),
        status: input.status.unwrap_or_default(),
        priority: input.priority.unwrap_or_default(),
        start_date: input.start_date.map(|d| d.to_rfc3339()),
        end_date: input.end_date.map(|d| d.to_rfc3339()),
        created_at: now.clone(),
        updated_at: now,
    };
    store.insert_task(&task.to_row()).await?;
    info!(task_id = %task.id, board_id = %board_id, "Task created");

    announce(hub, Event::created(board_id, &task));
    Ok(task)
}

/// Get a task. Requires `View` on the task's board.
pub async fn get_task(store: &dyn Store, actor_id: &str, task_id: &str) -> CoreResult<Task> {
    let task = load_task(store, task_id).await?;
    authorize(store, &task.board_id, actor_id, Permission::View).await?;
    Ok(task)
}

/// List a board's tasks, oldest first. Requires `View`.
pub async fn list_tasks(store: &dyn Store, actor_id: &str, board_id: &str) -> CoreResult<Vec<Task>> {
    authorize(store, board_id, actor_id, Permission::View).await?;
    let rows = store.list_tasks(board_id).await?;
    Ok(rows.into_iter().map(Task::from_row).collect())
}

/// Apply a partial update. Requires `Edit`.
pub async fn update_task(
    store: &dyn Store,
    hub: &Hub,
    actor_id: &str,
    task_id: &str,
    patch: &TaskPatch,
) -> CoreResult<Task> {
    let mut task = load_task(store, task_id).await?;
    authorize(store, &task.board_id, actor_id, Permission::Edit).await?;

    patch.apply(&mut task)?;
    task.updated_at = chrono::Utc::now().to_rfc3339();
    store.update_task(&task.to_row()).await?;
    info!(task_id = %task.id, board_id = %task.board_id, "Task updated");

    announce(hub, Event::updated(task.board_id.as_str(), &task));
    Ok(task)
}

/// Delete a task. Requires `Delete`.
pub async fn delete_task(store: &dyn Store, hub: &Hub, actor_id: &str, task_id: &str) -> CoreResult<()> {
    let task = load_task(store, task_id).await?;
    authorize(store, &task.board_id, actor_id, Permission::Delete).await?;

    if !store.delete_task(task_id).await? {
        return Err(CoreError::TaskNotFound(task_id.to_string()));
    }
    info!(task_id = %task_id, board_id = %task.board_id, "Task deleted");

    announce(hub, Ok(Event::deleted(task.board_id.as_str(), task_id)));
    Ok(())
}

async fn load_task(store: &dyn Store, task_id: &str) -> CoreResult<Task> {
    store
        .get_task(task_id)
        .await?
        .map(Task::from_row)
        .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))
}

/// Publish after a committed write. Delivery problems never reach the caller.
fn announce(hub: &Hub, event: serde_json::Result<Event>) {
    match event {
        Ok(event) => {
            hub.publish(&event);
        }
        Err(e) => warn!(error = %e, "Failed to build task event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::model::BoardInput;
    use crate::directory::{add_collaborator, create_board_with_owner};
    use crate::realtime::Scope;
    use crate::role::Role;
    use crate::user::{register_user, NewUser, User};
    use serde_json::Value;
    use taskdeck_db::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        hub: Hub,
        owner: User,
        editor: User,
        viewer: User,
        board_id: String,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut users = Vec::new();
        for name in ["owner", "editor", "viewer"] {
            let input = NewUser {
                name: name.to_string(),
                email: format!("{name}@example.com"),
            };
            users.push(register_user(&store, &input).await.unwrap());
        }
        let viewer = users.pop().unwrap();
        let editor = users.pop().unwrap();
        let owner = users.pop().unwrap();

        let board = create_board_with_owner(&store, &BoardInput::new("Sprint", None), &owner.id)
            .await
            .unwrap()
            .board;
        add_collaborator(&store, &board.id, &editor.email, Role::Editor)
            .await
            .unwrap();
        add_collaborator(&store, &board.id, &viewer.email, Role::Viewer)
            .await
            .unwrap();

        Fixture {
            store,
            hub: Hub::default(),
            owner,
            editor,
            viewer,
            board_id: board.id,
        }
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_mutations_publish_events() {
        let f = fixture().await;
        let mut sub = f.hub.register(Scope::board(f.board_id.as_str(), f.viewer.id.as_str())).unwrap();

        let task = create_task(&f.store, &f.hub, &f.editor.id, &f.board_id, &TaskInput::new("Docs"))
            .await
            .unwrap();
        let created = parse(&sub.recv().await.unwrap());
        assert_eq!(created["type"], "create");
        assert_eq!(created["data"]["id"], task.id.as_str());
        assert_eq!(created["data"]["status"], "todo");

        let patch = TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        update_task(&f.store, &f.hub, &f.editor.id, &task.id, &patch)
            .await
            .unwrap();
        let updated = parse(&sub.recv().await.unwrap());
        assert_eq!(updated["type"], "update");
        assert_eq!(updated["data"]["status"], "in_progress");

        delete_task(&f.store, &f.hub, &f.owner.id, &task.id)
            .await
            .unwrap();
        assert_eq!(
            &*sub.recv().await.unwrap(),
            format!(r#"{{"type":"delete","data":{{"id":"{}"}}}}"#, task.id)
        );
    }

    #[tokio::test]
    async fn test_denied_mutations_publish_nothing() {
        let f = fixture().await;
        let mut sub = f.hub.register(Scope::All).unwrap();

        let err = create_task(&f.store, &f.hub, &f.viewer.id, &f.board_id, &TaskInput::new("Docs"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));

        let task = create_task(&f.store, &f.hub, &f.editor.id, &f.board_id, &TaskInput::new("Docs"))
            .await
            .unwrap();
        sub.recv().await.unwrap();

        let err = delete_task(&f.store, &f.hub, &f.editor.id, &task.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
        assert!(f.store.get_task(&task.id).await.unwrap().is_some());

        // Only the successful create was published.
        f.hub.unregister(sub.id());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_viewer_can_read() {
        let f = fixture().await;
        let task = create_task(&f.store, &f.hub, &f.owner.id, &f.board_id, &TaskInput::new("Docs"))
            .await
            .unwrap();

        assert_eq!(get_task(&f.store, &f.viewer.id, &task.id).await.unwrap(), task);
        assert_eq!(
            list_tasks(&f.store, &f.viewer.id, &f.board_id).await.unwrap(),
            vec![task]
        );
    }

    #[tokio::test]
    async fn test_outsider_and_missing_task() {
        let f = fixture().await;
        let task = create_task(&f.store, &f.hub, &f.owner.id, &f.board_id, &TaskInput::new("Docs"))
            .await
            .unwrap();

        assert!(matches!(
            get_task(&f.store, "stranger", &task.id).await,
            Err(CoreError::NotAMember { .. })
        ));
        assert!(matches!(
            update_task(&f.store, &f.hub, &f.owner.id, "missing", &TaskPatch::default()).await,
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_write() {
        let f = fixture().await;
        let err = create_task(&f.store, &f.hub, &f.owner.id, &f.board_id, &TaskInput::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(f.store.list_tasks(&f.board_id).await.unwrap().is_empty());
    }
}
