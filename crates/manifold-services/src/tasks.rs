// crates/manifold-services/src/tasks.rs
//
// Task manager: CRUD over caller-keyed task records plus per-status
// statistics. State lives behind one RwLock; updates are last-writer-wins
// per field.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use manifold_core::{typed, HandlerError, RegistryBuilder, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    New,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------------
// Requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTaskRequest {
    pub task_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub task_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskRequest {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskResponse {
    pub task_id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatsResponse {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub completed: usize,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, TaskRecord>>,
}

impl TaskStore {
    pub async fn create(&self, request: CreateTaskRequest) -> Result<TaskRecord, HandlerError> {
        if request.title.is_empty() {
            return Err(HandlerError::InvalidParams(
                "title must not be empty".to_string(),
            ));
        }
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&request.task_id) {
            return Err(HandlerError::Failed(format!(
                "task already exists: {}",
                request.task_id
            )));
        }
        let record = TaskRecord {
            task_id: request.task_id.clone(),
            title: request.title,
            description: request.description,
            status: TaskStatus::New,
        };
        tracing::debug!(task_id = %record.task_id, "task created");
        tasks.insert(request.task_id, record.clone());
        Ok(record)
    }

    pub async fn get(&self, request: GetTaskRequest) -> Result<TaskRecord, HandlerError> {
        let tasks = self.tasks.read().await;
        tasks
            .get(&request.task_id)
            .cloned()
            .ok_or_else(|| HandlerError::Failed(format!("task not found: {}", request.task_id)))
    }

    pub async fn update(&self, request: UpdateTaskRequest) -> Result<TaskRecord, HandlerError> {
        let mut tasks = self.tasks.write().await;
        let record = tasks
            .get_mut(&request.task_id)
            .ok_or_else(|| HandlerError::Failed(format!("task not found: {}", request.task_id)))?;
        if let Some(title) = request.title {
            record.title = title;
        }
        if let Some(description) = request.description {
            record.description = description;
        }
        if let Some(status) = request.status {
            record.status = status;
        }
        Ok(record.clone())
    }

    pub async fn delete(
        &self,
        request: DeleteTaskRequest,
    ) -> Result<DeleteTaskResponse, HandlerError> {
        let mut tasks = self.tasks.write().await;
        if tasks.remove(&request.task_id).is_none() {
            return Err(HandlerError::Failed(format!(
                "task not found: {}",
                request.task_id
            )));
        }
        Ok(DeleteTaskResponse {
            task_id: request.task_id,
            deleted: true,
        })
    }

    /// All tasks, sorted by id for stable output.
    pub async fn list(&self) -> Result<TaskListResponse, HandlerError> {
        let tasks = self.tasks.read().await;
        let mut records: Vec<TaskRecord> = tasks.values().cloned().collect();
        records.sort_unstable_by(|a, b| a.task_id.cmp(&b.task_id));
        let count = records.len();
        Ok(TaskListResponse {
            tasks: records,
            count,
        })
    }

    pub async fn stats(&self) -> Result<TaskStatsResponse, HandlerError> {
        let tasks = self.tasks.read().await;
        let mut stats = TaskStatsResponse {
            total: tasks.len(),
            new: 0,
            in_progress: 0,
            completed: 0,
        };
        for record in tasks.values() {
            match record.status {
                TaskStatus::New => stats.new += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
            }
        }
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Empty request for operations that take no arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct NoArgs {}

pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    let store = Arc::new(TaskStore::default());

    let s = store.clone();
    builder.register(
        "tasks/create",
        typed(move |req: CreateTaskRequest| {
            let store = s.clone();
            async move { store.create(req).await }
        }),
    )?;

    let s = store.clone();
    builder.register(
        "tasks/get",
        typed(move |req: GetTaskRequest| {
            let store = s.clone();
            async move { store.get(req).await }
        }),
    )?;

    let s = store.clone();
    builder.register(
        "tasks/update",
        typed(move |req: UpdateTaskRequest| {
            let store = s.clone();
            async move { store.update(req).await }
        }),
    )?;

    let s = store.clone();
    builder.register(
        "tasks/delete",
        typed(move |req: DeleteTaskRequest| {
            let store = s.clone();
            async move { store.delete(req).await }
        }),
    )?;

    let s = store.clone();
    builder.register(
        "tasks/list",
        typed(move |_req: NoArgs| {
            let store = s.clone();
            async move { store.list().await }
        }),
    )?;

    let s = store;
    builder.register(
        "tasks/stats",
        typed(move |_req: NoArgs| {
            let store = s.clone();
            async move { store.stats().await }
        }),
    )?;

    Ok(())
}
