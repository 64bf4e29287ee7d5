//! Task lifecycle service.
//!
//! Reads go through the cache with [`TASK_CACHE_TTL`]. Every mutation follows
//! the same order: repository write, cache invalidation, then notification
//! hand-off. A failed write stops before the cache is touched.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use taskhub_core::cache::{
    pending_tasks_key, task_key, user_cache_keys, user_tasks_key, Cache, CacheExt, ALL_TASKS_KEY,
    TASK_CACHE_TTL,
};
use taskhub_core::storage::{TaskRepository, UserRepository};
use taskhub_core::task::{
    AssignTaskRequest, CreateTaskRequest, Task, TaskStatus, TaskView, UpdateTaskRequest, User,
};

use super::{Result, ServiceError};
use crate::jobs::NotificationDispatcher;

/// Creates, updates, assigns, completes and deletes tasks.
///
/// Holds no locks of its own; concurrent mutations of the same task are
/// last-writer-wins at the repository.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn Cache>,
    dispatcher: NotificationDispatcher,
    ttl: Duration,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn Cache>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            tasks,
            users,
            cache,
            dispatcher,
            ttl: TASK_CACHE_TTL,
        }
    }

    /// Overrides the TTL of cached task reads.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Every non-deleted task, oldest first.
    pub async fn get_all(&self) -> Result<Vec<TaskView>> {
        self.cache
            .get_or_create(ALL_TASKS_KEY, Some(self.ttl), || async move {
                let tasks = self.tasks.list_tasks().await?;
                self.to_views(&tasks).await
            })
            .await
    }

    /// A single task. A missing task is not cached.
    pub async fn get_by_id(&self, id: Uuid) -> Result<TaskView> {
        self.cache
            .get_or_create(&task_key(id), Some(self.ttl), || async move {
                let task = self.require_task(id).await?;
                self.to_view(&task).await
            })
            .await
    }

    /// Open tasks assigned to `user_id`.
    pub async fn get_pending(&self, user_id: Uuid) -> Result<Vec<TaskView>> {
        self.cache
            .get_or_create(&pending_tasks_key(user_id), Some(self.ttl), || async move {
                let tasks = self.tasks.list_pending_tasks_for_user(user_id).await?;
                self.to_views(&tasks).await
            })
            .await
    }

    /// Tasks `user_id` created or is assigned to, in any status.
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Vec<TaskView>> {
        self.cache
            .get_or_create(&user_tasks_key(user_id), Some(self.ttl), || async move {
                let tasks = self.tasks.list_tasks_for_user(user_id).await?;
                self.to_views(&tasks).await
            })
            .await
    }

    /// Logically deleted tasks. Never cached.
    pub async fn get_deleted(&self) -> Result<Vec<TaskView>> {
        let tasks = self.tasks.list_deleted_tasks().await?;
        self.to_views(&tasks).await
    }

    /// Creates a pending task owned by `creator_id`.
    ///
    /// An assignee other than the creator gets exactly one assignment
    /// notification.
    pub async fn create(&self, req: CreateTaskRequest, creator_id: Uuid) -> Result<TaskView> {
        req.validate()?;
        let creator = self.require_user(creator_id).await?;
        let assignee = match req.assigned_to {
            Some(id) => Some(self.require_user(id).await?),
            None => None,
        };

        let mut task = Task::new(req.title, req.due_date, creator_id);
        task.description = req.description;
        task.assigned_to = req.assigned_to;

        // 1. Persist
        self.tasks.create_task(&task).await?;

        // 2. Invalidate
        self.invalidate(&task, None).await;

        // 3. Notify
        if let Some(assignee_id) = task.assigned_to.filter(|id| *id != creator_id) {
            self.notify_assignee(task.id, assignee_id).await;
        }

        tracing::debug!(task_id = %task.id, created_by = %creator_id, "Task created");
        Ok(TaskView::from_task(&task, Some(&creator), assignee.as_ref()))
    }

    /// Replaces title, description and due date. Status is never changed here.
    pub async fn update(&self, id: Uuid, req: UpdateTaskRequest) -> Result<TaskView> {
        req.validate()?;
        let mut task = self.require_task(id).await?;

        task.title = req.title;
        task.description = req.description;
        task.due_date = req.due_date;
        task.updated_at = Some(Utc::now());

        self.tasks.update_task(&task).await?;
        self.invalidate(&task, None).await;

        tracing::debug!(task_id = %id, "Task updated");
        Ok(self.view_after_write(&task).await)
    }

    /// Assigns the task to another user and notifies them if the assignee changed.
    pub async fn assign(&self, id: Uuid, req: AssignTaskRequest) -> Result<TaskView> {
        let mut task = self.require_task(id).await?;
        let assignee = self.require_user(req.assigned_to).await?;

        let previous = task.assigned_to.replace(assignee.id);
        task.updated_at = Some(Utc::now());

        self.tasks.update_task(&task).await?;
        self.invalidate(&task, previous).await;

        let changed = previous != Some(assignee.id);
        if changed {
            self.notify_assignee(task.id, assignee.id).await;
        }

        tracing::debug!(
            task_id = %id,
            assigned_to = %assignee.id,
            previous = ?previous,
            changed,
            "Task assigned"
        );
        Ok(self.view_after_write(&task).await)
    }

    /// Marks the task completed. Completing twice succeeds.
    pub async fn complete(&self, id: Uuid) -> Result<TaskView> {
        let mut task = self.require_task(id).await?;

        task.status = TaskStatus::Completed;
        task.updated_at = Some(Utc::now());

        self.tasks.update_task(&task).await?;
        self.invalidate(&task, None).await;

        tracing::debug!(task_id = %id, "Task completed");
        Ok(self.view_after_write(&task).await)
    }

    /// Deletes the task. Cache keys are derived from the task as it was before.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let task = self.require_task(id).await?;

        self.tasks.delete_task(id).await?;
        self.invalidate(&task, None).await;

        tracing::debug!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Brings a deleted task back.
    pub async fn restore(&self, id: Uuid) -> Result<TaskView> {
        self.tasks.restore_task(id).await?;
        let task = self.require_task(id).await?;
        self.invalidate(&task, None).await;

        tracing::debug!(task_id = %id, "Task restored");
        Ok(self.view_after_write(&task).await)
    }

    async fn require_task(&self, id: Uuid) -> Result<Task> {
        self.tasks
            .get_task(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task", id))
    }

    async fn require_user(&self, id: Uuid) -> Result<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    async fn to_view(&self, task: &Task) -> Result<TaskView> {
        let creator = self.users.get_user(task.created_by).await?;
        let assignee = match task.assigned_to {
            Some(id) => self.users.get_user(id).await?,
            None => None,
        };
        Ok(TaskView::from_task(task, creator.as_ref(), assignee.as_ref()))
    }

    /// Resolves usernames for a batch, looking each user up once.
    async fn to_views(&self, tasks: &[Task]) -> Result<Vec<TaskView>> {
        let mut users: HashMap<Uuid, Option<User>> = HashMap::new();
        for id in tasks
            .iter()
            .flat_map(|task| std::iter::once(task.created_by).chain(task.assigned_to))
        {
            if let Entry::Vacant(slot) = users.entry(id) {
                slot.insert(self.users.get_user(id).await?);
            }
        }

        let lookup = |id: Uuid| users.get(&id).and_then(Option::as_ref);
        Ok(tasks
            .iter()
            .map(|task| {
                TaskView::from_task(task, lookup(task.created_by), task.assigned_to.and_then(lookup))
            })
            .collect())
    }

    /// The write already happened, so a failed user lookup only drops the names.
    async fn view_after_write(&self, task: &Task) -> TaskView {
        match self.to_view(task).await {
            Ok(view) => view,
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "Failed to resolve task users");
                TaskView::from_task(task, None, None)
            }
        }
    }

    /// Clears the task key, the all-tasks key and the per-user keys of the
    /// creator, the assignee and `previous_assignee`.
    async fn invalidate(&self, task: &Task, previous_assignee: Option<Uuid>) {
        let mut users = vec![task.created_by];
        users.extend(task.assigned_to);
        users.extend(previous_assignee);
        users.sort_unstable();
        users.dedup();

        let mut keys = vec![task_key(task.id), ALL_TASKS_KEY.to_string()];
        keys.extend(users.into_iter().flat_map(user_cache_keys));

        for key in &keys {
            if let Err(err) = self.cache.remove(key).await {
                tracing::warn!(
                    task_id = %task.id,
                    cache_key = %key,
                    error = %err,
                    "Failed to invalidate cache entry"
                );
            }
        }
    }

    async fn notify_assignee(&self, task_id: Uuid, user_id: Uuid) {
        if let Err(err) = self.dispatcher.notify(task_id, user_id).await {
            tracing::error!(
                %task_id,
                %user_id,
                error = %err,
                "Failed to enqueue assignment notification"
            );
        }
    }
}
