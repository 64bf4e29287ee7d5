mod error;
mod operations;
mod requests;
mod types;

pub use error::TaskError;
pub use operations::{filter_pending_for_user, filter_tasks_for_user, validate_title};
pub use requests::{AssignTaskRequest, CreateTaskRequest, UpdateTaskRequest};
pub use types::{
    Notification, NotificationType, NotificationView, Task, TaskStatus, TaskView, User,
};
