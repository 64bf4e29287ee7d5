use uuid::Uuid;

use super::error::TaskError;
use super::types::Task;

/// Maximum number of characters allowed in a task title.
const MAX_TITLE_LEN: usize = 200;

/// Validates a task title before creation or update.
pub fn validate_title(title: &str) -> Result<(), TaskError> {
    if title.trim().is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TaskError::TitleTooLong);
    }
    Ok(())
}

/// Filters tasks the user created or is assigned to.
pub fn filter_tasks_for_user(tasks: &[Task], user_id: Uuid) -> Vec<&Task> {
    tasks.iter().filter(|task| task.involves(user_id)).collect()
}

/// Filters open tasks assigned to the user. Completed tasks are never included.
pub fn filter_pending_for_user(tasks: &[Task], user_id: Uuid) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.is_pending_for(user_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::Utc;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Fix the build").is_ok());
        assert_eq!(validate_title(""), Err(TaskError::EmptyTitle));
        assert_eq!(validate_title("   "), Err(TaskError::EmptyTitle));
        assert_eq!(
            validate_title(&"x".repeat(201)),
            Err(TaskError::TitleTooLong)
        );
        assert!(validate_title(&"x".repeat(200)).is_ok());
    }

    #[test]
    fn test_filter_tasks_for_user() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let tasks = vec![
            Task::new("Created", Utc::now(), user),
            Task::new("Assigned", Utc::now(), other).with_assignee(user),
            Task::new("Unrelated", Utc::now(), other),
        ];

        let result = filter_tasks_for_user(&tasks, user);

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|t| t.title != "Unrelated"));
    }

    #[test]
    fn test_filter_pending_for_user_never_includes_completed() {
        let user = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let tasks = vec![
            Task::new("Pending", Utc::now(), creator).with_assignee(user),
            Task::new("Working", Utc::now(), creator)
                .with_assignee(user)
                .with_status(TaskStatus::InProgress),
            Task::new("Done", Utc::now(), creator)
                .with_assignee(user)
                .with_status(TaskStatus::Completed),
            // Created by the user but not assigned to them.
            Task::new("Own", Utc::now(), user),
        ];

        let result = filter_pending_for_user(&tasks, user);

        let titles: Vec<&str> = result.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Pending", "Working"]);
    }
}
