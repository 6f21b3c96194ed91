use crate::core::client::{ApiClient, ApiRequest};
use crate::domain::model::{Task, TaskCategory, TaskInput, TaskStatus};
use crate::utils::error::{MarinexError, Result};
use uuid::Uuid;

/// 分類查詢條件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    RootsOnly,
    Children(Uuid),
}

impl CategoryFilter {
    pub(crate) fn apply(self, request: ApiRequest) -> ApiRequest {
        match self {
            CategoryFilter::All => request,
            CategoryFilter::RootsOnly => request.query("roots_only", 1),
            CategoryFilter::Children(parent) => request.query("parent", parent),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskService {
    client: ApiClient,
}

impl TaskService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, boat_id: Uuid) -> Result<Vec<Task>> {
        self.client.get_list(&format!("boats/{}/tasks/", boat_id)).await
    }

    pub async fn create(&self, boat_id: Uuid, input: &TaskInput) -> Result<Task> {
        if input.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(MarinexError::Validation {
                message: "A task needs a title".to_string(),
            });
        }
        let task: Task = self
            .client
            .post_json(&format!("boats/{}/tasks/", boat_id), input)
            .await?;
        tracing::info!("📝 Created task '{}'", task.title);
        Ok(task)
    }

    pub async fn update(&self, boat_id: Uuid, task_id: Uuid, input: &TaskInput) -> Result<Task> {
        self.client
            .patch_json(&format!("boats/{}/tasks/{}/", boat_id, task_id), input)
            .await
    }

    /// 只改狀態（看板拖放）
    pub async fn set_status(&self, boat_id: Uuid, task_id: Uuid, status: Uuid) -> Result<Task> {
        let input = TaskInput {
            status: Some(status),
            ..Default::default()
        };
        self.update(boat_id, task_id, &input).await
    }

    pub async fn delete(&self, boat_id: Uuid, task_id: Uuid) -> Result<()> {
        self.client
            .delete(&format!("boats/{}/tasks/{}/", boat_id, task_id))
            .await
    }

    pub async fn statuses(&self) -> Result<Vec<TaskStatus>> {
        self.client.get_list("task-statuses/").await
    }

    pub async fn categories(&self, filter: CategoryFilter) -> Result<Vec<TaskCategory>> {
        self.client
            .execute_list(filter.apply(ApiRequest::get("task-categories/")))
            .await
    }
}

/// Tasks grouped by status code, in the order the statuses are listed.
/// Tasks without a status end up under `None`.
pub fn group_by_status<'a>(
    tasks: &'a [Task],
    statuses: &'a [TaskStatus],
) -> Vec<(Option<&'a TaskStatus>, Vec<&'a Task>)> {
    let mut columns: Vec<(Option<&TaskStatus>, Vec<&Task>)> =
        statuses.iter().map(|s| (Some(s), Vec::new())).collect();
    let mut unassigned = Vec::new();

    for task in tasks {
        let column = task
            .status
            .and_then(|id| columns.iter_mut().find(|(s, _)| s.map(|s| s.id) == Some(id)));
        match column {
            Some((_, items)) => items.push(task),
            None => unassigned.push(task),
        }
    }

    if !unassigned.is_empty() {
        columns.push((None, unassigned));
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: &str) -> TaskStatus {
        TaskStatus {
            id: Uuid::new_v4(),
            name: code.to_uppercase(),
            code: code.to_string(),
        }
    }

    fn task(title: &str, status: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            due_date: None,
            priority: None,
            status,
            status_details: None,
            category: None,
            category_details: None,
            assigned_user: None,
            assigned_user_details: None,
        }
    }

    #[test]
    fn test_group_by_status_keeps_status_order() {
        let todo = status("todo");
        let done = status("done");
        let statuses = vec![todo.clone(), done.clone()];
        let tasks = vec![
            task("Change oil", Some(done.id)),
            task("Check flares", Some(todo.id)),
            task("Orphan", None),
        ];

        let columns = group_by_status(&tasks, &statuses);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].0.map(|s| s.code.as_str()), Some("todo"));
        assert_eq!(columns[0].1[0].title, "Check flares");
        assert_eq!(columns[1].1[0].title, "Change oil");
        assert!(columns[2].0.is_none());
    }

    #[test]
    fn test_category_filter_query() {
        let parent = Uuid::new_v4();
        let request = CategoryFilter::Children(parent).apply(ApiRequest::get("task-categories/"));
        assert_eq!(request.query, vec![("parent".to_string(), parent.to_string())]);
        let request = CategoryFilter::RootsOnly.apply(ApiRequest::get("task-categories/"));
        assert_eq!(request.query, vec![("roots_only".to_string(), "1".to_string())]);
    }
}
