use crate::core::client::{ApiClient, ApiRequest};
use crate::core::tasks::CategoryFilter;
use crate::domain::model::{Work, WorkCategory, WorkInput, WorkStatus};
use crate::utils::error::{MarinexError, Result};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct WorkService {
    client: ApiClient,
}

impl WorkService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, boat_id: Uuid) -> Result<Vec<Work>> {
        self.client.get_list(&format!("boats/{}/works/", boat_id)).await
    }

    pub async fn create(&self, boat_id: Uuid, input: &WorkInput) -> Result<Work> {
        if input.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(MarinexError::Validation {
                message: "A work needs a title".to_string(),
            });
        }
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end < start {
                return Err(MarinexError::Validation {
                    message: "A work cannot end before it starts".to_string(),
                });
            }
        }

        let work: Work = self
            .client
            .post_json(&format!("boats/{}/works/", boat_id), input)
            .await?;
        tracing::info!("🔧 Created work '{}'", work.title);
        Ok(work)
    }

    pub async fn update(&self, boat_id: Uuid, work_id: Uuid, input: &WorkInput) -> Result<Work> {
        self.client
            .patch_json(&format!("boats/{}/works/{}/", boat_id, work_id), input)
            .await
    }

    pub async fn delete(&self, boat_id: Uuid, work_id: Uuid) -> Result<()> {
        self.client
            .delete(&format!("boats/{}/works/{}/", boat_id, work_id))
            .await
    }

    pub async fn statuses(&self) -> Result<Vec<WorkStatus>> {
        self.client.get_list("work-statuses/").await
    }

    pub async fn categories(&self, filter: CategoryFilter) -> Result<Vec<WorkCategory>> {
        self.client
            .execute_list(filter.apply(ApiRequest::get("work-categories/")))
            .await
    }
}
