use crate::core::client::{ApiClient, ApiRequest, FormField};
use crate::domain::model::{Boat, BoatAttachment, BoatBrand, BoatInput, BoatModel, FileUpload, Port};
use crate::utils::error::{MarinexError, Result};
use uuid::Uuid;

// 品牌、型號、港口表很長，每頁多拿一點
const LOOKUP_PAGE_SIZE: u32 = 200;

/// Boats and their lookup tables (brands, models, ports) and photos.
#[derive(Debug, Clone)]
pub struct BoatService {
    client: ApiClient,
}

impl BoatService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Boat>> {
        let boats: Vec<Boat> = self.client.get_list("boats/").await?;
        tracing::debug!("Fetched {} boats", boats.len());
        Ok(boats)
    }

    pub async fn get(&self, boat_id: Uuid) -> Result<Boat> {
        self.client.get_json(&format!("boats/{}/", boat_id)).await
    }

    pub async fn create(&self, input: &BoatInput) -> Result<Boat> {
        match input.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => {
                return Err(MarinexError::Validation {
                    message: "A boat needs a name".to_string(),
                })
            }
        }
        if input.model.is_none() {
            return Err(MarinexError::Validation {
                message: "A boat needs a model".to_string(),
            });
        }

        let boat: Boat = self.client.post_json("boats/", input).await?;
        tracing::info!("⛵ Created boat {} ({})", boat.name, boat.id);
        Ok(boat)
    }

    pub async fn update(&self, boat_id: Uuid, input: &BoatInput) -> Result<Boat> {
        self.client
            .patch_json(&format!("boats/{}/", boat_id), input)
            .await
    }

    pub async fn delete(&self, boat_id: Uuid) -> Result<()> {
        self.client.delete(&format!("boats/{}/", boat_id)).await
    }

    pub async fn brands(&self) -> Result<Vec<BoatBrand>> {
        self.client
            .execute_list(ApiRequest::get("brands/").query("limit", LOOKUP_PAGE_SIZE))
            .await
    }

    /// 依品牌篩選型號
    pub async fn models(&self, brand_id: Option<Uuid>) -> Result<Vec<BoatModel>> {
        let mut request = ApiRequest::get("models/").query("limit", LOOKUP_PAGE_SIZE);
        if let Some(brand_id) = brand_id {
            request = request.query("brand_id", brand_id);
        }
        self.client.execute_list(request).await
    }

    pub async fn ports(&self) -> Result<Vec<Port>> {
        self.client
            .execute_list(ApiRequest::get("ports/").query("limit", LOOKUP_PAGE_SIZE))
            .await
    }

    pub async fn attachments(&self, boat_id: Uuid) -> Result<Vec<BoatAttachment>> {
        self.client
            .get_list(&format!("boats/{}/attachments/", boat_id))
            .await
    }

    pub async fn upload_photo(&self, boat_id: Uuid, photo: FileUpload, order: i32) -> Result<BoatAttachment> {
        let request = ApiRequest::post(format!("boats/{}/attachments/", boat_id)).multipart(vec![
            FormField::file("file", photo),
            FormField::text("attachment_type", "photo"),
            FormField::text("order", order.to_string()),
        ]);
        self.client.execute_json(request).await
    }

    pub async fn delete_attachment(&self, boat_id: Uuid, attachment_id: Uuid) -> Result<()> {
        self.client
            .delete(&format!("boats/{}/attachments/{}/", boat_id, attachment_id))
            .await
    }
}
