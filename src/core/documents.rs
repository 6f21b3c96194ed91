use crate::core::client::{ApiClient, ApiRequest, FormField};
use crate::domain::model::{Document, DocumentAnalysis, DocumentCategory, DocumentInput, FileUpload};
use crate::utils::error::{MarinexError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 文件的有效狀態（列表上的徽章）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentValidity {
    InForce,
    Expired,
    NotApplicable,
}

impl DocumentValidity {
    pub fn of(document: &Document, now: DateTime<Utc>) -> Self {
        if document.no_expiration {
            return DocumentValidity::InForce;
        }
        match document.expiration_date {
            None => DocumentValidity::NotApplicable,
            Some(date) if date < now => DocumentValidity::Expired,
            Some(_) => DocumentValidity::InForce,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentValidity::InForce => "in force",
            DocumentValidity::Expired => "expired",
            DocumentValidity::NotApplicable => "n/a",
        }
    }
}

fn document_form(input: &DocumentInput) -> Vec<FormField> {
    let mut fields = Vec::new();
    if let Some(name) = &input.name {
        fields.push(FormField::text("name", name.clone()));
    }
    if let Some(category) = input.category {
        fields.push(FormField::text("category", category.to_string()));
    }
    if let Some(notes) = &input.notes {
        fields.push(FormField::text("notes", notes.clone()));
    }
    fields.push(FormField::text("no_expiration", input.no_expiration.to_string()));
    // 沒有期限時不送日期
    if !input.no_expiration {
        if let Some(date) = input.expiration_date {
            fields.push(FormField::text("expiration_date", date.format("%Y-%m-%d").to_string()));
        }
    }
    if let Some(file) = &input.file {
        fields.push(FormField::file("file", file.clone()));
    }
    fields
}

#[derive(Debug, Clone)]
pub struct DocumentService {
    client: ApiClient,
}

impl DocumentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, boat_id: Uuid) -> Result<Vec<Document>> {
        self.client
            .get_list(&format!("boats/{}/documents/", boat_id))
            .await
    }

    pub async fn create(&self, boat_id: Uuid, input: &DocumentInput) -> Result<Document> {
        if input.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(MarinexError::Validation {
                message: "A document needs a name".to_string(),
            });
        }

        let request = ApiRequest::post(format!("boats/{}/documents/", boat_id))
            .multipart(document_form(input));
        let document: Document = self.client.execute_json(request).await?;
        tracing::info!("📄 Created document {} on boat {}", document.name, boat_id);
        Ok(document)
    }

    pub async fn update(&self, boat_id: Uuid, document_id: Uuid, input: &DocumentInput) -> Result<Document> {
        let request = ApiRequest::patch(format!("boats/{}/documents/{}/", boat_id, document_id))
            .multipart(document_form(input));
        self.client.execute_json(request).await
    }

    pub async fn delete(&self, boat_id: Uuid, document_id: Uuid) -> Result<()> {
        self.client
            .delete(&format!("boats/{}/documents/{}/", boat_id, document_id))
            .await
    }

    pub async fn categories(&self) -> Result<Vec<DocumentCategory>> {
        self.client.get_list("document-categories/").await
    }

    /// 上傳檔案給後端 AI 分析，取得建議的名稱、分類與到期日
    pub async fn analyze(&self, file: FileUpload) -> Result<DocumentAnalysis> {
        tracing::info!("🤖 Sending {} for analysis", file.filename);
        let request =
            ApiRequest::post("ai/analyze-document/").multipart(vec![FormField::file("file", file)]);
        self.client.execute_json(request).await
    }
}

impl DocumentAnalysis {
    /// 把分析結果套用到表單上；分析沒給的欄位保留原值
    pub fn apply_to(&self, input: &mut DocumentInput) {
        if !self.name.is_empty() {
            input.name = Some(self.name.clone());
        }
        if let Some(category) = self.subcategory_id.or(self.category_id) {
            input.category = Some(category);
        }
        if self.expiration_date.is_some() {
            input.expiration_date = self.expiration_date;
        }
        input.no_expiration = self.no_expiration;
        if !self.notes.is_empty() {
            input.notes = Some(self.notes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn document(no_expiration: bool, expiration: Option<DateTime<Utc>>) -> Document {
        Document {
            id: Uuid::new_v4(),
            name: "Seguro".to_string(),
            notes: None,
            file: None,
            expiration_date: expiration,
            no_expiration,
            created_at: None,
            category: None,
            status: None,
            periodization: None,
            category_name: None,
            status_name: None,
            periodization_name: None,
        }
    }

    #[test]
    fn test_document_validity() {
        let now = Utc::now();
        assert_eq!(
            DocumentValidity::of(&document(true, Some(now - Duration::days(3))), now),
            DocumentValidity::InForce
        );
        assert_eq!(
            DocumentValidity::of(&document(false, None), now),
            DocumentValidity::NotApplicable
        );
        assert_eq!(
            DocumentValidity::of(&document(false, Some(now - Duration::days(1))), now),
            DocumentValidity::Expired
        );
        assert_eq!(
            DocumentValidity::of(&document(false, Some(now + Duration::days(30))), now),
            DocumentValidity::InForce
        );
    }

    #[test]
    fn test_form_skips_date_without_expiration() {
        let input = DocumentInput {
            name: Some("ITB".to_string()),
            no_expiration: true,
            expiration_date: NaiveDate::from_ymd_opt(2028, 1, 15),
            ..Default::default()
        };
        let fields = document_form(&input);
        assert!(fields.contains(&FormField::text("no_expiration", "true")));
        assert!(!fields
            .iter()
            .any(|f| matches!(f, FormField::Text { name, .. } if name == "expiration_date")));
    }

    #[test]
    fn test_analysis_prefers_subcategory() {
        let category = Uuid::new_v4();
        let subcategory = Uuid::new_v4();
        let analysis = DocumentAnalysis {
            name: "Seguro de Responsabilidad Civil".to_string(),
            category_id: Some(category),
            subcategory_id: Some(subcategory),
            expiration_date: NaiveDate::from_ymd_opt(2028, 1, 15),
            no_expiration: false,
            notes: String::new(),
        };
        let mut input = DocumentInput {
            notes: Some("keep me".to_string()),
            ..Default::default()
        };
        analysis.apply_to(&mut input);
        assert_eq!(input.category, Some(subcategory));
        assert_eq!(input.notes.as_deref(), Some("keep me"));
        assert_eq!(input.expiration_date, NaiveDate::from_ymd_opt(2028, 1, 15));
    }
}
