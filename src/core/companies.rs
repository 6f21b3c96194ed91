use crate::core::client::{ApiClient, ApiRequest};
use crate::domain::model::{AccountCompany, AccountCompanyInput, Company, CompanyInput, CompanyService};
use crate::utils::error::{MarinexError, Result};
use uuid::Uuid;

/// Service providers (shipyards, mechanics, marinas) and the account's
/// preferred ones.
#[derive(Debug, Clone)]
pub struct CompanyDirectory {
    client: ApiClient,
}

impl CompanyDirectory {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn search(&self, term: Option<&str>) -> Result<Vec<Company>> {
        let mut request = ApiRequest::get("companies/");
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.query("search", term);
        }
        self.client.execute_list(request).await
    }

    pub async fn get(&self, company_id: Uuid) -> Result<Company> {
        self.client.get_json(&format!("companies/{}/", company_id)).await
    }

    pub async fn create(&self, input: &CompanyInput) -> Result<Company> {
        if input.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(MarinexError::Validation {
                message: "A company needs a name".to_string(),
            });
        }
        self.client.post_json("companies/", input).await
    }

    pub async fn update(&self, company_id: Uuid, input: &CompanyInput) -> Result<Company> {
        self.client
            .patch_json(&format!("companies/{}/", company_id), input)
            .await
    }

    pub async fn delete(&self, company_id: Uuid) -> Result<()> {
        self.client.delete(&format!("companies/{}/", company_id)).await
    }

    pub async fn services(&self, company_id: Uuid) -> Result<Vec<CompanyService>> {
        self.client
            .get_list(&format!("companies/{}/services/", company_id))
            .await
    }

    pub async fn preferred(&self) -> Result<Vec<AccountCompany>> {
        self.client.get_list("my-companies/").await
    }

    pub async fn link(&self, input: &AccountCompanyInput) -> Result<AccountCompany> {
        self.client.post_json("my-companies/", input).await
    }

    pub async fn unlink(&self, link_id: Uuid) -> Result<()> {
        self.client.delete(&format!("my-companies/{}/", link_id)).await
    }
}
