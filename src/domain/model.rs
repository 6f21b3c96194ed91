use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// 後端的 DecimalField 以字串輸出（"1250.00"），偶爾是數字
mod decimal {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(n)) => Ok(Some(n)),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Raw::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// 列表端點可能回傳陣列或分頁物件 `{ "results": [...], "next": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl<T> ListResponse<T> {
    /// 下一頁的絕對網址，最後一頁或純陣列為 None
    pub fn next_page(&self) -> Option<&str> {
        match self {
            ListResponse::Plain(_) => None,
            ListResponse::Paginated { next, .. } => next.as_deref().filter(|n| !n.is_empty()),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paginated { results, .. } => results,
        }
    }
}

// ---------- auth ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub has_boats: bool,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    pub account_name: String,
}

// ---------- boats ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoatAttachment {
    pub id: Uuid,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub attachment_type: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Boat {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub port_name: Option<String>,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub draft: Option<f64>,
    #[serde(default)]
    pub engine_type: Option<String>,
    #[serde(default)]
    pub engine_power: Option<String>,
    #[serde(default)]
    pub attachments: Vec<BoatAttachment>,
    #[serde(default)]
    pub account: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoatInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_power: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoatBrand {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoatModel {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub brand: Option<Uuid>,
    #[serde(default)]
    pub brand_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Port {
    pub id: Uuid,
    pub name: String,
}

// ---------- documents ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub no_expiration: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub status: Option<Uuid>,
    #[serde(default)]
    pub periodization: Option<Uuid>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub periodization_name: Option<String>,
}

/// 上傳的附件檔案（multipart）
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInput {
    pub name: Option<String>,
    pub category: Option<Uuid>,
    pub notes: Option<String>,
    pub no_expiration: bool,
    pub expiration_date: Option<NaiveDate>,
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentCategory {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub level: u32,
}

/// AI 文件分析結果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub subcategory_id: Option<Uuid>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub no_expiration: bool,
    #[serde(default)]
    pub notes: String,
}

// ---------- tasks & works ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

pub type WorkStatus = TaskStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub level: u32,
}

pub type TaskCategory = Category;
pub type WorkCategory = Category;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<Uuid>,
    #[serde(default)]
    pub status_details: Option<TaskStatus>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub category_details: Option<TaskCategory>,
    #[serde(default)]
    pub assigned_user: Option<Uuid>,
    #[serde(default)]
    pub assigned_user_details: Option<User>,
}

impl Task {
    pub fn status_code(&self) -> Option<&str> {
        self.status_details.as_ref().map(|s| s.code.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Work {
    pub id: Uuid,
    #[serde(default)]
    pub account: Option<Uuid>,
    #[serde(default)]
    pub boat: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<Uuid>,
    #[serde(default)]
    pub status_details: Option<WorkStatus>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub category_details: Option<WorkCategory>,
    #[serde(default)]
    pub service_company: Option<Uuid>,
    #[serde(default)]
    pub service_company_details: Option<Company>,
    #[serde(default)]
    pub assigned_user: Option<Uuid>,
    #[serde(default)]
    pub assigned_user_details: Option<User>,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub cost_estimate: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    pub cost_final: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl Work {
    pub fn status_code(&self) -> Option<&str> {
        self.status_details.as_ref().map(|s| s.code.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_company: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_final: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

// ---------- companies ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub country: Option<Uuid>,
    #[serde(default)]
    pub province: Option<Uuid>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub province_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyService {
    pub id: Uuid,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub espace_name: Option<String>,
}

/// 帳戶常用的服務公司
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountCompany {
    pub id: Uuid,
    pub account: Uuid,
    pub company: Uuid,
    #[serde(default)]
    pub company_details: Option<Company>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCompanyInput {
    pub account: Uuid,
    pub company: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------- navigation ----------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    #[default]
    Gps,
    Start,
    End,
    Stop,
    Anchor,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointKind::Gps => "gps",
            PointKind::Start => "start",
            PointKind::End => "end",
            PointKind::Stop => "stop",
            PointKind::Anchor => "anchor",
        }
    }
}

impl std::fmt::Display for PointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gps" => Ok(PointKind::Gps),
            "start" => Ok(PointKind::Start),
            "end" => Ok(PointKind::End),
            "stop" => Ok(PointKind::Stop),
            "anchor" => Ok(PointKind::Anchor),
            other => Err(format!("unknown point type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationPoint {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: PointKind,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationRoute {
    pub id: Uuid,
    #[serde(default)]
    pub account: Option<Uuid>,
    #[serde(default)]
    pub boat: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: Vec<NavigationPoint>,
}

impl NavigationRoute {
    /// 路線開始的日期（`YYYY-MM-DD`），用於日曆篩選
    pub fn start_day(&self) -> Option<String> {
        self.start_time
            .map(|t| t.date_naive().format("%Y-%m-%d").to_string())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Route")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoute {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPoint {
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub recorded_at: DateTime<Utc>,
}
