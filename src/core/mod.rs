pub mod auth;
pub mod boats;
pub mod client;
pub mod companies;
pub mod documents;
pub mod kpi;
pub mod navigation;
pub mod tasks;
pub mod works;

pub use crate::domain::ports::{RouteRepository, SessionStore};
pub use crate::utils::error::Result;
pub use auth::{AuthSession, Landing, LoginOutcome};
pub use boats::BoatService;
pub use client::{ApiClient, ApiRequest, FormField, RequestBody};
pub use companies::CompanyDirectory;
pub use documents::{DocumentService, DocumentValidity};
pub use kpi::{fetch_dashboard, Dashboard, DashboardStats};
pub use navigation::{RouteService, ServerExport};
pub use tasks::{CategoryFilter, TaskService};
pub use works::WorkService;
