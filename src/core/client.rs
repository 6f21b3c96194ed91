use crate::config::ClientConfig;
use crate::domain::model::{AccessToken, FileUpload, ListResponse};
use crate::domain::ports::SessionStore;
use crate::utils::error::{MarinexError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const REFRESH_PATH: &str = "token/refresh/";

#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: FileUpload },
}

impl FormField {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        FormField::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn file(name: &str, upload: FileUpload) -> Self {
        FormField::File {
            name: name.to_string(),
            upload,
        }
    }
}

/// Request body kept in a rebuildable form so a request can be resent after
/// a token refresh (a `reqwest` multipart body cannot be cloned once built).
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    /// 不帶 Authorization header，也不觸發 token 刷新
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// REST client for the Marinex backend.
///
/// Authenticated requests carry the stored access token. When the backend
/// answers 401 and a refresh token is stored, the client refreshes the access
/// token once and resends the original request once; a failed refresh clears
/// the session.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_timeout(base_url, session, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        // 保證結尾有 '/'，否則 Url::join 會吃掉最後一段路徑
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| MarinexError::InvalidConfigValue {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn from_config(config: &ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_timeout(&config.api.base_url, session, config.timeout())
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| MarinexError::Validation {
                message: format!("Invalid API path '{}': {}", path, e),
            })
    }

    fn build(&self, request: &ApiRequest, token: Option<&str>) -> Result<RequestBuilder> {
        let url = self.url(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => {
                let mut form = Form::new();
                for field in fields {
                    form = match field {
                        FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                        FormField::File { name, upload } => {
                            let part = Part::bytes(upload.bytes.clone())
                                .file_name(upload.filename.clone())
                                .mime_str(&upload.mime_type)?;
                            form.part(name.clone(), part)
                        }
                    };
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }

    /// 送出請求；401 時以 refresh token 換新 access token 並重送一次
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let token = if request.authenticated {
            self.session.access_token()
        } else {
            None
        };

        tracing::debug!("{} {}", request.method, request.path);
        let response = self.build(request, token.as_deref())?.send().await?;

        if !request.authenticated || response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        let Some(refresh) = self.session.refresh_token() else {
            tracing::debug!("401 on {} without a refresh token", request.path);
            return Self::check(response).await;
        };

        tracing::info!("🔑 Access token rejected on {}, refreshing session", request.path);
        let access = match self.refresh_access(&refresh).await {
            Ok(access) => access,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.session.clear()?;
                return Err(MarinexError::SessionExpired {
                    message: e.to_string(),
                });
            }
        };
        self.session.store_access(&access)?;

        // 只重送一次，第二次 401 直接回報錯誤
        let retried = self.build(request, Some(&access))?.send().await?;
        Self::check(retried).await
    }

    async fn refresh_access(&self, refresh: &str) -> Result<String> {
        let request = ApiRequest::post(REFRESH_PATH)
            .public()
            .json(&serde_json::json!({ "refresh": refresh }))?;
        let response = Self::check(self.build(&request, None)?.send().await?).await?;
        let token: AccessToken = response.json().await?;
        Ok(token.access)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Unauthorized: {}", message);
            return Err(MarinexError::Unauthorized { message });
        }

        Err(MarinexError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(&request).await?;
        Ok(response.json().await?)
    }

    /// 回應內容可以是空的（204）或 `null`
    pub async fn execute_optional<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Option<T>> {
        let response = self.send(&request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice::<Option<T>>(&bytes)?)
    }

    /// 讀取列表，分頁回應會沿著 `next` 一路讀到最後一頁
    pub async fn execute_list<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Vec<T>> {
        let authenticated = request.authenticated;
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut request = request;

        loop {
            let Some(page) = self.execute_optional::<ListResponse<T>>(request).await? else {
                break;
            };
            let next = page.next_page().map(str::to_string);
            items.extend(page.into_vec());

            let Some(next) = next else { break };
            // `next` 通常是絕對網址，也接受以 `/` 開頭的路徑
            let next_url = self.base_url.join(&next).map_err(|e| MarinexError::Validation {
                message: format!("Invalid next page '{}': {}", next, e),
            })?;
            if !next_url.as_str().starts_with(self.base_url.as_str()) {
                return Err(MarinexError::Validation {
                    message: format!("Next page '{}' is outside the API", next),
                });
            }
            if !visited.insert(next_url.to_string()) {
                tracing::warn!("Pagination loops back to {}, stopping", next_url);
                break;
            }

            tracing::debug!("📄 Following next page {} ({} items so far)", next_url, items.len());
            request = ApiRequest::get(next_url.to_string());
            request.authenticated = authenticated;
        }

        Ok(items)
    }

    pub async fn execute_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(&request).await?;
        Ok(())
    }

    pub async fn execute_text(&self, request: ApiRequest) -> Result<String> {
        let response = self.send(&request).await?;
        Ok(response.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(ApiRequest::get(path)).await
    }

    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        self.execute_list(ApiRequest::get(path)).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute_json(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute_empty(ApiRequest::delete(path)).await
    }
}

/// 後端錯誤格式：`{"detail": ...}`、`{"error": ...}` 或欄位錯誤 `{"name": ["..."]}`
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match &value {
        serde_json::Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(serde_json::Value::String(s)) = map.get(key) {
                    return Some(s.clone());
                }
            }
            let fields: Vec<String> = map
                .iter()
                .map(|(field, errors)| match errors {
                    serde_json::Value::Array(items) => format!(
                        "{}: {}",
                        field,
                        items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                    other => format!("{}: {}", field, other),
                })
                .collect();
            (!fields.is_empty()).then(|| fields.join("; "))
        }
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::session::MemorySessionStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Arc::new(MemorySessionStore::new())).unwrap()
    }

    #[test]
    fn test_url_join_keeps_api_prefix() {
        let c = client("http://127.0.0.1:8000/api");
        assert_eq!(
            c.url("boats/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/boats/"
        );
        assert_eq!(
            c.url("/token/refresh/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/token/refresh/"
        );
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"detail": "No active account found"}"#).as_deref(),
            Some("No active account found")
        );
        assert_eq!(
            extract_error_message(r#"{"error": "Lat/Lng required"}"#).as_deref(),
            Some("Lat/Lng required")
        );
        assert_eq!(
            extract_error_message(r#"{"name": ["This field is required."]}"#).as_deref(),
            Some("name: This field is required.")
        );
        assert_eq!(extract_error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_request_builder_helpers() {
        let request = ApiRequest::get("companies/")
            .query("search", "nautic")
            .public();
        assert_eq!(request.query, vec![("search".to_string(), "nautic".to_string())]);
        assert!(!request.authenticated);
        assert_eq!(request.body, RequestBody::Empty);
    }
}
