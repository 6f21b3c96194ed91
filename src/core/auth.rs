use crate::core::client::{ApiClient, ApiRequest, FormField};
use crate::domain::model::{FileUpload, ProfileUpdate, Registration, TokenPair, User, UserProfile};
use crate::utils::error::{MarinexError, Result};
use crate::utils::validation::validate_non_empty_string;
use serde::Deserialize;

/// 登入後應該前往的畫面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Dashboard,
    AddBoat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub landing: Landing,
}

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    profile_photo: Option<String>,
}

/// 後端沒有給出 detail 時使用通用訊息
fn login_failure(message: String) -> String {
    match message.as_str() {
        "" | "Unauthorized" | "Bad Request" => "Failed to login".to_string(),
        _ => message,
    }
}

/// Session-level operations: login, logout, profile.
pub struct AuthSession {
    client: ApiClient,
}

impl AuthSession {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().access_token().is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        validate_non_empty_string("username", username)?;
        validate_non_empty_string("password", password)?;

        let request = ApiRequest::post("token/")
            .public()
            .json(&serde_json::json!({ "username": username, "password": password }))?;

        let tokens: TokenPair = self
            .client
            .execute_json(request)
            .await
            .map_err(|e| match e {
                MarinexError::Unauthorized { message } => MarinexError::Unauthorized {
                    message: login_failure(message),
                },
                MarinexError::Api { status, message } if status < 500 => {
                    MarinexError::Unauthorized {
                        message: login_failure(message),
                    }
                }
                other => other,
            })?;

        self.client.session().store_tokens(&tokens)?;
        tracing::info!("🔓 Logged in as {}", username);

        let user = self.me().await?;
        let landing = if user.has_boats {
            Landing::Dashboard
        } else {
            Landing::AddBoat
        };

        Ok(LoginOutcome { user, landing })
    }

    /// 啟動時檢查既有 session；token 無效就清除
    pub async fn check_user(&self) -> Result<Option<UserProfile>> {
        if self.client.session().access_token().is_none() {
            return Ok(None);
        }

        match self.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::info!("Stored session is no longer valid: {}", e);
                self.client.session().clear()?;
                Ok(None)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.client.session().clear()?;
        tracing::info!("🔒 Session cleared");
        Ok(())
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.client.get_json("me/").await
    }

    pub async fn register(&self, registration: &Registration) -> Result<User> {
        validate_non_empty_string("username", &registration.username)?;
        validate_non_empty_string("password", &registration.password)?;
        validate_non_empty_string("email", &registration.email)?;
        validate_non_empty_string("account_name", &registration.account_name)?;

        let request = ApiRequest::post("register/").public().json(registration)?;
        self.client.execute_json(request).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.client.patch_json("me/", update).await
    }

    /// 上傳頭像，回傳新的照片 URL
    pub async fn upload_profile_photo(&self, photo: FileUpload) -> Result<Option<String>> {
        let request =
            ApiRequest::patch("me/").multipart(vec![FormField::file("profile_photo", photo)]);
        let response: PhotoResponse = self.client.execute_json(request).await?;
        Ok(response.profile_photo)
    }
}
