use crate::core::client::{ApiClient, ApiRequest};
use crate::domain::model::{NavigationPoint, NavigationRoute, NewPoint, NewRoute};
use crate::domain::ports::RouteRepository;
use crate::utils::error::{MarinexError, Result};
use async_trait::async_trait;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

/// 後端提供的匯出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerExport {
    Gpx,
    Kml,
}

impl ServerExport {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerExport::Gpx => "gpx",
            ServerExport::Kml => "kml",
        }
    }
}

impl FromStr for ServerExport {
    type Err = MarinexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gpx" => Ok(ServerExport::Gpx),
            "kml" => Ok(ServerExport::Kml),
            other => Err(MarinexError::Validation {
                message: format!("Unsupported export format '{}'", other),
            }),
        }
    }
}

/// Routes of a boat's logbook (`bitacora`) and their points.
#[derive(Debug, Clone)]
pub struct RouteService {
    client: ApiClient,
}

impl RouteService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, boat_id: Uuid) -> Result<Vec<NavigationRoute>> {
        let routes: Vec<NavigationRoute> = self
            .client
            .get_list(&format!("boats/{}/bitacora/", boat_id))
            .await?;
        tracing::debug!("Loaded {} routes for boat {}", routes.len(), boat_id);
        Ok(routes)
    }

    pub async fn get(&self, boat_id: Uuid, route_id: Uuid) -> Result<NavigationRoute> {
        self.client
            .get_json(&format!("boats/{}/bitacora/{}/", boat_id, route_id))
            .await
    }

    pub async fn create(&self, boat_id: Uuid, route: &NewRoute) -> Result<NavigationRoute> {
        self.client
            .post_json(&format!("boats/{}/bitacora/", boat_id), route)
            .await
    }

    pub async fn delete(&self, boat_id: Uuid, route_id: Uuid) -> Result<()> {
        self.client
            .delete(&format!("boats/{}/bitacora/{}/", boat_id, route_id))
            .await
    }

    fn point_request(route_id: Uuid, point: &NewPoint) -> Result<ApiRequest> {
        ApiRequest::post(format!("navigation/route/{}/point/", route_id)).json(point)
    }

    /// 新增一個點並解析後端回傳的點
    pub async fn post_point(&self, route_id: Uuid, point: &NewPoint) -> Result<Option<NavigationPoint>> {
        self.client
            .execute_optional(Self::point_request(route_id, point)?)
            .await
    }

    pub fn export_url(&self, route_id: Uuid, format: ServerExport) -> Result<Url> {
        self.client.url(&format!(
            "navigation/route/{}/export/{}/",
            route_id,
            format.as_str()
        ))
    }

    /// 下載後端產生的 GPX / KML
    pub async fn export(&self, route_id: Uuid, format: ServerExport) -> Result<String> {
        let request = ApiRequest::get(format!(
            "navigation/route/{}/export/{}/",
            route_id,
            format.as_str()
        ));
        self.client.execute_text(request).await
    }
}

#[async_trait]
impl RouteRepository for RouteService {
    async fn list_routes(&self, boat_id: Uuid) -> Result<Vec<NavigationRoute>> {
        self.list(boat_id).await
    }

    async fn create_route(&self, boat_id: Uuid, route: &NewRoute) -> Result<NavigationRoute> {
        self.create(boat_id, route).await
    }

    // 回應內容不一定是點，只看狀態碼
    async fn add_point(&self, route_id: Uuid, point: &NewPoint) -> Result<()> {
        self.client
            .execute_empty(Self::point_request(route_id, point)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::session::MemorySessionStore;
    use std::sync::Arc;

    #[test]
    fn test_export_url() {
        let client = ApiClient::new("http://127.0.0.1:8000/api/", Arc::new(MemorySessionStore::new())).unwrap();
        let routes = RouteService::new(client);
        let id = Uuid::nil();
        assert_eq!(
            routes.export_url(id, ServerExport::Kml).unwrap().as_str(),
            "http://127.0.0.1:8000/api/navigation/route/00000000-0000-0000-0000-000000000000/export/kml/"
        );
        assert_eq!("GPX".parse::<ServerExport>().unwrap(), ServerExport::Gpx);
        assert!("csv".parse::<ServerExport>().is_err());
    }

    #[tokio::test]
    async fn test_add_point_ignores_reply_body() {
        use crate::domain::model::PointKind;
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let route_id = Uuid::new_v4();
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/api/navigation/route/{}/point/", route_id))
                    .json_body_partial(r#"{"type": "stop", "speed": 0.0}"#);
                then.status(201).json_body(serde_json::json!({"status": "ok"}));
            })
            .await;

        let client = ApiClient::new(
            &server.url("/api/"),
            Arc::new(MemorySessionStore::with_tokens("access", None)),
        )
        .unwrap();
        let routes = RouteService::new(client);
        let point = NewPoint {
            lat: 39.55,
            lng: 2.6,
            speed: 0.0,
            kind: PointKind::Stop,
            recorded_at: chrono::Utc::now(),
        };

        routes.add_point(route_id, &point).await.unwrap();
        // 直接解析成點時，這種回應是錯誤
        assert!(routes.post_point(route_id, &point).await.is_err());
        mock.assert_hits_async(2).await;
    }
}
