//! Production HTTP client for the remote catalog/profile API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::entity::ruleset::Ruleset;

use super::OsuApi;
use super::error::{ApiError, Result, classify_status};
use super::types::{BeatmapDetail, MapsetDetail, MapsetSearchPage, Score, UserProfile};

/// OAuth2 client-credentials pair for the remote service.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Default base URL of the remote service.
pub const DEFAULT_BASE_URL: &str = "https://osu.ppy.sh";

/// Refresh the cached token this long before its reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::seconds(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct PassedBeatmapsResponse {
    beatmaps_passed: Vec<BeatmapDetail>,
}

/// HTTP client with lazy OAuth2 client-credentials authentication.
///
/// The token is fetched on first use and re-fetched shortly before expiry;
/// request methods otherwise map straight onto the trait operations.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: ApiCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl ApiClient {
    /// Create a client against the default remote service.
    pub fn new(credentials: ApiCredentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a client against a specific base URL (tests, staging).
    pub fn with_base_url(credentials: ApiCredentials, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, fetching or refreshing as needed.
    async fn bearer_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at - TOKEN_EXPIRY_MARGIN > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/oauth/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", "public"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Auth(format!(
                "token endpoint returned status {}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response.json().await?;
        let cached = CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        };
        let bearer = cached.access_token.clone();
        *guard = Some(cached);
        Ok(bearer)
    }

    /// GET an API resource and deserialize the JSON body.
    ///
    /// `resource` is the path under `/api/v2`, used verbatim in error context.
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let token = self.bearer_token().await?;
        let url = format!("{}/api/v2/{}", self.base_url, resource);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), resource));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl OsuApi for ApiClient {
    async fn search_ranked_mapsets(&self, cursor: Option<&str>) -> Result<MapsetSearchPage> {
        let mut query = vec![
            ("sort".to_string(), "ranked_desc".to_string()),
            ("nsfw".to_string(), "true".to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor_string".to_string(), cursor.to_string()));
        }
        self.get_json("beatmapsets/search", &query).await
    }

    async fn get_mapset(&self, mapset_id: i64) -> Result<MapsetDetail> {
        self.get_json(&format!("beatmapsets/{}", mapset_id), &[])
            .await
    }

    async fn get_user(&self, user_id: i64) -> Result<UserProfile> {
        self.get_json(&format!("users/{}", user_id), &[]).await
    }

    async fn get_user_recent_scores(
        &self,
        user_id: i64,
        ruleset: Ruleset,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Score>> {
        let query = vec![
            ("mode".to_string(), ruleset.as_str().to_string()),
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
            ("include_fails".to_string(), "0".to_string()),
            ("legacy_only".to_string(), "0".to_string()),
        ];
        self.get_json(&format!("users/{}/scores/recent", user_id), &query)
            .await
    }

    async fn get_passed_beatmaps(
        &self,
        user_id: i64,
        mapset_ids: &[i64],
    ) -> Result<Vec<BeatmapDetail>> {
        let mut query = vec![
            // Converts count; difficulty-reduction mods count.
            ("exclude_converts".to_string(), "0".to_string()),
            ("no_diff_reduction".to_string(), "0".to_string()),
        ];
        for id in mapset_ids {
            query.push(("beatmapset_ids[]".to_string(), id.to_string()));
        }
        let response: PassedBeatmapsResponse = self
            .get_json(&format!("users/{}/beatmaps-passed", user_id), &query)
            .await?;
        Ok(response.beatmaps_passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::with_base_url(
            ApiCredentials {
                client_id: "1".into(),
                client_secret: "s".into(),
            },
            "https://example.com/",
        );
        assert_eq!(client.base_url, "https://example.com");
    }

    #[test]
    fn test_passed_beatmaps_response_shape() {
        let json = r#"{"beatmaps_passed": [
            {"id": 9, "beatmapset_id": 4, "status": "ranked",
             "version": "Insane", "mode": "fruits", "difficulty_rating": 4.2,
             "convert": true}
        ]}"#;
        let parsed: PassedBeatmapsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.beatmaps_passed.len(), 1);
        assert_eq!(parsed.beatmaps_passed[0].mode, Ruleset::Catch);
    }
}
