//! Authenticated landcover classification provider.
//!
//! The service hands out short-lived bearer tokens. A token is obtained by
//! POSTing the configured credentials to the auth URL and is shared by every
//! tile request until it expires (see [`SessionCache`]).
//!
//! Tile URLs come from a template with `{x}`, `{y}` and `{z}` placeholders.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::session::SessionCache;
use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, AsyncProvider, LayerKind, ProviderError};

/// Token response returned by the auth endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Connection settings for the classification service.
#[derive(Debug, Clone)]
pub struct ClassificationEndpoint {
    /// Tile URL template, e.g. `https://host/tiles/{z}/{x}/{y}.png`
    pub tile_url: String,
    pub auth_url: String,
    /// JSON body sent to `auth_url`
    pub credentials: String,
}

/// Classification provider backed by a session-token cache.
pub struct ClassificationProvider<C: AsyncHttpClient> {
    http_client: C,
    endpoint: ClassificationEndpoint,
    session: SessionCache,
}

impl<C: AsyncHttpClient> ClassificationProvider<C> {
    pub fn new(http_client: C, endpoint: ClassificationEndpoint, session_ttl: Duration) -> Self {
        Self {
            http_client,
            endpoint,
            session: SessionCache::new(session_ttl),
        }
    }

    fn tile_url(&self, tile: TileCoord) -> String {
        self.endpoint
            .tile_url
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{z}", &tile.zoom.to_string())
    }

    async fn authenticate(&self) -> Result<(String, Option<Duration>), ProviderError> {
        debug!(url = %self.endpoint.auth_url, "Requesting classification session");
        let body = self
            .http_client
            .post_json(&self.endpoint.auth_url, &self.endpoint.credentials)
            .await?;

        let parsed: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse session token: {}", e))
        })?;
        if parsed.access_token.is_empty() {
            return Err(ProviderError::Authentication(
                "Empty access token in session response".to_string(),
            ));
        }

        Ok((parsed.access_token, parsed.expires_in.map(Duration::from_secs)))
    }

    async fn token(&self) -> Result<String, ProviderError> {
        self.session.get_or_refresh(|| self.authenticate()).await
    }
}

impl<C: AsyncHttpClient> AsyncProvider for ClassificationProvider<C> {
    async fn fetch(&self, tile: TileCoord, layer: LayerKind) -> Result<Vec<u8>, ProviderError> {
        if layer != LayerKind::Classification {
            return Err(ProviderError::UnsupportedLayer(layer));
        }
        let url = self.tile_url(tile);

        let token = self.token().await?;
        match self.http_client.get_with_bearer(&url, &token).await {
            Err(ProviderError::Authentication(reason)) => {
                // Token revoked server-side before its expiry; one fresh attempt.
                warn!(tile = %tile, reason = %reason, "Session rejected, re-authenticating");
                self.session.invalidate().await;
                let token = self.token().await?;
                self.http_client.get_with_bearer(&url, &token).await
            }
            other => other,
        }
    }

    fn name(&self) -> &str {
        "Classification"
    }

    fn supports(&self, layer: LayerKind) -> bool {
        layer == LayerKind::Classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Recorded, RecordingHttpClient};
    use std::sync::Arc;

    fn endpoint() -> ClassificationEndpoint {
        ClassificationEndpoint {
            tile_url: "https://classify.test/tiles/{z}/{x}/{y}.png".into(),
            auth_url: "https://classify.test/auth".into(),
            credentials: r#"{"client_id":"id","client_secret":"secret"}"#.into(),
        }
    }

    fn token_body(token: &str, expires_in: u64) -> Result<Vec<u8>, ProviderError> {
        Ok(format!(r#"{{"access_token":"{}","expires_in":{}}}"#, token, expires_in).into_bytes())
    }

    #[test]
    fn test_tile_url_template() {
        let provider = ClassificationProvider::new(
            RecordingHttpClient::default(),
            endpoint(),
            Duration::from_secs(600),
        );
        assert_eq!(
            provider.tile_url(TileCoord::new(10, 20, 13)),
            "https://classify.test/tiles/13/10/20.png"
        );
    }

    #[tokio::test]
    async fn test_fetch_uses_bearer_token() {
        let client = RecordingHttpClient::new(vec![token_body("tok", 3600)], vec![Ok(vec![7])]);
        let provider = ClassificationProvider::new(client, endpoint(), Duration::from_secs(600));

        let bytes = provider
            .fetch(TileCoord::new(1, 2, 3), LayerKind::Classification)
            .await
            .unwrap();
        assert_eq!(bytes, vec![7]);

        let requests = provider.http_client.requests();
        assert_eq!(
            requests[0],
            Recorded::Post(
                "https://classify.test/auth".into(),
                r#"{"client_id":"id","client_secret":"secret"}"#.into()
            )
        );
        assert_eq!(
            requests[1],
            Recorded::Bearer("https://classify.test/tiles/3/1/2.png".into(), "tok".into())
        );
    }

    #[tokio::test]
    async fn test_session_reused_across_fetches() {
        let client = RecordingHttpClient::new(vec![token_body("tok", 3600)], vec![Ok(vec![1])]);
        let provider = ClassificationProvider::new(client, endpoint(), Duration::from_secs(600));

        for x in 0..5 {
            provider
                .fetch(TileCoord::new(x, 0, 5), LayerKind::Classification)
                .await
                .unwrap();
        }
        assert_eq!(provider.http_client.post_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_authenticate_once() {
        let client = RecordingHttpClient::new(vec![token_body("tok", 3600)], vec![Ok(vec![1])]);
        let provider = Arc::new(ClassificationProvider::new(
            client,
            endpoint(),
            Duration::from_secs(600),
        ));

        let fetches = (0..8).map(|x| {
            let provider = Arc::clone(&provider);
            async move {
                provider
                    .fetch(TileCoord::new(x, 0, 5), LayerKind::Classification)
                    .await
            }
        });
        for result in futures::future::join_all(fetches).await {
            assert!(result.is_ok());
        }
        assert_eq!(provider.http_client.post_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_reauthenticates() {
        let client = RecordingHttpClient::new(
            vec![token_body("first", 0), token_body("second", 3600)],
            vec![Ok(vec![1])],
        );
        let provider = ClassificationProvider::new(client, endpoint(), Duration::from_secs(600));

        provider
            .fetch(TileCoord::new(0, 0, 5), LayerKind::Classification)
            .await
            .unwrap();
        provider
            .fetch(TileCoord::new(1, 0, 5), LayerKind::Classification)
            .await
            .unwrap();

        let bearers: Vec<_> = provider
            .http_client
            .requests()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Bearer(_, token) => Some(token),
                _ => None,
            })
            .collect();
        assert_eq!(bearers, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_unauthorized_retries_once_with_new_token() {
        let client = RecordingHttpClient::new(
            vec![token_body("stale", 3600), token_body("fresh", 3600)],
            vec![
                Err(ProviderError::Authentication("HTTP 401".into())),
                Ok(vec![5]),
            ],
        );
        let provider = ClassificationProvider::new(client, endpoint(), Duration::from_secs(600));

        let bytes = provider
            .fetch(TileCoord::new(0, 0, 5), LayerKind::Classification)
            .await
            .unwrap();
        assert_eq!(bytes, vec![5]);
        assert_eq!(provider.http_client.post_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let client = RecordingHttpClient::new(vec![Ok(b"not json".to_vec())], vec![Ok(vec![1])]);
        let provider = ClassificationProvider::new(client, endpoint(), Duration::from_secs(600));

        let err = provider
            .fetch(TileCoord::new(0, 0, 5), LayerKind::Classification)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_rejects_other_layers() {
        let provider = ClassificationProvider::new(
            RecordingHttpClient::default(),
            endpoint(),
            Duration::from_secs(600),
        );
        assert!(!provider.supports(LayerKind::Terrain));
        let err = provider
            .fetch(TileCoord::new(0, 0, 5), LayerKind::Terrain)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::UnsupportedLayer(LayerKind::Terrain));
        assert!(provider.http_client.requests().is_empty());
    }
}
