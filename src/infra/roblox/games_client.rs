use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::stats::{FetchError, GameStats, StatsFetcher};

const DEFAULT_BASE_URL: &str = "https://games.roblox.com";

/// Body of `GET /v1/games?universeIds=...`. Only the two fields the tracker
/// reports are modeled; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct GamesResponse {
    #[serde(default)]
    data: Vec<GameEntry>,
}

#[derive(Debug, Deserialize)]
struct GameEntry {
    playing: u64,
    visits: u64,
}

/// Roblox games-metadata client. One request per fetch, no retries: a bad
/// tick just waits for the next one.
pub struct RobloxGamesClient {
    client: Client,
    base_url: String,
}

impl RobloxGamesClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent("GameStatsBot/1.0")
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn extract_stats(body: GamesResponse) -> Result<GameStats, FetchError> {
        let entry = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MalformedResponse("empty data list".to_string()))?;

        Ok(GameStats {
            playing: entry.playing,
            visits: entry.visits,
        })
    }
}

#[async_trait]
impl StatsFetcher for RobloxGamesClient {
    async fn fetch(&self, universe_id: u64) -> Result<GameStats, FetchError> {
        let url = format!("{}/v1/games", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("universeIds", universe_id.to_string())])
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: GamesResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        Self::extract_stats(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<GameStats, FetchError> {
        let body: GamesResponse = serde_json::from_str(raw)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
        RobloxGamesClient::extract_stats(body)
    }

    #[test]
    fn parses_first_data_entry() {
        let stats = parse(
            r#"{"data":[{"id":42,"name":"Some Game","playing":317,"visits":4210}]}"#,
        )
        .unwrap();
        assert_eq!(stats, GameStats { playing: 317, visits: 4210 });
    }

    #[test]
    fn empty_data_list_is_a_failure() {
        assert!(matches!(
            parse(r#"{"data":[]}"#),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_data_field_is_a_failure() {
        assert!(matches!(
            parse(r#"{"errors":[{"code":400}]}"#),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_stat_fields_are_a_failure() {
        assert!(matches!(
            parse(r#"{"data":[{"id":42,"name":"Some Game"}]}"#),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_collapses_to_http_failure() {
        // Port 1 on localhost refuses connections immediately.
        let client = RobloxGamesClient::with_base_url("http://127.0.0.1:1");
        assert!(matches!(
            client.fetch(42).await,
            Err(FetchError::Http(_))
        ));
    }
}
