//! HoYoLAB game-record client.
//!
//! Fetches the daily note (GET `dailyNote`) and the character roster (POST
//! `character/list`) for one account, authenticated with the account's
//! `ltuid_v2`/`ltoken_v2` cookies and a signed `DS` header.

mod signing;

pub use signing::{dynamic_secret, generate_ds, parse_date_header, server_region};

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::HoyolabError;
use crate::models::{ApiEnvelope, CharacterListData, DailyNoteData};
use resinwatch_core::accounts::Account;
use resinwatch_core::errors::Result;
use resinwatch_core::snapshots::{FetchedStatus, RawCharacter, RawStatusPayload};
use resinwatch_core::status::StatusProviderTrait;

const BASE_URL: &str = "https://bbs-api-os.hoyolab.com/game_record/genshin/api";
const PROVIDER_ID: &str = "HOYOLAB";
const APP_VERSION: &str = "1.5.0";
const CLIENT_TYPE: &str = "5";
const LANGUAGE: &str = "en-us";

/// Game-record API client; one instance serves every account.
pub struct HoyolabClient {
    client: Client,
    base_url: String,
}

impl Default for HoyolabClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HoyolabClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root (e.g. a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, request: RequestBuilder, account: &Account) -> RequestBuilder {
        let credentials = &account.credentials;
        request
            .header(
                "Cookie",
                format!(
                    "ltuid_v2={}; ltoken_v2={}",
                    credentials.ltuid_v2, credentials.ltoken_v2
                ),
            )
            .header("DS", generate_ds(Utc::now()))
            .header("x-rpc-app_version", APP_VERSION)
            .header("x-rpc-client_type", CLIENT_TYPE)
            .header("x-rpc-language", LANGUAGE)
    }

    /// Sends the request and unwraps the API envelope. Also returns the
    /// server's `Date` header when it parses.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> std::result::Result<(T, Option<DateTime<Utc>>), HoyolabError> {
        debug!("{} request: {}", PROVIDER_ID, endpoint);
        let response = request.send().await?;

        let status = response.status();
        let server_time = response
            .headers()
            .get(reqwest::header::DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_date_header);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HoyolabError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&text)
            .map_err(|e| HoyolabError::Parse(format!("{}: {}", endpoint, e)))?;
        Ok((envelope.into_data()?, server_time))
    }

    /// Daily note of `account`; `server_time` is taken from the `Date` header.
    pub async fn daily_note(
        &self,
        account: &Account,
    ) -> std::result::Result<RawStatusPayload, HoyolabError> {
        let uid = account.credentials.uid.trim();
        let region = server_region(uid)?;
        let request = self
            .client
            .get(format!("{}/dailyNote", self.base_url))
            .query(&[("server", region), ("role_id", uid)]);

        let (data, server_time): (DailyNoteData, _) = self
            .send(self.authorized(request, account), "dailyNote")
            .await?;
        let mut raw = data.into_raw();
        raw.server_time = server_time;
        Ok(raw)
    }

    /// Owned characters of `account`, in upstream order.
    pub async fn character_list(
        &self,
        account: &Account,
    ) -> std::result::Result<Vec<RawCharacter>, HoyolabError> {
        let uid = account.credentials.uid.trim();
        let region = server_region(uid)?;
        let request = self
            .client
            .post(format!("{}/character/list", self.base_url))
            .json(&json!({ "role_id": uid, "server": region }));

        let (data, _): (CharacterListData, _) = self
            .send(self.authorized(request, account), "character/list")
            .await?;
        Ok(data.into_raw())
    }
}

#[async_trait]
impl StatusProviderTrait for HoyolabClient {
    fn name(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch(&self, account: &Account) -> Result<FetchedStatus> {
        let fetched_at = Utc::now();

        let status = self.daily_note(account).await.map_err(|e| {
            warn!(account = %account.display_name, "Daily note fetch failed: {}", e);
            e
        })?;

        // A missing roster only skips character diffs for this cycle.
        let roster = match self.character_list(account).await {
            Ok(characters) => Some(characters),
            Err(e) => {
                warn!(account = %account.display_name, "Character list fetch failed: {}", e);
                None
            }
        };

        Ok(FetchedStatus {
            status,
            roster,
            fetched_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resinwatch_core::accounts::AccountCredentials;

    fn account(uid: &str) -> Account {
        Account::new(
            "Main",
            "genshin_main.sqlite3",
            AccountCredentials {
                uid: uid.to_string(),
                ltuid_v2: "1234".to_string(),
                ltoken_v2: "v2_secret".to_string(),
            },
        )
    }

    #[test]
    fn test_provider_id() {
        assert_eq!(HoyolabClient::new().name(), "HOYOLAB");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let client = HoyolabClient::new().with_base_url("http://127.0.0.1:9/api/");
        assert_eq!(client.base_url, "http://127.0.0.1:9/api");
    }

    #[test]
    fn test_authorized_request_headers() {
        let client = HoyolabClient::new();
        let request = client
            .authorized(client.client.get("http://127.0.0.1:9/dailyNote"), &account("812345678"))
            .build()
            .unwrap();
        let headers = request.headers();
        assert_eq!(headers["Cookie"], "ltuid_v2=1234; ltoken_v2=v2_secret");
        assert_eq!(headers["x-rpc-client_type"], "5");
        assert_eq!(headers["DS"].to_str().unwrap().split(',').count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_region_fails_before_any_request() {
        let client = HoyolabClient::new().with_base_url("http://127.0.0.1:9");
        let err = client.fetch(&account("123")).await.unwrap_err();
        assert!(matches!(err, resinwatch_core::Error::Fetch(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_fetch_failure() {
        // Port 9 (discard) is closed on test hosts, so the connection is refused.
        let client = HoyolabClient::new().with_base_url("http://127.0.0.1:9");
        let err = client.fetch(&account("812345678")).await.unwrap_err();
        assert!(matches!(err, resinwatch_core::Error::Fetch(_)));
    }
}
