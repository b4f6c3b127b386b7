use async_trait::async_trait;

use crate::accounts::Account;
use crate::errors::Result;
use crate::snapshots::FetchedStatus;

/// Source of raw daily note and roster payloads for an account.
///
/// Implementations map transport and upstream API failures to `Error::Fetch`.
#[async_trait]
pub trait StatusProviderTrait: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self, account: &Account) -> Result<FetchedStatus>;
}
