//! Subscription fetching over HTTP(S).

use std::time::Duration;

use tracing::info;

use crate::subscription::{self, ImportReport};
use crate::LinkError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("tunkit/", env!("CARGO_PKG_VERSION"));

/// Fetch a subscription URL and run it through [`subscription::import`].
pub async fn fetch_subscription(url: &str) -> Result<ImportReport, LinkError> {
    let body = fetch_text(url).await?;
    let report = subscription::import(&body);
    info!(
        url,
        imported = report.records.len(),
        failed = report.failures.len(),
        "subscription fetched"
    );
    Ok(report)
}

async fn fetch_text(url: &str) -> Result<String, LinkError> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| LinkError::malformed(format!("http client: {e}")))?;

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| LinkError::malformed(format!("fetch {url}: {e}")))?;
    if !resp.status().is_success() {
        return Err(LinkError::malformed(format!(
            "fetch {url}: status {}",
            resp.status()
        )));
    }
    resp.text()
        .await
        .map_err(|e| LinkError::malformed(format!("read body: {e}")))
}
