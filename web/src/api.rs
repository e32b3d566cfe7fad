use gloo::net::http::{Request, Response};
use gloo::timers::callback::Timeout;
use powercard_core::{NormalizedUrl, PowerStats, Screenshot, ScreenshotService, ServiceError, StatsService};
use powercard_protocol as protocol;
use protocol::{
    ErrorResponse, GeneratePowerRequest, GeneratePowerResponse, ImageDataUri, ScreenshotRequest,
    ScreenshotResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use web_sys::AbortController;

/// Slack on top of the worker's upstream budget for its own work and the round trip.
const RESPONSE_SLACK_MS: u64 = 10_000;

/// Outbound requests are aborted after this long, the worker answers well before.
pub(crate) const REQUEST_TIMEOUT_MS: u32 = (protocol::UPSTREAM_BUDGET_MS + RESPONSE_SLACK_MS) as u32;

/// Client for the worker's `/api` routes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ApiClient {
    base: String,
    timeout_ms: u32,
}

impl ApiClient {
    pub(crate) fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            timeout_ms: REQUEST_TIMEOUT_MS,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let abort = AbortController::new().map_err(|err| ServiceError::new(format!("{err:?}")))?;
        let signal = abort.signal();
        let timeout_ms = self.timeout_ms;
        let _deadline = Timeout::new(timeout_ms, move || {
            log::warn!("request timed out after {}ms", timeout_ms);
            abort.abort();
        });

        log::debug!("POST {}", url);
        let response = Request::post(&url)
            .abort_signal(Some(&signal))
            .json(body)
            .map_err(ServiceError::new)?
            .send()
            .await
            .map_err(ServiceError::new)?;

        if !response.ok() {
            return Err(error_from(response).await);
        }
        response.json::<T>().await.map_err(ServiceError::new)
    }
}

async fn error_from(response: Response) -> ServiceError {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(ErrorResponse { error }) => ServiceError::new(format!("{status}: {error}")),
        Err(_) => ServiceError::new(format!("{status} {}", response.status_text())),
    }
}

impl ScreenshotService for ApiClient {
    async fn take_screenshot(&self, url: &NormalizedUrl) -> Result<Screenshot, ServiceError> {
        let request = ScreenshotRequest {
            url: url.to_string(),
        };
        let ScreenshotResponse { screenshot } = self.post_json(protocol::SCREENSHOT_PATH, &request).await?;
        ImageDataUri::parse(&screenshot).map_err(ServiceError::new)?;
        Ok(Screenshot::from_data_uri(screenshot)?)
    }
}

impl StatsService for ApiClient {
    async fn generate_stats(
        &self,
        url: &NormalizedUrl,
        description: Option<&str>,
    ) -> Result<PowerStats, ServiceError> {
        let request = GeneratePowerRequest {
            url: url.to_string(),
            description: description.map(str::to_string),
        };
        let response: GeneratePowerResponse = self.post_json(protocol::GENERATE_POWER_PATH, &request).await?;
        Ok(PowerStats::from_parts(
            &response.rank,
            response.attack_power,
            response.defence_power,
            response.hidden_advantage,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        assert_eq!(ApiClient::new("").endpoint(protocol::SCREENSHOT_PATH), "/api/screenshot");
        assert_eq!(
            ApiClient::new("https://cards.example.com/").endpoint(protocol::GENERATE_POWER_PATH),
            "https://cards.example.com/api/generate-power"
        );
    }

    #[test]
    fn client_waits_longer_than_worker_budget() {
        assert!(u64::from(REQUEST_TIMEOUT_MS) > protocol::UPSTREAM_BUDGET_MS);
        assert_eq!(ApiClient::new("").timeout_ms, 40_000);
    }
}
