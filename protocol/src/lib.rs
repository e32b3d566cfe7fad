//! JSON bodies exchanged between the web app and the worker.

use serde::{Deserialize, Serialize};

pub use data_uri::*;

mod data_uri;

pub const GENERATE_POWER_PATH: &str = "/api/generate-power";
pub const SCREENSHOT_PATH: &str = "/api/screenshot";

/// Default time the worker may spend on upstream calls for one request, across all of its steps.
pub const UPSTREAM_BUDGET_MS: u64 = 30_000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratePowerRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Stats as sent over the wire, validated into a card by the receiver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePowerResponse {
    pub rank: String,
    pub attack_power: i64,
    pub defence_power: i64,
    pub hidden_advantage: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotResponse {
    /// `data:<mime>;base64,<payload>`
    pub screenshot: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
