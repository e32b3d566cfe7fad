//! Cloudflare worker serving the card API: screenshots and power stats for a site.

use powercard_core::NormalizedUrl;
use powercard_protocol::{self as protocol, GeneratePowerRequest, ScreenshotRequest, ScreenshotResponse};
use worker::*;

use crate::config::WorkerConfig;
use crate::error::{ApiError, ApiResult};
use crate::stats::StatsSource;
use crate::upstream::Deadline;

pub mod config;
pub mod error;
pub mod metadata;
pub mod screenshot;
pub mod stats;
pub mod upstream;

const GENERATE_POWER_FAILED: &str = "Failed to generate power";
const SCREENSHOT_FAILED: &str = "Failed to take screenshot";

#[event(start)]
pub fn start() {
    console_log::init_with_level(log::Level::Info).expect("Error initializing logger");
}

#[event(fetch)]
pub async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    if req.method() == Method::Options {
        return Response::empty()?.with_cors(&cors());
    }

    Router::new()
        .post_async(protocol::GENERATE_POWER_PATH, |req, ctx| async move {
            respond(generate_power(req, &ctx.env).await, GENERATE_POWER_FAILED)
        })
        .post_async(protocol::SCREENSHOT_PATH, |req, ctx| async move {
            respond(screenshot(req, &ctx.env).await, SCREENSHOT_FAILED)
        })
        .run(req, env)
        .await?
        .with_cors(&cors())
}

fn cors() -> Cors {
    Cors::new()
        .with_origins(["*"])
        .with_methods([Method::Post, Method::Options])
        .with_allowed_headers(["content-type"])
}

fn respond<T: serde::Serialize>(result: ApiResult<T>, fallback: &str) -> Result<Response> {
    match result {
        Ok(body) => Response::from_json(&body),
        Err(err) => err.into_response(fallback),
    }
}

fn load_config(env: &Env) -> ApiResult<WorkerConfig> {
    WorkerConfig::from_env(env).map_err(|err| ApiError::Upstream(err.into()))
}

async fn read_json<T: serde::de::DeserializeOwned>(req: &mut Request) -> ApiResult<T> {
    req.json::<T>().await.map_err(|err| {
        log::debug!("unreadable body: {}", err);
        ApiError::BadRequest("Invalid JSON body")
    })
}

async fn generate_power(mut req: Request, env: &Env) -> ApiResult<protocol::GeneratePowerResponse> {
    let body: GeneratePowerRequest = read_json(&mut req).await?;
    let url = NormalizedUrl::parse(&body.url)?;
    let config = load_config(env)?;
    let deadline = Deadline::start(config.fetch_timeout);

    let description = match body.description.filter(|d| !d.trim().is_empty()) {
        Some(description) => Some(description),
        None => describe_page(&url, deadline).await,
    };
    log::info!("generating power for {} ({:?})", url, description);

    let source = match &config.stats_api_url {
        Some(url) => StatsSource::Remote {
            url: url.clone(),
            timeout: deadline.remaining()?,
        },
        None => StatsSource::Roller,
    };
    let request = GeneratePowerRequest {
        url: url.to_string(),
        description,
    };
    let stats = source.generate(&request).await?;
    Ok(stats::to_wire(&stats))
}

/// Description derived from the page's metadata. The page being unreachable is not fatal.
async fn describe_page(url: &NormalizedUrl, deadline: Deadline) -> Option<String> {
    let page = async {
        let mut response = upstream::send(upstream::get(url.as_str())?, deadline.remaining()?).await?;
        response.text().await.map_err(|err| anyhow::anyhow!("{err}"))
    };
    match page.await {
        Ok(html) => metadata::page_description(&html),
        Err(err) => {
            log::warn!("could not read metadata of {}: {:#}", url, err);
            None
        }
    }
}

async fn screenshot(mut req: Request, env: &Env) -> ApiResult<ScreenshotResponse> {
    let body: ScreenshotRequest = read_json(&mut req).await?;
    let url = NormalizedUrl::parse(&body.url)?;
    let config = load_config(env)?;

    log::info!("taking screenshot of {}", url);
    let screenshot = screenshot::take_screenshot(&config, &url).await?;
    Ok(ScreenshotResponse { screenshot })
}
