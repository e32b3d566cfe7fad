use anyhow::{Context as _, anyhow, bail};
use futures_util::future::{Either, select};
use serde::Serialize;
use std::pin::pin;
use std::time::Duration;
use wasm_bindgen::JsValue;
use worker::{AbortController, Delay, Fetch, Headers, Method, Request, RequestInit, Response, Url};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; PowerCardBot/0.1)";

fn js_err(err: worker::Error) -> anyhow::Error {
    anyhow!("{err}")
}

pub fn get(url: &str) -> anyhow::Result<Request> {
    let headers = Headers::new();
    headers.set("user-agent", USER_AGENT).map_err(js_err)?;
    let mut init = RequestInit::new();
    init.with_method(Method::Get).with_headers(headers);
    Request::new_with_init(url, &init).map_err(js_err)
}

pub fn post_json(url: &str, body: &impl Serialize) -> anyhow::Result<Request> {
    let body = serde_json::to_string(body).context("encoding request body")?;
    let headers = Headers::new();
    headers.set("content-type", "application/json").map_err(js_err)?;
    let mut init = RequestInit::new();
    init.with_method(Method::Post)
        .with_headers(headers)
        .with_body(Some(JsValue::from_str(&body)));
    Request::new_with_init(url, &init).map_err(js_err)
}

/// Sends `request`, aborting it once `timeout` elapses. Non-2xx responses are errors.
pub async fn send(request: Request, timeout: Duration) -> anyhow::Result<Response> {
    let host = request.url().map(|url| host_label(&url).to_string()).map_err(js_err)?;
    let controller = AbortController::default();
    let signal = controller.signal();
    let fetch = Fetch::Request(request);

    let response = match select(pin!(fetch.send_with_signal(&signal)), pin!(Delay::from(timeout))).await {
        Either::Left((response, _)) => response.map_err(js_err)?,
        Either::Right(_) => {
            controller.abort();
            bail!("request to {} timed out after {}ms", host, timeout.as_millis());
        }
    };

    let status = response.status_code();
    if !(200..300).contains(&status) {
        bail!("{} responded with {}", host, status);
    }
    Ok(response)
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// One time budget shared by consecutive upstream calls of a request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Deadline {
    started_ms: u64,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget: Duration) -> Self {
        Self::starting_at(now_ms(), budget)
    }

    fn starting_at(started_ms: u64, budget: Duration) -> Self {
        Self { started_ms, budget }
    }

    /// Time left for the next call, an error once the budget is spent.
    pub fn remaining(&self) -> anyhow::Result<Duration> {
        self.remaining_at(now_ms())
    }

    fn remaining_at(&self, now_ms: u64) -> anyhow::Result<Duration> {
        let elapsed = Duration::from_millis(now_ms.saturating_sub(self.started_ms));
        match self.budget.checked_sub(elapsed) {
            Some(left) if !left.is_zero() => Ok(left),
            _ => bail!("upstream budget of {}ms spent", self.budget.as_millis()),
        }
    }
}

/// Host of `url` for log lines, so query strings carrying keys never reach the log.
fn host_label(url: &Url) -> &str {
    url.host_str().unwrap_or("upstream")
}
