//! A minimal W3C WebDriver client over HTTP, enough to drive a headless
//! Chrome through chromedriver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};

use super::driver::{DriverError, DriverFactory, PageDriver};

/// Starts headless Chrome sessions on a chromedriver endpoint.
#[derive(Clone)]
pub struct WebDriverFactory {
  client:            Client,
  endpoint:          String,
  user_agent:        String,
  page_load_timeout: Duration,
}

impl WebDriverFactory {
  pub fn new(
    endpoint: &str,
    user_agent: &str,
    page_load_timeout: Duration,
  ) -> Result<Self, DriverError> {
    // Navigation blocks until the page loads, so leave headroom over the
    // browser's own page-load timeout.
    let client = Client::builder()
      .timeout(page_load_timeout + Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      endpoint: endpoint.trim_end_matches('/').to_owned(),
      user_agent: user_agent.to_owned(),
      page_load_timeout,
    })
  }

  fn capabilities(&self) -> Value {
    let page_load_ms = u64::try_from(self.page_load_timeout.as_millis()).unwrap_or(u64::MAX);
    json!({
      "capabilities": {
        "alwaysMatch": {
          "browserName": "chrome",
          "pageLoadStrategy": "normal",
          "timeouts": { "pageLoad": page_load_ms },
          "goog:chromeOptions": {
            "args": [
              "--headless=new",
              "--no-sandbox",
              "--disable-dev-shm-usage",
              "--disable-gpu",
              "--window-size=1920,1080",
              "--disable-blink-features=AutomationControlled",
              "--disable-extensions",
              format!("--user-agent={}", self.user_agent),
            ],
            "excludeSwitches": ["enable-automation"],
          },
        },
      },
    })
  }
}

#[async_trait]
impl DriverFactory for WebDriverFactory {
  async fn create(&self) -> Result<Box<dyn PageDriver>, DriverError> {
    let value = send(
      &self.client,
      Method::POST,
      &format!("{}/session", self.endpoint),
      Some(self.capabilities()),
    )
    .await?;

    let session_id = value
      .get("sessionId")
      .and_then(Value::as_str)
      .ok_or_else(|| DriverError::Protocol("new session response has no sessionId".into()))?;

    tracing::debug!(session_id, "started browser session");
    Ok(Box::new(WebDriverSession {
      client:  self.client.clone(),
      session: format!("{}/session/{session_id}", self.endpoint),
    }))
  }
}

/// One chromedriver session.
pub struct WebDriverSession {
  client:  Client,
  /// `{endpoint}/session/{id}`
  session: String,
}

impl WebDriverSession {
  async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
    send(&self.client, method, &format!("{}{path}", self.session), body).await
  }
}

#[async_trait]
impl PageDriver for WebDriverSession {
  async fn navigate(&self, url: &str) -> Result<(), DriverError> {
    self.command(Method::POST, "/url", Some(json!({ "url": url }))).await?;
    Ok(())
  }

  async fn current_url(&self) -> Result<String, DriverError> {
    let value = self.command(Method::GET, "/url", None).await?;
    expect_string(value, "current url")
  }

  async fn page_source(&self) -> Result<String, DriverError> {
    let value = self.command(Method::GET, "/source", None).await?;
    expect_string(value, "page source")
  }

  async fn element_exists(&self, selector: &str) -> Result<bool, DriverError> {
    let body = json!({ "using": "css selector", "value": selector });
    let value = self.command(Method::POST, "/elements", Some(body)).await?;
    match value {
      Value::Array(found) => Ok(!found.is_empty()),
      other => Err(DriverError::Protocol(format!("find elements returned {other}"))),
    }
  }

  async fn quit(&self) -> Result<(), DriverError> {
    self.command(Method::DELETE, "", None).await?;
    Ok(())
  }
}

/// Issue one WebDriver command and unwrap the `value` member of the reply.
async fn send(
  client: &Client,
  method: Method,
  url: &str,
  body: Option<Value>,
) -> Result<Value, DriverError> {
  let mut req = client.request(method, url);
  if let Some(body) = body {
    req = req.json(&body);
  }
  let resp = req.send().await?;
  let status = resp.status();
  let mut reply: Value = resp.json().await?;
  let value = reply.get_mut("value").map(Value::take).unwrap_or(Value::Null);

  if status.is_success() {
    return Ok(value);
  }

  let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
  if error == "invalid session id" {
    return Err(DriverError::SessionGone);
  }
  Err(DriverError::Remote {
    error:   error.to_owned(),
    message: value
      .get("message")
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_owned(),
  })
}

fn expect_string(value: Value, what: &str) -> Result<String, DriverError> {
  match value {
    Value::String(s) => Ok(s),
    other => Err(DriverError::Protocol(format!("{what} was {other}"))),
  }
}
