use async_trait::async_trait;
use botflow_config::LogLevel;
use botflow_runtime::{
  ActionHandlers, ChannelMessage, DirectMessage, Embed, HandlerError, HttpRequestSpec,
  HttpResponse, InteractionPrompt, InteractionResponse, Reply, RoleRequest,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Action handlers for running workflows outside of a chat platform.
///
/// Chat actions are printed to stdout as JSON lines. HTTP requests are real.
/// Interactive messages are answered with `response` when one was given on
/// the command line, otherwise they time out.
pub struct ConsoleHandlers {
  client: reqwest::Client,
  response: Option<InteractionResponse>,
}

impl ConsoleHandlers {
  pub fn new(response: Option<InteractionResponse>) -> Self {
    Self {
      client: reqwest::Client::new(),
      response,
    }
  }

  fn emit<T: Serialize>(&self, action: &str, payload: &T) -> Result<(), HandlerError> {
    let line = json!({ "action": action, "payload": payload });
    println!("{}", line);
    Ok(())
  }
}

#[async_trait]
impl ActionHandlers for ConsoleHandlers {
  async fn reply(&self, reply: Reply) -> Result<(), HandlerError> {
    self.emit("reply", &reply)
  }

  async fn send_channel(&self, message: ChannelMessage) -> Result<(), HandlerError> {
    self.emit("sendChannel", &message)
  }

  async fn send_dm(&self, message: DirectMessage) -> Result<(), HandlerError> {
    self.emit("sendDm", &message)
  }

  async fn send_embed(&self, embed: Embed) -> Result<(), HandlerError> {
    self.emit("sendEmbed", &embed)
  }

  async fn add_role(&self, request: RoleRequest) -> Result<(), HandlerError> {
    self.emit("addRole", &request)
  }

  async fn remove_role(&self, request: RoleRequest) -> Result<(), HandlerError> {
    self.emit("removeRole", &request)
  }

  async fn log(&self, level: LogLevel, message: &str) -> Result<(), HandlerError> {
    self.emit("log", &json!({ "level": level, "message": message }))
  }

  async fn http_request(&self, request: HttpRequestSpec) -> Result<HttpResponse, HandlerError> {
    let method = reqwest::Method::from_bytes(request.method.as_bytes())
      .map_err(|_| HandlerError::rejected(format!("invalid HTTP method '{}'", request.method)))?;
    let url = http_url(&request.url)?;

    let mut builder = self.client.request(method, url);
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder.send().await.map_err(|e| {
      warn!(url = %request.url, error = %e, "http_request_failed");
      HandlerError::rejected(e.to_string())
    })?;
    let status = response.status().as_u16();
    debug!(method = %request.method, url = %request.url, status, "http_request_completed");
    let text = response
      .text()
      .await
      .map_err(|e| HandlerError::rejected(e.to_string()))?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

    Ok(HttpResponse { status, body })
  }

  async fn await_interaction(
    &self,
    prompt: InteractionPrompt,
  ) -> Result<Option<InteractionResponse>, HandlerError> {
    self.emit("interactiveMessage", &prompt)?;
    Ok(self.response.clone())
  }
}

/// Parse `url`, accepting only `http` and `https`.
fn http_url(url: &str) -> Result<reqwest::Url, HandlerError> {
  let parsed = reqwest::Url::parse(url)
    .map_err(|e| HandlerError::rejected(format!("invalid URL '{}': {}", url, e)))?;
  match parsed.scheme() {
    "http" | "https" => Ok(parsed),
    scheme => Err(HandlerError::Unsupported {
      action: format!("http_request over '{}'", scheme),
    }),
  }
}

/// Parse `button:<id>` or `select:<menu>:<value>` into a response.
pub fn parse_response(text: &str) -> Option<InteractionResponse> {
  if let Some(id) = text.strip_prefix("button:") {
    return Some(InteractionResponse::Button { id: id.to_string() });
  }
  let (menu_id, value) = text.strip_prefix("select:")?.split_once(':')?;
  Some(InteractionResponse::Select {
    menu_id: menu_id.to_string(),
    value: value.to_string(),
  })
}
