//! Per-type node behavior.

use std::time::Duration;

use botflow_config::{
  DEFAULT_HANDLE, EmbedMessage, ExecutionContext, GetPersistentVariable, HttpRequest,
  InteractiveMessage, LoopData, NodeKind, RoleChange, SetPersistentVariable, Template,
};
use botflow_expr::{evaluate_group, parse_literal, render, resolve, to_number, to_text};
use botflow_workflow::{EdgeKind, ExecutableWorkflow};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::RuntimeError;
use crate::events::EventKind;
use crate::handlers::{
  ActionHandlers, ChannelMessage, DirectMessage, Embed, EmbedFieldContent, HttpRequestSpec,
  InteractionPrompt, Reply, RoleRequest,
};
use crate::interpreter::Run;
use crate::loops::{LoopStep, to_items};
use crate::store::{VariableScope, VariableStore};

/// Interactive messages wait this long when the node does not say.
const DEFAULT_INTERACTION_TIMEOUT_MS: u64 = 60_000;

/// Where the walk goes after a node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
  /// Follow the named output handle. A handle with no edge ends the run.
  Follow(String),
  /// End the run at a Stop node.
  Stop,
}

impl Flow {
  fn follow(handle: impl Into<String>) -> Self {
    Flow::Follow(handle.into())
  }

  fn next() -> Self {
    Flow::follow(DEFAULT_HANDLE)
  }
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn dispatch(
  workflow: &ExecutableWorkflow,
  node_id: &str,
  kind: &NodeKind,
  arrival: EdgeKind,
  ctx: &mut ExecutionContext,
  handlers: &dyn ActionHandlers,
  store: &dyn VariableStore,
  run: &mut Run,
) -> Result<Flow, RuntimeError> {
  match kind {
    NodeKind::SlashCommandTrigger(_) | NodeKind::MessageTrigger(_) | NodeKind::MemberJoinTrigger => {
      Ok(Flow::next())
    }

    NodeKind::ReplyMessage(data) => {
      let reply = Reply {
        content: render(data.content.as_str(), ctx),
        ephemeral: data.ephemeral,
      };
      handlers
        .reply(reply.clone())
        .await
        .map_err(RuntimeError::handler("reply"))?;
      action(run, node_id, "reply sent", &reply);
      Ok(Flow::next())
    }

    NodeKind::SendChannelMessage(data) => {
      let channel_id = render_or(&data.channel_id, ctx, |ctx| {
        ctx.channel.as_ref().map(|c| c.id.clone())
      })
      .ok_or(RuntimeError::MissingChannel)?;
      let message = ChannelMessage {
        channel_id,
        content: render(data.content.as_str(), ctx),
      };
      handlers
        .send_channel(message.clone())
        .await
        .map_err(RuntimeError::handler("send_channel"))?;
      action(run, node_id, "channel message sent", &message);
      Ok(Flow::next())
    }

    NodeKind::SendDm(data) => {
      let user_id = render_or(&data.user_id, ctx, |ctx| Some(ctx.user.id.clone()))
        .ok_or(RuntimeError::MissingUser)?;
      let message = DirectMessage {
        user_id,
        content: render(data.content.as_str(), ctx),
      };
      handlers
        .send_dm(message.clone())
        .await
        .map_err(RuntimeError::handler("send_dm"))?;
      action(run, node_id, "direct message sent", &message);
      Ok(Flow::next())
    }

    NodeKind::EmbedMessage(data) => {
      let embed = build_embed(data, ctx)?;
      handlers
        .send_embed(embed.clone())
        .await
        .map_err(RuntimeError::handler("send_embed"))?;
      action(run, node_id, "embed sent", &embed);
      Ok(Flow::next())
    }

    NodeKind::IfElse(data) => {
      let matched = evaluate_group(&data.conditions, ctx);
      debug!(node_id = %node_id, matched, "condition_evaluated");
      Ok(Flow::follow(if matched { "true" } else { "false" }))
    }

    NodeKind::SwitchCase(data) => {
      let value = to_text(resolve(data.expression.as_str(), ctx).as_ref());
      let handle = format!("case:{}", value);
      if workflow.has_handle(node_id, &handle) {
        Ok(Flow::Follow(handle))
      } else {
        Ok(Flow::follow("default"))
      }
    }

    NodeKind::Loop(data) => Ok(visit_loop(node_id, data, arrival, ctx, run)),

    NodeKind::SetVariable(data) => {
      let value = resolve_value(&data.value, ctx);
      ctx.set_variable(data.name.clone(), value);
      Ok(Flow::next())
    }

    NodeKind::GetPersistentVariable(data) => {
      get_persistent(data, ctx, store).await?;
      Ok(Flow::next())
    }

    NodeKind::SetPersistentVariable(data) => {
      set_persistent(data, ctx, store).await?;
      Ok(Flow::next())
    }

    NodeKind::Delay(data) => {
      let requested = delay_duration(&data.duration_ms, ctx)?;
      let remaining = run.remaining();
      if requested > remaining {
        warn!(
          node_id = %node_id,
          requested_ms = requested.as_millis() as u64,
          remaining_ms = remaining.as_millis() as u64,
          "delay_truncated"
        );
      }
      tokio::time::sleep(requested.min(remaining)).await;
      Ok(Flow::next())
    }

    NodeKind::HttpRequest(data) => http_request(node_id, data, ctx, handlers, run).await,

    NodeKind::AddRole(data) => {
      let request = role_request(data, ctx)?;
      handlers
        .add_role(request.clone())
        .await
        .map_err(RuntimeError::handler("add_role"))?;
      action(run, node_id, "role added", &request);
      Ok(Flow::next())
    }

    NodeKind::RemoveRole(data) => {
      let request = role_request(data, ctx)?;
      handlers
        .remove_role(request.clone())
        .await
        .map_err(RuntimeError::handler("remove_role"))?;
      action(run, node_id, "role removed", &request);
      Ok(Flow::next())
    }

    NodeKind::Logger(data) => {
      let message = render(data.message.as_str(), ctx);
      run.trace.record(
        EventKind::Log,
        Some(node_id),
        message.clone(),
        Some(json!({ "level": data.level })),
      );
      handlers
        .log(data.level, &message)
        .await
        .map_err(RuntimeError::handler("log"))?;
      Ok(Flow::next())
    }

    NodeKind::Stop(data) => {
      let reason = render(data.reason.as_str(), ctx);
      let message = if reason.is_empty() {
        "workflow stopped".to_string()
      } else {
        format!("workflow stopped: {}", reason)
      };
      run.trace.record(EventKind::Log, Some(node_id), message, None);
      Ok(Flow::Stop)
    }

    NodeKind::InteractiveMessage(data) => {
      interactive_message(node_id, data, ctx, handlers, run).await
    }
  }
}

fn action<T: Serialize>(run: &mut Run, node_id: &str, message: &str, payload: &T) {
  let data = serde_json::to_value(payload).ok();
  run.trace.record(EventKind::Action, Some(node_id), message, data);
}

/// Render `template`, or use `fallback` when it renders empty. `None` if both
/// are empty.
fn render_or(
  template: &Template,
  ctx: &ExecutionContext,
  fallback: impl FnOnce(&ExecutionContext) -> Option<String>,
) -> Option<String> {
  let rendered = render(template.as_str(), ctx);
  let value = if rendered.trim().is_empty() {
    fallback(ctx)?
  } else {
    rendered
  };
  (!value.trim().is_empty()).then_some(value)
}

/// Text values are resolved as expressions; other JSON is taken verbatim.
fn resolve_value(value: &Value, ctx: &ExecutionContext) -> Value {
  match value {
    Value::String(text) => resolve(text, ctx).unwrap_or(Value::Null),
    other => other.clone(),
  }
}

fn visit_loop(
  node_id: &str,
  data: &LoopData,
  arrival: EdgeKind,
  ctx: &mut ExecutionContext,
  run: &mut Run,
) -> Flow {
  let max = run.limits.max_loop_iterations;
  let advanced = match arrival {
    EdgeKind::LoopReentry => run.loops.advance(node_id, max),
    EdgeKind::Forward => None,
  };
  let step = match advanced {
    Some(step) => step,
    None => {
      let items = to_items(resolve(data.list_expression.as_str(), ctx));
      debug!(node_id = %node_id, items = items.len(), "loop_started");
      run.loops.start(node_id, items, max)
    }
  };

  match step {
    LoopStep::Item { index, item } => {
      ctx.set_variable(data.item_var.clone(), item);
      if let Some(index_var) = data.index_var.as_ref().filter(|v| !v.is_empty()) {
        ctx.set_variable(index_var.clone(), Value::from(index));
      }
      debug!(node_id = %node_id, index, "loop_iteration");
      Flow::follow("loop")
    }
    LoopStep::Finished => {
      debug!(node_id = %node_id, "loop_finished");
      Flow::follow("done")
    }
    LoopStep::CapReached => {
      let message = format!("loop exceeded max iterations ({})", max);
      warn!(
        execution_id = %run.trace.execution_id(),
        node_id = %node_id,
        max_loop_iterations = max,
        "loop_iteration_cap_reached"
      );
      run.trace.record(EventKind::Error, Some(node_id), message, None);
      Flow::follow("done")
    }
  }
}

fn scope(name: &str, ctx: &ExecutionContext) -> Result<VariableScope, RuntimeError> {
  match name.trim().to_ascii_lowercase().as_str() {
    "user" => Ok(VariableScope::User(ctx.user.id.clone())),
    "guild" => ctx
      .guild
      .as_ref()
      .map(|g| VariableScope::Guild(g.id.clone()))
      .ok_or(RuntimeError::MissingGuild),
    _ => Err(RuntimeError::UnknownScope {
      scope: name.to_string(),
    }),
  }
}

async fn get_persistent(
  data: &GetPersistentVariable,
  ctx: &mut ExecutionContext,
  store: &dyn VariableStore,
) -> Result<(), RuntimeError> {
  let scope = scope(&data.scope, ctx)?;
  let key = render(data.key.as_str(), ctx);
  let value = match store.get(&scope, &key).await? {
    Some(value) => value,
    None => match &data.default_value {
      Value::String(text) => parse_literal(text).unwrap_or_else(|| Value::String(text.clone())),
      other => other.clone(),
    },
  };
  debug!(scope = %scope, key = %key, "persistent_variable_read");
  ctx.set_variable(data.variable.clone(), value);
  Ok(())
}

async fn set_persistent(
  data: &SetPersistentVariable,
  ctx: &ExecutionContext,
  store: &dyn VariableStore,
) -> Result<(), RuntimeError> {
  let scope = scope(&data.scope, ctx)?;
  let key = render(data.key.as_str(), ctx);
  let value = resolve_value(&data.value, ctx);
  store.set(&scope, &key, value).await?;
  debug!(scope = %scope, key = %key, "persistent_variable_written");
  Ok(())
}

fn delay_duration(template: &Template, ctx: &ExecutionContext) -> Result<Duration, RuntimeError> {
  let value = resolve(template.as_str(), ctx);
  let ms = to_number(value.as_ref());
  if ms.is_nan() {
    return Err(RuntimeError::InvalidDelay {
      value: template.to_string(),
    });
  }
  Ok(Duration::from_millis(ms.max(0.0) as u64))
}

fn build_embed(data: &EmbedMessage, ctx: &ExecutionContext) -> Result<Embed, RuntimeError> {
  let channel_id = render_or(&data.channel_id, ctx, |ctx| {
    ctx.channel.as_ref().map(|c| c.id.clone())
  })
  .ok_or(RuntimeError::MissingChannel)?;

  Ok(Embed {
    channel_id,
    title: render(data.title.as_str(), ctx),
    description: render(data.description.as_str(), ctx),
    color: data.color.as_ref().and_then(parse_color),
    footer: render(data.footer.as_str(), ctx),
    fields: data
      .fields
      .iter()
      .map(|field| EmbedFieldContent {
        name: render(field.name.as_str(), ctx),
        value: render(field.value.as_str(), ctx),
        inline: field.inline,
      })
      .collect(),
  })
}

/// A number, or `#rrggbb` / decimal text.
fn parse_color(value: &Value) -> Option<u32> {
  match value {
    Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
    Value::String(text) => {
      let text = text.trim();
      match text.strip_prefix('#') {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
      }
    }
    _ => None,
  }
}

fn role_request(data: &RoleChange, ctx: &ExecutionContext) -> Result<RoleRequest, RuntimeError> {
  let role_id = render(data.role_id.as_str(), ctx);
  if role_id.trim().is_empty() {
    return Err(RuntimeError::MissingRole);
  }
  let user_id = render_or(&data.user_id, ctx, |ctx| Some(ctx.user.id.clone()))
    .ok_or(RuntimeError::MissingUser)?;
  let reason = render(data.reason.as_str(), ctx);

  Ok(RoleRequest {
    user_id,
    role_id,
    reason: (!reason.is_empty()).then_some(reason),
  })
}

async fn http_request(
  node_id: &str,
  data: &HttpRequest,
  ctx: &mut ExecutionContext,
  handlers: &dyn ActionHandlers,
  run: &mut Run,
) -> Result<Flow, RuntimeError> {
  let method = render(data.method.as_str(), ctx).trim().to_uppercase();
  let body = render(data.body.as_str(), ctx);
  let request = HttpRequestSpec {
    method: if method.is_empty() { "GET".to_string() } else { method },
    url: render(data.url.as_str(), ctx),
    headers: data
      .headers
      .iter()
      .map(|(name, value)| (name.clone(), render(value.as_str(), ctx)))
      .collect(),
    body: (!body.is_empty()).then_some(body),
  };

  let response = handlers
    .http_request(request.clone())
    .await
    .map_err(RuntimeError::handler("http_request"))?;

  run.trace.record(
    EventKind::Action,
    Some(node_id),
    "http request completed",
    Some(json!({
      "method": request.method,
      "url": request.url,
      "status": response.status,
    })),
  );

  let handle = if response.is_success() { "success" } else { "failure" };
  if let Some(variable) = data.response_variable.as_ref().filter(|v| !v.is_empty()) {
    ctx.set_variable(variable.clone(), response.body);
  }
  Ok(Flow::follow(handle))
}

async fn interactive_message(
  node_id: &str,
  data: &InteractiveMessage,
  ctx: &mut ExecutionContext,
  handlers: &dyn ActionHandlers,
  run: &mut Run,
) -> Result<Flow, RuntimeError> {
  let wait = Duration::from_millis(data.timeout_ms.unwrap_or(DEFAULT_INTERACTION_TIMEOUT_MS))
    .min(run.remaining());
  let prompt = InteractionPrompt {
    content: render(data.content.as_str(), ctx),
    buttons: data.buttons.clone(),
    select_menus: data.select_menus.clone(),
    timeout_ms: wait.as_millis() as u64,
  };
  action(run, node_id, "interactive message sent", &prompt);

  let response = match tokio::time::timeout(wait, handlers.await_interaction(prompt)).await {
    Ok(response) => response.map_err(RuntimeError::handler("await_interaction"))?,
    Err(_) => None,
  };

  if let Some(variable) = data.response_variable.as_ref().filter(|v| !v.is_empty()) {
    let value = response
      .as_ref()
      .and_then(|r| serde_json::to_value(r).ok())
      .unwrap_or(Value::Null);
    ctx.set_variable(variable.clone(), value);
  }

  let handle = match &response {
    Some(response) => response.handle(),
    None => "timeout".to_string(),
  };
  debug!(node_id = %node_id, handle = %handle, "interaction_received");
  Ok(Flow::Follow(handle))
}
