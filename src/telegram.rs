use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::BotConfig;
use crate::render::Outbound;
use crate::session::SessionId;

// Slack on top of the long-poll window so the server answers first.
const REQUEST_SLACK_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub update_id: i64,
    pub chat_id: i64,
    pub session_id: SessionId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub outbound: Outbound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    pub events: Vec<InboundEvent>,
    // Offset acknowledging every update seen, text or not.
    pub next_offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

pub fn session_id_for_chat(chat_id: i64) -> SessionId {
    chat_id.to_string()
}

pub fn parse_updates_json(raw: &str) -> Result<UpdateBatch> {
    let resp: ApiResponse<Vec<TgUpdate>> =
        serde_json::from_str(raw.trim()).context("invalid getUpdates json")?;
    if !resp.ok {
        return Err(anyhow!(
            "getUpdates rejected: {}",
            resp.description.unwrap_or_else(|| "no description".to_string())
        ));
    }
    let updates = resp.result.unwrap_or_default();

    let next_offset = updates.iter().map(|u| u.update_id).max().map(|id| id + 1);
    let events = updates
        .into_iter()
        .filter_map(|u| {
            let message = u.message?;
            let text = message.text?;
            Some(InboundEvent {
                update_id: u.update_id,
                chat_id: message.chat.id,
                session_id: session_id_for_chat(message.chat.id),
                text,
            })
        })
        .collect();

    Ok(UpdateBatch {
        events,
        next_offset,
    })
}

fn parse_send_response(status: StatusCode, raw: &str) -> Result<()> {
    let resp = serde_json::from_str::<ApiResponse<Value>>(raw).ok();
    match resp {
        Some(r) if r.ok && status.is_success() => Ok(()),
        Some(r) => Err(anyhow!(
            "sendMessage failed ({status}): {}",
            r.description.unwrap_or_else(|| "no description".to_string())
        )),
        None => Err(anyhow!("sendMessage failed ({status}): unreadable response")),
    }
}

pub struct TelegramClient {
    client: Client,
    bot_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs + REQUEST_SLACK_SECS,
            ))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            bot_url: format!("{}/bot{}", config.api_base, config.token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    pub fn get_updates(&self, offset: Option<i64>) -> Result<UpdateBatch> {
        let mut query = vec![
            ("timeout", self.poll_timeout_secs.to_string()),
            ("allowed_updates", "[\"message\"]".to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let resp = self
            .client
            .get(format!("{}/getUpdates", self.bot_url))
            .query(&query)
            .send()
            .map_err(|e| e.without_url())
            .context("getUpdates request failed")?;
        let body = resp
            .text()
            .map_err(|e| e.without_url())
            .context("failed reading getUpdates body")?;
        parse_updates_json(&body)
    }

    pub fn send(&self, message: &OutboundMessage) -> Result<()> {
        let outbound = &message.outbound;
        let parse_mode = outbound.markdown.then_some("Markdown");
        match self.send_text(message.chat_id, &outbound.text, parse_mode) {
            Ok(()) => Ok(()),
            // Markup the server could not parse still gets delivered as plain text.
            Err(err) if parse_mode.is_some() => {
                warn!(
                    chat_id = message.chat_id,
                    error = %err,
                    "markdown send failed, retrying as plain text"
                );
                self.send_text(message.chat_id, outbound.plain_text(), None)
            }
            Err(err) => Err(err),
        }
    }

    fn send_text(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let body = SendMessageBody {
            chat_id,
            text,
            parse_mode,
        };
        let resp = self
            .client
            .post(format!("{}/sendMessage", self.bot_url))
            .json(&body)
            .send()
            .map_err(|e| e.without_url())
            .context("sendMessage request failed")?;
        let status = resp.status();
        let raw = resp
            .text()
            .map_err(|e| e.without_url())
            .context("failed reading sendMessage body")?;
        parse_send_response(status, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_response_requires_ok_flag() {
        assert!(parse_send_response(StatusCode::OK, r#"{"ok":true,"result":{}}"#).is_ok());
        let err = parse_send_response(
            StatusCode::BAD_REQUEST,
            r#"{"ok":false,"description":"Bad Request: can't parse entities"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("can't parse entities"));
        assert!(parse_send_response(StatusCode::BAD_GATEWAY, "<html>").is_err());
    }

    #[test]
    fn chat_id_is_session_key() {
        assert_eq!(session_id_for_chat(-100123), "-100123");
    }
}
