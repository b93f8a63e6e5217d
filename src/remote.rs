//! Remote command interface (Telegram bot).
//!
//! A thin front end: every command translates 1:1 onto the core's
//! `get_status`/`set_state` operations, and the response text reports
//! exactly what the core returned — including an explicit failure line
//! when actuation fails. No decision logic lives here.
//!
//! Layered for testability:
//!
//! - [`Command::parse`] — pure vocabulary parsing;
//! - [`execute`] — command → core call → response text;
//! - [`TelegramInterface`] — long-poll bookkeeping plus update-JSON
//!   parsing (`serde_json`), with the HTTP transport cfg-gated so every
//!   layer above it runs on the host.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use crate::app::core::CrockpotCore;
use crate::app::ports::{ConnectivityPort, EventSink, RelayPort};
use crate::config::SystemConfig;
use crate::state::OperatingState;

// ───────────────────────────────────────────────────────────────
// Command vocabulary
// ───────────────────────────────────────────────────────────────

/// The remote command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/status` (also `/start`, for first contact with the bot).
    Status,
    /// `/off`, `/warm`, `/low`, `/high`.
    Set(OperatingState),
    /// `/help`.
    Help,
}

impl Command {
    /// Parse one message text. Commands start with `/`; a `@botname`
    /// suffix (group chats) is stripped before matching. Anything else
    /// yields `None` and the caller answers with a help pointer.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        let cmd = text.split('@').next().unwrap_or(text);
        match cmd {
            "/status" | "/start" => Some(Self::Status),
            "/off" => Some(Self::Set(OperatingState::Off)),
            "/warm" => Some(Self::Set(OperatingState::Warm)),
            "/low" => Some(Self::Set(OperatingState::Low)),
            "/high" => Some(Self::Set(OperatingState::High)),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Build the `/status` report from a fresh snapshot.
fn status_text<R: RelayPort>(core: &CrockpotCore<R>) -> String {
    let s = core.get_status();
    format!(
        "Crockpot Status:\n\
         State: {}\n\
         Temperature: {:.1} F\n\
         Uptime: {} seconds\n\
         WiFi: {}\n\
         Sensor: {}",
        s.state.as_str().to_uppercase(),
        s.temperature_f,
        s.uptime_seconds,
        if s.connectivity_ok { "Connected" } else { "Disconnected" },
        if s.sensor_fault { "ERROR" } else { "OK" },
    )
}

fn help_text() -> String {
    "IoT Crockpot Commands:\n\
     /status - Show current status\n\
     /off - Turn off\n\
     /warm - Set to warm\n\
     /low - Set to low\n\
     /high - Set to high\n\
     /help - Show this help"
        .to_string()
}

/// Execute one command against the core and produce the reply text.
pub fn execute<R: RelayPort>(
    command: Command,
    core: &CrockpotCore<R>,
    sink: &mut impl EventSink,
) -> String {
    match command {
        Command::Status => status_text(core),
        Command::Help => help_text(),
        Command::Set(state) => match core.set_state(state, sink) {
            Ok(()) => {
                if state == OperatingState::Off {
                    "Crockpot turned OFF".to_string()
                } else {
                    format!("Crockpot set to {}", state.as_str().to_uppercase())
                }
            }
            Err(e) => {
                warn!("remote: set_state({state}) failed: {e}");
                if state == OperatingState::Off {
                    "Failed to turn off crockpot".to_string()
                } else {
                    format!("Failed to set crockpot to {}", state.as_str())
                }
            }
        },
    }
}

/// Reply to an unrecognised message.
pub fn unknown_text(text: &str) -> String {
    format!("Unknown command: {text}\nType /help for available commands.")
}

// ───────────────────────────────────────────────────────────────
// Telegram update stream
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// A reply queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Long-poll state for the bot API.
pub struct TelegramInterface {
    token: heapless::String<64>,
    last_update_id: i64,
}

impl TelegramInterface {
    /// `None` if no token is configured (remote control disabled, the rest
    /// of the system runs normally).
    pub fn new(token: &str) -> Option<Self> {
        if token.is_empty() {
            warn!("telegram: bot token not configured, remote control disabled");
            return None;
        }
        let token = heapless::String::try_from(token).ok()?;
        Some(Self {
            token,
            last_update_id: 0,
        })
    }

    /// Offset to request next (highest seen update_id + 1).
    pub fn poll_offset(&self) -> i64 {
        self.last_update_id
    }

    /// Parse one getUpdates payload, dispatch each command, and return the
    /// replies to send. Malformed JSON or an API-level error yields no
    /// replies and leaves the offset untouched.
    pub fn process_payload<R: RelayPort>(
        &mut self,
        payload: &str,
        core: &CrockpotCore<R>,
        sink: &mut impl EventSink,
    ) -> Vec<OutboundMessage> {
        let parsed: UpdateResponse = match serde_json::from_str(payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("telegram: bad update payload ({e})");
                return Vec::new();
            }
        };
        if !parsed.ok {
            warn!("telegram: API returned ok=false");
            return Vec::new();
        }

        let mut replies = Vec::new();
        for update in parsed.result {
            self.last_update_id = self.last_update_id.max(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };
            if !text.starts_with('/') {
                continue; // plain chatter, not addressed to us
            }
            info!("telegram: command '{text}' from chat {}", message.chat.id);
            let reply = match Command::parse(&text) {
                Some(cmd) => execute(cmd, core, sink),
                None => unknown_text(&text),
            };
            replies.push(OutboundMessage {
                chat_id: message.chat.id,
                text: reply,
            });
        }
        replies
    }

    /// Long-poll loop; runs for the process lifetime on its own thread.
    pub fn run<R, C, E>(
        mut self,
        core: Arc<CrockpotCore<R>>,
        connectivity: C,
        mut sink: E,
        config: &SystemConfig,
    ) -> !
    where
        R: RelayPort,
        C: ConnectivityPort,
        E: EventSink,
    {
        info!("telegram: interface started");
        let poll = Duration::from_millis(u64::from(config.remote_poll_interval_ms));
        loop {
            if !connectivity.is_connected() {
                thread::sleep(Duration::from_secs(1));
                continue;
            }
            if let Some(payload) = self.fetch_updates() {
                let replies = self.process_payload(&payload, &core, &mut sink);
                for reply in replies {
                    self.send_message(&reply);
                }
            }
            thread::sleep(poll);
        }
    }

    // ── Transport (cfg-gated) ─────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn fetch_updates(&self) -> Option<String> {
        // esp_http_client GET of
        //   https://api.telegram.org/bot{token}/getUpdates?offset={n}&timeout=...
        // with the response body collected by the data-event handler.
        let _ = (&self.token, self.last_update_id);
        None
    }

    #[cfg(not(target_os = "espidf"))]
    fn fetch_updates(&self) -> Option<String> {
        None
    }

    #[cfg(target_os = "espidf")]
    fn send_message(&self, message: &OutboundMessage) {
        // esp_http_client POST to /sendMessage.
        info!("telegram: reply to chat {}", message.chat_id);
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_message(&self, message: &OutboundMessage) {
        info!("telegram(sim): -> chat {}: {}", message.chat_id, message.text);
    }
}
