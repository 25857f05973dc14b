//! Realtime voice session owned by the caller.
//!
//! The transport is an opaque [`RealtimeChannel`]; this module only tracks
//! the session lifecycle, frames outgoing audio and decodes incoming tool
//! calls into [`VoiceCommand`]s.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    audio,
    error::{Result, StudioError},
    models::{GenerationConfig, PreservationFlag},
};

/// Bidirectional JSON message channel to the realtime speech service.
#[async_trait]
pub trait RealtimeChannel: Send {
    async fn open(&mut self) -> Result<()>;
    async fn send(&mut self, message: Value) -> Result<()>;
    /// `None` once the remote side has hung up.
    async fn recv(&mut self) -> Result<Option<Value>>;
    async fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Ready,
    Capturing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Base64 PCM16 audio from the model.
    Audio(String),
    Text(String),
    ToolCalls(Vec<ToolCall>),
    TurnComplete,
    Other(Value),
}

/// Commands the voice layer can trigger through tool calls.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceCommand {
    CapturePhoto,
    GenerateVariants,
    SetPreservation { flag: PreservationFlag, value: bool },
    SetContext(String),
    Unknown(String),
}

impl VoiceCommand {
    pub fn from_tool_call(call: &ToolCall) -> Self {
        match call.name.as_str() {
            "capture_photo" | "take_photo" => VoiceCommand::CapturePhoto,
            "generate_variants" | "generate" => VoiceCommand::GenerateVariants,
            "set_preservation" => {
                let flag = call
                    .args
                    .get("flag")
                    .and_then(Value::as_str)
                    .and_then(PreservationFlag::from_name);
                let value = call.args.get("value").and_then(Value::as_bool);
                match (flag, value) {
                    (Some(flag), Some(value)) => VoiceCommand::SetPreservation { flag, value },
                    _ => VoiceCommand::Unknown(call.name.clone()),
                }
            }
            "set_context" => match call.args.get("text").and_then(Value::as_str) {
                Some(text) => VoiceCommand::SetContext(text.to_string()),
                None => VoiceCommand::Unknown(call.name.clone()),
            },
            other => VoiceCommand::Unknown(other.to_string()),
        }
    }

    /// Applies settings commands to the caller's config and context.
    /// Returns false for commands that need the caller to act.
    pub fn apply(&self, config: &mut GenerationConfig, context: &mut String) -> bool {
        match self {
            VoiceCommand::SetPreservation { flag, value } => {
                config.set(*flag, *value);
                true
            }
            VoiceCommand::SetContext(text) => {
                *context = text.clone();
                true
            }
            _ => false,
        }
    }
}

pub struct VoiceSession<C: RealtimeChannel> {
    id: String,
    channel: C,
    state: SessionState,
    capture: CaptureState,
    sample_rate: u32,
}

impl<C: RealtimeChannel> VoiceSession<C> {
    pub fn new(channel: C) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel,
            state: SessionState::Idle,
            capture: CaptureState::Ready,
            sample_rate: audio::INPUT_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    pub async fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(StudioError::Session(format!(
                "cannot connect from {:?}",
                self.state
            )));
        }

        self.state = SessionState::Connecting;
        log::info!("Connecting voice session {}", self.id);
        match self.channel.open().await {
            Ok(()) => {
                self.state = SessionState::Active;
                log::info!("Voice session {} active", self.id);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Idle;
                log::error!("Voice session {} failed to connect: {}", self.id, e);
                Err(e)
            }
        }
    }

    pub async fn send_audio(&mut self, samples: &[f32]) -> Result<()> {
        self.ensure_active()?;
        let message = json!({
            "realtimeInput": {
                "mediaChunks": [{
                    "mimeType": audio::pcm_mime_type(self.sample_rate),
                    "data": audio::pcm16_base64(samples),
                }]
            }
        });
        self.channel.send(message).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ensure_active()?;
        let message = json!({
            "clientContent": {
                "turns": [{"role": "user", "parts": [{"text": text}]}],
                "turnComplete": true
            }
        });
        self.channel.send(message).await
    }

    pub async fn respond_to_tool(&mut self, call: &ToolCall, response: Value) -> Result<()> {
        self.ensure_active()?;
        let message = json!({
            "toolResponse": {
                "functionResponses": [{
                    "id": call.id,
                    "name": call.name,
                    "response": response,
                }]
            }
        });
        self.channel.send(message).await
    }

    /// Next decoded event; `None` once the channel has closed.
    pub async fn next_event(&mut self) -> Result<Option<SessionEvent>> {
        self.ensure_active()?;
        match self.channel.recv().await? {
            Some(message) => Ok(Some(decode_event(message))),
            None => {
                log::info!("Voice session {} closed by remote", self.id);
                self.state = SessionState::Closed;
                self.capture = CaptureState::Ready;
                Ok(None)
            }
        }
    }

    /// Refuses a second capture while one is still running.
    pub fn begin_capture(&mut self) -> Result<()> {
        self.ensure_active()?;
        if self.capture == CaptureState::Capturing {
            return Err(StudioError::Session("capture already in progress".into()));
        }
        self.capture = CaptureState::Capturing;
        Ok(())
    }

    pub fn end_capture(&mut self) {
        self.capture = CaptureState::Ready;
    }

    pub async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        let was_open = self.state != SessionState::Idle;
        self.state = SessionState::Closed;
        self.capture = CaptureState::Ready;
        if was_open {
            self.channel.close().await?;
        }
        log::info!("Voice session {} closed", self.id);
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(StudioError::Session(format!(
                "session is {:?}, expected Active",
                self.state
            )))
        }
    }
}

#[derive(Deserialize)]
struct RawFunctionCall {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    args: Value,
}

fn decode_event(message: Value) -> SessionEvent {
    if let Some(calls) = message
        .pointer("/toolCall/functionCalls")
        .and_then(|calls| serde_json::from_value::<Vec<RawFunctionCall>>(calls.clone()).ok())
    {
        return SessionEvent::ToolCalls(
            calls
                .into_iter()
                .map(|call| ToolCall {
                    id: call.id,
                    name: call.name,
                    args: call.args,
                })
                .collect(),
        );
    }

    if let Some(content) = message.get("serverContent") {
        if let Some(parts) = content.pointer("/modelTurn/parts").and_then(Value::as_array) {
            for part in parts {
                if let Some(data) = part.pointer("/inlineData/data").and_then(Value::as_str) {
                    return SessionEvent::Audio(data.to_string());
                }
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    return SessionEvent::Text(text.to_string());
                }
            }
        }
        if content.get("turnComplete").and_then(Value::as_bool) == Some(true) {
            return SessionEvent::TurnComplete;
        }
    }

    SessionEvent::Other(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct LoopbackChannel {
        fail_open: bool,
        incoming: VecDeque<Value>,
        sent: Vec<Value>,
        closed: bool,
    }

    #[async_trait]
    impl RealtimeChannel for LoopbackChannel {
        async fn open(&mut self) -> Result<()> {
            if self.fail_open {
                Err(StudioError::Session("handshake refused".into()))
            } else {
                Ok(())
            }
        }

        async fn send(&mut self, message: Value) -> Result<()> {
            self.sent.push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<Value>> {
            Ok(self.incoming.pop_front())
        }

        async fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let mut session = VoiceSession::new(LoopbackChannel::default());
        assert_eq!(session.state(), SessionState::Idle);

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.connect().await.is_err());

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.channel.closed);
        assert!(session.send_text("hello").await.is_err());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_connect_returns_to_idle() {
        let mut session = VoiceSession::new(LoopbackChannel {
            fail_open: true,
            ..Default::default()
        });
        assert!(session.connect().await.is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_capture_is_not_reentrant() {
        let mut session = VoiceSession::new(LoopbackChannel::default());
        assert!(session.begin_capture().is_err());

        session.connect().await.unwrap();
        session.begin_capture().unwrap();
        assert!(session.begin_capture().is_err());
        session.end_capture();
        session.begin_capture().unwrap();
    }

    #[tokio::test]
    async fn test_audio_frames() {
        let mut session = VoiceSession::new(LoopbackChannel::default());
        session.connect().await.unwrap();
        session.send_audio(&[0.0, 1.0]).await.unwrap();

        let chunk = &session.channel.sent[0]["realtimeInput"]["mediaChunks"][0];
        assert_eq!(chunk["mimeType"], "audio/pcm;rate=16000");
        assert_eq!(chunk["data"], audio::pcm16_base64(&[0.0, 1.0]));
    }

    #[tokio::test]
    async fn test_tool_calls_and_remote_close() {
        let mut channel = LoopbackChannel::default();
        channel.incoming.push_back(json!({
            "toolCall": {"functionCalls": [
                {"id": "1", "name": "set_preservation", "args": {"flag": "keepFace", "value": true}},
                {"id": "2", "name": "capture_photo", "args": {}}
            ]}
        }));
        channel.incoming.push_back(json!({"serverContent": {"turnComplete": true}}));

        let mut session = VoiceSession::new(channel);
        session.connect().await.unwrap();

        let calls = match session.next_event().await.unwrap() {
            Some(SessionEvent::ToolCalls(calls)) => calls,
            other => panic!("unexpected event: {:?}", other),
        };
        let commands: Vec<_> = calls.iter().map(VoiceCommand::from_tool_call).collect();
        assert_eq!(
            commands,
            vec![
                VoiceCommand::SetPreservation {
                    flag: PreservationFlag::Face,
                    value: true
                },
                VoiceCommand::CapturePhoto,
            ]
        );

        session.respond_to_tool(&calls[1], json!({"ok": true})).await.unwrap();
        assert_eq!(
            session.channel.sent[0]["toolResponse"]["functionResponses"][0]["id"],
            "2"
        );

        assert_eq!(
            session.next_event().await.unwrap(),
            Some(SessionEvent::TurnComplete)
        );
        assert_eq!(session.next_event().await.unwrap(), None);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_commands_apply_to_settings() {
        let mut config = GenerationConfig::default();
        let mut context = String::new();

        assert!(VoiceCommand::SetContext("neon alley".into()).apply(&mut config, &mut context));
        assert!(VoiceCommand::SetPreservation {
            flag: PreservationFlag::Monochrome,
            value: true
        }
        .apply(&mut config, &mut context));
        assert!(!VoiceCommand::GenerateVariants.apply(&mut config, &mut context));

        assert_eq!(context, "neon alley");
        assert!(config.monochrome);
    }

    #[test]
    fn test_malformed_tool_call_is_unknown() {
        let call = ToolCall {
            id: "x".into(),
            name: "set_preservation".into(),
            args: json!({"flag": "lighting", "value": true}),
        };
        assert_eq!(
            VoiceCommand::from_tool_call(&call),
            VoiceCommand::Unknown("set_preservation".into())
        );
    }

    #[test]
    fn test_decodes_model_audio() {
        let event = decode_event(json!({
            "serverContent": {"modelTurn": {"parts": [
                {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAAA"}}
            ]}}
        }));
        assert_eq!(event, SessionEvent::Audio("AAAA".into()));
    }
}
