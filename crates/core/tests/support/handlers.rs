use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courier_core::{CallbackContext, MessageHandler, ReplySink};
use courier_domain::{PlatformMessage, TextReply};

/// What a [`RecordingHandler`] answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    Acknowledge,
    EchoRaw,
    EchoEncrypted,
}

/// Handler that records every message it sees and optionally echoes text
/// content back as a passive reply.
pub struct RecordingHandler {
    seen: Mutex<Vec<CallbackContext>>,
    mode: ReplyMode,
}

impl RecordingHandler {
    pub fn new(mode: ReplyMode) -> Arc<Self> {
        Arc::new(Self { seen: Mutex::new(Vec::new()), mode })
    }

    pub fn messages(&self) -> Vec<PlatformMessage> {
        self.seen.lock().unwrap().iter().map(|ctx| ctx.message.clone()).collect()
    }

    pub fn contexts(&self) -> Vec<CallbackContext> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, ctx: &CallbackContext, reply: &mut ReplySink<'_>) {
        self.seen.lock().unwrap().push(ctx.clone());

        let content = ctx.message.content.clone().unwrap_or_default();
        let xml = TextReply::to(&ctx.message, format!("echo: {content}"), ctx.message.create_time)
            .to_xml()
            .unwrap();
        match self.mode {
            ReplyMode::Acknowledge => reply.reply_none(),
            ReplyMode::EchoRaw => reply.reply_raw(xml),
            ReplyMode::EchoEncrypted => reply.reply_encrypted(&xml).unwrap(),
        }
    }
}
