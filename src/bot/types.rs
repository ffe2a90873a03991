use serde::{Deserialize, Serialize};

/// Incoming webhook update. Only the fields the command handler reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

impl Message {
    /// Sender id, falling back to the chat id for anonymous senders
    pub fn sender_id(&self) -> i64 {
        self.from.as_ref().map(|user| user.id).unwrap_or(self.chat.id)
    }
}

/// Payload of `sendMessage`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            reply_markup: None,
        }
    }

    pub fn with_url_button(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.reply_markup = Some(InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: label.into(),
                url: url.into(),
            }]],
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

/// Envelope of every bot API reply
#[derive(Debug, Deserialize)]
pub struct ApiReply {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}
