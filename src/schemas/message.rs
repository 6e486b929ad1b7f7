use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::Message;
use crate::db::types::MessageType;
use crate::repositories::messages::MessageListRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MessageCreate {
    #[serde(default)]
    pub(crate) message_type: MessageType,
    #[validate(length(min = 1, max = 200, message = "subject must be 1 to 200 characters"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MessageRespond {
    #[validate(length(min = 1, message = "response must not be empty"))]
    pub(crate) response: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) id: String,
    pub(crate) message_type: MessageType,
    pub(crate) subject: String,
    pub(crate) content: String,
    pub(crate) sent_at: String,
    pub(crate) is_read: bool,
    pub(crate) response: Option<String>,
    pub(crate) responded_at: Option<String>,
    pub(crate) admin_account_id: Option<String>,
}

impl MessageResponse {
    pub(crate) fn from_db(message: Message) -> Self {
        Self {
            id: message.id,
            message_type: message.message_type,
            subject: message.subject,
            content: message.content,
            sent_at: format_primitive(message.sent_at),
            is_read: message.is_read,
            response: message.response,
            responded_at: format_optional(message.responded_at),
            admin_account_id: message.admin_account_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageListItem {
    #[serde(flatten)]
    pub(crate) message: MessageResponse,
    pub(crate) student_id: String,
    pub(crate) student_code: String,
    pub(crate) student_full_name: String,
}

impl MessageListItem {
    pub(crate) fn from_row(row: MessageListRow) -> Self {
        Self {
            student_id: row.message.student_id.clone(),
            message: MessageResponse::from_db(row.message),
            student_code: row.student_code,
            student_full_name: row.student_full_name,
        }
    }
}

/// Raw query string of the admin message list.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageListQuery {
    #[serde(default, rename = "type")]
    pub(crate) message_type: Option<String>,
    #[serde(default)]
    pub(crate) read: Option<String>,
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) page: Option<String>,
}
