use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

// Contact form payload
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required".to_string());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("name must be at most {} characters", MAX_NAME_LEN));
        }

        if !is_plausible_email(self.email.trim()) {
            return Err("email is invalid".to_string());
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err("message is required".to_string());
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(format!("message must be at most {} characters", MAX_MESSAGE_LEN));
        }

        Ok(())
    }
}

// one '@' with something on both sides, no whitespace
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ContactResponse {
    pub status: String,
    pub remaining: u32,
}

// Queued submission - holds request + response channel
pub struct QueuedSubmission {
    pub request: ContactRequest,
    pub identifier: String,
    pub response_tx: oneshot::Sender<Result<(), String>>, //one-time channel to send back the delivery outcome
}
