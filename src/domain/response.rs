use serde::{Deserialize, Serialize};

/// Outcome of processing one command, keyed by command id.
///
/// `resource_id` is present only on success and `reason` only on rejection;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    command_id: String,
    status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    Succeeded,
    Rejected,
}

impl CommandResponse {
    pub fn succeeded(command_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            status: CommandStatus::Succeeded,
            resource_id: Some(resource_id.into()),
            reason: None,
        }
    }

    pub fn rejected(command_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            status: CommandStatus::Rejected,
            resource_id: None,
            reason: Some(reason.into()),
        }
    }

    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == CommandStatus::Succeeded
    }
}
