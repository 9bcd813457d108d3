//! Request and response bodies of the balancer API

use serde::{Deserialize, Serialize};

use crate::infrastructure::team::InstanceSummary;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub passcode: Option<String>,
}

/// Plain acknowledgement, optionally disclosing a freshly issued passcode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            passcode: None,
        }
    }

    pub fn with_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.passcode = Some(passcode.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResponse {
    pub team: String,
    pub name: String,
    pub ready: bool,
    pub created_at: i64,
    pub last_connect: i64,
    pub challenges_solved: u32,
}

impl From<InstanceSummary> for InstanceResponse {
    fn from(instance: InstanceSummary) -> Self {
        Self {
            team: instance.team,
            name: instance.name,
            ready: instance.ready,
            created_at: instance.created_at,
            last_connect: instance.last_connect,
            challenges_solved: instance.challenges_solved,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceListResponse {
    pub instances: Vec<InstanceResponse>,
}
