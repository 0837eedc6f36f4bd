//! JSON shapes exchanged with the comparison backend.

use reconnoiter_core::{ComparisonResult, JobEvent, ProgressSnapshot, Step};
use serde::{Deserialize, Serialize};

use crate::{ApiError, CreatedJob};

pub const PROCESSING_MESSAGE: &str = "Processing...";
pub const COMPLETE_MESSAGE: &str = "Complete!";
pub const ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Serialize)]
pub(crate) struct CreateComparisonRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateComparisonResponse {
    pub session_id: String,
    pub websocket_url: Option<String>,
    pub status_url: Option<String>,
}

impl From<CreateComparisonResponse> for CreatedJob {
    fn from(response: CreateComparisonResponse) -> Self {
        Self {
            session_id: response.session_id.into(),
            channel_endpoint: response.websocket_url.filter(|url| !url.is_empty()),
            poll_endpoint: response.status_url.filter(|url| !url.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Processing,
    Complete,
    Error,
}

/// Body of `GET /comparisons/status/:session_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: StatusKind,
    pub step: Option<String>,
    pub message: Option<String>,
    pub percentage: Option<f64>,
    pub current: Option<u32>,
    pub total: Option<u32>,
    pub comparison_id: Option<u64>,
    pub redirect_url: Option<String>,
    pub error: Option<String>,
}

impl StatusResponse {
    fn empty(status: StatusKind) -> Self {
        Self {
            status,
            step: None,
            message: None,
            percentage: None,
            current: None,
            total: None,
            comparison_id: None,
            redirect_url: None,
            error: None,
        }
    }

    pub fn processing(percentage: f64) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::empty(StatusKind::Processing)
        }
    }

    pub fn complete(comparison_id: u64) -> Self {
        Self {
            comparison_id: Some(comparison_id),
            ..Self::empty(StatusKind::Complete)
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::empty(StatusKind::Error)
        }
    }

    /// Classifies the response. A `complete` status without a comparison id
    /// cannot be acted on and is reported as a decode error.
    pub fn into_event(self) -> Result<JobEvent, ApiError> {
        match self.status {
            StatusKind::Processing => Ok(JobEvent::Progress(ProgressSnapshot {
                step: self.step.as_deref().and_then(Step::from_wire),
                message: Some(non_empty(self.message).unwrap_or_else(|| PROCESSING_MESSAGE.into())),
                percentage: self.percentage.unwrap_or(0.0),
                current: self.current,
                total: self.total,
            })),
            StatusKind::Complete => {
                let comparison_id = self.comparison_id.ok_or_else(|| {
                    ApiError::Decode("complete status without comparison_id".into())
                })?;
                Ok(JobEvent::Complete {
                    result: ComparisonResult {
                        comparison_id,
                        redirect_url: self.redirect_url,
                    },
                    message: Some(
                        non_empty(self.message).unwrap_or_else(|| COMPLETE_MESSAGE.into()),
                    ),
                })
            }
            StatusKind::Error => Ok(JobEvent::Failed {
                reason: non_empty(self.error).unwrap_or_else(|| ERROR_MESSAGE.into()),
            }),
        }
    }
}

/// Payload pushed over the realtime channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    Progress {
        #[serde(default)]
        step: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        percentage: Option<f64>,
        #[serde(default)]
        current: Option<u32>,
        #[serde(default)]
        total: Option<u32>,
    },
    Complete {
        comparison_id: u64,
        #[serde(default)]
        redirect_url: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

impl ChannelMessage {
    pub fn into_event(self) -> JobEvent {
        match self {
            ChannelMessage::Progress {
                step,
                message,
                percentage,
                current,
                total,
            } => JobEvent::Progress(ProgressSnapshot {
                step: step.as_deref().and_then(Step::from_wire),
                message,
                percentage: percentage.unwrap_or(0.0),
                current,
                total,
            }),
            ChannelMessage::Complete {
                comparison_id,
                redirect_url,
                message,
            } => JobEvent::Complete {
                result: ComparisonResult {
                    comparison_id,
                    redirect_url,
                },
                message: Some(non_empty(message).unwrap_or_else(|| COMPLETE_MESSAGE.into())),
            },
            ChannelMessage::Error { message } => JobEvent::Failed {
                reason: non_empty(message).unwrap_or_else(|| ERROR_MESSAGE.into()),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
