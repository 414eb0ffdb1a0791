//! Component lookup outcomes and their protobuf error codes.

use serde::{Deserialize, Serialize};

/// Result of an operation on a single component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub message: String,
    pub status_code: ComponentStatusCode,
}

impl ComponentStatus {
    pub fn new(status_code: ComponentStatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == ComponentStatusCode::Success
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.status_code.error_code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatusCode {
    ComponentNotFound,
    InvalidPurl,
    ComponentWithoutInfo,
    Success,
    InvalidSemver,
}

impl ComponentStatusCode {
    /// The protobuf error code for this outcome; `None` for success.
    pub fn error_code(self) -> Option<ErrorCode> {
        match self {
            Self::InvalidPurl => Some(ErrorCode::InvalidPurl),
            Self::ComponentNotFound => Some(ErrorCode::ComponentNotFound),
            Self::InvalidSemver => Some(ErrorCode::InvalidSemver),
            Self::ComponentWithoutInfo => Some(ErrorCode::NoInfo),
            Self::Success => None,
        }
    }
}

/// Per-component error codes carried in response messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    Unspecified = 0,
    InvalidPurl = 1,
    ComponentNotFound = 2,
    NoInfo = 3,
    InvalidSemver = 4,
}

impl ErrorCode {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "ERROR_CODE_UNSPECIFIED",
            Self::InvalidPurl => "INVALID_PURL",
            Self::ComponentNotFound => "COMPONENT_NOT_FOUND",
            Self::NoInfo => "NO_INFO",
            Self::InvalidSemver => "INVALID_SEMVER",
        }
    }
}
