//! The common `StatusResponse` message and status injection into responses.

use serde::{Serialize, Serializer};

/// Outcome of a request, embedded in every response message.
#[derive(Clone, PartialEq, prost::Message, Serialize)]
pub struct StatusResponse {
    #[prost(enumeration = "StatusCode", tag = "1")]
    #[serde(serialize_with = "serialize_status_code")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum StatusCode {
    Unspecified = 0,
    Success = 1,
    SucceededWithWarnings = 2,
    Warning = 3,
    Failed = 4,
}

impl StatusCode {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Success => "SUCCESS",
            Self::SucceededWithWarnings => "SUCCEEDED_WITH_WARNINGS",
            Self::Warning => "WARNING",
            Self::Failed => "FAILED",
        }
    }
}

impl StatusResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status as i32,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Success, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Failed, message)
    }
}

fn serialize_status_code<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    match StatusCode::try_from(*value) {
        Ok(code) => serializer.serialize_str(code.as_str_name()),
        Err(_) => serializer.serialize_i32(*value),
    }
}

/// Response messages that can receive a [`StatusResponse`].
///
/// Implement it with [`impl_with_status!`](crate::impl_with_status) rather
/// than by hand.
pub trait WithStatus {
    fn set_status(&mut self, status: StatusResponse);
}

/// Implement [`WithStatus`] for response messages.
///
/// Types listed plainly must have a `status: Option<StatusResponse>` field,
/// which gets overwritten. Types listed after `@none` have no status field and
/// ignore the call.
///
/// ```ignore
/// gateway_kit_grpc::impl_with_status!(ComponentsResponse, VersionsResponse);
/// gateway_kit_grpc::impl_with_status!(@none EchoResponse);
/// ```
#[macro_export]
macro_rules! impl_with_status {
    (@none $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::WithStatus for $ty {
                fn set_status(&mut self, _status: $crate::StatusResponse) {}
            }
        )+
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::WithStatus for $ty {
                fn set_status(&mut self, status: $crate::StatusResponse) {
                    self.status = ::core::option::Option::Some(status);
                }
            }
        )+
    };
}

/// Set the status field of `response`, if there is one.
pub fn inject_status<T: WithStatus>(response: Option<&mut T>, status: StatusResponse) {
    if let Some(response) = response {
        response.set_status(status);
    }
}
