use thiserror::Error;

/// Errors produced by capability invocation.
///
/// All of these are recoverable: they are returned to the caller as
/// structured results and mirrored on the event sink, never panicked on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("subsystem `{0}` is not active")]
    NotActive(String),

    #[error("tool `{0}` is not registered")]
    ToolNotFound(String),

    #[error("resource `{0}` is not registered")]
    ResourceNotFound(String),

    #[error("tool `{tool}` is missing required parameter `{param}`")]
    MissingParameter { tool: String, param: String },

    #[error("invalid argument for `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },
}

impl CapabilityError {
    /// Short machine-readable tag used in emitted error events.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NotActive(_) => "not_active",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::InvalidArgument { .. } => "invalid_argument",
        }
    }
}
