use thiserror::Error;

/// Result type alias using LinkTreeError
pub type Result<T> = std::result::Result<T, LinkTreeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code. Protocol responders translate
/// these codes into protocol-level error replies, so codes never change once
/// published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural
    InvalidInput,
    NotFound,
    AlreadyExists,
    IllegalReparent,
    CycleDetected,
    CannotDelete,

    // Lifecycle
    InvalidLifecycle,

    // Defaults
    DefaultImmutable,
    BootstrapFailed,
    UnknownType,

    // Codec
    InvalidPath,
    InvalidSnapshot,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::IllegalReparent => "ERR_ILLEGAL_REPARENT",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::CannotDelete => "ERR_CANNOT_DELETE",
            ExErrorKind::InvalidLifecycle => "ERR_INVALID_LIFECYCLE",
            ExErrorKind::DefaultImmutable => "ERR_DEFAULT_IMMUTABLE",
            ExErrorKind::BootstrapFailed => "ERR_BOOTSTRAP_FAILED",
            ExErrorKind::UnknownType => "ERR_UNKNOWN_TYPE",
            ExErrorKind::InvalidPath => "ERR_INVALID_PATH",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the node path and child name the failure
/// is about, which is what a remote peer needs to see.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    child: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            child: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add node path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add child name context
    pub fn with_child(mut self, child: impl Into<String>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the node path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the child name context, if any
    pub fn child(&self) -> Option<&str> {
        self.child.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(child) = &self.child {
            write!(f, " (child: {})", child)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for node tree operations
///
/// Every variant is a contract violation reported synchronously to the
/// caller; hook failures never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkTreeError {
    // ===== Structural Errors =====
    /// A child with this name already exists in the container
    #[error("Duplicate child {name} in {path}")]
    DuplicateChild { path: String, name: String },

    /// The node being added already has a parent
    #[error("Node {name} is already a child of {parent_path}")]
    AlreadyParented { name: String, parent_path: String },

    /// Adding the node would make a container its own ancestor
    #[error("Cycle detected: adding {name} to {path} would make it its own ancestor")]
    CycleDetected { path: String, name: String },

    /// The child record belongs to a different container
    #[error("Child record {name} is not owned by {path}")]
    ForeignInfo { path: String, name: String },

    /// No child with this name
    #[error("Child {name} not found in {path}")]
    ChildNotFound { path: String, name: String },

    /// Permanent children cannot be removed
    #[error("Cannot remove permanent child {name} from {path}")]
    PermanentChild { path: String, name: String },

    // ===== Lifecycle Errors =====
    /// start() called on a node that is already started or stable
    #[error("Node already running: {path}")]
    AlreadyRunning { path: String },

    /// stable() called on a node that is not in the started state
    #[error("Node {path} is not started (state: {state})")]
    NotStarted { path: String, state: String },

    // ===== Default Errors =====
    /// A type's default instance was mutated after bootstrap
    #[error("Default instance of {type_name} cannot be modified")]
    DefaultInstanceImmutable { type_name: String },

    /// declare_default() called outside of default bootstrap
    #[error("declare_default on {type_name} is only allowed while declaring defaults")]
    NotBootstrapping { type_name: String },

    /// The type's declare_defaults() failed
    #[error("Failed to build default instance of {type_name}: {reason}")]
    DefaultBootstrapFailed { type_name: String, reason: String },

    /// No node type registered under this name
    #[error("Unknown node type: {type_name}")]
    UnknownNodeType { type_name: String },

    // ===== Codec Errors =====
    /// Malformed node path
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Snapshot document is structurally invalid
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from LinkTreeError to ExError
impl From<LinkTreeError> for ExError {
    fn from(err: LinkTreeError) -> Self {
        match err {
            LinkTreeError::DuplicateChild { path, name } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_path(path)
                    .with_child(name)
                    .with_message("Child name already in use")
            }

            LinkTreeError::AlreadyParented { name, parent_path } => {
                ExError::new(ExErrorKind::IllegalReparent)
                    .with_child(name)
                    .with_message(format!("Node is already a child of {}", parent_path))
            }

            LinkTreeError::CycleDetected { path, name } => ExError::new(ExErrorKind::CycleDetected)
                .with_path(path)
                .with_child(name)
                .with_message("Node would become its own ancestor"),

            LinkTreeError::ForeignInfo { path, name } => ExError::new(ExErrorKind::InvalidInput)
                .with_path(path)
                .with_child(name)
                .with_message("Child record is owned by another container"),

            LinkTreeError::ChildNotFound { path, name } => ExError::new(ExErrorKind::NotFound)
                .with_path(path)
                .with_child(name)
                .with_message("Child not found"),

            LinkTreeError::PermanentChild { path, name } => ExError::new(ExErrorKind::CannotDelete)
                .with_op("remove")
                .with_path(path)
                .with_child(name)
                .with_message("Child is permanent"),

            LinkTreeError::AlreadyRunning { path } => ExError::new(ExErrorKind::InvalidLifecycle)
                .with_op("start")
                .with_path(path)
                .with_message("Node already running"),

            LinkTreeError::NotStarted { path, state } => {
                ExError::new(ExErrorKind::InvalidLifecycle)
                    .with_op("stable")
                    .with_path(path)
                    .with_message(format!("Node is not started (state: {})", state))
            }

            LinkTreeError::DefaultInstanceImmutable { type_name } => {
                ExError::new(ExErrorKind::DefaultImmutable)
                    .with_message(format!("Default instance of {} is immutable", type_name))
            }

            LinkTreeError::NotBootstrapping { type_name } => {
                ExError::new(ExErrorKind::DefaultImmutable)
                    .with_op("declare_default")
                    .with_message(format!("{} is not declaring defaults", type_name))
            }

            LinkTreeError::DefaultBootstrapFailed { type_name, reason } => {
                ExError::new(ExErrorKind::BootstrapFailed)
                    .with_op("declare_defaults")
                    .with_message(format!("{}: {}", type_name, reason))
            }

            LinkTreeError::UnknownNodeType { type_name } => ExError::new(ExErrorKind::UnknownType)
                .with_message(format!("Unknown node type {}", type_name)),

            LinkTreeError::InvalidPath { path, reason } => ExError::new(ExErrorKind::InvalidPath)
                .with_path(path)
                .with_message(reason),

            LinkTreeError::InvalidSnapshot { reason } => {
                ExError::new(ExErrorKind::InvalidSnapshot).with_message(reason)
            }

            LinkTreeError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            LinkTreeError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to LinkTreeError
impl From<serde_json::Error> for LinkTreeError {
    fn from(err: serde_json::Error) -> Self {
        LinkTreeError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_kinds_share_a_code() {
        let running: ExError = LinkTreeError::AlreadyRunning {
            path: "/a".to_string(),
        }
        .into();
        let not_started: ExError = LinkTreeError::NotStarted {
            path: "/a".to_string(),
            state: "stopped".to_string(),
        }
        .into();
        assert_eq!(running.code(), "ERR_INVALID_LIFECYCLE");
        assert_eq!(running.code(), not_started.code());
        assert_ne!(running.op(), not_started.op());
    }

    #[test]
    fn test_display_includes_path_and_child() {
        let err: ExError = LinkTreeError::PermanentChild {
            path: "/dev".to_string(),
            name: "count".to_string(),
        }
        .into();
        let text = err.to_string();
        assert!(text.starts_with("[ERR_CANNOT_DELETE]"));
        assert!(text.contains("(path: /dev)"));
        assert!(text.contains("(child: count)"));
    }

    #[test]
    fn test_source_chain() {
        let inner = ExError::new(ExErrorKind::Serialization);
        let outer = ExError::new(ExErrorKind::InvalidSnapshot).with_source(inner);
        assert_eq!(
            outer.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Serialization)
        );
        assert!(std::error::Error::source(&outer).is_some());
    }
}
