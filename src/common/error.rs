use std::fmt;
use thiserror::Error;

/// Graph analysis error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    // General errors
    Failed = 1,
    Internal = 4,
    BadParameter = 10,
    SerializationError = 40,
    ConfigurationError = 41,

    // Graph construction errors
    MalformedInput = 1100,
    UnsupportedModel = 1101,
    GenerationFailed = 1102,

    // Graph query errors
    NodeNotFound = 1200,
    EmptyGraph = 1201,
    MetricsNotComputed = 1202,
    GraphTooLarge = 1203,

    // Path errors
    NegativeCycle = 1300,

    // Growth errors
    GrowthStalled = 1400,
    NotGrowing = 1401,
}

impl ErrorCode {
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => ErrorCode::Failed,
            4 => ErrorCode::Internal,
            10 => ErrorCode::BadParameter,
            40 => ErrorCode::SerializationError,
            41 => ErrorCode::ConfigurationError,
            1100 => ErrorCode::MalformedInput,
            1101 => ErrorCode::UnsupportedModel,
            1102 => ErrorCode::GenerationFailed,
            1200 => ErrorCode::NodeNotFound,
            1201 => ErrorCode::EmptyGraph,
            1202 => ErrorCode::MetricsNotComputed,
            1203 => ErrorCode::GraphTooLarge,
            1300 => ErrorCode::NegativeCycle,
            1400 => ErrorCode::GrowthStalled,
            1401 => ErrorCode::NotGrowing,
            _ => ErrorCode::Internal, // Unknown error codes default to Internal
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Failed => write!(f, "failed"),
            ErrorCode::Internal => write!(f, "internal error"),
            ErrorCode::BadParameter => write!(f, "bad parameter"),
            ErrorCode::SerializationError => write!(f, "serialization error"),
            ErrorCode::ConfigurationError => write!(f, "configuration error"),
            ErrorCode::MalformedInput => write!(f, "malformed input"),
            ErrorCode::UnsupportedModel => write!(f, "unsupported model"),
            ErrorCode::GenerationFailed => write!(f, "generation failed"),
            ErrorCode::NodeNotFound => write!(f, "node not found"),
            ErrorCode::EmptyGraph => write!(f, "empty graph"),
            ErrorCode::MetricsNotComputed => write!(f, "metrics not computed"),
            ErrorCode::GraphTooLarge => write!(f, "graph too large"),
            ErrorCode::NegativeCycle => write!(f, "negative cycle"),
            ErrorCode::GrowthStalled => write!(f, "growth stalled"),
            ErrorCode::NotGrowing => write!(f, "graph is not growing"),
        }
    }
}

/// Main graph analysis error type
#[derive(Error, Debug)]
pub enum GraphLabError {
    #[error("graph error {code}: {message}")]
    Graph {
        code: ErrorCode,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl GraphLabError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        GraphLabError::Graph {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        GraphLabError::new(ErrorCode::Internal, message)
    }

    pub fn bad_parameter(message: impl Into<String>) -> Self {
        GraphLabError::new(ErrorCode::BadParameter, message)
    }

    /// Edge-list text that breaks the 2-or-3-token row contract
    pub fn malformed_input(line: usize, message: impl Into<String>) -> Self {
        GraphLabError::new(
            ErrorCode::MalformedInput,
            format!("line {}: {}", line, message.into())
        )
    }

    pub fn unsupported_model(model: impl Into<String>) -> Self {
        GraphLabError::new(
            ErrorCode::UnsupportedModel,
            format!("unknown graph model '{}'", model.into())
        )
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        GraphLabError::new(ErrorCode::GenerationFailed, message)
    }

    pub fn node_not_found(node: impl fmt::Display) -> Self {
        GraphLabError::new(
            ErrorCode::NodeNotFound,
            format!("node '{}' not found in graph", node)
        )
    }

    pub fn empty_graph(message: impl Into<String>) -> Self {
        GraphLabError::new(ErrorCode::EmptyGraph, message)
    }

    pub fn metrics_not_computed() -> Self {
        GraphLabError::new(
            ErrorCode::MetricsNotComputed,
            "node metrics have not been computed for this graph"
        )
    }

    pub fn graph_too_large(operation: &str, nodes: usize, limit: usize) -> Self {
        GraphLabError::new(
            ErrorCode::GraphTooLarge,
            format!("{} refused: {} nodes exceeds the limit of {}", operation, nodes, limit)
        )
    }

    pub fn negative_cycle() -> Self {
        GraphLabError::new(
            ErrorCode::NegativeCycle,
            "graph contains a negative cycle; shortest paths are undefined"
        )
    }

    pub fn growth_stalled(attempts: usize, degree: usize, target: usize) -> Self {
        GraphLabError::new(
            ErrorCode::GrowthStalled,
            format!(
                "preferential attachment stalled after {} attempts at degree {} of {}",
                attempts, degree, target
            )
        )
    }

    pub fn not_growing() -> Self {
        GraphLabError::new(
            ErrorCode::NotGrowing,
            "graph was not created by a growth model"
        )
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            GraphLabError::Graph { code, .. } => *code,
            GraphLabError::Io(_) => ErrorCode::Failed,
            GraphLabError::Config(_) => ErrorCode::ConfigurationError,
            GraphLabError::Serde(_) => ErrorCode::SerializationError,
            GraphLabError::Toml(_) => ErrorCode::SerializationError,
        }
    }

    pub fn is_malformed_input(&self) -> bool {
        self.error_code() == ErrorCode::MalformedInput
    }

    pub fn is_negative_cycle(&self) -> bool {
        self.error_code() == ErrorCode::NegativeCycle
    }
}

/// Result type alias for graph analysis operations
pub type Result<T> = std::result::Result<T, GraphLabError>;

/// Macro for creating graph analysis errors
#[macro_export]
macro_rules! graphlab_error {
    ($code:expr, $($arg:tt)*) => {
        $crate::common::error::GraphLabError::new($code, format!($($arg)*))
    };
}

/// Macro for early return on error
#[macro_export]
macro_rules! graphlab_bail {
    ($code:expr, $($arg:tt)*) => {
        return Err($crate::graphlab_error!($code, $($arg)*))
    };
}

/// Macro for ensuring a condition or returning an error
#[macro_export]
macro_rules! graphlab_ensure {
    ($cond:expr, $code:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::graphlab_bail!($code, $($arg)*);
        }
    };
}
