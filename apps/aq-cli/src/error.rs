//! Error type for the interpreter, wrapping the engine errors and the
//! interpreter's own parse failures.

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Net(#[from] aq_network::NetError),

    #[error(transparent)]
    Analysis(#[from] aq_analysis::AnalysisError),

    #[error(transparent)]
    Core(#[from] aq_core::CoreError),

    #[error("unknown command: {line}")]
    UnknownCommand { line: String },

    #[error("missing argument for {command}")]
    MissingArgument { command: &'static str },

    #[error("malformed number: {text}")]
    BadNumber { text: String },

    #[error("malformed coordinate: {text}")]
    BadCoordinate { text: String },

    #[error("malformed pipe id (expected from-to): {text}")]
    BadPipeId { text: String },

    #[error("malformed observation (expected '<terminal> YES|NO'): {text}")]
    BadObservation { text: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
