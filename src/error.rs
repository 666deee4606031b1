use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode source{}: {source}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    StreamDecode {
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    #[error("No mapping selected for required field '{field}'")]
    MissingRequiredMapping { field: String },

    #[error("Invalid selection for field '{field}': {reason}")]
    InvalidSelection { field: String, reason: String },

    #[error("Unknown choice {id} for field '{field}'")]
    UnknownLookup { field: String, id: i64 },

    #[error("Row {row}, field '{field}': {reason}")]
    RowMaterialization {
        row: u64,
        field: String,
        reason: String,
    },

    #[error("Draft {draft} rejected: {reason}")]
    SinkRejection { draft: usize, reason: String },

    #[error("Unknown target field: {0}")]
    UnknownField(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl From<csv::Error> for ImportError {
    fn from(source: csv::Error) -> Self {
        let line = source.position().map(|p| p.line());
        ImportError::StreamDecode { line, source }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
