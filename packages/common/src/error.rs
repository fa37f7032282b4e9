use thiserror::Error;

/// Errors shared by every trellis crate that touches paths or files
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path '{path}' escapes the project root")]
    PathEscapesRoot { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

pub type CommonResult<T> = Result<T, CommonError>;
