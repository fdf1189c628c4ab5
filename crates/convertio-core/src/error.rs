use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("No files uploaded")]
    NoFiles,

    #[error("File '{0}' is empty")]
    EmptyFile(String),

    #[error("For this tool, please upload only one PDF at a time.")]
    TooManyFiles,

    #[error("{0}")]
    WrongFileType(String),

    #[error("Tool not supported: {0}")]
    UnsupportedTool(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Invalid rotation: {0}")]
    InvalidRotation(String),

    #[error("Password is required")]
    MissingPassword,

    #[error("PDF is already encrypted")]
    AlreadyEncrypted,

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ConvertError {
    /// True when the caller supplied bad input, false when the library failed.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ConvertError::ParseError(_)
                | ConvertError::OperationError(_)
                | ConvertError::SerializationError(_)
        )
    }
}
