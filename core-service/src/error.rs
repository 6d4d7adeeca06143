use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] core_extraction::ExtractionError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
