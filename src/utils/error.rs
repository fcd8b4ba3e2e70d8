use thiserror::Error;
use tracing::error;

use crate::api::ApiError;
use crate::scanner::DecoderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Decoder(#[from] DecoderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan loop stopped unexpectedly")]
    LoopClosed,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidLink(_) => "INVALID_LINK",
            AppError::Api(ApiError::Rejected { .. }) => "REJECTED",
            AppError::Api(_) => "CONNECTION_ERROR",
            AppError::Decoder(_) => "DECODER_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::LoopClosed => "LOOP_CLOSED",
        }
    }

    pub fn log(&self) {
        match self {
            AppError::InvalidLink(msg) => {
                error!(code = self.code(), message = %msg, "Application error");
            }
            AppError::Api(e) => {
                error!(code = self.code(), error = ?e, "Backend error");
            }
            AppError::Decoder(e) => {
                error!(code = self.code(), error = ?e, "Decoder error");
            }
            AppError::Io(e) => {
                error!(code = self.code(), error = ?e, "I/O error");
            }
            AppError::LoopClosed => {
                error!(code = self.code(), "Application error");
            }
        }
    }
}
