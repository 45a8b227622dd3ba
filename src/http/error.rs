use rouille::Response;

use crate::artwork::ArtworkError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl From<ArtworkError> for ApiError {
    fn from(err: ArtworkError) -> Self {
        match err {
            ArtworkError::Fs(_) | ArtworkError::Poisoned => {
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl ApiError {
    pub fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => Response::text(msg).with_status_code(404),

            ApiError::Internal(msg) => Response::text(msg).with_status_code(500),
        }
    }
}
