// faultline-gateway/src/extract.rs
// ============================================================================
// Module: Gateway Extractors
// Description: JSON body extraction normalized to the error envelope.
// Purpose: Keep malformed bodies on 400 with a stable error code.
// Dependencies: axum, faultline-contract
// ============================================================================

//! ## Overview
//! [`Body<T>`] wraps the stock JSON extractor so every deserialization
//! failure (malformed JSON, wrong shapes, missing fields) answers 400 with
//! the standard `VALIDATION_ERROR` envelope instead of the framework's
//! default rejection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::Request;
use axum::extract::rejection::JsonRejection;

use crate::error::ApiError;

// ============================================================================
// SECTION: Body Extractor
// ============================================================================

/// JSON body extractor with normalized validation failures.
pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}
