//! # Custom Extractors & Validation
//!
//! The [`Validate`] trait for request DTOs, plus helpers that turn axum
//! rejections into [`AppError`] so every malformed request gets the same
//! JSON error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::Json;
use serde::de::DeserializeOwned;

use civic_core::ValidationError;

use crate::error::AppError;

/// Request types with business rules beyond what serde checks.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

/// Extract a numeric row identifier from the path, e.g. `/issue/vote/:id`.
pub fn extract_id<T: From<i64>>(result: Result<Path<i64>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(id)| T::from(id))
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract query parameters, mapping parse failures to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse an optional JSON body from raw bytes.
///
/// An empty body yields `T::default()`. Anything else must parse as `T`,
/// whatever the `Content-Type`, or the request is a [`AppError::BadRequest`].
pub fn extract_optional_json<T>(body: Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("Failed to parse the request body as JSON: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Note {
        #[serde(default)]
        text: Option<String>,
    }

    #[test]
    fn empty_body_yields_default() {
        let note: Note = extract_optional_json(Bytes::new()).unwrap();
        assert_eq!(note, Note::default());
        let note: Note = extract_optional_json(Bytes::from_static(b" \n")).unwrap();
        assert_eq!(note, Note::default());
    }

    #[test]
    fn present_body_is_parsed() {
        let note: Note = extract_optional_json(Bytes::from_static(br#"{"text":"hi"}"#)).unwrap();
        assert_eq!(note.text.as_deref(), Some("hi"));
    }

    #[test]
    fn mistyped_body_is_rejected() {
        let err = extract_optional_json::<Note>(Bytes::from_static(br#"{"text":42}"#)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = extract_optional_json::<Note>(Bytes::from_static(b"not json")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
