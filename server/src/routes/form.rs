//! Multipart form reading for report uploads.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;

use crate::error::{ApiError, ApiResult};

/// Name of the file part carrying the report image.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// A fully buffered multipart form: text fields plus at most one image.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, Vec<String>>,
    image: Option<Upload>,
}

impl Form {
    /// Drain every part of the request body.
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart?;
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(invalid_form)?;
                form.image = Some(Upload { file_name, bytes });
            } else {
                let value = field.text().await.map_err(invalid_form)?;
                form.fields.entry(name).or_default().push(value);
            }
        }
        Ok(form)
    }

    /// First non-blank value of a text field, trimmed.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)?
            .iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Like [`Form::text`] but an absent field reads as empty.
    #[must_use]
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    /// Every non-blank value of a repeatable field.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn take_image(&mut self) -> ApiResult<Upload> {
        self.image
            .take()
            .filter(|upload| !upload.bytes.is_empty())
            .ok_or_else(|| ApiError::bad_request("Image is required"))
    }
}

fn invalid_form(e: MultipartError) -> ApiError {
    tracing::debug!("failed to read multipart body: {e}");
    ApiError::bad_request("Invalid form data")
}
