use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::Json,
};
use axum_extra::extract::WithRejection;
use std::collections::HashMap;

use crate::{
    error::ApiError,
    models::{Photo, PhotoCreate, PhotoUploaded},
    repositories::{StoreError, PHOTO_COLLECTION, SESSION_COLLECTION},
    AppState,
};

/// Raw multipart fields of a photo upload before coercion.
#[derive(Debug, Default)]
struct PhotoUploadForm {
    fields: HashMap<String, String>,
    file: Option<Bytes>,
}

impl PhotoUploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        // An over-limit body surfaces here as 413
        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or("").to_string();

            if field_name == "file" {
                form.file = Some(field.bytes().await?);
            } else if !field_name.is_empty() {
                let value = field.text().await?;
                form.fields.insert(field_name, value);
            }
        }

        Ok(form)
    }

    fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::Validation(format!("Missing required field '{}'", name)))
    }

    /// Absent and empty fields are both treated as not supplied.
    fn optional(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn into_parts(self) -> Result<(PhotoCreate, Bytes), ApiError> {
        let input = PhotoCreate {
            session_id: self.required("session_id")?.trim().to_string(),
            seq: parse_int("seq", self.required("seq")?)?,
            lat: parse_float("lat", self.required("lat")?)?,
            lng: parse_float("lng", self.required("lng")?)?,
            tilt_deg: self.optional("tilt_deg").map(|v| parse_float("tilt_deg", v)).transpose()?,
            heading_deg: self
                .optional("heading_deg")
                .map(|v| parse_float("heading_deg", v))
                .transpose()?,
            zoom: self.optional("zoom").map(|v| parse_float("zoom", v)).transpose()?,
            filename: self.required("filename")?.to_string(),
        };

        let file = self
            .file
            .ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;

        Ok((input, file))
    }
}

fn parse_float(name: &str, raw: &str) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::Validation(format!("Field '{}' must be a number, got '{}'", name, raw)))
}

fn parse_int(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("Field '{}' must be an integer, got '{}'", name, raw)))
}

pub async fn upload_photo(
    State(app_state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<Json<PhotoUploaded>, ApiError> {
    let (input, content) = PhotoUploadForm::read(multipart).await?.into_parts()?;
    let photo = Photo::new(input)?;

    // A malformed id cannot name an existing session
    let session = match app_state
        .store
        .fetch_by_id(SESSION_COLLECTION, &photo.session_id)
        .await
    {
        Ok(found) => found,
        Err(StoreError::InvalidIdentifier(_)) => None,
        Err(e) => return Err(e.into()),
    };
    if session.is_none() {
        return Err(ApiError::not_found("Invalid session id"));
    }

    let stored_path = app_state
        .photo_storage
        .save(&photo.session_id, &photo.filename, &content)
        .await?;

    let mirror = app_state
        .mirror
        .upload_file(&photo.filename, &stored_path)
        .await;

    let photo_id = app_state
        .store
        .insert(PHOTO_COLLECTION, photo.to_document())
        .await?;

    tracing::info!(
        photo_id = %photo_id,
        session_id = %photo.session_id,
        seq = photo.seq,
        bytes = content.len(),
        mirrored = mirror.file_id().is_some(),
        "photo uploaded"
    );

    Ok(Json(PhotoUploaded {
        photo_id,
        drive_file_id: mirror.into_file_id(),
        stored_path: stored_path.to_string_lossy().into_owned(),
    }))
}
