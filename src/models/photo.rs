use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_ZOOM: f64 = 1.0;

/// Scalar fields of a photo upload after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoCreate {
    pub session_id: String,
    pub seq: i64,
    pub lat: f64,
    pub lng: f64,
    pub tilt_deg: Option<f64>,
    pub heading_deg: Option<f64>,
    pub zoom: Option<f64>,
    pub filename: String,
}

/// One captured image within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub session_id: String,
    pub seq: i64,
    pub lat: f64,
    pub lng: f64,
    pub tilt_deg: Option<f64>,
    pub heading_deg: Option<f64>,
    pub zoom: f64,
    pub filename: String,
    pub captured_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(input: PhotoCreate) -> Result<Self, ApiError> {
        if input.seq < 1 {
            return Err(ApiError::validation(format!(
                "seq must be greater than or equal to 1, got {}",
                input.seq
            )));
        }

        if input.session_id.trim().is_empty() {
            return Err(ApiError::validation("session_id cannot be empty"));
        }

        validate_filename(&input.filename)?;

        Ok(Self {
            session_id: input.session_id,
            seq: input.seq,
            lat: input.lat,
            lng: input.lng,
            tilt_deg: input.tilt_deg,
            heading_deg: input.heading_deg,
            zoom: input.zoom.unwrap_or(DEFAULT_ZOOM),
            filename: input.filename,
            captured_at: Utc::now(),
        })
    }

    pub fn to_document(&self) -> Document {
        doc! {
            "session_id": self.session_id.as_str(),
            "seq": self.seq,
            "lat": self.lat,
            "lng": self.lng,
            "tilt_deg": self.tilt_deg,
            "heading_deg": self.heading_deg,
            "zoom": self.zoom,
            "filename": self.filename.as_str(),
            "captured_at": bson::DateTime::from_chrono(self.captured_at),
        }
    }
}

/// The filename becomes one path component under the session directory.
fn validate_filename(filename: &str) -> Result<(), ApiError> {
    if filename.trim().is_empty() {
        return Err(ApiError::validation("filename cannot be empty"));
    }

    if filename == "." || filename == ".." || filename.contains(['/', '\\', '\0']) {
        return Err(ApiError::validation(format!(
            "Invalid filename '{}' - path components not allowed",
            filename
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUploaded {
    pub photo_id: String,
    pub drive_file_id: Option<String>,
    pub stored_path: String,
}
