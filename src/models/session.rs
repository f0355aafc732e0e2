use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Request body for creating a session. Server-controlled fields are not
/// part of this shape, so any caller-supplied `created_at` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreate {
    pub site_name: String,
    /// Expected as YYYY-MM-DD, stored as given
    pub date: String,
    pub start_lat: f64,
    pub start_lng: f64,
    pub device: Option<String>,
    pub battery_level: Option<f64>,
}

/// One excavation photo-documentation session.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSession {
    pub site_name: String,
    pub date: String,
    pub start_lat: f64,
    pub start_lng: f64,
    pub device: Option<String>,
    pub battery_level: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl PhotoSession {
    pub fn new(payload: SessionCreate) -> Result<Self, ApiError> {
        if let Some(level) = payload.battery_level {
            if !(0.0..=1.0).contains(&level) {
                return Err(ApiError::validation(format!(
                    "battery_level must be between 0 and 1, got {}",
                    level
                )));
            }
        }

        Ok(Self {
            site_name: payload.site_name,
            date: payload.date,
            start_lat: payload.start_lat,
            start_lng: payload.start_lng,
            device: payload.device,
            battery_level: payload.battery_level,
            created_at: Utc::now(),
        })
    }

    pub fn to_document(&self) -> Document {
        doc! {
            "site_name": self.site_name.as_str(),
            "date": self.date.as_str(),
            "start_lat": self.start_lat,
            "start_lng": self.start_lng,
            "device": self.device.clone(),
            "battery_level": self.battery_level,
            "created_at": bson::DateTime::from_chrono(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}
