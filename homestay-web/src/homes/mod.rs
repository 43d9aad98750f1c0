//! Home listings
//!
//! [`Home`] is the only domain entity. All lifecycle transitions go through
//! [`HomeService`].

mod service;

pub use service::{DeleteReport, HomeService, UpdateReport};

use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::media::MediaError;

/// A bookable property
#[derive(Debug, Clone, PartialEq)]
pub struct Home {
    pub id: Uuid,
    pub house_name: String,
    pub price: f64,
    pub location: String,
    pub rating: f64,
    pub description: String,
    /// Root-relative path or absolute URL; never empty
    pub photo: String,
    pub photo_asset_id: Option<String>,
    pub rules_url: Option<String>,
    pub rules_asset_id: Option<String>,
}

/// Scalar fields of the add/edit form
#[derive(Debug, Clone, PartialEq)]
pub struct HomeForm {
    pub house_name: String,
    pub price: f64,
    pub location: String,
    pub rating: f64,
    pub description: String,
}

impl HomeForm {
    /// Validate and convert submitted text fields
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, HomeError> {
        let text = |name: &str| -> Result<String, HomeError> {
            let value = fields.get(name).map(|v| v.trim()).unwrap_or_default();
            if value.is_empty() {
                return Err(HomeError::Validation(format!("Missing field: {}", name)));
            }
            Ok(value.to_string())
        };
        let number = |name: &str| -> Result<f64, HomeError> {
            let raw = text(name)?;
            let value: f64 = raw
                .parse()
                .map_err(|_| HomeError::Validation(format!("Field {} must be a number", name)))?;
            if !value.is_finite() || value < 0.0 {
                return Err(HomeError::Validation(format!(
                    "Field {} must be a non-negative number",
                    name
                )));
            }
            Ok(value)
        };

        Ok(HomeForm {
            house_name: text("houseName")?,
            price: number("price")?,
            location: text("location")?,
            rating: number("rating")?,
            description: fields
                .get("description")
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

impl Home {
    fn apply_form(&mut self, form: HomeForm) {
        self.house_name = form.house_name;
        self.price = form.price;
        self.location = form.location;
        self.rating = form.rating;
        self.description = form.description;
    }
}

/// Home record service errors
#[derive(Debug, Error)]
pub enum HomeError {
    #[error("{0}")]
    Validation(String),

    #[error("Home not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] homestay_common::Error),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}
