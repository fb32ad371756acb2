use serde::{Deserialize, Serialize};
use trellis_core::catalog::CatalogItem;
use trellis_core::criteria::{ContentType, MAX_RATING, MIN_RATING, SearchCriteria};

use crate::traits::CatalogError;

const LANGUAGE_CODE_LEN: usize = 5;
const COUNTRY_CODE_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub export_open: bool,
}

impl Country {
    pub fn new(id: impl Into<String>, name: impl Into<String>, export_open: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            export_open,
        }
    }

    /// Country ids are two-letter codes.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidCountry {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().chars().count() != COUNTRY_CODE_LEN {
            return Err(invalid("id must be a two-letter code"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: manufacturer.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidDevice {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id is empty"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub categories: Vec<String>,
    pub rating: i32,
    pub price: f64,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
    pub devices: Vec<String>,
    pub image_url: String,
}

impl Product {
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidProduct {
            id: self.id.clone(),
            reason,
        };

        for (field, value) in [
            ("id", &self.id),
            ("name", &self.name),
            ("author", &self.author),
            ("description", &self.description),
            ("image_url", &self.image_url),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("{field} is empty")));
            }
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(invalid(format!("rating {} is outside 0..=5", self.rating)));
        }
        if self.price.is_nan() || self.price < 0.0 {
            return Err(invalid(format!("price {} is not a non-negative number", self.price)));
        }
        if self.countries.is_empty() {
            return Err(invalid("at least one country is required".to_string()));
        }
        if self.devices.is_empty() {
            return Err(invalid("at least one device is required".to_string()));
        }
        if self.languages.is_empty() {
            return Err(invalid("at least one language is required".to_string()));
        }
        if let Some(bad) = self
            .languages
            .iter()
            .find(|l| l.chars().count() != LANGUAGE_CODE_LEN)
        {
            return Err(invalid(format!("language '{bad}' is not a five-character code")));
        }
        Ok(())
    }

    /// Absent or empty criteria fields impose no constraint. Text matching is case-sensitive.
    pub fn matches(&self, criteria: &SearchCriteria) -> bool {
        if !criteria.categories.is_empty()
            && !self.categories.iter().any(|c| criteria.categories.contains(c))
        {
            return false;
        }
        if let Some(text) = criteria.text_fragment()
            && !self.name.contains(text)
            && !self.description.contains(text)
        {
            return false;
        }
        if criteria.min_rating.is_some_and(|min| self.rating < min) {
            return false;
        }
        if criteria.max_price.is_some_and(|max| self.price > max) {
            return false;
        }
        if !criteria.languages.is_empty()
            && !self.languages.iter().any(|l| criteria.languages.contains(l))
        {
            return false;
        }
        if let Some(country) = criteria.country()
            && !self.countries.iter().any(|c| c == country)
        {
            return false;
        }
        if let Some(device) = criteria.device()
            && !self.devices.iter().any(|d| d == device)
        {
            return false;
        }
        if !criteria.content_types.is_empty() && !criteria.content_types.contains(&self.content_type)
        {
            return false;
        }
        true
    }

    pub fn item(&self) -> CatalogItem {
        CatalogItem::new(&self.id, &self.name, &self.description)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn product(id: &str, rating: i32, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("{id} name"),
            author: "Acme".to_string(),
            description: format!("{id} description"),
            content_type: ContentType::Application,
            categories: vec!["games".to_string()],
            rating,
            price,
            languages: vec!["en_US".to_string()],
            countries: vec!["US".to_string()],
            devices: vec!["iphone".to_string()],
            image_url: format!("https://img.example/{id}.png"),
        }
    }
}
