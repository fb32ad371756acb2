use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MIN_RATING: i32 = 0;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Application,
    Ringtone,
    Wallpaper,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Application => "application",
            ContentType::Ringtone => "ringtone",
            ContentType::Wallpaper => "wallpaper",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ContentType {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application" => Ok(ContentType::Application),
            "ringtone" => Ok(ContentType::Ringtone),
            "wallpaper" => Ok(ContentType::Wallpaper),
            other => Err(CriteriaError::UnknownContentType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriteriaError {
    #[error("minimum rating {0} is outside 0..=5")]
    RatingOutOfRange(i32),

    #[error("maximum price {0} must be a non-negative number")]
    NegativePrice(f64),

    #[error("unknown content type '{0}'")]
    UnknownContentType(String),
}

/// Query predicate stored on dynamic collections. Every empty or absent field imposes no
/// constraint, so the default value matches the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub categories: BTreeSet<String>,
    pub text: Option<String>,
    pub min_rating: Option<i32>,
    pub max_price: Option<f64>,
    pub languages: BTreeSet<String>,
    pub country_code: Option<String>,
    pub device_id: Option<String>,
    pub content_types: BTreeSet<ContentType>,
}

impl SearchCriteria {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if let Some(rating) = self.min_rating
            && !(MIN_RATING..=MAX_RATING).contains(&rating)
        {
            return Err(CriteriaError::RatingOutOfRange(rating));
        }
        if let Some(price) = self.max_price
            && (price.is_nan() || price < 0.0)
        {
            return Err(CriteriaError::NegativePrice(price));
        }
        Ok(())
    }

    pub fn text_fragment(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }

    pub fn country(&self) -> Option<&str> {
        non_blank(self.country_code.as_deref())
    }

    pub fn device(&self) -> Option<&str> {
        non_blank(self.device_id.as_deref())
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_min_rating(mut self, rating: i32) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn with_max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country_code = Some(country.into());
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_id = Some(device.into());
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_types.insert(content_type);
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
