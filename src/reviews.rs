// Review drafts and rating aggregation shared by hotels, packages, destinations and flights

use crate::catalog::Review;
use crate::forms::ValidationError;
use serde::Serialize;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

// Body posted to `/{collection}/{id}/reviews/`; only `new` can build one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewDraft {
    rating: u8,
    text: String,
}

impl ReviewDraft {
    pub fn new(rating: u8, text: impl Into<String>) -> Result<Self, ValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ValidationError::RatingOutOfRange(rating));
        }
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(ValidationError::Blank("text"));
        }
        Ok(Self { rating, text })
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| r.rating as u32).sum();
    Some(sum as f64 / reviews.len() as f64)
}

// Whole-star bucket of an average, rounding halves up (4.5 lands in 5)
pub fn star_bucket(average: f64) -> u8 {
    (average + 0.5).floor().clamp(0.0, MAX_RATING as f64) as u8
}
