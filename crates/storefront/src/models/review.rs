//! Product reviews and rating aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{ProductId, ReviewId, UserId};

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

/// A review. At most one per (product, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    /// 1..=5 stars.
    pub rating: u8,
    pub title: Option<String>,
    pub comment: Option<String>,
    /// The author has a delivered order containing the product.
    pub verified: bool,
    pub helpful_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate rating written back to a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Arithmetic mean, `0.0` with no reviews.
    pub average: f64,
    pub count: u32,
}

impl RatingSummary {
    /// Aggregate over a product's reviews.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let count = u32::try_from(reviews.len()).unwrap_or(u32::MAX);
        if count == 0 {
            return Self {
                average: 0.0,
                count: 0,
            };
        }
        let total: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
        Self {
            average: f64::from(total) / f64::from(count),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: ReviewId::new(format!("r-{rating}")),
            product_id: ProductId::new("p-1"),
            user_id: UserId::new("u-1"),
            user_name: "Customer".to_owned(),
            rating,
            title: None,
            comment: None,
            verified: false,
            helpful_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_mean_rating() {
        let summary = RatingSummary::from_reviews(&[review(5), review(3), review(4)]);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn test_no_reviews_is_zero() {
        let summary = RatingSummary::from_reviews(&[]);
        assert!(summary.average.abs() < f64::EPSILON);
        assert_eq!(summary.count, 0);
    }
}
