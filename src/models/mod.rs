pub mod auth;
pub mod rating;

pub use rating::{ProverbRatingStats, Rating, RatingSubmission, UserRating};
