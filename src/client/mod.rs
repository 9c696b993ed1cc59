//! Client-side half of the rating feature, kept free of any rendering
//! framework: session identity, the optimistic star-rating state
//! machine, and the HTTP client that drives it.

pub mod api;
pub mod session;
pub mod star_rating;

pub use api::{RatingsApi, rate_proverb};
pub use session::SessionIdentity;
pub use star_rating::{RatingRequest, StarRating};
