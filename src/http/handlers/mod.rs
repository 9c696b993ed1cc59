pub mod auth;
pub mod ratings;

pub use auth::login_handler;
pub use ratings::{get_ratings_handler, submit_rating_handler};
