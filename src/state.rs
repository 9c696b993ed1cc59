use std::sync::Arc;

use crate::db::RatingsRepository;

/// One ratings store is picked at startup and shared by every request
/// worker; nothing else is held between requests.
pub type SharedRatingsRepository = Arc<dyn RatingsRepository>;

#[derive(Clone)]
pub struct AppState {
    pub ratings: SharedRatingsRepository,
}
