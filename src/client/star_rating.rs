use crate::models::{ProverbRatingStats, Rating, rating::is_valid_rating};

/// Displayed values captured before a speculative update, restored
/// verbatim if the submission fails.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    user_rating: Option<i32>,
    average_rating: f64,
    total_votes: i64,
}

/// A vote accepted by the widget and awaiting submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRequest {
    pub proverb_id: String,
    pub rating: i32,
}

/// Optimistic rating state for one proverb.
///
/// A click updates the displayed average and count immediately and
/// hands back the request to submit; the server response then either
/// confirms (its values are adopted verbatim, since concurrent votes
/// from other sessions may have landed in between) or fails, rolling
/// the display back to the pre-click snapshot. While a submission is
/// in flight further clicks are ignored, so at most one request per
/// proverb is ever outstanding.
#[derive(Debug)]
pub struct StarRating {
    proverb_id: String,
    user_rating: Option<i32>,
    average_rating: f64,
    total_votes: i64,
    in_flight: Option<Snapshot>,
}

impl StarRating {
    pub fn new(
        proverb_id: impl Into<String>,
        average_rating: f64,
        total_votes: i64,
        user_rating: Option<i32>,
    ) -> Self {
        Self {
            proverb_id: proverb_id.into(),
            user_rating,
            average_rating,
            total_votes,
            in_flight: None,
        }
    }

    /// Registers a star click. Returns the request to submit, or `None`
    /// when the click is ignored (submission already in flight, or the
    /// value is not a 1-5 star).
    pub fn click(&mut self, rating: i32) -> Option<RatingRequest> {
        if self.in_flight.is_some() || !is_valid_rating(rating) {
            return None;
        }

        let snapshot = Snapshot {
            user_rating: self.user_rating,
            average_rating: self.average_rating,
            total_votes: self.total_votes,
        };

        match self.user_rating {
            None => {
                // First vote adds to the count.
                let new_total = self.total_votes + 1;
                self.average_rating = (self.average_rating * self.total_votes as f64
                    + f64::from(rating))
                    / new_total as f64;
                self.total_votes = new_total;
            }
            Some(previous) => {
                // Changing an existing vote keeps the count.
                self.average_rating = (self.average_rating * self.total_votes as f64
                    - f64::from(previous)
                    + f64::from(rating))
                    / self.total_votes as f64;
            }
        }

        self.user_rating = Some(rating);
        self.in_flight = Some(snapshot);

        Some(RatingRequest {
            proverb_id: self.proverb_id.clone(),
            rating,
        })
    }

    /// Adopts the server's authoritative values, replacing the
    /// speculative ones.
    pub fn confirm(&mut self, rating: &Rating, stats: &ProverbRatingStats) {
        self.user_rating = Some(rating.rating);
        self.average_rating = stats.average_rating;
        self.total_votes = stats.total_votes;
        self.in_flight = None;
    }

    /// Rolls the display back to its pre-click state after a failed
    /// submission. The user retries explicitly; nothing is resubmitted.
    pub fn fail(&mut self) {
        if let Some(snapshot) = self.in_flight.take() {
            self.user_rating = snapshot.user_rating;
            self.average_rating = snapshot.average_rating;
            self.total_votes = snapshot.total_votes;
        }
    }

    /// Syncs freshly fetched server state into the display. Ignored
    /// while a submission is in flight, the in-flight response wins.
    pub fn refresh(&mut self, stats: &ProverbRatingStats, user_rating: Option<i32>) {
        if self.in_flight.is_some() {
            return;
        }
        self.user_rating = user_rating;
        self.average_rating = stats.average_rating;
        self.total_votes = stats.total_votes;
    }

    pub fn proverb_id(&self) -> &str {
        &self.proverb_id
    }

    pub fn user_rating(&self) -> Option<i32> {
        self.user_rating
    }

    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    pub fn total_votes(&self) -> i64 {
        self.total_votes
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Once a session has voted, star hover previews are disabled; the
    /// vote stays editable only through the click path.
    pub fn has_voted(&self) -> bool {
        self.user_rating.is_some()
    }
}
