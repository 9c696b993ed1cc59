use std::collections::HashMap;
use std::sync::{
    Mutex,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use proverbs_be::db::{self, RatingsRepository, fold_rating_stats, validate_rating_value};
use proverbs_be::errors::AppError;
use proverbs_be::models::{ProverbRatingStats, Rating, UserRating};

/// In-memory double for the storage contract, with a switch to force
/// the empty-stats read that the degraded aggregation path can produce
/// right after a write.
#[derive(Default)]
struct MemoryRatingsRepository {
    rows: Mutex<HashMap<(String, String), Rating>>,
    next_id: AtomicI64,
    stats_reads: AtomicUsize,
    return_empty_stats: bool,
}

impl MemoryRatingsRepository {
    fn new() -> Self {
        Self::default()
    }

    fn with_empty_stats() -> Self {
        Self {
            return_empty_stats: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl RatingsRepository for MemoryRatingsRepository {
    async fn upsert_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
        rating: i32,
    ) -> Result<Rating, AppError> {
        validate_rating_value(rating)?;

        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();
        let key = (proverb_id.to_string(), session_id.to_string());

        let row = match rows.get_mut(&key) {
            Some(existing) => {
                existing.rating = rating;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = Rating {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                    proverb_id: proverb_id.to_string(),
                    session_id: session_id.to_string(),
                    rating,
                    created_at: now,
                    updated_at: now,
                };
                rows.insert(key, row.clone());
                row
            }
        };

        Ok(row)
    }

    async fn get_rating_stats(
        &self,
        proverb_ids: &[String],
    ) -> Result<Vec<ProverbRatingStats>, AppError> {
        if proverb_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.stats_reads.fetch_add(1, Ordering::SeqCst);

        if self.return_empty_stats {
            return Ok(Vec::new());
        }

        let rows = self.rows.lock().unwrap();
        let pairs: Vec<(String, i32)> = rows
            .values()
            .filter(|row| proverb_ids.contains(&row.proverb_id))
            .map(|row| (row.proverb_id.clone(), row.rating))
            .collect();

        Ok(fold_rating_stats(&pairs))
    }

    async fn get_user_ratings(&self, session_id: &str) -> Result<Vec<UserRating>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|row| row.session_id == session_id)
            .map(|row| UserRating {
                proverb_id: row.proverb_id.clone(),
                rating: row.rating,
            })
            .collect())
    }

    async fn get_rating(
        &self,
        proverb_id: &str,
        session_id: &str,
    ) -> Result<Option<Rating>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&(proverb_id.to_string(), session_id.to_string()))
            .cloned())
    }
}

#[tokio::test]
async fn test_first_vote() {
    let repo = MemoryRatingsRepository::new();

    let submission = db::submit_rating(&repo, "p1", "s1", 4).await.unwrap();

    assert_eq!(submission.rating.rating, 4);
    assert_eq!(submission.rating.proverb_id, "p1");
    assert_eq!(submission.stats.proverb_id, "p1");
    assert_eq!(submission.stats.total_votes, 1);
    assert!((submission.stats.average_rating - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_revote_same_session_replaces_row() {
    let repo = MemoryRatingsRepository::new();

    let first = db::submit_rating(&repo, "p1", "s1", 4).await.unwrap();
    let second = db::submit_rating(&repo, "p1", "s1", 2).await.unwrap();

    // Still exactly one row, carrying the latest value
    assert_eq!(second.rating.rating, 2);
    assert_eq!(second.stats.total_votes, 1);
    assert!((second.stats.average_rating - 2.0).abs() < 1e-9);
    assert_eq!(repo.get_user_ratings("s1").await.unwrap().len(), 1);

    // First insertion time survives the update
    assert_eq!(second.rating.id, first.rating.id);
    assert_eq!(second.rating.created_at, first.rating.created_at);
    assert!(second.rating.updated_at >= first.rating.updated_at);
}

#[tokio::test]
async fn test_two_sessions_average() {
    let repo = MemoryRatingsRepository::new();

    db::submit_rating(&repo, "p1", "s1", 4).await.unwrap();
    let submission = db::submit_rating(&repo, "p1", "s2", 2).await.unwrap();

    assert_eq!(submission.stats.total_votes, 2);
    assert!((submission.stats.average_rating - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_out_of_range_rejected_without_write() {
    let repo = MemoryRatingsRepository::new();

    for value in [0, 6, -1, 42] {
        let result = db::submit_rating(&repo, "p1", "s1", value).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    assert!(repo.get_user_ratings("s1").await.unwrap().is_empty());
    assert!(repo.get_rating("p1", "s1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_stats_input_short_circuits() {
    let repo = MemoryRatingsRepository::new();
    db::submit_rating(&repo, "p1", "s1", 3).await.unwrap();

    let reads_before = repo.stats_reads.load(Ordering::SeqCst);
    let stats = repo.get_rating_stats(&[]).await.unwrap();

    assert!(stats.is_empty());
    assert_eq!(repo.stats_reads.load(Ordering::SeqCst), reads_before);
}

#[tokio::test]
async fn test_degenerate_stats_synthesized_on_empty_read() {
    // Read-after-write skew: the stats query sees nothing even though
    // the upsert just landed
    let repo = MemoryRatingsRepository::with_empty_stats();

    let submission = db::submit_rating(&repo, "p1", "s1", 5).await.unwrap();

    assert_eq!(submission.stats.proverb_id, "p1");
    assert!((submission.stats.average_rating - 5.0).abs() < 1e-9);
    assert_eq!(submission.stats.total_votes, 1);
}

#[tokio::test]
async fn test_stats_omit_unrated_proverbs() {
    let repo = MemoryRatingsRepository::new();

    db::submit_rating(&repo, "p1", "s1", 4).await.unwrap();
    db::submit_rating(&repo, "p2", "s1", 2).await.unwrap();

    let ids: Vec<String> = ["p1", "p2", "p3"].iter().map(|s| s.to_string()).collect();
    let stats = repo.get_rating_stats(&ids).await.unwrap();

    assert_eq!(stats.len(), 2);
    assert!(stats.iter().all(|s| s.proverb_id != "p3"));
}

#[tokio::test]
async fn test_get_rating_absence_is_not_an_error() {
    let repo = MemoryRatingsRepository::new();

    assert!(repo.get_rating("p1", "s1").await.unwrap().is_none());

    db::submit_rating(&repo, "p1", "s1", 4).await.unwrap();
    let stored = repo.get_rating("p1", "s1").await.unwrap().unwrap();
    assert_eq!(stored.rating, 4);
}

#[tokio::test]
async fn test_user_ratings_scoped_to_session() {
    let repo = MemoryRatingsRepository::new();

    db::submit_rating(&repo, "p1", "s1", 4).await.unwrap();
    db::submit_rating(&repo, "p2", "s1", 5).await.unwrap();
    db::submit_rating(&repo, "p1", "s2", 1).await.unwrap();

    let mut ratings = repo.get_user_ratings("s1").await.unwrap();
    ratings.sort_by(|a, b| a.proverb_id.cmp(&b.proverb_id));

    assert_eq!(
        ratings,
        vec![
            UserRating {
                proverb_id: "p1".to_string(),
                rating: 4
            },
            UserRating {
                proverb_id: "p2".to_string(),
                rating: 5
            },
        ]
    );
}
