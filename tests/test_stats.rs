use proverbs_be::db::fold_rating_stats;
use proverbs_be::models::ProverbRatingStats;

fn rows(pairs: &[(&str, i32)]) -> Vec<(String, i32)> {
    pairs
        .iter()
        .map(|(id, rating)| (id.to_string(), *rating))
        .collect()
}

fn stats_for<'a>(
    stats: &'a [ProverbRatingStats],
    proverb_id: &str,
) -> Option<&'a ProverbRatingStats> {
    stats.iter().find(|s| s.proverb_id == proverb_id)
}

#[test]
fn test_fold_groups_by_proverb() {
    let stats = fold_rating_stats(&rows(&[("p1", 4), ("p2", 5), ("p1", 2)]));

    assert_eq!(stats.len(), 2);

    let p1 = stats_for(&stats, "p1").unwrap();
    assert_eq!(p1.total_votes, 2);
    assert!((p1.average_rating - 3.0).abs() < 1e-9);

    let p2 = stats_for(&stats, "p2").unwrap();
    assert_eq!(p2.total_votes, 1);
    assert!((p2.average_rating - 5.0).abs() < 1e-9);
}

#[test]
fn test_fold_empty_input() {
    assert!(fold_rating_stats(&[]).is_empty());
}

#[test]
fn test_fold_omits_unrated_proverbs() {
    // Only proverbs with at least one row appear; nothing is padded
    // out with zero values
    let stats = fold_rating_stats(&rows(&[("p1", 3)]));

    assert_eq!(stats.len(), 1);
    assert!(stats_for(&stats, "p2").is_none());
}

#[test]
fn test_fold_matches_direct_computation() {
    let values = [1, 2, 2, 3, 4, 4, 4, 5, 5, 1, 3, 5];
    let pairs: Vec<(String, i32)> = values.iter().map(|v| ("p1".to_string(), *v)).collect();

    let stats = fold_rating_stats(&pairs);
    let p1 = stats_for(&stats, "p1").unwrap();

    let expected = values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64;
    let relative_error = (p1.average_rating - expected).abs() / expected;

    assert_eq!(p1.total_votes, values.len() as i64);
    assert!(relative_error < 1e-9);
}

#[test]
fn test_fold_two_sessions_scenario() {
    // One proverb, two sessions: 4 and 2
    let stats = fold_rating_stats(&rows(&[("p1", 4), ("p1", 2)]));

    let p1 = stats_for(&stats, "p1").unwrap();
    assert!((p1.average_rating - 3.0).abs() < 1e-9);
    assert_eq!(p1.total_votes, 2);
}
