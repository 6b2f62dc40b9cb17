use crate::pose::Keypoint;

/// Keypoints scoring strictly above `min_score`, in their original order.
pub fn filter_keypoints(keypoints: &[Keypoint], min_score: f32) -> Vec<&Keypoint> {
    keypoints.iter().filter(|k| k.passes(min_score)).collect()
}

/// Skeletal links worth drawing.
///
/// A link is kept when its *first* keypoint passes the threshold; the second
/// keypoint's score is not consulted. Links pointing outside `keypoints` are
/// dropped.
// NOTE: the one-sided check is long-standing overlay behaviour and unverified
// against the estimator's intent; keep it until someone confirms otherwise.
pub fn filter_links(
    keypoints: &[Keypoint],
    pairs: &[(usize, usize)],
    min_score: f32,
) -> Vec<(usize, usize)> {
    pairs
        .iter()
        .copied()
        .filter(|&(from, to)| {
            let (Some(start), Some(_)) = (keypoints.get(from), keypoints.get(to)) else {
                return false;
            };
            start.passes(min_score)
        })
        .collect()
}
