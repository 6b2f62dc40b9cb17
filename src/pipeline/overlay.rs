use serde::Serialize;

use super::filter::{filter_keypoints, filter_links};
use super::normalize::{normalize, OrientationContext, ScreenPoint};
use crate::pose::PoseHypothesis;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPoint {
    pub name: String,
    pub position: ScreenPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLink {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

/// Everything the render target needs to draw one frame's skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoseOverlay {
    pub points: Vec<OverlayPoint>,
    pub links: Vec<OverlayLink>,
}

impl PoseOverlay {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.links.is_empty()
    }
}

/// Filter then normalize the 2D keypoints of `pose` for display.
pub fn build_overlay(
    pose: &PoseHypothesis,
    pairs: &[(usize, usize)],
    min_score: f32,
    ctx: &OrientationContext,
) -> PoseOverlay {
    let points = filter_keypoints(&pose.keypoints, min_score)
        .into_iter()
        .map(|k| OverlayPoint {
            name: k.name.clone(),
            position: normalize(k, ctx),
        })
        .collect();

    let links = filter_links(&pose.keypoints, pairs, min_score)
        .into_iter()
        .map(|(from, to)| OverlayLink {
            from: normalize(&pose.keypoints[from], ctx),
            to: normalize(&pose.keypoints[to], ctx),
        })
        .collect();

    PoseOverlay { points, links }
}
