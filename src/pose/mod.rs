pub mod keypoint;
pub mod skeleton;

pub use keypoint::{Keypoint, PoseHypothesis};
pub use skeleton::SkeletonModel;
