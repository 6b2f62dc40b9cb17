pub mod filter;
pub mod normalize;
pub mod overlay;

pub use filter::{filter_keypoints, filter_links};
pub use normalize::{normalize, normalize_xy, OrientationContext, Platform, ScreenPoint};
pub use overlay::{build_overlay, PoseOverlay};
