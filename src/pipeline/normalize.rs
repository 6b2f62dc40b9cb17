use serde::{Deserialize, Serialize};

use crate::pose::Keypoint;

/// Width of the resized tensor handed to the estimator. The model crops and
/// resizes on its own, so only the aspect ratio matters.
pub const OUTPUT_TENSOR_WIDTH: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Width/height ratio that renders the camera feed without distortion:
    /// 9:16 on iOS, 3:4 on Android.
    pub fn preview_aspect(&self) -> f32 {
        match self {
            Platform::Ios => 9.0 / 16.0,
            Platform::Android => 3.0 / 4.0,
        }
    }
}

/// Orientation and geometry for the current frame, as last reported by the
/// device layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationContext {
    pub is_portrait: bool,
    pub platform: Platform,
    pub output_width: f32,
    pub output_height: f32,
    pub preview_width: f32,
    pub preview_height: f32,
}

impl OrientationContext {
    /// Stock geometry for a device whose window is `window_width` points wide.
    pub fn for_device(platform: Platform, is_portrait: bool, window_width: f32) -> Self {
        let aspect = platform.preview_aspect();
        Self {
            is_portrait,
            platform,
            output_width: OUTPUT_TENSOR_WIDTH,
            output_height: OUTPUT_TENSOR_WIDTH / aspect,
            preview_width: window_width,
            preview_height: window_width / aspect,
        }
    }

    /// Output tensor size as the estimator saw it. iOS landscape swaps width
    /// and height; Android textures arrive already re-oriented.
    pub fn effective_output(&self) -> (f32, f32) {
        if self.is_portrait || self.platform == Platform::Android {
            (self.output_width, self.output_height)
        } else {
            (self.output_height, self.output_width)
        }
    }

    /// Preview extent paired with the effective output width and height.
    pub fn preview_extent(&self) -> (f32, f32) {
        if self.is_portrait {
            (self.preview_width, self.preview_height)
        } else {
            (self.preview_height, self.preview_width)
        }
    }
}

/// Position in the logical preview space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

pub fn normalize(point: &Keypoint, ctx: &OrientationContext) -> ScreenPoint {
    normalize_xy(point.x, point.y, ctx)
}

/// Map a raw estimator coordinate into preview space.
///
/// Never fails: non-finite coordinates are read as 0 and a degenerate output
/// dimension gives a zero scale on that axis.
pub fn normalize_xy(x: f32, y: f32, ctx: &OrientationContext) -> ScreenPoint {
    let x = finite_or_zero(x);
    let y = finite_or_zero(y);

    let x = match ctx.platform {
        Platform::Android => finite_or_zero(ctx.output_width) - x,
        Platform::Ios => x,
    };

    let (out_w, out_h) = ctx.effective_output();
    let (preview_w, preview_h) = ctx.preview_extent();

    ScreenPoint {
        x: x * scale(preview_w, out_w),
        y: y * scale(preview_h, out_h),
    }
}

fn scale(preview: f32, output: f32) -> f32 {
    let preview = finite_or_zero(preview);
    if !output.is_finite() || output <= 0.0 {
        return 0.0;
    }
    preview / output
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(platform: Platform, is_portrait: bool, out: (f32, f32), preview: (f32, f32)) -> OrientationContext {
        OrientationContext {
            is_portrait,
            platform,
            output_width: out.0,
            output_height: out.1,
            preview_width: preview.0,
            preview_height: preview.1,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_android_mirrors_about_output_width() {
        // unit scale so the mirrored x shows through untouched
        let c = ctx(Platform::Android, true, (180.0, 240.0), (180.0, 240.0));
        let p = normalize_xy(50.0, 80.0, &c);
        assert!(approx(p.x, 130.0));
        assert!(approx(p.y, 80.0));
    }

    #[test]
    fn test_ios_does_not_mirror() {
        let c = ctx(Platform::Ios, true, (180.0, 320.0), (180.0, 320.0));
        let p = normalize_xy(50.0, 80.0, &c);
        assert!(approx(p.x, 50.0));
        assert!(approx(p.y, 80.0));
    }

    #[test]
    fn test_portrait_scales_to_preview() {
        let c = ctx(Platform::Ios, true, (180.0, 320.0), (360.0, 640.0));
        let p = normalize_xy(90.0, 160.0, &c);
        assert!(approx(p.x, 180.0));
        assert!(approx(p.y, 320.0));
    }

    #[test]
    fn test_ios_landscape_swaps_output_dimensions() {
        let c = ctx(Platform::Ios, false, (180.0, 320.0), (360.0, 640.0));
        assert_eq!(c.effective_output(), (320.0, 180.0));
        // x: 160 * 640 / 320, y: 90 * 360 / 180
        let p = normalize_xy(160.0, 90.0, &c);
        assert!(approx(p.x, 320.0));
        assert!(approx(p.y, 180.0));
    }

    #[test]
    fn test_android_landscape_keeps_output_dimensions() {
        let c = ctx(Platform::Android, false, (180.0, 240.0), (360.0, 480.0));
        assert_eq!(c.effective_output(), (180.0, 240.0));
        // mirrored x = 180 - 30 = 150; x scale 480 / 180, y scale 360 / 240
        let p = normalize_xy(30.0, 60.0, &c);
        assert!(approx(p.x, 150.0 * 480.0 / 180.0));
        assert!(approx(p.y, 60.0 * 360.0 / 240.0));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let c = OrientationContext::for_device(Platform::Android, true, 393.0);
        let kp = Keypoint::new("nose", 12.5, 99.25, Some(0.9));
        let first = normalize(&kp, &c);
        for _ in 0..100 {
            assert_eq!(normalize(&kp, &c), first);
        }
    }

    #[test]
    fn test_degenerate_input_clamps_instead_of_failing() {
        let c = ctx(Platform::Ios, true, (0.0, f32::NAN), (180.0, 320.0));
        let p = normalize_xy(f32::INFINITY, 10.0, &c);
        assert_eq!(p, ScreenPoint { x: 0.0, y: 0.0 });

        let c = ctx(Platform::Ios, true, (180.0, 320.0), (180.0, 320.0));
        let p = normalize_xy(f32::NAN, 10.0, &c);
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 10.0));
    }

    #[test]
    fn test_for_device_geometry() {
        let ios = OrientationContext::for_device(Platform::Ios, true, 360.0);
        assert!(approx(ios.output_height, 320.0));
        assert!(approx(ios.preview_height, 640.0));

        let android = OrientationContext::for_device(Platform::Android, true, 360.0);
        assert!(approx(android.output_height, 240.0));
        assert!(approx(android.preview_height, 480.0));
    }
}
