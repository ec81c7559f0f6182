//! Tunable parameters for the locator.

use crate::gate::GateThresholds;
use crate::image::RgbaView;
use crate::util::{MapLocateError, MapLocateResult};

/// Minimap ROI inside a full-screen capture: x offset.
pub const MINIMAP_ROI_X: usize = 49;
/// Minimap ROI inside a full-screen capture: y offset.
pub const MINIMAP_ROI_Y: usize = 51;
/// Minimap ROI width in pixels.
pub const MINIMAP_ROI_WIDTH: usize = 117;
/// Minimap ROI height in pixels.
pub const MINIMAP_ROI_HEIGHT: usize = 120;

/// Crops a full-screen capture view to the minimap ROI, clipped to the
/// capture bounds.
pub fn crop_minimap_roi(capture: RgbaView<'_>) -> MapLocateResult<RgbaView<'_>> {
    let cw = capture.width();
    let ch = capture.height();
    if cw <= MINIMAP_ROI_X || ch <= MINIMAP_ROI_Y {
        return Err(MapLocateError::RoiOutOfBounds {
            x: MINIMAP_ROI_X,
            y: MINIMAP_ROI_Y,
            width: MINIMAP_ROI_WIDTH,
            height: MINIMAP_ROI_HEIGHT,
            img_width: cw,
            img_height: ch,
        });
    }
    let w = MINIMAP_ROI_WIDTH.min(cw - MINIMAP_ROI_X);
    let h = MINIMAP_ROI_HEIGHT.min(ch - MINIMAP_ROI_Y);
    capture.roi(MINIMAP_ROI_X, MINIMAP_ROI_Y, w, h)
}

/// Locator tunables. `Default` carries the production values; hosts with
/// blurrier captures typically only raise `tracking_max_diff`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocatorParams {
    /// Consecutive misses tolerated before tracking state is dropped.
    pub max_lost_tracking: u32,
    /// Half-side base of the tracking search square, in pixels.
    pub mobile_search_radius: usize,
    /// Tracking-mode acceptance threshold on the coarse avg diff.
    pub tracking_max_diff: f64,
    /// Halo around a tracking hit refined at full resolution.
    pub tracking_fine_radius: usize,
    /// Physical stride of the global search.
    pub global_step: usize,
    /// Probe subsampling stride of the global search.
    pub global_probe_step: usize,
    /// Edge-weight gamma for the global search.
    pub edge_gamma: f64,
    /// Probe subsampling stride of the consistency check.
    pub consistency_stride: usize,
    /// Weight of the consistency penalty in the combined score.
    pub consistency_alpha: f64,
    /// Halo around a global winner refined at full resolution.
    pub global_fine_radius: usize,
    /// Confidence-gate thresholds.
    pub gate: GateThresholds,
    /// EMA coefficient of the velocity estimate.
    pub velocity_alpha: f64,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            max_lost_tracking: 3,
            mobile_search_radius: 50,
            tracking_max_diff: 50.0,
            tracking_fine_radius: 4,
            global_step: 8,
            global_probe_step: 8,
            edge_gamma: 2.0,
            consistency_stride: 4,
            consistency_alpha: 0.2,
            global_fine_radius: 20,
            gate: GateThresholds::default(),
            velocity_alpha: 0.5,
        }
    }
}

/// Motion-model dt window: below this the frame pair is too close to
/// estimate velocity.
pub(crate) const MOTION_DT_MIN: f64 = 0.016;
/// Motion-model dt window: above this the frames are too far apart.
pub(crate) const MOTION_DT_MAX: f64 = 1.0;
/// Prediction resets (dt treated as 0, velocity zeroed) past this gap.
pub(crate) const PREDICT_DT_RESET: f64 = 0.5;
