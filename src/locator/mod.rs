//! The locator state machine: zones, motion model, tracking and global
//! search orchestration.
//!
//! A locator is created once by the host and driven with one `locate` call
//! per frame. Exactly one call runs at a time per instance; the parallel
//! fan-out inside a call is joined before returning, so no external
//! synchronization is needed. All motion state is ephemeral.

mod params;
pub mod scan;

pub use params::{
    crop_minimap_roi, LocatorParams, MINIMAP_ROI_HEIGHT, MINIMAP_ROI_WIDTH, MINIMAP_ROI_X,
    MINIMAP_ROI_Y,
};

use crate::gate::{select_candidate, ZoneCandidate};
use crate::image::{ops, RgbaImage, RgbaView};
use crate::mask::filter::VOID_LUMA_THRESHOLD;
use crate::mask::{apply_void_filter, AlphaMask};
use crate::matcher::{compute_local_consistency_fast, match_probe, match_probe_weighted};
use crate::probe::TemplateProbe;
use crate::trace::{trace_event, trace_span};
use crate::util::{MapLocateError, MapLocateResult};

use params::{MOTION_DT_MAX, MOTION_DT_MIN, PREDICT_DT_RESET};

use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Id suffix marking a base map (void-filtered at load time). Any other id
/// is a tier overlay whose alpha channel already encodes don't-care regions.
const BASE_ZONE_SUFFIX: &str = "_Base";

/// A pre-loaded world map, immutable after construction.
pub struct Zone {
    id: String,
    image: RgbaImage,
}

impl Zone {
    /// Returns the zone id, e.g. `ValleyIV_Base` or `ValleyIV_L1_172`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the zone pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// A resolved minimap position inside a zone.
///
/// `x`/`y` are the minimap center in zone pixel coordinates. `avg_diff` is
/// the matcher's mean absolute per-channel difference at the match (lower is
/// better). `slice_index` is reserved for wire-format compatibility and is
/// always 0.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapPosition {
    pub zone_id: String,
    pub x: f64,
    pub y: f64,
    pub avg_diff: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slice_index: i32,
}

/// Real-time minimap locator over a fixed set of zones.
pub struct MapLocator {
    zones: Vec<Zone>,
    params: LocatorParams,

    current_zone: Option<usize>,
    last_known_pos: Option<MapPosition>,
    last_time: Option<Instant>,
    velocity: (f64, f64),
    lost_tracking: u32,

    probe: TemplateProbe,
    work_buf: RgbaImage,
    search_buf: RgbaImage,
    annulus: AlphaMask,
}

impl MapLocator {
    /// Creates a locator from decoded zone images.
    ///
    /// Ids ending in `_Base` get the void filter applied (dark background
    /// pixels become transparent). Zones are ordered by id so the global
    /// search is deterministic regardless of the input order.
    pub fn from_zone_images(
        zones: impl IntoIterator<Item = (String, RgbaImage)>,
    ) -> MapLocateResult<Self> {
        let mut loaded = Vec::new();
        for (id, mut image) in zones {
            if id.ends_with(BASE_ZONE_SUFFIX) {
                apply_void_filter(&mut image, VOID_LUMA_THRESHOLD);
            }
            trace_event!(
                "zone_loaded",
                zone = id.as_str(),
                width = image.width(),
                height = image.height(),
                base = id.ends_with(BASE_ZONE_SUFFIX)
            );
            loaded.push(Zone { id, image });
        }
        if loaded.is_empty() {
            return Err(MapLocateError::NoZones);
        }
        loaded.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Self {
            zones: loaded,
            params: LocatorParams::default(),
            current_zone: None,
            last_known_pos: None,
            last_time: None,
            velocity: (0.0, 0.0),
            lost_tracking: 0,
            probe: TemplateProbe::new(),
            work_buf: RgbaImage::default(),
            search_buf: RgbaImage::default(),
            annulus: AlphaMask::annulus(MINIMAP_ROI_WIDTH, MINIMAP_ROI_HEIGHT),
        })
    }

    /// Creates a locator by loading and decoding zone files (PNG/JPG/WEBP).
    #[cfg(feature = "image-io")]
    pub fn from_zone_files<P: AsRef<std::path::Path>>(
        zones: impl IntoIterator<Item = (String, P)>,
    ) -> MapLocateResult<Self> {
        let mut images = Vec::new();
        for (id, path) in zones {
            let image = crate::image::io::load_rgba_image(path.as_ref()).map_err(|err| {
                MapLocateError::ZoneLoad {
                    zone: id.clone(),
                    reason: err.to_string(),
                }
            })?;
            images.push((id, image));
        }
        Self::from_zone_images(images)
    }

    /// Replaces the default tunables.
    pub fn with_params(mut self, params: LocatorParams) -> Self {
        self.params = params;
        self
    }

    /// Replaces the tunables on a live locator. Takes effect next frame.
    pub fn set_params(&mut self, params: LocatorParams) {
        self.params = params;
    }

    /// Returns the active tunables.
    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    /// Returns the loaded zones, ordered by id.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Returns the last successful position, if tracking state is held.
    pub fn last_known_pos(&self) -> Option<&MapPosition> {
        self.last_known_pos.as_ref()
    }

    /// Returns the id of the zone the locator believes it is in.
    pub fn current_zone_id(&self) -> Option<&str> {
        self.current_zone.map(|i| self.zones[i].id())
    }

    /// Returns the smoothed velocity estimate in px/s.
    pub fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    /// Returns the consecutive-miss counter.
    pub fn lost_tracking_count(&self) -> u32 {
        self.lost_tracking
    }

    /// Locates the minimap, stamping the frame with the current time.
    pub fn locate(&mut self, minimap: RgbaView<'_>) -> MapLocateResult<Option<MapPosition>> {
        self.locate_at(minimap, Instant::now())
    }

    /// Locates the minimap with an explicit frame timestamp.
    ///
    /// Useful for offline replay and tests; `locate` is this with
    /// `Instant::now()`.
    pub fn locate_at(
        &mut self,
        minimap: RgbaView<'_>,
        now: Instant,
    ) -> MapLocateResult<Option<MapPosition>> {
        let w = minimap.width();
        let h = minimap.height();

        if self.annulus.width() != w || self.annulus.height() != h {
            self.annulus = AlphaMask::annulus(w, h);
        }
        self.work_buf.copy_from(minimap)?;
        self.probe.rebuild(self.work_buf.view(), &self.annulus);
        debug_assert!(
            self.probe.width() == w && self.probe.height() == h,
            "probe dimensions diverged from minimap after rebuild"
        );

        if let Some((zone_index, pos)) = self.try_tracking(w, h, now)? {
            let out = pos.clone();
            self.commit(pos, zone_index, now);
            trace_event!(
                "tracking_match",
                zone = out.zone_id.as_str(),
                x = out.x,
                y = out.y,
                avg_diff = out.avg_diff
            );
            return Ok(Some(out));
        }

        if let Some((zone_index, pos)) = self.global_search(w, h)? {
            let out = pos.clone();
            self.commit(pos, zone_index, now);
            trace_event!(
                "global_match",
                zone = out.zone_id.as_str(),
                x = out.x,
                y = out.y,
                avg_diff = out.avg_diff
            );
            return Ok(Some(out));
        }

        self.lost_tracking = (self.lost_tracking + 1).min(self.params.max_lost_tracking + 1);
        if self.lost_tracking > self.params.max_lost_tracking {
            self.last_known_pos = None;
        }
        // Motion estimates do not survive a loss.
        self.velocity = (0.0, 0.0);
        Ok(None)
    }

    /// Tracking branch: a sparse search in a small square around the motion
    /// prediction, refined at full resolution on success.
    fn try_tracking(
        &mut self,
        w: usize,
        h: usize,
        now: Instant,
    ) -> MapLocateResult<Option<(usize, MapPosition)>> {
        let zone_index = match self.current_zone {
            Some(i) if self.lost_tracking <= self.params.max_lost_tracking => i,
            _ => return Ok(None),
        };
        let (last_x, last_y) = match &self.last_known_pos {
            Some(pos) => (pos.x, pos.y),
            None => return Ok(None),
        };

        let _span = trace_span!("tracking_search").entered();

        let mut dt = self
            .last_time
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        if dt > PREDICT_DT_RESET {
            dt = 0.0;
            self.velocity = (0.0, 0.0);
        }
        let pred_x = last_x + self.velocity.0 * dt;
        let pred_y = last_y + self.velocity.1 * dt;

        let zone = &self.zones[zone_index];
        let zw = zone.image.width();
        let zh = zone.image.height();

        let cx = pred_x as i64;
        let cy = pred_y as i64;
        let pad = (self.params.mobile_search_radius + (w + h) / 2) as i64;
        let x0 = (cx - pad).clamp(0, zw as i64) as usize;
        let y0 = (cy - pad).clamp(0, zh as i64) as usize;
        let x1 = (cx + pad).clamp(0, zw as i64) as usize;
        let y1 = (cy + pad).clamp(0, zh as i64) as usize;
        if x1 <= x0 || y1 <= y0 {
            return Ok(None);
        }

        ops::copy_sub_image_into(zone.image.view(), &mut self.search_buf, x0, y0, x1 - x0, y1 - y0)?;

        // Coarse: step 2 physically, every 4th probe point.
        let coarse = match match_probe(self.search_buf.view(), &self.probe, 2, 4, true) {
            Some(m) if m.avg_diff < self.params.tracking_max_diff => m,
            _ => return Ok(None),
        };

        let mut final_x = x0 + coarse.x;
        let mut final_y = y0 + coarse.y;
        let mut final_avg = coarse.avg_diff;

        // Fine pass over a small halo corrects the stride error.
        let r = self.params.tracking_fine_radius;
        let fx0 = final_x.saturating_sub(r);
        let fy0 = final_y.saturating_sub(r);
        let fx1 = (final_x + w + r).min(zw);
        let fy1 = (final_y + h + r).min(zh);
        if fx1 - fx0 >= w && fy1 - fy0 >= h {
            let roi = zone.image.view().roi(fx0, fy0, fx1 - fx0, fy1 - fy0)?;
            if let Some(fine) = match_probe(roi, &self.probe, 1, 1, false) {
                if fine.avg_diff < final_avg {
                    final_x = fx0 + fine.x;
                    final_y = fy0 + fine.y;
                    final_avg = fine.avg_diff;
                }
            }
        }

        Ok(Some((
            zone_index,
            MapPosition {
                zone_id: zone.id.clone(),
                x: final_x as f64 + w as f64 / 2.0,
                y: final_y as f64 + h as f64 / 2.0,
                avg_diff: final_avg,
                slice_index: 0,
            },
        )))
    }

    /// Global branch: every zone searched in parallel with the edge-weighted
    /// kernel, gated for confidence, then refined at full resolution.
    fn global_search(&self, w: usize, h: usize) -> MapLocateResult<Option<(usize, MapPosition)>> {
        let _span = trace_span!("global_search", zones = self.zones.len()).entered();

        let probe = &self.probe;
        let params = &self.params;

        #[cfg(feature = "rayon")]
        let results: Vec<Option<ZoneCandidate>> = self
            .zones
            .par_iter()
            .enumerate()
            .map(|(i, zone)| global_candidate(zone, probe, params, i))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let results: Vec<Option<ZoneCandidate>> = self
            .zones
            .iter()
            .enumerate()
            .map(|(i, zone)| global_candidate(zone, probe, params, i))
            .collect();

        let mut candidates: Vec<ZoneCandidate> = results.into_iter().flatten().collect();
        candidates.sort_by(|a, b| a.combined.total_cmp(&b.combined));
        for (rank, cand) in candidates.iter().enumerate().take(5) {
            trace_event!(
                "global_rank",
                rank = rank + 1,
                zone = self.zones[cand.zone_index].id(),
                combined = cand.combined,
                x = cand.x,
                y = cand.y
            );
        }

        let winner = match select_candidate(candidates, &self.params.gate) {
            Some(winner) => winner,
            None => return Ok(None),
        };

        // Refine the winner on a halo at full resolution; the gate already
        // vouched for it, so the fine result is taken without a threshold.
        let zone = &self.zones[winner.zone_index];
        let zw = zone.image.width();
        let zh = zone.image.height();
        let r = self.params.global_fine_radius;
        let fx0 = winner.x.saturating_sub(r);
        let fy0 = winner.y.saturating_sub(r);
        let fx1 = (winner.x + w + r).min(zw);
        let fy1 = (winner.y + h + r).min(zh);
        let roi = zone.image.view().roi(fx0, fy0, fx1 - fx0, fy1 - fy0)?;

        let (final_x, final_y, final_avg) = match match_probe(roi, &self.probe, 1, 1, false) {
            Some(fine) => (fx0 + fine.x, fy0 + fine.y, fine.avg_diff),
            None => (winner.x, winner.y, winner.combined),
        };

        Ok(Some((
            winner.zone_index,
            MapPosition {
                zone_id: zone.id.clone(),
                x: final_x as f64 + w as f64 / 2.0,
                y: final_y as f64 + h as f64 / 2.0,
                avg_diff: final_avg,
                slice_index: 0,
            },
        )))
    }

    /// Records a successful frame: zone, position, timestamps, velocity.
    fn commit(&mut self, pos: MapPosition, zone_index: usize, now: Instant) {
        if self.current_zone != Some(zone_index) {
            // Velocity is meaningless across a zone switch.
            self.velocity = (0.0, 0.0);
        } else {
            self.update_motion_model(&pos, now);
        }
        self.current_zone = Some(zone_index);
        self.last_known_pos = Some(pos);
        self.last_time = Some(now);
        self.lost_tracking = 0;
    }

    /// EMA velocity update, applied only when the previous frame was itself
    /// a successful track and the frame gap is inside the usable window.
    fn update_motion_model(&mut self, new_pos: &MapPosition, now: Instant) {
        let dt = self
            .last_time
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(f64::INFINITY);

        if let Some(last) = &self.last_known_pos {
            if self.lost_tracking == 0 && dt > MOTION_DT_MIN && dt < MOTION_DT_MAX {
                let raw_vx = (new_pos.x - last.x) / dt;
                let raw_vy = (new_pos.y - last.y) / dt;
                let alpha = self.params.velocity_alpha;
                self.velocity.0 = self.velocity.0 * (1.0 - alpha) + raw_vx * alpha;
                self.velocity.1 = self.velocity.1 * (1.0 - alpha) + raw_vy * alpha;
                return;
            }
        }
        if self.lost_tracking > 0 {
            self.velocity = (0.0, 0.0);
        }
    }

    /// Saves a debug PNG of the zone context around `pos` with the match box
    /// drawn in red. Development tooling; never called from `locate`.
    #[cfg(feature = "image-io")]
    pub fn save_match_context<P: AsRef<std::path::Path>>(
        &self,
        pos: &MapPosition,
        minimap_w: usize,
        minimap_h: usize,
        output_dir: P,
    ) -> MapLocateResult<std::path::PathBuf> {
        const CONTEXT_SIZE: i64 = 512;

        let zone = self
            .zones
            .iter()
            .find(|z| z.id == pos.zone_id)
            .ok_or_else(|| MapLocateError::ZoneLoad {
                zone: pos.zone_id.clone(),
                reason: "zone not loaded".to_owned(),
            })?;
        let zw = zone.image.width() as i64;
        let zh = zone.image.height() as i64;

        let cx = pos.x as i64;
        let cy = pos.y as i64;
        let x0 = (cx - CONTEXT_SIZE / 2).clamp(0, zw);
        let y0 = (cy - CONTEXT_SIZE / 2).clamp(0, zh);
        let x1 = (cx + CONTEXT_SIZE / 2).clamp(0, zw);
        let y1 = (cy + CONTEXT_SIZE / 2).clamp(0, zh);

        let mut context = ops::copy_sub_image(
            zone.image.view(),
            x0 as usize,
            y0 as usize,
            (x1 - x0) as usize,
            (y1 - y0) as usize,
        )?;

        let lcx = cx - x0;
        let lcy = cy - y0;
        ops::draw_rect_outline(
            &mut context,
            lcx - minimap_w as i64 / 2,
            lcy - minimap_h as i64 / 2,
            lcx + minimap_w as i64 / 2,
            lcy + minimap_h as i64 / 2,
            2,
            [255, 0, 0, 255],
        );

        crate::image::io::save_debug_image(output_dir, &format!("result_{}", pos.zone_id), &context)
    }
}

/// Runs the weighted match plus consistency check for one zone.
fn global_candidate(
    zone: &Zone,
    probe: &TemplateProbe,
    params: &LocatorParams,
    zone_index: usize,
) -> Option<ZoneCandidate> {
    let m = match_probe_weighted(
        zone.image.view(),
        probe,
        params.global_step,
        params.global_probe_step,
        false,
        params.edge_gamma,
    )?;
    let consistency =
        compute_local_consistency_fast(zone.image.view(), probe, m.x, m.y, params.consistency_stride);
    Some(ZoneCandidate {
        zone_index,
        x: m.x,
        y: m.y,
        combined: m.avg_diff + consistency * params.consistency_alpha,
    })
}
