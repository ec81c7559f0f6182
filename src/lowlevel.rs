//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the probe, mask, and matcher internals for advanced use
//! cases beyond the high-level `MapLocator` API, such as matching hand-built
//! probes against arbitrary images. Most users should prefer `MapLocator`.

pub use crate::gate::GateThresholds;
pub use crate::mask::filter::VOID_LUMA_THRESHOLD;
pub use crate::mask::{apply_void_filter, is_icon_pixel, AlphaMask, ANNULUS_INNER_RADIUS};
pub use crate::matcher::{
    compute_local_consistency_fast, match_probe, match_probe_weighted, ProbeMatch,
};
pub use crate::probe::{ProbePoint, TemplateProbe};
