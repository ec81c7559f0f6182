//! MapLocate is a CPU-first visual localization engine for game minimaps.
//!
//! Given a circular minimap cropped from a screen capture, the locator
//! identifies which pre-loaded world map ("zone") the minimap belongs to and
//! returns the pixel coordinates of the minimap center inside that zone. It is
//! built for 10-30 Hz call rates: a cheap predictive tracking search handles
//! the common case, and an exhaustive parallel search across all zones runs
//! only when tracking is lost.

pub mod image;
pub mod locator;
pub mod util;

mod gate;
mod mask;
mod matcher;
mod probe;
mod trace;

pub mod lowlevel;

pub use gate::GateThresholds;
pub use image::{RgbaImage, RgbaView};
pub use locator::{LocatorParams, MapLocator, MapPosition, Zone};
pub use util::{MapLocateError, MapLocateResult};
