//! Zone directory auto-scan.
//!
//! The on-disk layout is one directory per region under the map root. A
//! region's `Base.png` becomes `<Region>_Base`; tier overlays named
//! `Lv<level>Tier<tier>.<ext>` become `<Region>_L<level>_<tier>`, with
//! leading zeros stripped from both numbers.

use crate::trace::trace_event;
use crate::util::{MapLocateError, MapLocateResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LAYER_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Lv(\d+)Tier(\d+)\.(png|jpg|webp)$").expect("valid regex"));

/// Scans `root` for zone images and returns the id -> path map.
///
/// Unrecognized files are skipped silently; unreadable region directories
/// are skipped with a trace event. The result is ordered by zone id.
pub fn scan_zone_dir<P: AsRef<Path>>(root: P) -> MapLocateResult<BTreeMap<String, PathBuf>> {
    let root = root.as_ref();
    let entries = std::fs::read_dir(root).map_err(|err| MapLocateError::ZoneScan {
        reason: format!("{}: {err}", root.display()),
    })?;

    let mut zones = BTreeMap::new();
    for entry in entries.flatten() {
        let region_path = entry.path();
        if !region_path.is_dir() {
            continue;
        }
        let region = match region_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_owned(),
            None => continue,
        };

        let files = match std::fs::read_dir(&region_path) {
            Ok(files) => files,
            Err(err) => {
                trace_event!(
                    "zone_scan_skip",
                    region = region.as_str(),
                    error = err.to_string().as_str()
                );
                continue;
            }
        };

        for file in files.flatten() {
            let path = file.path();
            if path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };

            if name.eq_ignore_ascii_case("base.png") {
                zones.insert(format!("{region}_Base"), path);
                continue;
            }
            if let Some(caps) = LAYER_FILE_RE.captures(name) {
                let level = strip_leading_zeros(&caps[1]);
                let tier = strip_leading_zeros(&caps[2]);
                zones.insert(format!("{region}_L{level}_{tier}"), path);
            }
        }
    }
    Ok(zones)
}

fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::{strip_leading_zeros, LAYER_FILE_RE};

    #[test]
    fn layer_regex_matches_tier_files() {
        let caps = LAYER_FILE_RE.captures("Lv001Tier172.png").unwrap();
        assert_eq!(&caps[1], "001");
        assert_eq!(&caps[2], "172");

        assert!(LAYER_FILE_RE.is_match("lv2tier3.WEBP"));
        assert!(!LAYER_FILE_RE.is_match("Base.png"));
        assert!(!LAYER_FILE_RE.is_match("Lv1Tier2.bmp"));
    }

    #[test]
    fn leading_zeros_are_stripped() {
        assert_eq!(strip_leading_zeros("001"), "1");
        assert_eq!(strip_leading_zeros("000"), "0");
        assert_eq!(strip_leading_zeros("172"), "172");
    }
}
