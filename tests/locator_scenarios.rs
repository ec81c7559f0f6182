//! End-to-end locator scenarios on synthetic zones.
//!
//! Zone art is a slowly varying triangle-wave pattern with a quadratic phase
//! warp: smooth enough that the strided global search lands within its fine
//! halo of the true position, and aperiodic so the true position is the
//! unique global minimum.

use maplocate::image::ops::copy_sub_image;
use maplocate::{MapLocateError, MapLocator, RgbaImage};
use std::time::{Duration, Instant};

const MM_W: usize = 117;
const MM_H: usize = 120;

fn tri(t: i64) -> i64 {
    let m = t.rem_euclid(192);
    m.min(192 - m)
}

fn zone_image(width: usize, height: usize, salt: i64) -> RgbaImage {
    let mut img = RgbaImage::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (x as i64, y as i64);
            let warp = xi * xi / 2048 + yi * yi / 2048;
            let r = 60 + tri(xi + yi + warp + salt) as u8;
            let g = 60 + tri(xi - yi + warp + 2 * salt + 64) as u8;
            let b = 60 + tri(xi + 2 * yi - warp + salt + 128) as u8;
            img.put_pixel(x, y, [r, g, b, 255]);
        }
    }
    img
}

fn brightened(src: &RgbaImage, delta: u8) -> RgbaImage {
    let mut img = RgbaImage::new(src.width(), src.height()).unwrap();
    for y in 0..src.height() {
        for x in 0..src.width() {
            let [r, g, b, a] = src.view().pixel(x, y).unwrap();
            img.put_pixel(
                x,
                y,
                [
                    r.saturating_add(delta),
                    g.saturating_add(delta),
                    b.saturating_add(delta),
                    a,
                ],
            );
        }
    }
    img
}

fn noise_minimap(seed: u64) -> RgbaImage {
    let mut img = RgbaImage::new(MM_W, MM_H).unwrap();
    let mut state = seed.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u8
    };
    for y in 0..MM_H {
        for x in 0..MM_W {
            img.put_pixel(x, y, [next(), next(), next(), 255]);
        }
    }
    img
}

fn black_minimap() -> RgbaImage {
    let mut img = RgbaImage::new(MM_W, MM_H).unwrap();
    for y in 0..MM_H {
        for x in 0..MM_W {
            img.put_pixel(x, y, [0, 0, 0, 255]);
        }
    }
    img
}

fn carve(zone: &RgbaImage, x: usize, y: usize) -> RgbaImage {
    copy_sub_image(zone.view(), x, y, MM_W, MM_H).unwrap()
}

fn single_zone_locator() -> (MapLocator, RgbaImage) {
    let zone = zone_image(1000, 1000, 0);
    let locator =
        MapLocator::from_zone_images([("ZoneA_Base".to_owned(), zone.clone())]).unwrap();
    (locator, zone)
}

/// Forbids global acceptance, so any further hit must come from tracking.
fn disable_global(locator: &mut MapLocator) {
    let mut params = locator.params().clone();
    params.gate.single_max = -1.0;
    params.gate.max_absolute = -1.0;
    locator.set_params(params);
}

#[test]
fn construction_requires_zones() {
    let err = MapLocator::from_zone_images(std::iter::empty::<(String, RgbaImage)>())
        .err()
        .unwrap();
    assert_eq!(err, MapLocateError::NoZones);
}

#[test]
fn cold_start_hit() {
    let (mut locator, zone) = single_zone_locator();
    let minimap = carve(&zone, 400, 300);

    let pos = locator
        .locate_at(minimap.view(), Instant::now())
        .unwrap()
        .expect("cold start should resolve");
    assert_eq!(pos.zone_id, "ZoneA_Base");
    assert!((pos.x - 458.5).abs() <= 1.0, "x = {}", pos.x);
    assert!((pos.y - 359.5).abs() <= 1.0, "y = {}", pos.y);
    assert!(pos.avg_diff < 3.0, "avg_diff = {}", pos.avg_diff);

    assert_eq!(locator.lost_tracking_count(), 0);
    assert_eq!(locator.current_zone_id(), Some("ZoneA_Base"));
    assert_eq!(locator.last_known_pos(), Some(&pos));
}

#[test]
fn cold_start_miss_on_noise() {
    let (mut locator, _zone) = single_zone_locator();
    let result = locator
        .locate_at(noise_minimap(42).view(), Instant::now())
        .unwrap();
    assert!(result.is_none());
    assert_eq!(locator.lost_tracking_count(), 1);
    assert!(locator.last_known_pos().is_none());
    assert!(locator.current_zone_id().is_none());
}

#[test]
fn predictive_tracking_follows_motion() {
    let (mut locator, zone) = single_zone_locator();
    let t0 = Instant::now();

    locator
        .locate_at(carve(&zone, 400, 300).view(), t0)
        .unwrap()
        .expect("initial global hit");

    // With global acceptance disabled, the second frame can only resolve
    // through the tracking branch.
    disable_global(&mut locator);
    let pos = locator
        .locate_at(carve(&zone, 410, 300).view(), t0 + Duration::from_millis(100))
        .unwrap()
        .expect("tracking hit");

    assert!((pos.x - 468.5).abs() <= 1.0, "x = {}", pos.x);
    assert!((pos.y - 359.5).abs() <= 1.0, "y = {}", pos.y);

    // 10 px in 100 ms smoothed by the EMA: half of 100 px/s.
    let (vx, vy) = locator.velocity();
    assert!((vx - 50.0).abs() <= 6.0, "vx = {vx}");
    assert!(vy.abs() <= 6.0, "vy = {vy}");
}

#[test]
fn brief_loss_then_tracking_recovery() {
    let (mut locator, zone) = single_zone_locator();
    let t0 = Instant::now();
    let minimap = carve(&zone, 400, 300);

    let first = locator
        .locate_at(minimap.view(), t0)
        .unwrap()
        .expect("initial global hit");

    disable_global(&mut locator);
    for i in 1..=3u32 {
        let frame = noise_minimap(100 + i as u64);
        let result = locator
            .locate_at(frame.view(), t0 + Duration::from_millis(100 * i as u64))
            .unwrap();
        assert!(result.is_none(), "noise frame {i} should miss");
        assert_eq!(locator.lost_tracking_count(), i);
        assert!(locator.last_known_pos().is_some(), "grace period frame {i}");
    }

    // Fourth frame: the original view again. Tracking state is still held
    // (3 <= MaxLost) and global is disabled, so this must be a tracking hit.
    let recovered = locator
        .locate_at(minimap.view(), t0 + Duration::from_millis(400))
        .unwrap()
        .expect("tracking recovery");
    assert!((recovered.x - first.x).abs() <= 1.0);
    assert!((recovered.y - first.y).abs() <= 1.0);
    assert_eq!(locator.lost_tracking_count(), 0);
}

#[test]
fn occlusion_clears_state_after_grace_period() {
    let (mut locator, zone) = single_zone_locator();
    let t0 = Instant::now();

    locator
        .locate_at(carve(&zone, 400, 300).view(), t0)
        .unwrap()
        .expect("initial global hit");

    for i in 1..=3u32 {
        let result = locator
            .locate_at(black_minimap().view(), t0 + Duration::from_millis(100 * i as u64))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(locator.lost_tracking_count(), i);
        assert!(locator.last_known_pos().is_some());
    }

    let fourth = locator
        .locate_at(black_minimap().view(), t0 + Duration::from_millis(400))
        .unwrap();
    assert!(fourth.is_none());
    assert!(locator.last_known_pos().is_none());
}

#[test]
fn zone_switch_resets_velocity() {
    let zone_a = zone_image(1000, 1000, 0);
    let zone_b = zone_image(600, 600, 1000);
    let mut locator = MapLocator::from_zone_images([
        ("ZoneA_Base".to_owned(), zone_a.clone()),
        ("ZoneB_Base".to_owned(), zone_b.clone()),
    ])
    .unwrap();
    let t0 = Instant::now();

    locator
        .locate_at(carve(&zone_a, 400, 300).view(), t0)
        .unwrap()
        .expect("hit on zone A");
    locator
        .locate_at(carve(&zone_a, 410, 300).view(), t0 + Duration::from_millis(100))
        .unwrap()
        .expect("tracked frame on zone A");
    assert!(locator.velocity().0 > 10.0, "velocity should be established");

    let pos = locator
        .locate_at(carve(&zone_b, 200, 150).view(), t0 + Duration::from_millis(200))
        .unwrap()
        .expect("hit on zone B");
    assert_eq!(pos.zone_id, "ZoneB_Base");
    assert!((pos.x - 258.5).abs() <= 1.0);
    assert!((pos.y - 210.5).abs() <= 1.0);
    assert_eq!(locator.velocity(), (0.0, 0.0));
    assert_eq!(locator.current_zone_id(), Some("ZoneB_Base"));
}

#[test]
fn near_duplicate_zones_are_rejected_as_ambiguous() {
    let zone_a = zone_image(1000, 1000, 0);
    let zone_c = brightened(&zone_a, 3);
    let mut locator = MapLocator::from_zone_images([
        ("ZoneA_Base".to_owned(), zone_a.clone()),
        ("ZoneC_Base".to_owned(), zone_c),
    ])
    .unwrap();

    // The two zones differ by a constant brightness offset, so their global
    // scores differ by only a few units: no single winner is trustworthy.
    let result = locator
        .locate_at(carve(&zone_a, 400, 300).view(), Instant::now())
        .unwrap();
    assert!(result.is_none());
    assert_eq!(locator.lost_tracking_count(), 1);
    assert!(locator.last_known_pos().is_none());
}

#[test]
fn transparent_minimap_is_a_miss() {
    let (mut locator, _zone) = single_zone_locator();
    let mut clear = RgbaImage::new(MM_W, MM_H).unwrap();
    for y in 0..MM_H {
        for x in 0..MM_W {
            clear.put_pixel(x, y, [120, 120, 120, 0]);
        }
    }
    let result = locator.locate_at(clear.view(), Instant::now()).unwrap();
    assert!(result.is_none());
    assert_eq!(locator.lost_tracking_count(), 1);
}

#[test]
fn annulus_mask_regenerates_for_other_minimap_sizes() {
    let (mut locator, zone) = single_zone_locator();
    let small = copy_sub_image(zone.view(), 160, 240, 80, 80).unwrap();
    let pos = locator
        .locate_at(small.view(), Instant::now())
        .unwrap()
        .expect("smaller minimap should still resolve");
    assert!((pos.x - 200.0).abs() <= 1.0);
    assert!((pos.y - 280.0).abs() <= 1.0);
}
