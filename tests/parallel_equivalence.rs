#![cfg(feature = "rayon")]

//! The banded parallel scan must reproduce the serial scan bit-exactly,
//! including tie-breaking.

use maplocate::lowlevel::{match_probe, match_probe_weighted, ProbePoint, TemplateProbe};
use maplocate::RgbaImage;

fn textured_image(width: usize, height: usize, salt: usize) -> RgbaImage {
    let mut img = RgbaImage::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            let mix = (x * 13) ^ (y * 7) ^ (x * y) ^ salt;
            img.put_pixel(
                x,
                y,
                [
                    60 + (mix % 97) as u8,
                    60 + ((mix / 97) % 97) as u8,
                    60 + ((mix / 9409) % 97) as u8,
                    255,
                ],
            );
        }
    }
    img
}

fn probe_from_rect(img: &RgbaImage, x0: usize, y0: usize, w: usize, h: usize) -> TemplateProbe {
    let mut points = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let [r, g, b, _] = img.view().pixel(x0 + x, y0 + y).unwrap();
            points.push(ProbePoint {
                x: x as i16,
                y: y as i16,
                r,
                g,
                b,
            });
        }
    }
    TemplateProbe::from_points(points, w, h)
}

#[test]
fn parallel_scan_equals_serial_scan() {
    let img = textured_image(160, 140, 11);
    let probe = probe_from_rect(&img, 57, 43, 24, 20);

    for (step, probe_step) in [(1, 1), (2, 4), (8, 8), (3, 2)] {
        let serial = match_probe(img.view(), &probe, step, probe_step, false).unwrap();
        let parallel = match_probe(img.view(), &probe, step, probe_step, true).unwrap();
        assert_eq!((serial.x, serial.y), (parallel.x, parallel.y));
        assert_eq!(serial.avg_diff.to_bits(), parallel.avg_diff.to_bits());
    }
}

#[test]
fn parallel_weighted_scan_equals_serial_weighted_scan() {
    let img = textured_image(120, 120, 23);
    let probe = probe_from_rect(&img, 30, 66, 20, 20);

    let serial = match_probe_weighted(img.view(), &probe, 2, 2, false, 2.0).unwrap();
    let parallel = match_probe_weighted(img.view(), &probe, 2, 2, true, 2.0).unwrap();
    assert_eq!((serial.x, serial.y), (parallel.x, parallel.y));
    assert_eq!(serial.avg_diff.to_bits(), parallel.avg_diff.to_bits());
}

#[test]
fn parallel_ties_still_resolve_to_first_in_scan_order() {
    let mut img = RgbaImage::new(64, 64).unwrap();
    for y in 0..64 {
        for x in 0..64 {
            img.put_pixel(x, y, [80, 80, 80, 255]);
        }
    }
    let probe = TemplateProbe::from_points(
        vec![ProbePoint {
            x: 0,
            y: 0,
            r: 80,
            g: 80,
            b: 80,
        }],
        16,
        16,
    );
    let m = match_probe(img.view(), &probe, 1, 1, true).unwrap();
    assert_eq!((m.x, m.y), (0, 0));
}
