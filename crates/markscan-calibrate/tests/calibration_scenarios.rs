//! Integration test: drive both editors through pointer input the way the
//! browser components do, from encoded image bytes to results.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use std::io::Cursor;

use markscan_calibrate::mapper::normalize;
use markscan_calibrate::{
    CalibrateError, CanvasLayout, ClientPoint, CornerScanner, Dimensions, MarkerConfig, Point,
    PointerEvent, PointerPhase, RawPointer, RegionMarker, RegionType, RenderStyle, RgbaImage,
    ScannerConfig, raster, source,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 251) as u8, (y % 241) as u8, 128, 255])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// 1000x800 image displayed at 400x320 with the canvas at (8, 60).
const LAYOUT: CanvasLayout = CanvasLayout {
    left: 8.0,
    top: 60.0,
    rendered_width: 400.0,
    rendered_height: 320.0,
    natural_width: 1000.0,
    natural_height: 800.0,
};

/// Client coordinates for an image-space point under [`LAYOUT`].
fn client(x: f64, y: f64) -> ClientPoint {
    ClientPoint::new(x.mul_add(0.4, 8.0), y.mul_add(0.4, 60.0))
}

fn event(raw: &RawPointer, phase: PointerPhase) -> PointerEvent {
    normalize(raw, phase, &LAYOUT).expect("layout is valid")
}

#[test]
fn scanner_default_crop_from_decoded_png() {
    let image = source::decode(&png_bytes(1000, 800)).unwrap();
    let mut scanner = CornerScanner::new(ScannerConfig::default());
    scanner.load(image);

    let labelled: Vec<(String, f64, f64)> = scanner
        .corners()
        .unwrap()
        .iter()
        .map(|c| (c.label.to_string(), c.x, c.y))
        .collect();
    assert_eq!(
        labelled,
        vec![
            ("TL".to_owned(), 50.0, 50.0),
            ("TR".to_owned(), 950.0, 50.0),
            ("BR".to_owned(), 950.0, 750.0),
            ("BL".to_owned(), 50.0, 750.0),
        ]
    );

    let result = scanner.confirm().unwrap();
    assert_eq!(result.image.dimensions(), (900, 700));
    assert_eq!(result.image.get_pixel(10, 10).0, [60, 60, 128, 255]);
}

#[test]
fn scanner_touch_drag_then_crop_matches_bounding_box() {
    let mut scanner = CornerScanner::new(ScannerConfig::default());
    scanner.load(source::decode(&png_bytes(1000, 800)).unwrap());

    // Touch the BR handle and pull it inward.
    let down = RawPointer::Touch(vec![client(950.0, 750.0)]);
    assert!(scanner.handle_pointer(event(&down, PointerPhase::Down)));
    let mv = RawPointer::Touch(vec![client(700.0, 600.0)]);
    assert!(scanner.handle_pointer(event(&mv, PointerPhase::Move)));
    assert!(scanner.handle_pointer(event(&RawPointer::Touch(Vec::new()), PointerPhase::Up)));

    let br = scanner.corners().unwrap()[2];
    assert!((br.x - 700.0).abs() < 1e-9);
    assert!((br.y - 600.0).abs() < 1e-9);

    // Bounding box now spans (50,50)-(950,750) still, because TR and BL
    // keep the extremes.
    assert_eq!(scanner.crop().unwrap().dimensions(), (900, 700));
}

#[test]
fn scanner_corners_stay_in_bounds_for_any_drag_sequence() {
    let mut scanner = CornerScanner::new(ScannerConfig::default());
    scanner.load(RgbaImage::new(1000, 800));
    let defaults = *scanner.corners().unwrap();

    // Deterministic pseudo-random walk well beyond the image edges.
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % 3000) as f64 - 1000.0
    };
    for round in 0..200 {
        let corner = round % 4;
        assert!(scanner.begin_drag(corner));
        for _ in 0..10 {
            scanner.update_drag(Point::new(next(), next()));
        }
        scanner.end_drag();
        for c in scanner.corners().unwrap() {
            assert!((0.0..=1000.0).contains(&c.x), "{c:?}");
            assert!((0.0..=800.0).contains(&c.y), "{c:?}");
        }
        let bbox = markscan_calibrate::BoundingBox::of(
            &scanner.corners().unwrap().map(|c| c.point()),
        )
        .unwrap();
        assert_eq!(
            Dimensions::of(&scanner.crop().unwrap()),
            bbox.pixel_size(),
            "crop size equals the corner bounding box"
        );
    }

    scanner.reset_corners();
    assert_eq!(scanner.corners().unwrap(), &defaults);
}

#[test]
fn scanner_preview_dims_outside_polygon() {
    let mut scanner = CornerScanner::new(ScannerConfig::default());
    scanner.load(RgbaImage::from_pixel(200, 200, image::Rgba([200, 200, 200, 255])));
    let preview = raster::rasterize(
        &scanner.render(&RenderStyle::default()),
        scanner.source().unwrap(),
    );

    let outside = preview.get_pixel(5, 100).0;
    let inside = preview.get_pixel(100, 100).0;
    assert_eq!(inside, [200, 200, 200, 255]);
    assert!(outside[0] < 200, "overlay darkens outside: {outside:?}");
}

#[test]
fn marker_mouse_session_to_payload() {
    let mut marker = RegionMarker::new(MarkerConfig::default());
    marker.load(Dimensions::new(1000, 800));

    let drag = |m: &mut RegionMarker, from: (f64, f64), to: (f64, f64)| {
        let d = event(&RawPointer::Mouse(client(from.0, from.1)), PointerPhase::Down);
        let mv = event(&RawPointer::Mouse(client(to.0, to.1)), PointerPhase::Move);
        m.handle_pointer(d).unwrap();
        m.handle_pointer(mv).unwrap();
        m.handle_pointer(PointerEvent::Up)
    };

    drag(&mut marker, (100.0, 100.0), (300.0, 150.0)).unwrap();
    let mcq = &marker.regions()[0];
    assert_eq!(mcq.question_id, "all");
    assert_eq!(mcq.region_type, RegionType::Mcq);
    assert!((mcq.x - 100.0).abs() < 1e-6 && (mcq.y - 100.0).abs() < 1e-6);
    assert!((mcq.width - 200.0).abs() < 1e-6 && (mcq.height - 50.0).abs() < 1e-6);

    // Switching back to mcq is refused while one exists.
    assert!(!marker.set_active_type(RegionType::Mcq));

    for i in 0..3 {
        let y = 250.0 + 120.0 * f64::from(i);
        drag(&mut marker, (80.0, y), (600.0, y + 90.0)).unwrap();
    }
    marker.delete_region(2);
    let ids: Vec<&str> = marker
        .regions()
        .iter()
        .map(|r| r.question_id.as_str())
        .collect();
    assert_eq!(ids, ["all", "1", "3"]);

    let payload = marker.save().unwrap();
    assert_eq!(payload.dimensions(), Dimensions::new(1000, 800));
    assert_eq!(payload.regions[0].x, 100);
    assert_eq!(payload.regions[0].width, 200);
    payload.check().unwrap();
}

#[test]
fn marker_never_holds_two_mcq_regions() {
    let mut marker = RegionMarker::default();
    marker.load(Dimensions::new(500, 500));

    let plan: [(bool, RegionType); 8] = [
        (false, RegionType::Mcq),
        (false, RegionType::Mcq),
        (true, RegionType::Written),
        (false, RegionType::Mcq),
        (true, RegionType::Mcq),
        (false, RegionType::Mcq),
        (false, RegionType::Written),
        (false, RegionType::Mcq),
    ];
    for (step, (delete_first, kind)) in plan.into_iter().enumerate() {
        if delete_first && !marker.regions().is_empty() {
            let idx = marker
                .regions()
                .iter()
                .position(|r| r.region_type == kind)
                .unwrap_or(0);
            marker.delete_region(idx);
        }
        marker.set_active_type(kind);
        let off = f64::from(u32::try_from(step).unwrap()) * 20.0;
        let before = marker.regions().len();
        marker.begin_draw(Point::new(off, off));
        marker.update_draw(Point::new(off + 50.0, off + 40.0));
        match marker.end_draw() {
            Ok(Some(_)) => assert_eq!(marker.regions().len(), before + 1),
            Ok(None) => unreachable!("draft is large enough"),
            Err(CalibrateError::DuplicateMcq) => assert_eq!(marker.regions().len(), before),
            Err(e) => panic!("unexpected error: {e}"),
        }
        let mcqs = marker
            .regions()
            .iter()
            .filter(|r| r.region_type == RegionType::Mcq)
            .count();
        assert!(mcqs <= 1, "step {step}: {mcqs} mcq regions");
    }
}

#[test]
fn marker_small_drags_never_append() {
    let mut marker = RegionMarker::default();
    marker.load(Dimensions::new(500, 500));
    for dx in [-10.0, -5.0, 0.0, 5.0, 10.0] {
        for dy in [-10.0, 0.0, 10.0, 200.0] {
            marker.begin_draw(Point::new(250.0, 250.0));
            marker.update_draw(Point::new(250.0 + dx, 250.0 + dy));
            assert_eq!(marker.end_draw().unwrap(), None);
            assert!(marker.regions().is_empty());
        }
    }
}
