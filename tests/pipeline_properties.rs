//! Behavioral properties of the detection and restitution pipeline checked
//! through the public API on synthetic rasters.

use aerofid::fiducial::{
    detect_fiducials, principal_point_from_pairs, principal_point_from_proxies, reject_low_scores,
    ScoreMedians,
};
use aerofid::geometry::{corner_windows, midside_windows};
use aerofid::refine::upsample;
use aerofid::{
    match_template, restitute, AffineTransform, CanonicalGeometry, CompileConfig, CompiledTemplate,
    Confidence, DetectConfig, FiducialLayout, FiducialSet, FiducialTemplates, FrameDetection,
    InterpolationOrder, Marker, MarkerSlot, MatchConfig, OutlierConfig, Point, Raster,
    RestitutionConfig, SubpixelConfig, Template,
};

fn textured(width: usize, height: usize, seed: usize) -> Raster {
    Raster::from_fn("textured", width, height, |x, y| {
        let x = x + seed;
        (((x * 73 + y * 151) ^ (x * y * 31)) % 251) as u8
    })
    .unwrap()
}

fn smooth(width: usize, height: usize) -> Raster {
    Raster::from_fn("smooth", width, height, |x, y| {
        let (xf, yf) = (x as f64, y as f64);
        let v = 128.0
            + 60.0 * (xf / 7.0).sin() * (yf / 9.0).cos()
            + 40.0 * ((xf + 2.0 * yf) / 13.0).sin();
        v.round().clamp(0.0, 255.0) as u8
    })
    .unwrap()
}

fn cut(raster: &Raster, x: usize, y: usize, width: usize, height: usize) -> Template {
    let roi = raster.view().roi(x, y, width, height).unwrap();
    Template::from_raster(Raster::from_view("tpl", roi).unwrap())
}

fn blob(width: usize, height: usize, centers: &[(f64, f64)]) -> Raster {
    Raster::from_fn("blob", width, height, |x, y| {
        let bright: f64 = centers
            .iter()
            .map(|&(cy, cx)| {
                let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                200.0 * (-d2 / 18.0).exp()
            })
            .sum();
        (30.0 + bright).round().min(255.0) as u8
    })
    .unwrap()
}

#[test]
fn search_windows_are_disjoint_bounded_and_symmetric() {
    let (height, width) = (1000, 1200);
    for windows in [midside_windows(height, width).unwrap(), corner_windows(height, width).unwrap()] {
        for (i, a) in windows.iter().enumerate() {
            assert!(a.bottom <= height && a.right <= width);
            for b in &windows[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        assert_eq!(windows[0].height(), windows[2].height());
        assert_eq!(windows[1].width(), windows[3].width());
    }
    let [left, top, right, bottom] = midside_windows(height, width).unwrap();
    assert_eq!(left.width(), right.width());
    assert_eq!(top.height(), bottom.height());
}

#[test]
fn exact_copy_scores_one_at_its_offset() {
    let image = textured(96, 80, 0);
    let tpl = CompiledTemplate::single_level(&cut(&image, 37, 21, 16, 12)).unwrap();
    let hit = match_template(image.view(), &tpl, &MatchConfig::default()).unwrap().unwrap();
    assert_eq!((hit.row, hit.col), (21, 37));
    assert!((hit.score - 1.0).abs() < 1e-9);

    let other = textured(96, 80, 500);
    let miss = match_template(other.view(), &tpl, &MatchConfig::default()).unwrap().unwrap();
    assert!(miss.score < 1.0 - 1e-6);
}

#[test]
fn pyramid_search_finds_an_aligned_copy() {
    let image = smooth(256, 224);
    let template = cut(&image, 120, 88, 48, 48);
    let cfg = MatchConfig {
        pyramid_levels: 3,
        ..MatchConfig::default()
    };
    let compiled = CompiledTemplate::compile(
        &template,
        &CompileConfig {
            max_levels: cfg.pyramid_levels,
            ..CompileConfig::default()
        },
    )
    .unwrap();
    let hit = match_template(image.view(), &compiled, &cfg).unwrap().unwrap();
    assert_eq!((hit.row, hit.col), (88, 120));
    assert!((hit.score - 1.0).abs() < 1e-9);
}

#[test]
fn detection_with_refinement_recovers_fractional_centers() {
    let centers = [(80.25, 30.75), (20.5, 100.25), (79.75, 169.5), (139.5, 99.75)];
    let raster = blob(200, 160, &centers);

    let factor = 4;
    let coarse = blob(24, 24, &[(11.5, 11.5)]);
    let high_res = upsample(&coarse, factor, InterpolationOrder::Cubic).unwrap();
    let cfg = DetectConfig {
        subpixel: SubpixelConfig {
            distance_from_loc: 32,
            factor,
            ..SubpixelConfig::default()
        },
        ..DetectConfig::default()
    };
    let templates = FiducialTemplates::compile(
        FiducialLayout::Midside,
        &Template::from_raster(coarse),
        Some(&Template::from_raster(high_res)),
        &cfg,
    )
    .unwrap();

    let set = detect_fiducials(&raster, &templates, &cfg).unwrap();
    for (marker, &(cy, cx)) in set.markers.iter().zip(&centers) {
        let p = marker.point.unwrap();
        assert!((p.y - cy).abs() <= 0.25 && (p.x - cx).abs() <= 0.25, "{p:?} vs ({cy}, {cx})");
        assert!(marker.score.unwrap() > 0.95);
    }

    let medians = ScoreMedians::from_sets(std::slice::from_ref(&set));
    let pp = principal_point_from_pairs(&set, &medians, 0.01).unwrap();
    assert!((pp.y - 80.0).abs() <= 0.25 && (pp.x - 100.0625).abs() <= 0.25);
}

#[test]
fn refinement_crop_past_the_border_drops_only_that_marker() {
    let centers = [(80.25, 6.0), (20.5, 100.25), (79.75, 169.5), (139.5, 99.75)];
    let raster = blob(200, 160, &centers);

    let factor = 4;
    let coarse = blob(24, 24, &[(11.5, 11.5)]);
    let high_res = upsample(&coarse, factor, InterpolationOrder::Cubic).unwrap();
    let cfg = DetectConfig {
        subpixel: SubpixelConfig {
            distance_from_loc: 32,
            factor,
            ..SubpixelConfig::default()
        },
        ..DetectConfig::default()
    };
    let templates = FiducialTemplates::compile(
        FiducialLayout::Midside,
        &Template::from_raster(coarse),
        Some(&Template::from_raster(high_res)),
        &cfg,
    )
    .unwrap();

    let set = detect_fiducials(&raster, &templates, &cfg).unwrap();
    assert_eq!(set.markers[0], Marker::missing());
    for (marker, &(cy, cx)) in set.markers[1..].iter().zip(&centers[1..]) {
        let p = marker.point.unwrap();
        assert!((p.y - cy).abs() <= 0.25 && (p.x - cx).abs() <= 0.25, "{p:?} vs ({cy}, {cx})");
    }
}

#[test]
fn only_the_low_scoring_frame_is_flagged() {
    let mut sets: Vec<FiducialSet> = [0.9, 0.9, 0.9, 0.3]
        .iter()
        .enumerate()
        .map(|(i, &score)| {
            let mut markers = [Marker::new(Point::new(10.0, 10.0), 0.9); 4];
            markers[0] = Marker::new(Point::new(50.0, 5.0), score);
            FiducialSet::new(format!("frame_{i}"), FiducialLayout::Midside, markers)
        })
        .collect();
    reject_low_scores(&mut sets, &OutlierConfig::default()).unwrap();
    let cleared: Vec<bool> = sets.iter().map(|s| s.markers[0].point.is_none()).collect();
    assert_eq!(cleared, [false, false, false, true]);
    assert_eq!(sets[3].markers[0].score, Some(0.3));
}

#[test]
fn proxy_rectangle_center_and_adjacent_fallback() {
    let rectangle = [
        Marker::new(Point::new(50.0, 0.0), 1.0),
        Marker::new(Point::new(0.0, 80.0), 1.0),
        Marker::new(Point::new(50.0, 160.0), 1.0),
        Marker::new(Point::new(100.0, 80.0), 1.0),
    ];
    let full = FiducialSet::new("f", FiducialLayout::Midside, rectangle);
    let estimate = principal_point_from_proxies(&full).unwrap();
    assert_eq!(estimate.point, Point::new(50.0, 80.0));
    assert_eq!(estimate.confidence, Confidence::Full);

    let mut partial = rectangle;
    partial[2] = Marker::missing();
    partial[3] = Marker::missing();
    let estimate = principal_point_from_proxies(&FiducialSet::new("f", FiducialLayout::Midside, partial)).unwrap();
    // Row of the left proxy, column of the top proxy.
    assert_eq!(estimate.point, Point::new(50.0, 80.0));
    assert_eq!(estimate.confidence, Confidence::Reduced);
}

#[test]
fn pure_translation_is_recovered() {
    let src = [
        Point::new(10.0, 20.0),
        Point::new(300.0, 25.0),
        Point::new(150.0, 400.0),
        Point::new(40.0, 380.0),
    ];
    let dst = src.map(|p| p.offset(-3.5, 7.25));
    let tf = AffineTransform::estimate(&src, &dst).unwrap();
    let (dy, dx) = tf.translation();
    assert!((dy + 3.5).abs() < 1e-9 && (dx - 7.25).abs() < 1e-9);
    let linear = tf.linear();
    assert!((linear[(0, 0)] - 1.0).abs() < 1e-9 && linear[(0, 1)].abs() < 1e-9);
    assert!(linear[(1, 0)].abs() < 1e-9 && (linear[(1, 1)] - 1.0).abs() < 1e-9);
}

#[test]
fn two_correspondences_leave_the_raster_untouched() {
    let mut table = [None; 8];
    table[MarkerSlot::MidsideLeft.frame_index()] = Some((-0.4, 0.0));
    table[MarkerSlot::MidsideTop.frame_index()] = Some((0.0, 0.3));
    table[MarkerSlot::MidsideRight.frame_index()] = Some((0.4, 0.0));
    let canonical = CanonicalGeometry::from_mm(table, 0.02).unwrap();

    let markers = [
        Marker::new(Point::new(20.0, 4.5), 0.9),
        Marker::new(Point::new(5.0, 24.0), 0.9),
        Marker::missing(),
        Marker::missing(),
    ];
    let detection = FrameDetection::new("f")
        .with_set(&FiducialSet::new("f", FiducialLayout::Midside, markers))
        .with_principal_point(Some(Point::new(20.0, 24.0)), Confidence::Full);
    let raster = textured(48, 40, 3);
    let cfg = RestitutionConfig {
        crop_image: false,
        ..RestitutionConfig::default()
    };
    let out = restitute(&detection, Some(&raster), &canonical, &cfg).unwrap();
    assert!(out.transform.is_none());
    assert_eq!(out.raster.unwrap(), raster);
    assert_eq!(out.qc.unwrap().coordinates_rmse_after, None);
}
