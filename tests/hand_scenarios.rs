//! End-to-end checks of the hand model and candidate assignment.

use palmtips::{
    observe, observe_batch, AssignmentStrategy, BayesianAssigner, Error, ExhaustiveAssigner,
    Finger, FingerClass, Frame, HandConfig, HandModel, PalmarHand, Pixel, SideFinger, SideHand,
};
use std::collections::{BTreeMap, BTreeSet};

fn palmar(height: f64) -> PalmarHand {
    PalmarHand::new(Pixel::new(128, 128), height, &HandConfig::default()).unwrap()
}

/// A silhouette whose hull is the five hypothesis tips plus the two lower
/// palm corners, with some interior clutter.
fn open_hand_contour(model: &PalmarHand) -> Vec<Pixel> {
    let tips = model.hypotheses();
    let frame = model.frame();
    vec![
        frame.bottom_left(),
        tips[&Finger::Pinky],
        Pixel::new(95, 80),
        tips[&Finger::Ring],
        Pixel::new(110, 70),
        tips[&Finger::Middle],
        Pixel::new(150, 75),
        tips[&Finger::Index],
        Pixel::new(170, 110),
        tips[&Finger::Thumb],
        frame.bottom_right(),
        Pixel::new(128, 160),
    ]
}

fn on_palm_boundary<F: FingerClass>(model: &HandModel<F>, p: Pixel) -> bool {
    let frame = model.frame();
    p.y == frame.top_left().y || p.x == frame.top_left().x || p.x == frame.top_right().x
}

#[test]
fn example_palm_frame() {
    let model = palmar(100.0);
    let frame = model.frame();
    assert_eq!(frame.peak(), Pixel::new(128, 78));
    assert_eq!(frame.base(), Pixel::new(128, 178));
    assert_eq!(frame.width(), 90);
    assert_eq!(frame.top_left(), Pixel::new(83, 78));
    assert_eq!(frame.top_right(), Pixel::new(173, 78));

    let theta = (-90.0f64).to_radians();
    assert_eq!(model.tip(Finger::Middle, theta), Pixel::new(128, -10));
    assert_eq!(model.basepoint(Finger::Middle, theta).unwrap(), Pixel::new(128, 78));
}

#[test]
fn accessors_are_deterministic() {
    let model = palmar(100.0);
    for &finger in Finger::ALL {
        let theta = model.default_theta(finger);
        let first = model.geometry(finger, theta).unwrap();
        for _ in 0..3 {
            assert_eq!(model.geometry(finger, theta).unwrap(), first);
            assert_eq!(model.tip(finger, theta), first.tip);
            assert_eq!(model.basepoint(finger, theta).unwrap(), first.basepoint);
            assert_eq!(model.length(finger, theta).unwrap(), first.length);
            assert_eq!(model.finger_box(finger, theta).unwrap(), first.bounding_box);
        }
    }
    assert_eq!(model.layout().unwrap(), model.layout().unwrap());
}

#[test]
fn finger_reach_scales_with_height() {
    let small = palmar(100.0);
    let large = palmar(200.0);
    for &finger in Finger::ALL {
        let theta = small.default_theta(finger);
        let d_small = small.frame().base().distance(&small.tip(finger, theta));
        let d_large = large.frame().base().distance(&large.tip(finger, theta));
        assert!(
            (d_large - 2.0 * d_small).abs() < 2.5,
            "{finger:?}: {d_small} -> {d_large}"
        );
    }
}

#[test]
fn basepoints_lie_on_palm_edges() {
    let model = palmar(100.0);
    for &finger in Finger::ALL {
        let nominal = model.default_theta(finger);
        for step in -10..=10 {
            let theta = nominal + (step as f64).to_radians();
            let bp = model.basepoint(finger, theta).unwrap();
            assert!(on_palm_boundary(&model, bp), "{finger:?} at {theta}: {bp:?}");
        }
    }

    let side = SideHand::new(Pixel::new(128, 128), 100.0, &HandConfig::default()).unwrap();
    for &finger in SideFinger::ALL {
        let bp = side.basepoint(finger, side.default_theta(finger)).unwrap();
        assert!(on_palm_boundary(&side, bp), "{finger:?}: {bp:?}");
    }
}

#[test]
fn edge_selection_per_finger() {
    let model = palmar(100.0);
    let top = model.frame().top_left().y;
    let left = model.frame().top_left().x;
    let right = model.frame().top_right().x;

    let bp = |finger: Finger| model.basepoint(finger, model.default_theta(finger)).unwrap();
    assert_eq!(bp(Finger::Pinky).x, left);
    assert_eq!(bp(Finger::Ring).y, top);
    assert_eq!(bp(Finger::Middle).y, top);
    assert_eq!(bp(Finger::Index).y, top);
    assert_eq!(bp(Finger::Thumb).x, right);
}

#[test]
fn boxes_follow_finger_direction() {
    let model = palmar(100.0);
    for &finger in Finger::ALL {
        let g = model.geometry(finger, model.default_theta(finger)).unwrap();
        let [far_left, _, _, near_left] = g.bounding_box;
        let axis = (far_left.to_point() - near_left.to_point()).normalized().unwrap();
        let dir = (g.tip.to_point() - g.basepoint.to_point()).normalized().unwrap();
        assert!(axis.dot(&dir).abs() > 0.99, "{finger:?}: {}", axis.dot(&dir));
    }
}

#[test]
fn exact_tips_among_outliers_resolve_one_to_one() {
    let model = palmar(100.0);
    let hypotheses = model.hypotheses();

    let mut candidates = vec![Pixel::new(-200, -200), Pixel::new(400, 10)];
    candidates.extend(hypotheses.values().copied());
    candidates.push(Pixel::new(128, 300));

    for estimate in [
        BayesianAssigner::default().assign(&candidates, &hypotheses),
        ExhaustiveAssigner::new(15.0).assign(&candidates, &hypotheses),
    ] {
        let estimate = estimate.expect("every finger should match");
        assert_eq!(estimate.points(), &hypotheses);
    }
}

#[test]
fn outlier_is_never_assigned() {
    let model = palmar(100.0);
    let hypotheses = model.hypotheses();
    let outlier = Pixel::new(20, 150);

    let mut candidates: Vec<Pixel> = hypotheses.values().copied().collect();
    candidates.push(outlier);

    let estimate = BayesianAssigner::default()
        .assign(&candidates, &hypotheses)
        .unwrap();
    assert!(estimate.iter().all(|(_, p)| p != outlier));
}

#[test]
fn no_over_assignment_with_crowded_candidates() {
    let model = palmar(100.0);
    let hypotheses = model.hypotheses();

    // Several jittered candidates around every hypothesis.
    let mut candidates = Vec::new();
    for (i, tip) in hypotheses.values().enumerate() {
        for (dx, dy) in [(0, 0), (3, -2), (-5, 4), (7, 7)] {
            candidates.push(Pixel::new(tip.x + dx + i as i32 % 2, tip.y + dy));
        }
    }

    let estimate = BayesianAssigner::default()
        .assign(&candidates, &hypotheses)
        .unwrap();
    let points: BTreeSet<Pixel> = estimate.iter().map(|(_, p)| p).collect();
    assert_eq!(points.len(), Finger::ALL.len());
    for (finger, p) in estimate.iter() {
        assert!(p.distance(&hypotheses[&finger]) <= 15.0);
    }
}

#[test]
fn likelihoods_normalize_per_class() {
    let model = palmar(100.0);
    let hypotheses = model.hypotheses();
    let mut candidates = Vec::new();
    for tip in hypotheses.values() {
        candidates.push(*tip);
        candidates.push(Pixel::new(tip.x + 6, tip.y - 6));
    }
    let table = BayesianAssigner::default().posteriors(&candidates, &hypotheses);
    for &finger in Finger::ALL {
        let total: f64 = (0..candidates.len())
            .map(|c| table.likelihood(c, finger))
            .sum();
        assert!((total - 1.0).abs() < 1e-9, "{finger:?}: {total}");
    }
}

#[test]
fn observe_open_hand() {
    let config = HandConfig::default();
    let model = palmar(100.0);
    let contour = open_hand_contour(&model);

    let observation = observe(
        &contour,
        Pixel::new(128, 128),
        100.0,
        &config,
        &BayesianAssigner::from_config(&config),
    )
    .unwrap();

    assert_eq!(observation.candidates.len(), 5);
    let estimate = observation.estimate.as_ref().expect("complete estimate");
    assert_eq!(estimate.points(), &model.hypotheses());

    let layout = observation.estimate_layout.as_ref().unwrap();
    for (finger, g) in &layout.fingers {
        assert_eq!(Some(g.tip), estimate.get(*finger));
    }
}

#[test]
fn observe_batch_keeps_order_and_errors() {
    let config = HandConfig::default();
    let model = palmar(100.0);
    let frames = vec![
        Frame {
            contour: open_hand_contour(&model),
            palm_center: Pixel::new(128, 128),
            palm_height: 100.0,
        },
        Frame {
            contour: Vec::new(),
            palm_center: Pixel::new(128, 128),
            palm_height: 100.0,
        },
        Frame {
            contour: open_hand_contour(&model),
            palm_center: Pixel::new(128, 128),
            palm_height: 0.0,
        },
    ];

    let results = observe_batch(&frames, &config, &BayesianAssigner::from_config(&config));
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().is_complete());
    assert!(matches!(results[1], Err(Error::InvalidInput(_))));
    assert!(matches!(results[2], Err(Error::InvalidInput(_))));
}

#[test]
fn layout_serializes_for_renderers() {
    let layout = palmar(100.0).layout().unwrap();
    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["top_left"], serde_json::json!([83, 78]));
    assert_eq!(json["fingers"]["middle"]["tip"], serde_json::json!([128, -10]));
    assert_eq!(
        json["fingers"]["middle"]["bounding_box"]
            .as_array()
            .map(|a| a.len()),
        Some(4)
    );

    let map: BTreeMap<String, serde_json::Value> =
        serde_json::from_value(json["fingers"].clone()).unwrap();
    assert_eq!(map.len(), 5);
}
