//! Integration tests driving widgets through their pick tables.

use proptest::prelude::*;

use brace_widget::{DragOutcome, FramePick, FrameWidget, GaugePick, GaugeWidget, Widget};
use glam::DVec3;

fn gauge() -> GaugeWidget {
    GaugeWidget::new(DVec3::new(-5.0, 0.0, 0.0), DVec3::new(5.0, 0.0, 0.0), 0.5, 10.0).unwrap()
}

fn frame() -> FrameWidget {
    FrameWidget::rectangle(DVec3::new(1.0, 2.0, 3.0), DVec3::X, DVec3::NEG_Z, 6.0, 4.0, 10.0).unwrap()
}

fn points<W: Widget>(widget: &W) -> Vec<DVec3> {
    widget.graph().variables().filter_map(|(_, v)| v.point()).collect()
}

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_delta() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
}

fn arb_stretch() -> impl Strategy<Value = f64> {
    -1.5f64..20.0
}

// ---------------------------------------------------------------------------
// 1. Body drags shift every point by exactly delta and keep distances
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn body_drag_is_rigid((dx, dy, dz) in arb_delta()) {
        let delta = DVec3::new(dx, dy, dz);
        let mut g = gauge();
        let before = points(&g);
        g.drag(GaugePick::Shaft, delta).unwrap();
        let after = points(&g);

        for (b, a) in before.iter().zip(&after) {
            prop_assert_eq!(*a, *b + delta);
        }
        for i in 0..before.len() {
            for j in i + 1..before.len() {
                let d0 = before[i].distance(before[j]);
                let d1 = after[i].distance(after[j]);
                prop_assert!((d0 - d1).abs() < 1e-9);
            }
        }
        prop_assert!(g.is_consistent());
    }
}

// ---------------------------------------------------------------------------
// 2. Stretching the frame along its axes keeps it rectangular
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn corner_drag_keeps_rectangle(sx in arb_stretch(), sz in arb_stretch()) {
        let mut f = frame();
        let outcome = f.drag(FramePick::ResizeCorner, DVec3::new(sx, 0.0, -sz)).unwrap();

        prop_assert!(outcome.is_clean(), "{:?}", outcome);
        prop_assert!((f.width() - (6.0 + 2.0 * sx)).abs() < 1e-9);
        prop_assert!((f.height() - (4.0 + 2.0 * sz)).abs() < 1e-9);

        let [ul, ur, dr, dl] = f.corners();
        prop_assert!((ur - ul).dot(dl - ul).abs() < 1e-9);
        prop_assert!(((ul + dr) * 0.5 - f.center()).length() < 1e-9);
    }
}

// ---------------------------------------------------------------------------
// 3. Dragging a gauge end never pulls the slider off the shaft
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn end_drag_keeps_slider_on_shaft((dx, dy, dz) in arb_delta()) {
        let mut g = gauge();
        let delta = DVec3::new(dx, dy, dz);
        // Keep the ends apart.
        prop_assume!((g.left() + delta).distance(g.right()) > 1.0);
        g.drag(GaugePick::EndLeft, delta).unwrap();

        let (l, r, s) = (g.left(), g.right(), g.slider());
        prop_assert!((l.distance(s) + s.distance(r) - l.distance(r)).abs() < 1e-6);
        prop_assert!(g.ratio() > -1e-9 && g.ratio() < 1.0 + 1e-9);
        prop_assert!(g.is_consistent());
    }
}

/// Drive every (variable, scheme) plan of `widget` by a zero delta.
fn assert_zero_drags_are_clean<W: Widget>(mut widget: W) {
    let drivable: Vec<_> = widget
        .graph()
        .variables()
        .flat_map(|(id, v)| v.schemes().iter().map(move |s| (id, *s)))
        .collect();
    assert!(!drivable.is_empty());

    for (var, scheme) in drivable {
        let report = widget.graph_mut().set_delta_in(var, scheme, DVec3::ZERO).unwrap();
        assert!(report.is_clean(), "{} {var} {scheme}: {report:?}", widget.name());
        let eps = widget.graph().epsilon().value();
        assert!(widget.graph().max_residual() < eps, "{} {var} {scheme}", widget.name());
    }
}

#[test]
fn test_zero_delta_keeps_every_widget_consistent() {
    assert_zero_drags_are_clean(gauge());
    assert_zero_drags_are_clean(frame());
    assert_zero_drags_are_clean(
        FrameWidget::square(DVec3::new(-3.0, 0.5, 0.0), DVec3::Y, DVec3::X, 5.0, 10.0).unwrap(),
    );
}

#[test]
fn test_scale_drives_widget_epsilon() {
    let mut f = frame();
    assert!((f.graph().epsilon().value() - 1e-3).abs() < 1e-15);

    f.set_scale(1000.0).unwrap();
    let eps = f.graph().epsilon();
    // Coincidence is relative to the widget scale.
    assert!(eps.coincident(DVec3::ZERO, DVec3::new(0.05, 0.0, 0.0)));
    assert!(eps.coincident(DVec3::ZERO, DVec3::new(5e-4, 0.0, 0.0)));

    f.set_scale(1.0).unwrap();
    let eps = f.graph().epsilon();
    assert!(eps.coincident(DVec3::ZERO, DVec3::new(5e-5, 0.0, 0.0)));
    assert!(!eps.coincident(DVec3::ZERO, DVec3::new(5e-4, 0.0, 0.0)));

    assert!(f.set_scale(-1.0).is_err());
}

#[test]
fn test_translate_moves_whole_widget() {
    let mut g = gauge();
    g.translate(DVec3::new(0.0, 0.0, 7.0));
    assert_eq!(g.left(), DVec3::new(-5.0, 0.0, 7.0));
    assert_eq!(g.slider(), DVec3::new(0.0, 0.0, 7.0));
    assert!((g.length() - 10.0).abs() < 1e-12);
    assert!(g.is_consistent());
}

#[test]
fn test_every_pick_is_bound() {
    let g = gauge();
    assert_eq!(
        g.picks().picks().collect::<Vec<_>>(),
        vec![GaugePick::EndLeft, GaugePick::EndRight, GaugePick::Slider, GaugePick::Shaft]
    );
    let f = frame();
    assert_eq!(f.picks().len(), 4);
}

#[test]
fn test_resize_right_reports_single_propagation() {
    let mut f = frame();
    match f.drag(FramePick::ResizeRight, DVec3::new(2.0, 9.0, 9.0)).unwrap() {
        DragOutcome::Resolved(reports) => {
            assert_eq!(reports.len(), 1);
            let report = &reports[0];
            assert_eq!(report.source, f.vars().right);
            // Every plan step runs at most once.
            let plan = f.graph().plan(f.vars().right, report.scheme).unwrap();
            assert!(report.evaluated.len() <= plan.len());
            assert_eq!(report.evaluated.len(), plan.len());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!((f.width() - 10.0).abs() < 1e-9);
}
