use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use kurbo::{Point, Rect};
use pane_chart::core::{LinearScale, Record, nearest_index};
use pane_chart::interaction::{
    ScaleExtent, TranslateExtent, ZoomAxis, ZoomBehavior, ZoomTransform,
};
use proptest::prelude::*;

fn transform() -> impl Strategy<Value = ZoomTransform> {
    (-1_000.0f64..1_000.0, -1_000.0f64..1_000.0, 0.01f64..100.0)
        .prop_map(|(x, y, k)| ZoomTransform::new(x, y, k).expect("valid transform"))
}

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-9 * scale.max(1.0)
}

proptest! {
    #[test]
    fn invert_undoes_apply(t in transform(), px in -5_000.0f64..5_000.0, py in -5_000.0f64..5_000.0) {
        let back = t.invert(t.apply(Point::new(px, py)));
        prop_assert!(close(back.x, px, px.abs() * t.k().max(1.0 / t.k())));
        prop_assert!(close(back.y, py, py.abs() * t.k().max(1.0 / t.k())));
    }

    #[test]
    fn compose_applies_right_operand_first(a in transform(), b in transform(), px in -500.0f64..500.0) {
        let point = Point::new(px, -px);
        let composed = a.compose(b).apply(point);
        let nested = a.apply(b.apply(point));
        let magnitude = a.x().abs().max(a.y().abs())
            + a.k() * b.x().abs().max(b.y().abs())
            + a.k() * b.k() * px.abs();
        prop_assert!(close(composed.x, nested.x, magnitude));
        prop_assert!(close(composed.y, nested.y, magnitude));
    }

    #[test]
    fn compose_is_associative(a in transform(), b in transform(), c in transform()) {
        let left = a.compose(b).compose(c);
        let right = a.compose(b.compose(c));
        let magnitude = a.x().abs().max(a.y().abs())
            + a.k() * b.x().abs().max(b.y().abs())
            + a.k() * b.k() * c.x().abs().max(c.y().abs());
        prop_assert!(close(left.x(), right.x(), magnitude));
        prop_assert!(close(left.y(), right.y(), magnitude));
        prop_assert!(close(left.k(), right.k(), left.k()));
    }

    #[test]
    fn identity_rescale_keeps_domain(lo in -1_000.0f64..1_000.0, span in 0.5f64..1_000.0, width in 10.0f64..2_000.0) {
        let scale = LinearScale::new(lo, lo + span).expect("scale").with_range(0.0, width);
        let rescaled = ZoomTransform::IDENTITY.rescale_x(scale).expect("rescale");
        let (d0, d1) = rescaled.domain();
        prop_assert!(close(d0, lo, lo.abs() + span));
        prop_assert!(close(d1, lo + span, lo.abs() + span));
    }

    #[test]
    fn rescaled_domain_is_what_the_range_shows(t in transform(), width in 10.0f64..2_000.0) {
        let scale = LinearScale::new(0.0, 100.0).expect("scale").with_range(0.0, width);
        let rescaled = t.rescale_x(scale).expect("rescale");
        let (d0, d1) = rescaled.domain();
        let magnitude = d0.abs().max(d1.abs());
        for pixel in [0.0, width / 3.0, width] {
            let expected = scale.invert(t.invert_x(pixel));
            prop_assert!(close(rescaled.invert(pixel), expected, magnitude));
        }
    }

    #[test]
    fn scale_stays_within_extent(factors in proptest::collection::vec(0.01f64..100.0, 1..20)) {
        let extent = ScaleExtent::new(0.05, 20.0).expect("extent");
        let mut zoom = ZoomBehavior::new(Rect::new(0.0, 0.0, 800.0, 600.0), ZoomAxis::X)
            .with_scale_extent(extent);
        for factor in factors {
            zoom.scale_by(factor, Some(Point::new(400.0, 0.0)));
            prop_assert!(extent.contains(zoom.transform().k()));
        }
    }

    #[test]
    fn viewport_stays_inside_translate_extent(pans in proptest::collection::vec(-2_000.0f64..2_000.0, 1..20)) {
        let viewport = Rect::new(0.0, 0.0, 400.0, 300.0);
        let mut zoom = ZoomBehavior::new(viewport, ZoomAxis::Both)
            .with_scale_extent(ScaleExtent::new(1.0, 8.0).expect("extent"))
            .with_translate_extent(TranslateExtent::new(0.0, 0.0, 400.0, 300.0).expect("extent"));
        zoom.scale_by(2.0, None);
        for dx in pans {
            let t = zoom.pan_pixels(dx, -dx / 2.0);
            prop_assert!(t.invert_x(viewport.x0) >= -1e-9);
            prop_assert!(t.invert_x(viewport.x1) <= 400.0 + 1e-9);
            prop_assert!(t.invert_y(viewport.y0) >= -1e-9);
            prop_assert!(t.invert_y(viewport.y1) <= 300.0 + 1e-9);
        }
    }

    #[test]
    fn scaling_about_anchor_keeps_the_anchor_fixed(
        t in transform(),
        factor in 0.1f64..10.0,
        ax in 0.0f64..800.0,
    ) {
        let zoom = ZoomBehavior::new(Rect::new(0.0, 0.0, 800.0, 600.0), ZoomAxis::X);
        let anchor = Point::new(ax, 0.0);
        let scaled = zoom.scaled_about(t, factor, anchor);
        let world_before = t.invert_x(ax);
        let world_after = scaled.invert_x(ax);
        prop_assert!(close(world_before, world_after, world_before.abs().max(1.0 / t.k())));
    }

    #[test]
    fn nearest_index_minimizes_time_distance(
        mut offsets in proptest::collection::vec(0i64..1_000_000, 1..60),
        query in -100_000.0f64..1_100_000.0,
    ) {
        offsets.sort_unstable();
        offsets.dedup();
        let records: Vec<Record> = offsets
            .iter()
            .map(|seconds| Record::new(Utc.timestamp_opt(*seconds, 0).single().expect("time")))
            .collect();
        let query_ms = query * 1_000.0;
        let index = nearest_index(&records, query_ms).expect("non-empty data");
        let best = (query_ms - records[index].time_millis()).abs();
        for record in &records {
            prop_assert!(best <= (query_ms - record.time_millis()).abs());
        }
    }
}

#[test]
fn transform_serializes_as_xyk_triple() {
    let transform = ZoomTransform::new(12.5, -3.0, 2.0).expect("transform");
    let json = serde_json::to_string(&transform).expect("serialize");
    assert_eq!(json, "[12.5,-3.0,2.0]");
    let parsed: ZoomTransform = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, transform);
    assert!(serde_json::from_str::<ZoomTransform>("[0.0,0.0,0.0]").is_err());
}

#[test]
fn nearest_index_handles_edges() {
    let records: Vec<Record> = [0i64, 60, 120]
        .iter()
        .map(|seconds| Record::new(Utc.timestamp_opt(*seconds, 0).single().expect("time")))
        .collect();
    assert_eq!(nearest_index(&records, -1e9), Some(0));
    assert_eq!(nearest_index(&records, 1e12), Some(2));
    assert_eq!(nearest_index(&records, 30_000.0), Some(0));
    assert_eq!(nearest_index(&records, 30_001.0), Some(1));
    assert_eq!(nearest_index(&[], 0.0), None);
    assert_relative_eq!(records[1].time_millis(), 60_000.0);
}
