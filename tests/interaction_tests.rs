use std::sync::mpsc::{self, Receiver};

use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use kurbo::Point;
use pane_chart::api::{
    AxisSpec, ChannelListener, ChartEngine, ChartEngineConfig, ChartEvent, HitTarget,
};
use pane_chart::core::{Interval, PaneId, Record, Viewport};
use pane_chart::elements::{CandleElement, LineElement};
use pane_chart::interaction::{WheelDeltaMode, WheelInput};
use pane_chart::pane::PaneSpec;
use pane_chart::render::{Color, LineStyle, RecordingContext};

const HOUR_MS: f64 = 3_600_000.0;

fn records(count: usize) -> Vec<Record> {
    let start = Utc
        .with_ymd_and_hms(2023, 6, 1, 0, 0, 0)
        .single()
        .expect("valid start");
    (0..count)
        .map(|i| {
            let open = 20.0 + (i as f64 / 9.0).cos() * 3.0;
            Record::candle(
                start + Duration::hours(i as i64),
                open,
                open + 0.8,
                open - 0.8,
                open + 0.2,
                500.0 + (i % 17) as f64,
            )
            .with_value("ma", open)
        })
        .collect()
}

/// Price pane over `[0, 432)`, indicator pane over `[432, 576)`, time axis
/// below, value axes right of `x = 736`.
fn engine() -> (ChartEngine<RecordingContext>, Receiver<ChartEvent>) {
    let config = ChartEngineConfig::new(Viewport::new(800, 600)).with_interval(Interval::H1);
    let mut engine = ChartEngine::new(RecordingContext::new(), config).expect("engine init");
    let (sender, receiver) = mpsc::channel();
    engine
        .register_listener(Box::new(ChannelListener::new("events", sender)))
        .expect("register listener");
    engine
        .update(
            vec![
                PaneSpec::new("price")
                    .with_element(CandleElement::default())
                    .with_data(records(300))
                    .with_stretch_factor(3.0),
                PaneSpec::new("ma")
                    .with_element(LineElement::new(
                        "ma",
                        LineStyle::solid(Color::from_rgb8(0x29, 0x62, 0xff), 1.5),
                    ))
                    .with_data(records(300)),
            ],
            AxisSpec::default(),
        )
        .expect("update");
    engine.redraw().expect("redraw");
    (engine, receiver)
}

fn price() -> PaneId {
    PaneId::new("price")
}

fn indicator() -> PaneId {
    PaneId::new("ma")
}

#[test]
fn hit_test_routes_plot_value_axis_and_time_axis() {
    let (engine, _events) = engine();
    assert_eq!(
        engine.hit_test(Point::new(100.0, 100.0)),
        Some(HitTarget::PlotArea(price()))
    );
    assert_eq!(
        engine.hit_test(Point::new(100.0, 500.0)),
        Some(HitTarget::PlotArea(indicator()))
    );
    assert_eq!(
        engine.hit_test(Point::new(760.0, 100.0)),
        Some(HitTarget::ValueAxis(price()))
    );
    assert_eq!(
        engine.hit_test(Point::new(760.0, 500.0)),
        Some(HitTarget::ValueAxis(indicator()))
    );
    assert_eq!(
        engine.hit_test(Point::new(100.0, 590.0)),
        Some(HitTarget::TimeAxis)
    );
    assert_eq!(engine.hit_test(Point::new(900.0, 100.0)), None);
}

#[test]
fn wheel_burst_is_one_gesture_until_settled() {
    let (mut engine, _events) = engine();
    let k_before = engine.time_transform().k();
    let at = Point::new(300.0, 200.0);

    engine.wheel(WheelInput::new(at, -100.0, WheelDeltaMode::Pixel), 0.0);
    engine.wheel(WheelInput::new(at, -100.0, WheelDeltaMode::Pixel), 50.0);
    assert!(engine.is_interacting());
    assert_relative_eq!(engine.time_transform().k(), k_before * 2f64.powf(0.4), epsilon = 1e-9);

    engine.tick(150.0).expect("tick");
    assert!(engine.is_interacting());
    engine.tick(201.0).expect("tick");
    assert!(!engine.is_interacting());
    assert!(engine.is_pinned());
}

#[test]
fn wheel_over_value_axis_only_moves_that_pane() {
    let (mut engine, _events) = engine();
    let time_before = engine.time_transform();
    let indicator_before = engine.pane(&indicator()).expect("ma").value_domain();

    engine.wheel(
        WheelInput::new(Point::new(760.0, 200.0), 100.0, WheelDeltaMode::Pixel),
        0.0,
    );
    engine.tick(500.0).expect("tick");
    engine.redraw().expect("redraw");

    assert_eq!(engine.time_transform(), time_before);
    assert_eq!(engine.pane(&price()).map(|pane| pane.is_free_pan()), Some(true));
    let indicator_after = engine.pane(&indicator()).expect("ma").value_domain();
    assert_relative_eq!(indicator_after.0, indicator_before.0, epsilon = 1e-9);
    assert_relative_eq!(indicator_after.1, indicator_before.1, epsilon = 1e-9);
}

#[test]
fn slow_drag_pans_time_and_unpins_without_inertia() {
    let (mut engine, _events) = engine();
    let x_before = engine.time_transform().x();

    engine.pointer_down(Point::new(300.0, 200.0), 0.0);
    engine.pointer_move(Point::new(360.0, 210.0), 16.0);
    engine.pointer_up(600.0);

    assert!(!engine.is_pinned());
    assert!(!engine.is_interacting());
    assert_relative_eq!(engine.time_transform().x(), x_before + 60.0, epsilon = 1e-9);
    assert_relative_eq!(engine.time_transform().y(), 0.0);
}

#[test]
fn vertical_drag_on_plot_keeps_time_pinned() {
    let (mut engine, _events) = engine();
    let before = engine.time_transform();

    engine.pointer_down(Point::new(300.0, 100.0), 0.0);
    engine.pointer_move(Point::new(300.0, 140.0), 16.0);
    engine.pointer_up(600.0);
    assert_eq!(engine.time_transform(), before);
    assert!(engine.is_pinned());

    engine.pointer_down(Point::new(300.0, 100.0), 1_000.0);
    engine.pointer_move(Point::new(300.0, 160.0), 1_016.0);
    engine.pointer_move(Point::new(300.0, 220.0), 1_032.0);
    engine.pointer_up(1_040.0);
    engine.tick(2_500.0).expect("tick");
    assert!(!engine.is_interacting());
    assert_eq!(engine.time_transform(), before);
    assert!(engine.is_pinned());
}

#[test]
fn double_click_on_time_axis_zooms_time_about_the_click() {
    let (mut engine, receiver) = engine();
    engine.pan_by(-20.0);
    assert!(!engine.is_pinned());
    let k_before = engine.time_transform().k();
    let anchor_ms = engine.time_scale().invert_millis(300.0);
    receiver.try_iter().for_each(drop);

    engine.double_click(Point::new(300.0, 590.0));
    assert_relative_eq!(engine.time_transform().k(), k_before * 2.0, epsilon = 1e-9);
    assert_relative_eq!(
        engine.time_scale().invert_millis(300.0),
        anchor_ms,
        max_relative = 1e-9
    );
    assert!(!engine.is_interacting());
    assert!(engine.needs_redraw());
    assert!(receiver
        .try_iter()
        .any(|event| matches!(event, ChartEvent::DblClick { pane: None, .. })));
}

#[test]
fn fast_drag_release_hands_over_to_inertia() {
    let (mut engine, receiver) = engine();
    engine.pointer_down(Point::new(300.0, 200.0), 0.0);
    engine.pointer_move(Point::new(340.0, 200.0), 16.0);
    engine.pointer_move(Point::new(380.0, 200.0), 32.0);
    engine.pointer_up(40.0);
    assert!(engine.is_interacting());

    let released_x = engine.time_transform().x();
    engine.tick(640.0).expect("tick");
    let mid_x = engine.time_transform().x();
    assert!(mid_x > released_x);
    assert!(engine.is_interacting());

    engine.tick(1_240.0).expect("tick");
    assert!(!engine.is_interacting());
    assert!(engine.time_transform().x() > mid_x);
    assert!(!engine.is_pinned());

    receiver.try_iter().for_each(drop);
    assert!(engine.frame(1_250.0).expect("frame"));
    assert!(receiver
        .try_iter()
        .any(|event| matches!(event, ChartEvent::ViewportChanged { is_pinned: false, .. })));
}

#[test]
fn new_pointer_down_stops_inertia() {
    let (mut engine, _events) = engine();
    engine.pointer_down(Point::new(300.0, 200.0), 0.0);
    engine.pointer_move(Point::new(380.0, 200.0), 16.0);
    engine.pointer_up(20.0);
    assert!(engine.is_interacting());

    engine.pointer_down(Point::new(300.0, 200.0), 100.0);
    let held = engine.time_transform();
    engine.tick(400.0).expect("tick");
    assert_eq!(engine.time_transform(), held);
    engine.pointer_up(900.0);
    assert!(!engine.is_interacting());
}

#[test]
fn pinch_zooms_time_about_the_fingers() {
    let (mut engine, _events) = engine();
    let k_before = engine.time_transform().k();

    engine.touch_start(&[Point::new(300.0, 200.0), Point::new(400.0, 200.0)], 0.0);
    assert!(engine.is_interacting());
    engine.touch_move(&[Point::new(250.0, 200.0), Point::new(450.0, 200.0)], 16.0);
    assert_relative_eq!(engine.time_transform().k(), k_before * 2.0, epsilon = 1e-9);
    assert!(engine.is_pinned());

    engine.touch_end(&[], 32.0);
    assert!(!engine.is_interacting());
}

#[test]
fn single_finger_drag_unpins() {
    let (mut engine, _events) = engine();
    engine.touch_start(&[Point::new(300.0, 200.0)], 0.0);
    engine.touch_move(&[Point::new(250.0, 200.0)], 200.0);
    engine.touch_end(&[], 800.0);
    assert!(!engine.is_pinned());
    assert!(!engine.is_interacting());
}

#[test]
fn touches_outside_the_time_surface_are_ignored() {
    let (mut engine, _events) = engine();
    let before = engine.time_transform();
    engine.touch_start(&[Point::new(760.0, 200.0)], 0.0);
    engine.touch_move(&[Point::new(700.0, 250.0)], 16.0);
    engine.touch_end(&[], 32.0);
    assert_eq!(engine.time_transform(), before);
    assert!(engine.is_pinned());
}

#[test]
fn crosshair_broadcasts_time_and_keeps_value_to_hovered_pane() {
    let (mut engine, receiver) = engine();
    engine.pointer_move(Point::new(400.0, 150.0), 0.0);

    let state = engine.crosshair().clone();
    assert!(state.visible);
    assert_eq!(state.pane, Some(price()));
    let index = state.index.expect("resolved index");
    let record_time = engine.pane(&price()).expect("price").data()[index].time_millis();
    assert_eq!(state.time_ms, Some(record_time));
    assert_relative_eq!(
        state.x,
        engine.time_scale().map_millis(record_time),
        epsilon = 1e-9
    );

    let hovered = engine.pane(&price()).expect("price").crosshair();
    let other = engine.pane(&indicator()).expect("ma").crosshair();
    assert_eq!(hovered.time_ms, Some(record_time));
    assert!(hovered.value.is_some());
    assert_eq!(other.time_ms, Some(record_time));
    assert_eq!(other.value, None);

    let moved = receiver
        .try_iter()
        .find(|event| matches!(event, ChartEvent::MouseMove { .. }));
    assert!(matches!(
        moved,
        Some(ChartEvent::MouseMove { pane, index: Some(i), .. }) if pane == price() && i == index
    ));

    engine.pointer_move(Point::new(400.0, 590.0), 10.0);
    assert!(!engine.crosshair().visible);
    assert!(receiver
        .try_iter()
        .any(|event| matches!(event, ChartEvent::MouseOut)));
}

#[test]
fn context_menu_reports_the_pane_under_the_pointer() {
    let (mut engine, receiver) = engine();
    engine.context_menu(Point::new(100.0, 500.0));
    engine.context_menu(Point::new(100.0, 590.0));
    let menus: Vec<ChartEvent> = receiver
        .try_iter()
        .filter(|event| matches!(event, ChartEvent::ContextMenu { .. }))
        .collect();
    assert_eq!(menus.len(), 2);
    assert!(matches!(&menus[0], ChartEvent::ContextMenu { pane: Some(id), .. } if *id == indicator()));
    assert!(matches!(&menus[1], ChartEvent::ContextMenu { pane: None, .. }));
}

#[test]
fn frame_only_paints_when_something_changed() {
    let (mut engine, _events) = engine();
    assert!(!engine.frame(0.0).expect("idle frame"));
    engine.pan_by(-3.0);
    assert!(engine.frame(16.0).expect("frame after pan"));
    assert!(!engine.frame(32.0).expect("idle frame"));
}

#[test]
fn pan_by_shifts_the_window_by_whole_intervals() {
    let (mut engine, _events) = engine();
    let (start, end) = engine.visible_time_window();
    engine.pan_by(-5.0);
    engine.redraw().expect("redraw");
    let (shifted_start, shifted_end) = engine.visible_time_window();
    assert_relative_eq!(shifted_start, start - 5.0 * HOUR_MS, epsilon = 1e-3);
    assert_relative_eq!(shifted_end, end - 5.0 * HOUR_MS, epsilon = 1e-3);
    assert!(!engine.is_pinned());

    engine.reset();
    engine.redraw().expect("redraw");
    assert!(engine.is_pinned());
    let (reset_start, reset_end) = engine.visible_time_window();
    assert_relative_eq!(reset_start, start, epsilon = 1e-3);
    assert_relative_eq!(reset_end, end, epsilon = 1e-3);
}

#[test]
fn zoom_is_clamped_and_keeps_latest_record_pinned() {
    let (mut engine, _events) = engine();
    engine.zoom_in(1.0);
    engine.redraw().expect("redraw");
    assert_relative_eq!(engine.time_transform().k(), 2.0, epsilon = 1e-9);
    let latest = records(300)[299].time_millis();
    let expected = engine.layout().plot_width - 4.0 * engine.interval_px();
    assert_relative_eq!(engine.time_scale().map_millis(latest), expected, epsilon = 1e-6);

    engine.zoom_out(20.0);
    assert_relative_eq!(engine.time_transform().k(), 0.05, epsilon = 1e-12);
    engine.zoom_in(20.0);
    assert_relative_eq!(engine.time_transform().k(), 20.0, epsilon = 1e-12);
    assert!(engine.is_pinned());
}
