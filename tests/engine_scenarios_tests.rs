use std::sync::mpsc::{self, Receiver};

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use kurbo::{Affine, Point, Rect, Shape};
use pane_chart::api::{
    AxisSpec, ChannelListener, ChartEngine, ChartEngineConfig, ChartEvent, EngineState,
};
use pane_chart::core::{Interval, PaneId, Record, Viewport};
use pane_chart::elements::{BarElement, CandleElement};
use pane_chart::interaction::{WheelDeltaMode, WheelInput};
use pane_chart::pane::PaneSpec;
use pane_chart::render::{Color, DrawCommand, RasterContext, RecordingContext};
use pane_chart::ChartError;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid start")
}

fn candle(index: usize) -> Record {
    let base = 100.0 + (index as f64 * 0.7).sin() * 5.0;
    Record::candle(
        start() + Duration::hours(index as i64),
        base,
        base + 2.0,
        base - 2.0,
        base + 0.5,
        1_000.0 + index as f64,
    )
}

fn candles(count: usize) -> Vec<Record> {
    (0..count).map(candle).collect()
}

fn panes(count: usize) -> Vec<PaneSpec> {
    vec![
        PaneSpec::new("price")
            .with_element(CandleElement::default())
            .with_data(candles(count))
            .with_stretch_factor(3.0),
        PaneSpec::new("volume")
            .with_element(BarElement::volume(
                Color::from_rgb8(0x26, 0xa6, 0x9a),
                Color::from_rgb8(0xef, 0x53, 0x50),
            ))
            .with_data(candles(count))
            .with_y_fields(["volume"]),
    ]
}

fn engine() -> ChartEngine<RecordingContext> {
    let config = ChartEngineConfig::new(Viewport::new(800, 600)).with_interval(Interval::H1);
    ChartEngine::new(RecordingContext::new(), config).expect("engine init")
}

fn listening_engine() -> (ChartEngine<RecordingContext>, Receiver<ChartEvent>) {
    let mut engine = engine();
    let (sender, receiver) = mpsc::channel();
    engine
        .register_listener(Box::new(ChannelListener::new("host", sender)))
        .expect("register listener");
    (engine, receiver)
}

fn fetches(receiver: &Receiver<ChartEvent>) -> Vec<ChartEvent> {
    receiver
        .try_iter()
        .filter(|event| matches!(event, ChartEvent::FetchData(_)))
        .collect()
}

/// Drags the price pane's value axis, which puts that pane in free-pan.
fn drag_price_value_axis(engine: &mut ChartEngine<RecordingContext>) {
    engine.pointer_down(Point::new(760.0, 200.0), 0.0);
    engine.pointer_move(Point::new(760.0, 260.0), 16.0);
    engine.pointer_up(500.0);
}

#[test]
fn first_update_pins_latest_record_at_right_offset() {
    let mut engine = engine();
    engine.update(panes(200), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");

    assert!(engine.is_pinned());
    assert_eq!(engine.pane_count(), 2);
    let latest = candle(199).time_millis();
    let expected = engine.layout().plot_width - 4.0 * engine.interval_px();
    assert_relative_eq!(
        engine.time_scale().map_millis(latest),
        expected,
        epsilon = 1e-6
    );
}

#[test]
fn pinned_append_keeps_newest_record_at_fixed_offset() {
    let mut engine = engine();
    engine.update(panes(200), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");

    let next = candle(200);
    engine
        .append_record(&PaneId::new("price"), next.clone())
        .expect("append");
    assert!(engine.needs_redraw());
    engine.redraw().expect("redraw");

    let expected = engine.layout().plot_width - 4.0 * engine.interval_px();
    assert_relative_eq!(
        engine.time_scale().map_millis(next.time_millis()),
        expected,
        epsilon = 1e-6
    );
    assert_eq!(engine.pane(&PaneId::new("price")).map(|pane| pane.data().len()), Some(201));
}

#[test]
fn append_rejects_unknown_pane_and_older_records() {
    let mut engine = engine();
    engine.update(panes(10), AxisSpec::default()).expect("update");

    let err = engine
        .append_record(&PaneId::new("missing"), candle(10))
        .expect_err("unknown pane");
    assert!(matches!(err, ChartError::UnknownPane(id) if id == "missing"));

    let err = engine
        .append_record(&PaneId::new("price"), candle(3))
        .expect_err("older record");
    assert!(matches!(err, ChartError::InvalidData(_)));
}

#[test]
fn time_zoom_leaves_free_pan_pane_untouched_and_refits_the_rest() {
    let mut engine = engine();
    engine.update(panes(200), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");

    drag_price_value_axis(&mut engine);
    let price = PaneId::new("price");
    let volume = PaneId::new("volume");
    assert_eq!(engine.pane(&price).map(|pane| pane.is_free_pan()), Some(true));
    assert_eq!(engine.pane(&volume).map(|pane| pane.is_free_pan()), Some(false));

    let price_before = engine.pane(&price).expect("price").value_domain();
    let volume_before = engine.pane(&volume).expect("volume").value_domain();

    engine.zoom_out(1.0);
    engine.redraw().expect("redraw");

    let price_after = engine.pane(&price).expect("price").value_domain();
    let volume_after = engine.pane(&volume).expect("volume").value_domain();
    assert_relative_eq!(price_after.0, price_before.0, epsilon = 1e-9);
    assert_relative_eq!(price_after.1, price_before.1, epsilon = 1e-9);
    assert!(volume_after.0 < volume_before.0);

    let window = engine.visible_time_window();
    let fitted = engine
        .pane(&volume)
        .and_then(|pane| pane.auto_fit_domain(window))
        .expect("volume fit");
    assert_relative_eq!(volume_after.0, fitted.0, epsilon = 1e-6);
    assert_relative_eq!(volume_after.1, fitted.1, epsilon = 1e-6);
}

#[test]
fn double_click_on_value_axis_leaves_free_pan_and_refits() {
    let (mut engine, receiver) = listening_engine();
    engine.update(panes(200), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");
    drag_price_value_axis(&mut engine);

    let price = PaneId::new("price");
    engine.double_click(Point::new(760.0, 200.0));

    let pane = engine.pane(&price).expect("price");
    assert!(!pane.is_free_pan());
    let fitted = pane
        .auto_fit_domain(engine.visible_time_window())
        .expect("price fit");
    let domain = pane.value_domain();
    assert_relative_eq!(domain.0, fitted.0, epsilon = 1e-6);
    assert_relative_eq!(domain.1, fitted.1, epsilon = 1e-6);

    let clicked = receiver
        .try_iter()
        .find(|event| matches!(event, ChartEvent::DblClick { .. }));
    assert!(matches!(
        clicked,
        Some(ChartEvent::DblClick { pane: Some(id), .. }) if id == price
    ));
}

#[test]
fn free_panned_marks_stay_inside_their_pane() {
    let mut engine = engine();
    engine.update(panes(200), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");

    engine.pointer_down(Point::new(760.0, 200.0), 0.0);
    engine.pointer_move(Point::new(760.0, 500.0), 16.0);
    engine.pointer_up(500.0);
    let price = PaneId::new("price");
    assert!(engine.pane(&price).expect("price pane").is_free_pan());
    engine.redraw().expect("redraw");

    let bounds = engine.pane(&price).expect("price pane").bounds();
    let price_rect = Rect::new(bounds.x, bounds.y, bounds.right(), bounds.bottom());
    let mut transform = Affine::IDENTITY;
    let mut clips = Vec::new();
    let mut price_marks = 0;
    for command in engine.context().last_frame() {
        match command {
            DrawCommand::SetTransform(next) => transform = *next,
            DrawCommand::PushClip(clip) => clips.push(*clip),
            DrawCommand::PopClip => {
                clips.pop();
            }
            DrawCommand::Fill { path, .. } | DrawCommand::Stroke { path, .. }
                if clips.last() == Some(&price_rect) =>
            {
                let painted = transform.transform_rect_bbox(path.bounding_box());
                assert!(
                    painted.y0 <= price_rect.y1 && painted.x0 <= price_rect.x1,
                    "mark at {painted:?} lies outside the price pane"
                );
                price_marks += 1;
            }
            _ => {}
        }
    }
    assert!(price_marks > 0);
    assert!(clips.is_empty());
}

#[test]
fn update_keeps_view_state_of_surviving_panes() {
    let mut engine = engine();
    engine.update(panes(120), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");
    drag_price_value_axis(&mut engine);

    let price = PaneId::new("price");
    let transform = engine.pane(&price).expect("price").value_transform();
    engine
        .update(
            vec![
                PaneSpec::new("price")
                    .with_element(CandleElement::default())
                    .with_data(candles(130)),
            ],
            AxisSpec::default(),
        )
        .expect("second update");

    assert_eq!(engine.pane_count(), 1);
    assert!(engine.pane(&PaneId::new("volume")).is_none());
    let pane = engine.pane(&price).expect("price");
    assert!(pane.is_free_pan());
    assert_eq!(pane.value_transform(), transform);
    assert_eq!(pane.data().len(), 130);
}

#[test]
fn update_rejects_duplicate_pane_ids() {
    let mut engine = engine();
    let err = engine
        .update(
            vec![PaneSpec::new("price"), PaneSpec::new("price")],
            AxisSpec::default(),
        )
        .expect_err("duplicate ids");
    assert!(matches!(err, ChartError::InvalidData(_)));
}

#[test]
fn add_and_remove_pane_relayout_the_stack() {
    let mut engine = engine();
    engine.update(panes(50), AxisSpec::default()).expect("update");
    engine
        .add_pane(PaneSpec::new("rsi").with_data(candles(50)).with_y_fields(["close"]))
        .expect("add pane");
    assert_eq!(engine.pane_count(), 3);
    assert!(engine.add_pane(PaneSpec::new("rsi")).is_err());

    let bottom = engine.pane(&PaneId::new("rsi")).expect("rsi").bounds();
    assert_relative_eq!(bottom.bottom(), engine.layout().time_axis.y, epsilon = 1e-9);

    assert!(engine.remove_pane(&PaneId::new("rsi")));
    assert!(!engine.remove_pane(&PaneId::new("rsi")));
    assert_eq!(engine.pane_count(), 2);
    let volume = engine.pane(&PaneId::new("volume")).expect("volume").bounds();
    assert_relative_eq!(volume.bottom(), engine.layout().time_axis.y, epsilon = 1e-9);
}

#[test]
fn fetch_fires_once_per_settled_view() {
    let (mut engine, receiver) = listening_engine();
    engine.update(panes(50), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");

    let fired = fetches(&receiver);
    assert_eq!(fired.len(), 1);
    let Some(ChartEvent::FetchData(request)) = fired.first() else {
        panic!("expected a fetch request");
    };
    let earliest = candle(0).time_millis();
    let (start_ms, end_ms) = engine.visible_time_window();
    assert_eq!(request.interval, Interval::H1);
    assert_relative_eq!(request.to_ms, earliest);
    assert_relative_eq!(request.from_ms, earliest - (end_ms - start_ms), epsilon = 1e-3);
    assert!(start_ms < earliest + (end_ms - start_ms));

    engine.redraw().expect("redraw");
    assert!(fetches(&receiver).is_empty());

    engine.pan_by(-10.0);
    assert!(!engine.is_pinned());
    engine.redraw().expect("redraw");
    assert_eq!(fetches(&receiver).len(), 1);
}

#[test]
fn no_fetch_while_far_from_loaded_history() {
    let (mut engine, receiver) = listening_engine();
    engine.update(panes(400), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");
    assert!(engine.pending_fetch().is_none());
    assert!(fetches(&receiver).is_empty());
}

#[test]
fn axis_data_alone_defines_the_time_axis() {
    let mut engine = engine();
    engine
        .update(Vec::new(), AxisSpec::new(candles(30)))
        .expect("update");
    engine.redraw().expect("redraw");
    assert!(engine.is_pinned());

    engine.append_axis_record(candle(30)).expect("append axis");
    engine.redraw().expect("redraw");
    let expected = engine.layout().plot_width - 4.0 * engine.interval_px();
    assert_relative_eq!(
        engine.time_scale().map_millis(candle(30).time_millis()),
        expected,
        epsilon = 1e-6
    );
}

#[test]
fn redraw_reports_viewport_changes_only_when_window_moves() {
    let (mut engine, receiver) = listening_engine();
    engine.update(panes(400), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");
    engine.redraw().expect("redraw");

    let events: Vec<ChartEvent> = receiver.try_iter().collect();
    let redraws = events
        .iter()
        .filter(|event| matches!(event, ChartEvent::Redraw))
        .count();
    let changes = events
        .iter()
        .filter(|event| matches!(event, ChartEvent::ViewportChanged { .. }))
        .count();
    assert_eq!(redraws, 2);
    assert_eq!(changes, 1);
}

#[test]
fn listener_ids_must_be_unique_and_non_empty() {
    let mut engine = engine();
    let (sender, _receiver) = mpsc::channel();
    engine
        .register_listener(Box::new(ChannelListener::new("a", sender.clone())))
        .expect("first listener");
    assert!(engine
        .register_listener(Box::new(ChannelListener::new("a", sender.clone())))
        .is_err());
    assert!(engine
        .register_listener(Box::new(ChannelListener::new("", sender)))
        .is_err());
    assert_eq!(engine.listener_count(), 1);
    assert!(engine.unregister_listener("a"));
    assert!(!engine.unregister_listener("a"));
}

#[test]
fn resize_applies_leading_call_and_folds_the_rest() {
    let (mut engine, receiver) = listening_engine();
    engine
        .resize(Viewport::new(1000, 600), 1.0, 0.0)
        .expect("first resize");
    assert_eq!(engine.viewport(), Viewport::new(1000, 600));

    engine
        .resize(Viewport::new(1100, 600), 1.0, 30.0)
        .expect("second resize");
    engine
        .resize(Viewport::new(1200, 700), 2.0, 60.0)
        .expect("third resize");
    assert_eq!(engine.viewport(), Viewport::new(1000, 600));

    engine.tick(150.0).expect("tick");
    assert_eq!(engine.viewport(), Viewport::new(1200, 700));
    assert_relative_eq!(engine.pixel_ratio(), 2.0);
    assert_eq!(engine.context().size(), (2400, 1400));

    let bounds: Vec<ChartEvent> = receiver
        .try_iter()
        .filter(|event| matches!(event, ChartEvent::BoundsChanged { .. }))
        .collect();
    assert_eq!(bounds.len(), 2);

    assert!(engine.resize(Viewport::new(0, 600), 1.0, 1_000.0).is_err());
}

#[test]
fn dispose_stops_everything_and_releases_the_surface() {
    let mut engine = engine();
    engine.update(panes(50), AxisSpec::default()).expect("update");
    engine.wheel(
        WheelInput::new(Point::new(300.0, 200.0), -100.0, WheelDeltaMode::Pixel),
        0.0,
    );
    assert!(engine.is_interacting());

    engine.dispose();
    assert!(engine.is_disposed());
    assert!(!engine.is_interacting());
    assert!(engine.context().is_released());
    assert!(engine.panes().all(|pane| pane.is_disposed()));

    let recorded = engine.context().commands().len();
    engine.redraw().expect("redraw after dispose");
    assert!(!engine.frame(1_000.0).expect("frame after dispose"));
    engine.append_record(&PaneId::new("price"), candle(50)).expect("ignored append");
    assert_eq!(engine.context().commands().len(), recorded);
    engine.dispose();
}

#[test]
fn state_serializes_view_and_panes() {
    let mut engine = engine();
    engine.update(panes(50), AxisSpec::default()).expect("update");
    engine.redraw().expect("redraw");

    let json = engine.state_json().expect("state json");
    let state: EngineState = serde_json::from_str(&json).expect("parse state");
    assert!(state.is_pinned);
    assert_eq!(state.interval, Interval::H1);
    assert_eq!(state.panes.len(), 2);
    assert_eq!(state.panes[0].id, PaneId::new("price"));
    assert_eq!(state.panes[1].records, 50);
    assert!(!state.crosshair.visible);
    assert!(engine.state_json_pretty().expect("pretty").contains('\n'));
}

#[test]
fn snapshot_reports_surfaces_without_pixels() {
    let mut engine = engine();
    engine.update(panes(20), AxisSpec::default()).expect("update");
    let err = engine.snapshot().expect_err("recording surface");
    assert!(matches!(err, ChartError::Backend(_)));
    assert!(!engine.needs_redraw());
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = ChartEngineConfig::new(Viewport::new(800, 600)).with_time_scale_extent(2.0, 1.0);
    assert!(ChartEngine::new(RecordingContext::new(), config).is_err());

    let config = ChartEngineConfig::new(Viewport::new(800, 600)).with_axis_strips(700.0, 64.0);
    assert!(ChartEngine::new(RecordingContext::new(), config).is_err());

    let config = ChartEngineConfig::new(Viewport::new(0, 600));
    assert!(matches!(
        ChartEngine::new(RecordingContext::new(), config),
        Err(ChartError::InvalidViewport { width: 0, height: 600 })
    ));
}
