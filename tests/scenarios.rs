// End-to-end behaviour of a zone: worker, trigger, reset and stroke sampling.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use scratch_zone::types::alpha_of;
use scratch_zone::{
    BrushOperation, EligibilityPolicy, FrameBuffer, PointerId, ResetMode, ScreenRect, Zone, ZoneConfig, ZoneId,
};
use test_log::test;

const MOUSE: PointerId = PointerId(0);

fn opaque_zone(w: usize, h: usize, cfg: ZoneConfig) -> Zone {
    Zone::try_activate(ZoneId(1), FrameBuffer::filled(w, h, 0xFF_80_60_40), &cfg).unwrap()
}

fn eraser(trigger: f32, reset_mode: ResetMode) -> ZoneConfig {
    ZoneConfig {
        brush_radius: 2,
        policy: EligibilityPolicy::EraseWhereOpaque,
        alpha_threshold: 0.5,
        trigger_threshold: trigger,
        reset_mode,
        ..ZoneConfig::default()
    }
}

fn dot(x: i32, y: i32) -> BrushOperation {
    BrushOperation { x, y, radius: 0 }
}

fn counting(zone: &mut Zone) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    zone.on_threshold(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    hits
}

#[test]
fn unit_brush_at_corner_covers_three_texels() {
    let mut zone = opaque_zone(4, 4, eraser(0.9, ResetMode::Fast));
    assert_eq!(zone.eligible_total(), 16);

    assert!(zone.enqueue(BrushOperation { x: 0, y: 0, radius: 1 }));
    zone.wait_idle();

    assert_eq!(zone.covered_count(), 3);
    let snap = zone.snapshot().unwrap();
    for idx in [0, 1, 4] {
        assert_eq!(alpha_of(snap.pixels[idx]), 0, "texel {idx}");
    }
    assert_eq!(alpha_of(snap.pixels[5]), 0xFF);
}

#[test]
fn trigger_fires_exactly_at_ninety_of_hundred() {
    let mut zone = opaque_zone(10, 10, eraser(0.9, ResetMode::Fast));
    assert_eq!(zone.eligible_total(), 100);
    let hits = counting(&mut zone);
    let mut surface = FrameBuffer::filled(0, 0, 0);

    for i in 0..89 {
        zone.enqueue(dot(i % 10, i / 10));
    }
    zone.wait_idle();
    zone.frame(&mut surface).unwrap();
    assert_eq!(zone.covered_count(), 89);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(!zone.has_fired());

    zone.enqueue(dot(9, 8));
    zone.wait_idle();
    zone.frame(&mut surface).unwrap();
    assert_eq!(zone.covered_count(), 90);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // still above threshold: no refire
    zone.enqueue(dot(0, 9));
    zone.wait_idle();
    zone.frame(&mut surface).unwrap();
    zone.stroke_end(MOUSE);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn reset_discards_queued_operations() {
    let mut zone = opaque_zone(64, 64, eraser(1.0, ResetMode::Fast));
    for i in 0..2_000 {
        zone.enqueue(BrushOperation { x: i % 64, y: (i / 64) % 64, radius: 4 });
    }
    zone.reset();
    zone.wait_idle();

    assert_eq!(zone.covered_count(), 0);
    assert_eq!(zone.flagged_count(), 0);
    assert_eq!(zone.coverage(), 0.0);

    // the round keeps working after the reset
    zone.enqueue(dot(10, 10));
    zone.wait_idle();
    assert_eq!(zone.covered_count(), 1);
}

#[test]
fn deactivate_with_a_full_queue_returns_promptly() {
    let mut zone = opaque_zone(512, 512, eraser(1.0, ResetMode::Fast));
    // each op rasterizes ~125k texels; draining them all would take far longer
    for i in 0..20_000 {
        zone.enqueue(BrushOperation { x: 256 + i % 8, y: 256, radius: 200 });
    }

    let start = Instant::now();
    zone.deactivate();
    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_secs(2), "deactivate took {elapsed:?}");
}

#[test]
fn quiescent_reset_leaves_no_stale_pixels() {
    let mut zone = opaque_zone(64, 64, eraser(1.0, ResetMode::Quiescent));
    let initial = zone.initial().cloned().unwrap();
    for i in 0..2_000 {
        zone.enqueue(BrushOperation { x: i % 64, y: (i * 3) % 64, radius: 4 });
    }
    zone.reset();
    assert_eq!(zone.snapshot().unwrap(), initial);
    zone.wait_idle();
    assert_eq!(zone.snapshot().unwrap(), initial);
    assert_eq!(zone.covered_count(), 0);
}

#[test]
fn fast_drag_is_filled_in() {
    let cfg = ZoneConfig { brush_radius: 32, ..eraser(0.9, ResetMode::Fast) };
    let mut zone = opaque_zone(400, 400, cfg);
    assert!(zone.stroke_begin(MOUSE, 100.0, 200.0));
    let queued = zone.stroke_move(MOUSE, 300.0, 200.0);
    assert!(queued >= 13, "only {queued} ops queued");
    zone.stroke_end(MOUSE);
    zone.wait_idle();

    let snap = zone.snapshot().unwrap();
    for x in 100..=300 {
        assert_eq!(alpha_of(snap.pixels[200 * 400 + x]), 0, "gap at x={x}");
    }
}

#[test]
fn stroke_follows_screen_rect() {
    let mut zone = opaque_zone(50, 50, eraser(0.9, ResetMode::Fast));
    zone.set_screen_rect(ScreenRect { x: 200.0, y: 100.0, width: 100.0, height: 100.0 });

    assert!(!zone.stroke_begin(MOUSE, 10.0, 10.0));
    assert!(zone.stroke_begin(MOUSE, 250.0, 150.0));
    zone.stroke_end(MOUSE);
    zone.wait_idle();

    let snap = zone.snapshot().unwrap();
    assert_eq!(alpha_of(snap.pixels[25 * 50 + 25]), 0);
    assert_eq!(alpha_of(snap.pixels[0]), 0xFF);
}

#[test]
fn paint_zone_counts_only_transparent_area() {
    // left half transparent, right half opaque
    let mut src = FrameBuffer::filled(8, 8, 0x00_00_00_00);
    for y in 0..8 {
        for x in 4..8 {
            src.pixels[y * 8 + x] = 0xFF_00_00_FF;
        }
    }
    let cfg = ZoneConfig { brush_radius: 20, brush_color: [0x11, 0x22, 0x33], ..ZoneConfig::default() };
    let mut zone = Zone::try_activate(ZoneId(5), src, &cfg).unwrap();
    let hits = counting(&mut zone);
    assert_eq!(zone.eligible_total(), 32);

    assert!(zone.stroke_begin(MOUSE, 3.0, 3.0));
    zone.wait_idle();
    zone.stroke_end(MOUSE);

    assert_eq!(zone.covered_count(), 32);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let snap = zone.snapshot().unwrap();
    assert_eq!(snap.pixels[0], 0xFF_11_22_33);
    assert_eq!(snap.pixels[7], 0xFF_00_00_FF);
}

#[test]
fn counters_never_exceed_eligible_while_worker_runs() {
    let mut zone = opaque_zone(48, 48, eraser(1.0, ResetMode::Fast));
    let eligible = zone.eligible_total();
    for round in 0..3 {
        for i in 0..500 {
            zone.enqueue(BrushOperation { x: (i * 7) % 48, y: (i * 11 + round) % 48, radius: 3 });
            assert!(zone.covered_count() <= eligible);
        }
        if round == 1 {
            zone.reset();
        }
    }
    zone.wait_idle();
    assert!(zone.covered_count() <= eligible);
    assert_eq!(zone.covered_count(), zone.flagged_count());
}
