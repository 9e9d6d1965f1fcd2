//! Benchmark tests for kino-tracker operations
//!
//! Run with: cargo bench -p kino-tracker

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::rc::Rc;

use kino_tracker::{
    ChannelReporter, Metadata, MetadataValue, PlayerError, PlayerEvent, SimulatedPlayer,
    TrackingController,
};

// ============================================================================
// Helpers
// ============================================================================

fn bound_controller() -> (TrackingController, Rc<SimulatedPlayer>) {
    let (reporter, rx) = ChannelReporter::new();
    // Records are discarded
    drop(rx);
    let controller = TrackingController::new(Rc::new(reporter));
    let player = Rc::new(SimulatedPlayer::new());
    player.set_duration(Some(3600.0));
    player.set_video_size(1920, 1080);
    controller
        .track_player(player.clone(), Metadata::new(), true)
        .unwrap();
    (controller, player)
}

fn custom_metadata(fields: usize) -> Metadata {
    (0..fields)
        .map(|i| (format!("custom_{}", i), MetadataValue::Int(i as i64)))
        .collect()
}

// ============================================================================
// Event Dispatch Benchmarks
// ============================================================================

fn bench_event_dispatch(c: &mut Criterion) {
    let (_controller, player) = bound_controller();
    let mut group = c.benchmark_group("Event Dispatch");

    group.bench_function("time_update", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t = (t + 0.25) % 3600.0;
            black_box(player.emit(PlayerEvent::TimeUpdate { current_time: t }))
        });
    });

    group.bench_function("time_update_suppressed", |b| {
        b.iter(|| black_box(player.emit(PlayerEvent::TimeUpdate { current_time: 0.0 })));
    });

    group.bench_function("playing", |b| {
        b.iter(|| black_box(player.emit(PlayerEvent::Playing)));
    });

    group.bench_function("error", |b| {
        b.iter(|| {
            black_box(player.emit(PlayerEvent::Error {
                error: Some(PlayerError::new(3001, "network")),
            }))
        });
    });

    group.finish();
}

// ============================================================================
// Lifecycle Benchmarks
// ============================================================================

fn bench_rebind(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rebind");

    for &fields in &[0, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("track_player", fields),
            &fields,
            |b, &fields| {
                let (controller, _) = bound_controller();
                let player = Rc::new(SimulatedPlayer::new());
                let metadata = custom_metadata(fields);
                b.iter(|| {
                    black_box(
                        controller
                            .track_player(player.clone(), metadata.clone(), false)
                            .unwrap(),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_state_queries(c: &mut Criterion) {
    let (controller, _player) = bound_controller();
    let mut group = c.benchmark_group("State Queries");

    group.bench_function("current_playback_state", |b| {
        b.iter(|| black_box(controller.current_playback_state()));
    });

    group.bench_function("fetch_player_current_time", |b| {
        b.iter(|| black_box(controller.fetch_player_current_time()));
    });

    group.finish();
}

criterion_group!(dispatch_benches, bench_event_dispatch);

criterion_group!(lifecycle_benches, bench_rebind, bench_state_queries);

criterion_main!(dispatch_benches, lifecycle_benches);
