//! # Scheduler Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Local dispatch, one handler | < 1µs per emit |
//! | Mixed-class enqueue + drain | < 2µs per message |
//! | Coalesced request storm | flat in storm size |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use devtools_catalog::{coalesced_topics, DevtoolsEvent, DevtoolsTopic};
use serde_json::json;
use shared_bus::{DrainMode, LocalMessageBus, MessageBus, PriorityAwareBus, SchedulerConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn counting_bus() -> (LocalMessageBus<DevtoolsEvent>, Arc<AtomicU64>) {
    let bus = LocalMessageBus::new();
    let delivered = Arc::new(AtomicU64::new(0));
    for topic in [
        DevtoolsTopic::TargetNavigated,
        DevtoolsTopic::GetLatestComponentExplorerView,
        DevtoolsTopic::ProfilerFrame,
    ] {
        let delivered = Arc::clone(&delivered);
        bus.subscribe(topic, move |_: &DevtoolsEvent| {
            delivered.fetch_add(1, Ordering::Relaxed);
        })
        .expect("fresh bus accepts handlers")
        .detach();
    }
    (bus, delivered)
}

fn mixed_event(index: u64) -> DevtoolsEvent {
    match index % 8 {
        0 => DevtoolsEvent::TargetNavigated(format!("/page/{index}")),
        1 | 2 => DevtoolsEvent::GetLatestComponentExplorerView(None),
        _ => DevtoolsEvent::ProfilerFrame(json!({ "frame": index })),
    }
}

fn bench_local_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("local-bus");
    let (bus, _delivered) = counting_bus();

    group.bench_function("emit_one_handler", |b| {
        b.iter(|| {
            bus.emit(black_box(DevtoolsEvent::ProfilerFrame(json!(1))))
                .expect("bus is open")
        })
    });
    group.finish();
}

fn bench_mixed_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority-bus");

    for size in [64u64, 512, 4096] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("enqueue_and_drain", size), &size, |b, &size| {
            let (inner, _delivered) = counting_bus();
            let bus = PriorityAwareBus::with_config(
                inner,
                SchedulerConfig::default().with_drain_mode(DrainMode::Deferred),
            );
            b.iter(|| {
                for index in 0..size {
                    bus.emit(mixed_event(index)).expect("bus is open");
                }
                black_box(bus.drain())
            })
        });
    }
    group.finish();
}

fn bench_coalesced_storm(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority-bus-coalescing");

    for size in [64u64, 4096] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("request_storm", size), &size, |b, &size| {
            let (inner, _delivered) = counting_bus();
            let bus = PriorityAwareBus::with_config(
                inner,
                SchedulerConfig::default()
                    .with_drain_mode(DrainMode::Deferred)
                    .coalescing(coalesced_topics()),
            );
            b.iter(|| {
                for _ in 0..size {
                    bus.emit(DevtoolsEvent::GetLatestComponentExplorerView(None))
                        .expect("bus is open");
                }
                black_box(bus.drain())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_local_dispatch,
    bench_mixed_drain,
    bench_coalesced_storm
);
criterion_main!(benches);
