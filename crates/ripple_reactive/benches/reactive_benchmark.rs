//! # Reactive Dispatch Benchmark
//!
//! REQUIREMENTS:
//! - Capture cost stays flat once buffers are warm
//! - One tick with 10,000 captured entities stays well under 1ms
//!
//! Run with: `cargo bench --package ripple_reactive`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::{Component, EntityId, FilterHandle, System, World};
use ripple_reactive::{
    Reactive, ReactiveBatch, ReactiveBuffer, ReactiveSystem, ReactiveType, UpdateMarking,
    UpdateReactive, UpdateReactiveSystem,
};

#[derive(Clone, Copy)]
struct Heat(u32);
impl Component for Heat {}

struct Sum(u64);

impl Reactive for Sum {
    fn filter(&mut self, world: &mut World) -> FilterHandle {
        world.filter_builder().with::<Heat>().build()
    }

    fn reactive_type(&self) -> ReactiveType {
        ReactiveType::OnAdded
    }

    fn process(&mut self, _world: &mut World, batch: ReactiveBatch<'_>) {
        for e in batch {
            self.0 += u64::from(e.index());
        }
    }
}

struct HeatChanged(u64);

impl UpdateReactive for HeatChanged {
    type Component = Heat;

    fn process_updated(&mut self, _world: &mut World, batch: ReactiveBatch<'_>) {
        self.0 += batch.len() as u64;
    }
}

/// Benchmark: raw buffer pushes with warm capacity.
fn bench_buffer_push(c: &mut Criterion) {
    let mut buffer = ReactiveBuffer::new();
    c.bench_function("buffer_push_1k_warm", |b| {
        b.iter(|| {
            for i in 0..1_000 {
                buffer.push(black_box(EntityId::new(i, 0)));
            }
            buffer.clear();
        });
    });
}

/// Benchmark: add-component transitions captured and processed in one tick.
fn bench_capture_and_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture_and_run");

    for count in [100_u32, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = World::with_capacity(count as usize);
            let entities: Vec<EntityId> = (0..count).map(|_| world.spawn()).collect();
            let mut system = ReactiveSystem::new(Sum(0));
            system.initialize(&mut world);

            b.iter(|| {
                for &e in &entities {
                    world.add_component(e, Heat(1));
                }
                system.run(&mut world);
                for &e in &entities {
                    world.remove_component::<Heat>(e);
                }
            });

            black_box(system.reactive().0);
        });
    }

    group.finish();
}

/// Benchmark: mark, collapse and strip update markers.
fn bench_update_markers(c: &mut Criterion) {
    let mut world = World::new();
    let entities: Vec<EntityId> = (0..1_000).map(|_| world.spawn()).collect();
    let mut system = UpdateReactiveSystem::updates(HeatChanged(0));
    system.initialize(&mut world);

    c.bench_function("update_markers_1k_double_mark", |b| {
        b.iter(|| {
            for &e in &entities {
                world.mark_updated::<Heat>(e);
                world.mark_updated::<Heat>(e);
            }
            system.run(&mut world);
        });
    });

    black_box(system.reactive().inner().0);
}

criterion_group!(
    benches,
    bench_buffer_push,
    bench_capture_and_run,
    bench_update_markers,
);
criterion_main!(benches);
