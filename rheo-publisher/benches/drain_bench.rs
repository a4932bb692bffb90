// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use criterion::{BenchmarkId, Criterion, Throughput};
use rheo_core::{RheoError, Subscriber, SubscriptionHandle};
use rheo_publisher::prelude::*;
use std::hint::black_box;

/// Requests `batch` items at a time, re-requesting once a batch has been received.
struct Batched {
    batch: u64,
    received: u64,
    subscription: Option<SubscriptionHandle>,
}

impl Subscriber<i64> for Batched {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        subscription.request(self.batch);
        self.subscription = Some(subscription);
    }

    fn on_next(&mut self, item: i64) {
        black_box(item);
        self.received += 1;
        if self.received % self.batch == 0 {
            if let Some(subscription) = &self.subscription {
                subscription.request(self.batch);
            }
        }
    }

    fn on_error(&mut self, _error: RheoError) {}

    fn on_complete(&mut self) {}
}

pub fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_drain");
    let sizes = [1_000u64, 10_000, 100_000];
    let batches = [1u64, 32, u64::MAX];

    for &size in &sizes {
        for &batch in &batches {
            let label = if batch == u64::MAX {
                "unbounded".to_string()
            } else {
                batch.to_string()
            };
            let id = BenchmarkId::from_parameter(format!("m{size}_b{label}"));
            group.throughput(Throughput::Elements(size));
            group.bench_with_input(id, &(size, batch), |bencher, &(size, batch)| {
                bencher.iter(|| {
                    range(0, size).subscribe(Box::new(Batched {
                        batch,
                        received: 0,
                        subscription: None,
                    }))
                });
            });
        }
    }
    group.finish();
}
