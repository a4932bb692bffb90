// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod drain_bench;

use criterion::{criterion_group, criterion_main};
use drain_bench::bench_drain;
use limit_rate_bench::bench_limit_rate;
use publish_bench::bench_publish;

criterion_group!(publisher_benches, bench_drain, bench_limit_rate, bench_publish);
criterion_main!(publisher_benches);
