//! Planner and filter throughput over synthetic boards.
//!
//! Run with:
//! ```sh
//! cargo bench --bench planners
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lanes_core::{
    CompiledFilter, DateContext, DisplayFilters, FilterSpec, GroupedIndex, Grouping, IssueField,
    IssueSnapshot, difference, filter_issues,
};

#[derive(Clone, Copy, Debug)]
struct BoardTier {
    name: &'static str,
    issues: usize,
    /// Distinct values per dimension.
    cardinality: usize,
}

const TIERS: [BoardTier; 3] = [
    BoardTier {
        name: "S",
        issues: 200,
        cardinality: 8,
    },
    BoardTier {
        name: "M",
        issues: 2_000,
        cardinality: 32,
    },
    BoardTier {
        name: "L",
        issues: 20_000,
        cardinality: 128,
    },
];

#[derive(Clone, Copy, Debug)]
struct Prng(u64);

impl Prng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 11
    }

    fn pick(&mut self, upper: usize) -> usize {
        (self.next_u64() as usize) % upper.max(1)
    }

    fn values(&mut self, prefix: &str, cardinality: usize, max: usize) -> Vec<String> {
        let count = self.pick(max + 1);
        let mut out: Vec<String> = (0..count)
            .map(|_| format!("{prefix}{}", self.pick(cardinality)))
            .collect();
        out.dedup();
        out
    }
}

fn board(tier: BoardTier, seed: u64) -> Vec<IssueSnapshot> {
    let mut rng = Prng(seed);
    (0..tier.issues)
        .map(|i| IssueSnapshot {
            state_id: Some(format!("s{}", rng.pick(6))),
            priority: Some(["urgent", "high", "medium", "low"][rng.pick(4)].to_string()),
            assignee_ids: rng.values("u", tier.cardinality, 3),
            label_ids: rng.values("l", tier.cardinality, 5),
            ..IssueSnapshot::new(format!("I{i}"))
        })
        .collect()
}

fn bench_difference(c: &mut Criterion) {
    let mut group = c.benchmark_group("planners.difference");

    for size in [4_usize, 64, 1_024] {
        let previous: Vec<String> = (0..size).map(|i| format!("v{i}")).collect();
        let current: Vec<String> = (size / 2..size + size / 2).map(|i| format!("v{i}")).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(difference(&current, &previous, None)));
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("planners.reconcile");
    let groupings = [
        ("single", Grouping::by(IssueField::Labels)),
        (
            "two",
            Grouping::by_and_then(IssueField::Labels, IssueField::Assignees),
        ),
    ];

    for tier in TIERS {
        let before = board(tier, 0x1A9E5_u64);
        let after = board(tier, 0x1A9E6_u64);
        group.throughput(Throughput::Elements(tier.issues as u64));

        for (name, grouping) in &groupings {
            group.bench_with_input(
                BenchmarkId::new(*name, tier.name),
                &(&before, &after),
                |b, (before, after)| {
                    b.iter(|| {
                        before
                            .iter()
                            .zip(after.iter())
                            .map(|(prev, cur)| grouping.reconcile(prev, cur).len())
                            .sum::<usize>()
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_incremental_vs_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("planners.index");
    let grouping = Grouping::by_and_then(IssueField::State, IssueField::Labels);

    for tier in TIERS {
        let issues = board(tier, 0xB0A2D_u64);
        let edited = board(tier, 0xB0A2E_u64);
        let base = GroupedIndex::rebuild(grouping.clone(), &issues);

        group.bench_with_input(BenchmarkId::new("rebuild", tier.name), &edited, |b, edited| {
            b.iter(|| black_box(GroupedIndex::rebuild(grouping.clone(), edited).bucket_count()));
        });

        // Ten edited issues against an existing index.
        group.bench_with_input(BenchmarkId::new("update_10", tier.name), &edited, |b, edited| {
            b.iter(|| {
                let mut index = base.clone();
                for (prev, cur) in issues.iter().zip(edited.iter()).take(10) {
                    let _ = index.update(prev, cur);
                }
                black_box(index.bucket_count())
            });
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter.evaluate");
    let ctx = DateContext::default();
    let spec = FilterSpec::new()
        .with("priority", ["urgent", "high"])
        .with("labels", ["l1", "l2", "l3"]);
    let filter = CompiledFilter::compile(&spec, &DisplayFilters::default(), &ctx)
        .expect("static filter compiles");

    for tier in TIERS {
        let issues = board(tier, 0xF117E_u64);
        group.throughput(Throughput::Elements(tier.issues as u64));
        group.bench_with_input(BenchmarkId::from_parameter(tier.name), &issues, |b, issues| {
            b.iter(|| black_box(filter_issues(&filter, issues).len()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_difference,
    bench_reconcile,
    bench_incremental_vs_rebuild,
    bench_filter
);
criterion_main!(benches);
