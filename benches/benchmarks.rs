//! Performance benchmarks for PodKiller
//!
//! Run with: cargo bench

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use podkiller::experiment::{pick_replacement, ClaimedReplacements};
use podkiller::models::{
    KillRecord, MatchedBy, PodPhase, PodRef, RecoveryResult, ReplacementCandidate, SessionReport,
};
use podkiller::reports::{build_report, export_csv};

/// A namespace of established running pods plus a handful of fresh ones
fn namespace_listing(pod_count: usize) -> (Vec<PodRef>, KillRecord) {
    let now = Utc::now();
    let pods = (0..pod_count)
        .map(|i| {
            let fresh = i % 50 == 0;
            PodRef {
                name: format!("web-{}", i),
                namespace: "bench".to_string(),
                creation_timestamp: Some(if fresh {
                    now + Duration::seconds((i % 30) as i64)
                } else {
                    now - Duration::hours(2)
                }),
                phase: PodPhase::Running,
                container_ready: vec![true],
                marked_for_deletion: i == 0,
            }
        })
        .collect();

    let kill = KillRecord {
        killed_pod_name: "web-0".to_string(),
        namespace: "bench".to_string(),
        deletion_time: now,
    };
    (pods, kill)
}

/// Benchmark replacement attribution over one pod listing
fn bench_pick_replacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("pick_replacement");

    for pod_count in [10, 100, 1000, 5000].iter() {
        let (pods, kill) = namespace_listing(*pod_count);

        // Half the fresh pods already attributed to earlier kills
        let mut claimed = ClaimedReplacements::new();
        for pod in pods.iter().step_by(100) {
            claimed.claim(&pod.name);
        }

        group.throughput(Throughput::Elements(*pod_count as u64));
        group.bench_with_input(
            BenchmarkId::new("recency", pod_count),
            &pods,
            |b, pods| {
                b.iter(|| pick_replacement(black_box(pods), black_box(&kill), &claimed));
            },
        );
    }

    group.finish();
}

fn session(results: usize) -> SessionReport {
    let candidate = ReplacementCandidate {
        replacement_pod_name: "web-new".to_string(),
        matched_by: MatchedBy::PendingHeuristic,
    };
    build_report(
        Utc::now(),
        "bench",
        (0..results)
            .map(|i| RecoveryResult::recovered(&format!("web-{}", i), &candidate, 3.25))
            .collect(),
    )
}

/// Benchmark report serialization and CSV export
fn bench_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports");

    for result_count in [1, 10, 100].iter() {
        let report = session(*result_count);

        group.bench_with_input(
            BenchmarkId::new("serialize", result_count),
            &report,
            |b, report| {
                b.iter(|| serde_json::to_string(black_box(report)).unwrap());
            },
        );

        let json = serde_json::to_string(&report).unwrap();
        group.bench_with_input(
            BenchmarkId::new("deserialize", result_count),
            &json,
            |b, json| {
                b.iter(|| serde_json::from_str::<SessionReport>(black_box(json)).unwrap());
            },
        );
    }

    let reports: Vec<SessionReport> = (0..50).map(|_| session(10)).collect();
    group.throughput(Throughput::Elements(500));
    group.bench_function("export_csv_500_rows", |b| {
        b.iter(|| export_csv(black_box(&reports)));
    });

    group.finish();
}

criterion_group!(benches, bench_pick_replacement, bench_reports);
criterion_main!(benches);
