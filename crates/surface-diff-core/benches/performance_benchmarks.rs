//! 性能基准测试
//!
//! 使用 criterion 测试比较、汇总、编解码和批量比较的性能

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use surface_diff_core::{
    BatchComparator, ChangeAggregator, DiffEngine, JsonSnapshotCodec, MemberDescriptor,
    MemberKind, SnapshotCodec, SnapshotFilter, SurfaceSnapshot, TypeDescriptor, TypeKind, attr,
    discover_pairs,
};
use tempfile::TempDir;

const MEMBERS_PER_TYPE: usize = 20;

/// 创建合成快照
///
/// `revision` 为 1 时大约十分之一的类型被删除、新增或修改成员返回类型
fn create_snapshot(type_count: usize, revision: usize) -> SurfaceSnapshot {
    let mut snapshot = SurfaceSnapshot::new("Bench.Assembly", format!("{revision}.0.0"));

    for i in 0..type_count {
        if revision > 0 && i % 10 == 3 {
            continue;
        }

        let mut type_descriptor =
            TypeDescriptor::new(format!("Bench.Namespace{}.Type{i}", i % 16), TypeKind::Class)
                .with_attribute(attr::ACCESSIBILITY, "public");

        for m in 0..MEMBERS_PER_TYPE {
            let return_type = if revision > 0 && i % 10 == 5 && m == 0 {
                "System.Int64"
            } else {
                "System.Int32"
            };
            let signature = MemberDescriptor::signature_key_for(
                MemberKind::Method,
                &format!("Method{m}"),
                &["System.String", "System.Int32"],
            );
            type_descriptor
                .add_member(
                    MemberDescriptor::new(signature, MemberKind::Method)
                        .with_attribute(attr::RETURN_TYPE, return_type),
                )
                .unwrap();
        }

        snapshot.add_type(type_descriptor).unwrap();
    }

    if revision > 0 {
        for i in 0..type_count / 10 {
            snapshot
                .add_type(TypeDescriptor::new(
                    format!("Bench.Added.Type{i}"),
                    TypeKind::Interface,
                ))
                .unwrap();
        }
    }

    snapshot
}

/// 基准测试：两个快照之间的比较
fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    let engine = DiffEngine::new();

    for type_count in [100, 1_000, 5_000].iter() {
        let old = create_snapshot(*type_count, 0);
        let new = create_snapshot(*type_count, 1);

        group.throughput(Throughput::Elements((*type_count * MEMBERS_PER_TYPE) as u64));
        group.bench_with_input(
            BenchmarkId::new("types", type_count),
            &(old, new),
            |b, (old, new)| {
                b.iter(|| {
                    let result = engine.compare(black_box(old), black_box(new));
                    black_box(result);
                })
            },
        );
    }

    group.finish();
}

/// 基准测试：变更汇总
fn bench_aggregate(c: &mut Criterion) {
    let old = create_snapshot(1_000, 0);
    let new = create_snapshot(1_000, 1);
    let changed = DiffEngine::new().compare(&old, &new);
    let unchanged = DiffEngine::new().compare(&old, &old);

    c.bench_function("has_changes_first_hit", |b| {
        b.iter(|| black_box(ChangeAggregator::has_changes(black_box(&changed))))
    });

    // 没有变更时需要遍历整棵结果树
    c.bench_function("has_changes_full_scan", |b| {
        b.iter(|| black_box(ChangeAggregator::has_changes(black_box(&unchanged))))
    });

    c.bench_function("summarize", |b| {
        b.iter(|| black_box(ChangeAggregator::summarize(black_box(&changed))))
    });
}

/// 基准测试：快照编解码
fn bench_codec(c: &mut Criterion) {
    let snapshot = create_snapshot(1_000, 0);
    let codec = JsonSnapshotCodec::compact();
    let encoded = codec.save_string(&snapshot).unwrap();

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("save", |b| {
        b.iter(|| black_box(codec.save_string(black_box(&snapshot)).unwrap()))
    });

    group.bench_function("load", |b| {
        b.iter(|| black_box(codec.load_str(black_box(&encoded)).unwrap()))
    });

    group.bench_function("filter", |b| {
        let filter = SnapshotFilter::new(Some(r"\.Namespace1[0-5]\.")).unwrap();
        b.iter(|| black_box(filter.apply(black_box(&snapshot))))
    });

    group.finish();
}

/// 基准测试：不同线程池大小下的批量比较
fn bench_batch_thread_pool_sizes(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let old_dir = temp_dir.path().join("old");
    let new_dir = temp_dir.path().join("new");
    std::fs::create_dir_all(&old_dir).unwrap();
    std::fs::create_dir_all(&new_dir).unwrap();

    let codec = JsonSnapshotCodec::compact();
    for i in 0..16 {
        let file_name = format!("assembly_{i}.json");
        codec
            .save_to_path(&create_snapshot(200, 0), &old_dir.join(&file_name))
            .unwrap();
        codec
            .save_to_path(&create_snapshot(200, 1), &new_dir.join(&file_name))
            .unwrap();
    }
    let pairs = discover_pairs(&old_dir, &new_dir, codec.file_extension())
        .unwrap()
        .pairs;

    let mut group = c.benchmark_group("batch_thread_pool_sizes");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    for thread_count in [1, 2, 4, num_cpus::get()].iter() {
        group.bench_with_input(
            BenchmarkId::new("threads", thread_count),
            thread_count,
            |b, &thread_count| {
                let comparator = BatchComparator::new().with_thread_pool_size(thread_count);
                b.iter(|| {
                    let result = comparator
                        .compare_files(&codec, black_box(&pairs))
                        .unwrap();
                    black_box(result);
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compare,
    bench_aggregate,
    bench_codec,
    bench_batch_thread_pool_sizes
);

criterion_main!(benches);
