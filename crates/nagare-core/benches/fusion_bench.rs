use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nagare_core::Stream;

fn bench_map_filter_chain(c: &mut Criterion) {
    let data: Vec<i64> = (0..1_000_000).collect();
    c.bench_function("map_filter_chain/1e6", |b| {
        b.iter(|| {
            let s = Stream::from_array(black_box(data.clone()))
                .map(|x| x * 2)
                .filter(|x| x % 3 == 0);
            let out: Vec<i64> = match nagare_core::exec::run_to_segment(s) {
                nagare_core::exec::SegmentOutput::Sync(it) => it.map(|r| r.unwrap()).collect(),
                nagare_core::exec::SegmentOutput::Async(_) => unreachable!("sync source stays sync"),
            };
            black_box(out)
        })
    });
}

fn bench_scan_running_sum(c: &mut Criterion) {
    let data: Vec<i64> = (0..1_000_000).collect();
    c.bench_function("scan_running_sum/1e6", |b| {
        b.iter(|| {
            let s = Stream::from_array(black_box(data.clone())).scan(0, |acc, x| acc + x);
            let out: Vec<i64> = match nagare_core::exec::run_to_segment(s) {
                nagare_core::exec::SegmentOutput::Sync(it) => it.map(|r| r.unwrap()).collect(),
                nagare_core::exec::SegmentOutput::Async(_) => unreachable!("sync source stays sync"),
            };
            black_box(out)
        })
    });
}

criterion_group!(benches, bench_map_filter_chain, bench_scan_running_sum);
criterion_main!(benches);
