use criterion::{criterion_group, criterion_main, Criterion};
use daisymatch::distance::l1_distance;
use daisymatch::{BlockMatcher, DescriptorField, FieldDimensions, SearchWindow};

fn synthetic_field(height: usize, width: usize, seed: usize) -> DescriptorField {
    let dims = FieldDimensions::new(height, width, 200).unwrap();
    let data = (0..dims.element_count())
        .map(|i| ((i * 31 + seed * 17) % 97) as f32 / 97.0)
        .collect();
    DescriptorField::from_vec(dims, data).unwrap()
}

fn bench_l1(c: &mut Criterion) {
    let a: Vec<f32> = (0..200).map(|i| (i as f32 * 0.1).sin()).collect();
    let b: Vec<f32> = (0..200).map(|i| (i as f32 * 0.1).cos()).collect();
    c.bench_function("l1_distance_200", |bench| bench.iter(|| l1_distance(&a, &b)));
}

fn bench_match(c: &mut Criterion) {
    let a = synthetic_field(32, 48, 1);
    let b = synthetic_field(32, 48, 2);
    let matcher = BlockMatcher::new(SearchWindow::new(7, 21).unwrap());
    c.bench_function("match_fields_parallel", |bench| {
        bench.iter(|| matcher.match_fields(&a, &b).unwrap())
    });
    let sequential = matcher.sequential();
    c.bench_function("match_fields_sequential", |bench| {
        bench.iter(|| sequential.match_fields(&a, &b).unwrap())
    });
}

criterion_group!(
    name = daisymatch;
    config = Criterion::default().sample_size(10);
    targets = bench_l1, bench_match
);

criterion_main!(daisymatch);
