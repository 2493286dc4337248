use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use morpher_image::{Image, ImageSize};
use morpher_imgproc::parallel::ExecutionStrategy;
use morpher_morph::{field_at, generate, render_frame, Feature, MorphConfig, MorphSession, Side};

fn random_image(rng: &mut StdRng, size: ImageSize) -> Image<u8, 4> {
    let data: Vec<u8> = (0..size.area() * 4).map(|_| rng.random()).collect();
    Image::new(size, data).unwrap()
}

fn random_lines(rng: &mut StdRng, size: ImageSize, count: usize) -> Vec<Feature> {
    let (w, h) = (size.width as f32 - 1.0, size.height as f32 - 1.0);
    (0..count)
        .map(|_| {
            let x0 = rng.random_range(0.0..w * 0.5);
            let y0 = rng.random_range(0.0..h);
            Feature::line(x0, y0, x0 + w * 0.4, rng.random_range(0.0..h))
        })
        .collect()
}

fn make_session(size: ImageSize, lines: usize, config: MorphConfig) -> MorphSession<u8, 4> {
    let mut rng = StdRng::seed_from_u64(42);
    let source = random_image(&mut rng, size);
    let destination = random_image(&mut rng, size);
    let src_features = random_lines(&mut rng, size, lines);
    let dst_features = random_lines(&mut rng, size, lines);
    MorphSession::from_features(source, destination, src_features, dst_features, config).unwrap()
}

fn bench_warp_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("WarpField");
    let size = ImageSize {
        width: 256,
        height: 224,
    };

    for lines in [1, 8, 32] {
        group.throughput(criterion::Throughput::Elements(size.area() as u64));
        let session = make_session(size, lines, MorphConfig::default());
        let field = field_at(0.5, session.correspondences(), Side::Source, session.config());

        group.bench_with_input(BenchmarkId::new("materialize", lines), &field, |b, f| {
            b.iter(|| black_box(f.materialize(black_box(size))))
        });
    }
    group.finish();
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("RenderFrame");

    for (width, height) in [(256, 224), (512, 448)].iter() {
        let size = ImageSize {
            width: *width,
            height: *height,
        };
        group.throughput(criterion::Throughput::Elements(size.area() as u64));
        let parameter_string = format!("{}x{}", width, height);

        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::ParallelRows] {
            let session = make_session(size, 8, MorphConfig::default().with_strategy(strategy));
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), &parameter_string),
                &session,
                |b, s| b.iter(|| render_frame(black_box(s), black_box(0.5)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sequence");
    group.sample_size(10);
    let size = ImageSize {
        width: 256,
        height: 224,
    };

    for frames_in_flight in [1, 4] {
        let session = make_session(
            size,
            8,
            MorphConfig::default().with_frames_in_flight(frames_in_flight),
        );
        group.bench_with_input(
            BenchmarkId::new("frames_in_flight", frames_in_flight),
            &session,
            |b, s| b.iter(|| generate(black_box(s), 8).unwrap().collect_frames().unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_warp_field, bench_render_frame, bench_sequence);
criterion_main!(benches);
