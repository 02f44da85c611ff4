use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tripmode_core::{BufferSet, NormalizationParams, WindowSpec, encode, normalize};
use tripmode_traits::Channel;

// Noisy sine per axis from a tiny xorshift PRNG
fn fill(buffers: &BufferSet, n: u64, seed: u32) {
    let mut state = seed.max(1);
    let mut noise = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state as f32 / u32::MAX as f32) * 0.2 - 0.1
    };
    for i in 0..n {
        let t = i as f32 / 100.0;
        for ch in Channel::ALL {
            buffers.push_sample(ch, i * 10_000, t.sin() + noise(), t.cos() + noise(), noise());
        }
    }
}

fn bench_encode(c: &mut Criterion) {
    let spec = WindowSpec::default();
    let buffers = BufferSet::with_capacity(900);
    fill(&buffers, 600, 7);
    let now = 5_990_000;
    let window = spec.extract(&buffers, now);

    c.bench_function("encode_window_200", |b| {
        b.iter(|| encode(black_box(&window)))
    });

    let params = NormalizationParams::new(0.5, 0.1).unwrap();
    c.bench_function("extract_encode_normalize", |b| {
        b.iter_batched(
            || now,
            |t| {
                let w = spec.extract(&buffers, t);
                encode(&w).map(|v| normalize(&v, &params))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
