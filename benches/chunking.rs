use college_rag::embeddings::chunking::{ChunkingConfig, chunk_content};
use college_rag::store::VectorIndex;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const DIMENSION: usize = 384;

fn prospectus(words: usize) -> String {
    let vocabulary = [
        "hostel", "fees", "semester", "library", "examination", "syllabus", "campus",
        "canteen", "timings", "warden", "admission", "scholarship", "laboratory",
    ];
    (0..words)
        .map(|i| vocabulary[i % vocabulary.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn pseudo_vector(seed: usize) -> Vec<f32> {
    (0..DIMENSION)
        .map(|i| ((seed * 31 + i * 17) % 97) as f32 / 97.0)
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let content = prospectus(20_000);
    let config = ChunkingConfig::default();
    c.bench_function("chunking", |b| {
        b.iter(|| chunk_content(black_box(&content), black_box(&config)))
    });

    let mut index = VectorIndex::new(DIMENSION);
    for seed in 0..5_000 {
        index
            .add(&pseudo_vector(seed))
            .expect("vector has index dimension");
    }
    let query = pseudo_vector(12_345);
    c.bench_function("flat_search_5000", |b| {
        b.iter(|| index.search(black_box(&query), black_box(3)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
