use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use wod_tracker::services::matching::DEFAULT_SIMILARITY_THRESHOLD;
use wod_tracker::services::{find_similar_names, normalize_workout_name, similarity_score};

const BENCHMARKS: [&str; 24] = [
    "Fran", "Grace", "Helen", "Diane", "Elizabeth", "Isabel", "Jackie", "Karen", "Annie",
    "Cindy", "Mary", "Nancy", "Kelly", "Amanda", "Chelsea", "Barbara", "Angie", "Eva",
    "Murph", "DT", "JT", "Nate", "Fight Gone Bad", "Filthy Fifty",
];

fn candidate_names() -> Vec<String> {
    // Mimic a leaderboard history full of near-duplicate spellings
    BENCHMARKS
        .iter()
        .flat_map(|name| {
            [
                name.to_string(),
                name.to_uppercase(),
                name.chars().map(|c| format!("{c} ")).collect::<String>(),
                format!("{name} (scaled)"),
            ]
        })
        .collect()
}

fn benchmark_matching(c: &mut Criterion) {
    let candidates = candidate_names();

    let mut group = c.benchmark_group("workout_matching");

    group.bench_function("normalize", |b| {
        b.iter(|| {
            for name in &candidates {
                black_box(normalize_workout_name(black_box(name)));
            }
        })
    });

    group.bench_function("similarity_pair", |b| {
        b.iter(|| similarity_score(black_box("Fight Gone Bad"), black_box("fight-gone-bad 2")))
    });

    group.bench_function("find_similar_names", |b| {
        b.iter(|| {
            find_similar_names(
                black_box("Filthy 50"),
                candidates.iter().map(String::as_str),
                DEFAULT_SIMILARITY_THRESHOLD,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_matching);
criterion_main!(benches);
