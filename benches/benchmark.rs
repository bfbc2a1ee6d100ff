use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use trail_topics::{
    cluster::kmeans::{KMeans, KMeansConfig},
    topic::nmf::{Nmf, NmfConfig},
    Corpus, StopWords, TFIDFVectorizer, VectorizerConfig,
};

const WORDS: [&str; 24] = [
    "lake", "shore", "forest", "pine", "summit", "ridge", "scramble", "view", "creek", "waterfall", "canyon",
    "meadow", "wildflower", "loop", "steep", "switchback", "dog", "family", "beach", "sand", "dune", "snow",
    "glacier", "boulder",
];

/// Synthetic trail descriptions drawn from a few overlapping word pools.
fn synthetic_corpus(docs: usize, words_per_doc: usize) -> Corpus {
    let mut rng = StdRng::seed_from_u64(2024);
    Corpus::from_texts((0..docs).map(|d| {
        let pool = (d % 4) * 6;
        (0..words_per_doc)
            .map(|_| {
                let offset = rng.gen_range(0..9);
                WORDS[(pool + offset) % WORDS.len()]
            })
            .collect::<Vec<_>>()
            .join(" ")
    }))
}

fn pipeline_benchmark(c: &mut Criterion) {
    let corpus = synthetic_corpus(2_000, 40);
    let vectorizer: TFIDFVectorizer = TFIDFVectorizer::new(VectorizerConfig::default(), StopWords::new());

    c.bench_function("vectorize", |b| {
        b.iter(|| vectorizer.fit_transform(&corpus).unwrap());
    });

    let space = vectorizer.fit_transform(&corpus).unwrap();

    let kmeans = KMeans::new(KMeansConfig::new(8).with_seed(1));
    c.bench_function("kmeans_k8", |b| {
        b.iter(|| kmeans.fit(&space.matrix).unwrap());
    });

    let nmf = Nmf::new(NmfConfig::new(6).with_seed(1));
    c.bench_function("nmf_fit_6_topics", |b| {
        b.iter(|| nmf.fit(&space.matrix).unwrap());
    });

    c.bench_function("similar_pairs", |b| {
        b.iter(|| space.similar_pairs(0.9, 1.1));
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
