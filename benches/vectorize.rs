use authorship_analyzer::vectorizer::tokenizer::Tokenizer;
use authorship_analyzer::vectorizer::vocabulary::VocabularyLimits;
use authorship_analyzer::{CountVectorizer, FittedVectorizer, HashingVectorizer, TextVectorizer, TfidfVectorizer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Random lines over a fixed word list
fn synthetic_docs(n: usize, words_per_doc: usize) -> Vec<String> {
    let words: Vec<String> = (0..2_000).map(|i| format!("w{i}")).collect();
    let mut rng = StdRng::seed_from_u64(7);
    (0..n)
        .map(|_| {
            (0..words_per_doc)
                .filter_map(|_| words.choose(&mut rng).cloned())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn vectorize_benchmark(c: &mut Criterion) {
    let docs = synthetic_docs(5_000, 12);

    let count = CountVectorizer::new(Tokenizer::default(), VocabularyLimits::default());
    c.bench_function("count_fit", |b| b.iter(|| count.fit(black_box(docs.as_slice()))));
    let fitted_count = count.fit(&docs).expect("count fit");
    c.bench_function("count_transform", |b| b.iter(|| fitted_count.transform(black_box(docs.as_slice()))));

    let hashing = HashingVectorizer::new(Tokenizer::default(), &Default::default()).expect("hashing vectorizer");
    c.bench_function("hashing_transform", |b| b.iter(|| hashing.transform(black_box(docs.as_slice()))));

    let tfidf = TfidfVectorizer::default();
    let fitted_tfidf = tfidf.fit(&docs).expect("tfidf fit");
    c.bench_function("tfidf_transform", |b| b.iter(|| fitted_tfidf.transform(black_box(docs.as_slice()))));
}

criterion_group!(benches, vectorize_benchmark);
criterion_main!(benches);
