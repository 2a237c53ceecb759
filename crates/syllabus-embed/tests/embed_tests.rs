use syllabus_core::config::EmbeddingSettings;
use syllabus_core::traits::Embedder;
use syllabus_embed::{get_default_embedder, FakeEmbedder, FAKE_EMBEDDING_DIM};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["Course Code: CS301".to_string(), "Course Code: CS301".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(embedder.dim(), FAKE_EMBEDDING_DIM);
    assert_eq!(v1.len(), FAKE_EMBEDDING_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_ranks_overlapping_text_closer() {
    let embedder = FakeEmbedder::new(1024);
    let query = embedder.embed_text("machine learning course code");
    let related = embedder.embed_text("UNIT 1: machine learning course code CS301");
    let unrelated = embedder.embed_text("hostel mess timings and fees");
    let l2 = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>();
    assert!(l2(&query, &related) < l2(&query, &unrelated));
}

#[test]
fn empty_batch_is_empty() {
    let embedder = FakeEmbedder::default();
    assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    assert_eq!(embedder.model_id(), "fake-hash:d384");
}

/// Downloads `all-MiniLM-L6-v2` from the Hugging Face Hub.
/// Run explicitly with `cargo test -p syllabus-embed -- --ignored`.
#[ignore]
#[test]
fn bert_embedder_produces_normalized_vectors() {
    let embedder = get_default_embedder(&EmbeddingSettings::default()).expect("model");
    let embs = embedder
        .embed_batch(&["What is the course code for Machine Learning?".to_string(), "Credits: 4".to_string()])
        .expect("embed");
    assert_eq!(embs.len(), 2);
    assert_eq!(embs[0].len(), embedder.dim());
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3);
}
