use curator_core::config::EmbeddingSettings;
use curator_core::traits::Embedder;
use curator_embed::{default_embedder, resolve_model_dir, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let embedder = default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), 1024, "embedding dim follows settings");
    assert_eq!(embedder.dim(), 1024);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_score_higher() {
    let embedder = HashEmbedder::new(256);
    let embs = embedder
        .embed_batch(&[
            "vector search with lancedb".to_string(),
            "lancedb vector search tutorial".to_string(),
            "sourdough baking schedule".to_string(),
        ])
        .unwrap();
    assert!(cosine(&embs[0], &embs[1]) > cosine(&embs[0], &embs[2]));
}

#[test]
fn empty_batch_is_empty() {
    let embedder = HashEmbedder::new(8);
    assert!(embedder.embed_batch(&[]).unwrap().is_empty());
}

#[test]
fn configured_model_dir_must_exist() {
    let tmp = tempfile::TempDir::new().unwrap();
    let configured = tmp.path().join("nope");
    let found = resolve_model_dir(Some(configured.to_str().unwrap()));
    if let Ok(dir) = found {
        assert_ne!(dir, configured);
    }
}
