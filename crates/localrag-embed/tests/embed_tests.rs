use localrag_core::traits::Embedder;
use localrag_embed::FakeEmbedder;

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(1024);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_scores_word_overlap() {
    let embedder = FakeEmbedder::new(64);
    let texts: Vec<String> = ["Who is Maru?", "Maru is a cat.", "He is famous.", "A painting by Titian."]
        .iter().map(|s| s.to_string()).collect();
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let q = &embs[0];
    let maru = cosine(q, &embs[1]);
    let famous = cosine(q, &embs[2]);
    let painting = cosine(q, &embs[3]);
    assert!(maru > famous, "maru={maru} famous={famous}");
    assert!(famous > painting, "famous={famous} painting={painting}");
    assert_eq!(painting, 0.0);
}

#[test]
fn text_without_tokens_embeds_to_a_unit_vector() {
    let embedder = FakeEmbedder::new(8);
    let embs = embedder
        .embed_batch(&["?! ...".to_string(), "---".to_string(), "Maru".to_string()])
        .expect("embed_batch");
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-5, "norm={norm}");
    assert_eq!(embs[0], embs[1]);
    let against_word = cosine(&embs[0], &embs[2]);
    assert!(against_word.is_finite() && against_word > 0.0, "cosine={against_word}");
}

#[test]
fn embedding_does_not_depend_on_earlier_calls() {
    let used = FakeEmbedder::new(64);
    used.embed_batch(&["Venus Anadyomene is an oil painting by Titian.".to_string()]).expect("warm up");
    let text = vec!["Maru is a cat.".to_string()];
    let from_used = used.embed_batch(&text).expect("embed_batch");
    let from_fresh = FakeEmbedder::new(64).embed_batch(&text).expect("embed_batch");
    assert_eq!(from_used, from_fresh);
}
