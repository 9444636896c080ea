use docqa_core::config::EmbeddingSettings;
use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::ProviderKind;
use docqa_embed::{provider_for, FakeProvider};

#[tokio::test]
async fn fake_vectors_are_deterministic_and_normalized() {
    let provider = FakeProvider::new(ProviderKind::Local, 384);
    let texts = vec!["supervised learning".to_string()];
    let a = provider.embed_batch(&texts).await.expect("embed");
    let b = provider.embed_batch(&texts).await.expect("embed");
    assert_eq!(a, b);
    assert_eq!(a[0].len(), 384);
    let norm: f32 = a[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-3, "vectors are L2-normalized, got {norm}");
}

#[tokio::test]
async fn different_texts_get_different_vectors() {
    let provider = FakeProvider::new(ProviderKind::Local, 128);
    let out = provider
        .embed_batch(&["tesla coil".to_string(), "victorian novels".to_string()])
        .await
        .expect("embed");
    assert_ne!(out[0], out[1]);
}

#[tokio::test]
async fn fake_mode_respects_per_kind_dimensions() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let remote = provider_for(ProviderKind::Remote, &settings).expect("remote");
    let local = provider_for(ProviderKind::Local, &settings).expect("local");
    assert_eq!(remote.dim(), settings.remote.dim);
    assert_eq!(local.dim(), settings.local.dim);
    assert_eq!(remote.kind(), ProviderKind::Remote);
    assert_eq!(local.kind(), ProviderKind::Local);
    assert_ne!(remote.provider_id(), local.provider_id());
}
