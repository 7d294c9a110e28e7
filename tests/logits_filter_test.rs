//! Integration tests for LogitsFilter.

use candle_core::{Device, Tensor};
use squash_qgen::engine::{LogitsFilter, FILTER_VALUE};

fn kept(logits: &[f32]) -> usize {
    logits.iter().filter(|&&x| x != FILTER_VALUE).count()
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

fn sample_logits() -> Vec<f32> {
    vec![1.3, -0.2, 4.1, 0.0, 2.7, 2.2, -3.0, 0.9, 3.5, 1.1]
}

#[test]
fn test_top_k_keeps_exactly_k_without_ties() {
    for k in 1..=10 {
        let mut logits = sample_logits();
        LogitsFilter::new(k, 0.0).apply_in_place(&mut logits);
        assert_eq!(kept(&logits), k, "top_k = {k}");
    }
}

#[test]
fn test_top_p_keeps_requested_mass() {
    let original = sample_logits();
    let probs = softmax(&original);
    for &p in &[0.1f32, 0.3, 0.5, 0.8, 0.95] {
        let mut logits = original.clone();
        LogitsFilter::new(0, p).apply_in_place(&mut logits);
        let mass: f32 = logits
            .iter()
            .zip(&probs)
            .filter(|(&x, _)| x != FILTER_VALUE)
            .map(|(_, &q)| q)
            .sum();
        assert!(mass >= p, "top_p = {p}, kept mass {mass}");
    }
}

#[test]
fn test_maximum_always_survives() {
    let original = sample_logits();
    let filters = [
        LogitsFilter::new(1, 0.0),
        LogitsFilter::new(0, 1e-6),
        LogitsFilter::new(3, 0.2),
        LogitsFilter::default().with_threshold(4.1),
    ];
    for filter in filters {
        let mut logits = original.clone();
        filter.apply_in_place(&mut logits);
        assert_eq!(logits[2], 4.1, "{filter:?}");
    }
}

#[test]
fn test_top_k_and_threshold_are_idempotent() {
    let filters = [
        LogitsFilter::new(4, 0.0),
        LogitsFilter::default().with_threshold(1.0),
        LogitsFilter::new(6, 0.0).with_threshold(0.5),
    ];
    for filter in filters {
        let mut once = sample_logits();
        filter.apply_in_place(&mut once);
        let mut twice = once.clone();
        filter.apply_in_place(&mut twice);
        assert_eq!(once, twice, "{filter:?}");
    }
}

#[test]
fn test_top_p_with_dominant_token_is_idempotent() {
    let filter = LogitsFilter::new(0, 0.9);
    let mut once = vec![10.0f32, 0.0, 0.0, 0.0];
    filter.apply_in_place(&mut once);
    let mut twice = once.clone();
    filter.apply_in_place(&mut twice);
    assert_eq!(once, twice);
    assert_eq!(kept(&once), 1);
}

#[test]
fn test_top_k_then_top_p_composition() {
    // After top-k = 3 only [4.1, 3.5, 2.7] remain, with probabilities of
    // roughly [0.56, 0.31, 0.14]; the mass before 2.7 exceeds 0.6.
    let mut logits = sample_logits();
    LogitsFilter::new(3, 0.6).apply_in_place(&mut logits);
    let survivors: Vec<usize> = logits
        .iter()
        .enumerate()
        .filter(|(_, &x)| x != FILTER_VALUE)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(survivors, vec![2, 8]);
}

#[test]
fn test_apply_on_tensor_matches_slice() {
    let device = Device::Cpu;
    let filter = LogitsFilter::new(5, 0.7);
    let tensor = Tensor::new(sample_logits().as_slice(), &device).unwrap();
    let from_tensor: Vec<f32> = filter.apply(&tensor).unwrap().to_vec1().unwrap();

    let mut from_slice = sample_logits();
    filter.apply_in_place(&mut from_slice);
    assert_eq!(from_tensor, from_slice);
}

#[test]
fn test_apply_rejects_empty() {
    let device = Device::Cpu;
    let empty = Tensor::new(&[] as &[f32], &device).unwrap();
    assert!(LogitsFilter::new(1, 0.0).apply(&empty).is_err());
}
