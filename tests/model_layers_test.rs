//! Integration tests for GPT-2 attention, MLP and block.

use candle_core::{DType, Device, Module, Tensor};
use squash_qgen::model::{Gpt2Attention, Gpt2Block, Gpt2Mlp};

fn test_device() -> Device {
    Device::Cpu
}

#[test]
fn test_attention_output_shape_and_past() {
    let device = test_device();
    let attn = Gpt2Attention::new_random(16, 4, DType::F32, &device).unwrap();
    assert_eq!(attn.num_heads(), 4);
    assert_eq!(attn.head_dim(), 4);

    let x = Tensor::randn(0.0f32, 1.0, (1, 5, 16), &device).unwrap();
    let (out, (k, v)) = attn.forward(&x, None).unwrap();

    assert_eq!(out.dims(), &[1, 5, 16]);
    assert_eq!(k.dims(), &[1, 4, 5, 4]);
    assert_eq!(v.dims(), &[1, 4, 5, 4]);

    let next = Tensor::randn(0.0f32, 1.0, (1, 1, 16), &device).unwrap();
    let (out, (k, _)) = attn.forward(&next, Some(&(k, v))).unwrap();
    assert_eq!(out.dims(), &[1, 1, 16]);
    assert_eq!(k.dims(), &[1, 4, 6, 4]);
}

#[test]
fn test_attention_incremental_matches_full() {
    let device = test_device();
    let attn = Gpt2Attention::new_random(8, 2, DType::F32, &device).unwrap();
    let x = Tensor::randn(0.0f32, 1.0, (1, 4, 8), &device).unwrap();

    let (full, _) = attn.forward(&x, None).unwrap();

    let (_, past) = attn.forward(&x.narrow(1, 0, 3).unwrap(), None).unwrap();
    let (last, _) = attn.forward(&x.narrow(1, 3, 1).unwrap(), Some(&past)).unwrap();

    let expected: Vec<f32> = full.narrow(1, 3, 1).unwrap().flatten_all().unwrap().to_vec1().unwrap();
    let actual: Vec<f32> = last.flatten_all().unwrap().to_vec1().unwrap();
    for (a, e) in actual.iter().zip(&expected) {
        assert!((a - e).abs() < 1e-5, "{a} vs {e}");
    }
}

#[test]
fn test_mlp_shape() {
    let device = test_device();
    let mlp = Gpt2Mlp::new_random(16, 64, DType::F32, &device).unwrap();
    assert_eq!(mlp.hidden_size(), 16);
    assert_eq!(mlp.intermediate_size(), 64);

    let x = Tensor::randn(0.0f32, 1.0, (2, 3, 16), &device).unwrap();
    assert_eq!(mlp.forward(&x).unwrap().dims(), &[2, 3, 16]);
}

#[test]
fn test_block_shape() {
    let device = test_device();
    let block = Gpt2Block::new_random(16, 64, 4, 1e-5, DType::F32, &device).unwrap();
    let x = Tensor::randn(0.0f32, 1.0, (1, 3, 16), &device).unwrap();

    let (out, (k, v)) = block.forward(&x, None).unwrap();

    assert_eq!(out.dims(), &[1, 3, 16]);
    assert_eq!(k.dims(), &[1, 4, 3, 4]);
    assert_eq!(v.dims(), &[1, 4, 3, 4]);
    assert_eq!(block.attn().num_heads(), 4);
}
