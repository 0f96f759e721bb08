use candle_core::{Device, Tensor, DType};
use localrag_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // Two tokens with hidden dim 4; second token is padding.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0,
                                 5.0, 6.0, 7.0, 8.0],
                               (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1i64, 0i64], (1, 2), &dev).unwrap()
        .to_dtype(DType::F32).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();
    let v = &v[0];
    let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in v.iter().cloned().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn masked_mean_l2_rejects_rank_two_input() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((1, 2), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}

#[test]
fn fully_masked_row_pools_to_zeros() {
    let dev = Device::Cpu;
    let h = Tensor::from_slice(&[1.0f32, 1.0, 2.0, 2.0, 3.0, 4.0, 0.0, 0.0], (2, 2, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[0u32, 0, 1, 0], (2, 2), &dev).unwrap();
    let rows: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();
    assert!(rows[0].iter().all(|x| *x == 0.0), "{:?}", rows[0]);
    assert!((rows[1][0] - 0.6).abs() < 1e-5 && (rows[1][1] - 0.8).abs() < 1e-5, "{:?}", rows[1]);
}

#[test]
fn mask_shape_must_match_batch() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 2), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}
