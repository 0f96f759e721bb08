use anyhow::{bail, Result};
use candle_core::Tensor;

/// Sentence vectors from token states: average the rows of `hidden`
/// (`[batch, tokens, dim]`) that `attention_mask` (`[batch, tokens]`) keeps,
/// then scale each result to unit length. A row with no kept tokens comes out
/// as all zeros.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, _dim) = hidden.dims3()?;
    let (mask_batch, mask_tokens) = attention_mask.dims2()?;
    if (mask_batch, mask_tokens) != (batch, tokens) {
        bail!("attention mask is [{mask_batch}, {mask_tokens}] but token states are [{batch}, {tokens}, _]");
    }
    let weights = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&weights.unsqueeze(2)?)?.sum(1)?;
    let kept = weights.sum_keepdim(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&kept)?;
    let length = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12f64)?;
    Ok(mean.broadcast_div(&length)?)
}
