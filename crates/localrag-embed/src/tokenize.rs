use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-RoBERTa `<pad>` id.
pub const PAD_ID: u32 = 1;

/// Model inputs for a batch of texts, right-padded to the longest entry.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Encode `texts`, truncating each to `max_len` tokens.
pub fn encode_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<EncodedBatch> {
    let mut rows: Vec<(Vec<u32>, Vec<u32>)> = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("tokenizing {:.40?}: {e}", text))?;
        let keep = enc.get_ids().len().min(max_len);
        rows.push((enc.get_ids()[..keep].to_vec(), enc.get_attention_mask()[..keep].to_vec()));
    }
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);

    let mut ids = Vec::with_capacity(rows.len() * width);
    let mut mask = Vec::with_capacity(rows.len() * width);
    for (row_ids, row_mask) in rows {
        let pad = width - row_ids.len();
        ids.extend(row_ids.into_iter().chain(std::iter::repeat(PAD_ID).take(pad)));
        mask.extend(row_mask.into_iter().chain(std::iter::repeat(0).take(pad)));
    }
    let shape = (texts.len(), width);
    let input_ids = Tensor::from_vec(ids, shape, device)?;
    let attention_mask = Tensor::from_vec(mask, shape, device)?;
    // XLM-RoBERTa has a single segment type.
    let token_type_ids = input_ids.zeros_like()?;
    Ok(EncodedBatch { input_ids, attention_mask, token_type_ids })
}
