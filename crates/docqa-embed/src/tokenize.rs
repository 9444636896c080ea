use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use docqa_core::error::{Error, Result};

/// Encode `text` into padded/truncated id and attention-mask tensors of
/// shape `[1, max_len]` on the given device.
pub fn tokenize_on_device(
    tokenizer: &Tokenizer,
    text: &str,
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| Error::EmbeddingFailure(format!("tokenization failed: {e}")))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len {
        ids.truncate(max_len);
        mask.truncate(max_len);
    }
    if ids.len() < max_len {
        let pad = max_len - ids.len();
        ids.extend(std::iter::repeat(0).take(pad));
        mask.extend(std::iter::repeat(0).take(pad));
    }
    let input_ids = Tensor::from_iter(ids, device)
        .and_then(|t| t.reshape((1, max_len)))
        .map_err(|e| Error::EmbeddingFailure(format!("tensor build failed: {e}")))?;
    let attention_mask = Tensor::from_iter(mask, device)
        .and_then(|t| t.reshape((1, max_len)))
        .map_err(|e| Error::EmbeddingFailure(format!("tensor build failed: {e}")))?;
    Ok((input_ids, attention_mask))
}
