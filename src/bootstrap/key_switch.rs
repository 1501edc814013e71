//! Key switching from the extracted key (dimension `k·N`) back to the
//! outer key (dimension `n`).
use super::decomposition::KeySwitchDecomposer;
use crate::ciphertext::LweSampleArray;
use crate::device::Device;
use crate::errors::{TfheResult, ensure_eq};
use crate::keys::KeySwitchKey;
use rayon::prelude::*;
use tracing::instrument;

/// `out = (0, b) - Σ_{i,j} KS[i][j][digit_j(a_i)]` for every sample.
///
/// Coordinates are visited in increasing `i`, levels in increasing `j`.
pub fn key_switch_into(
    key: &KeySwitchKey,
    input: &LweSampleArray,
    out: &mut LweSampleArray,
) -> TfheResult<()> {
    ensure_eq("key-switching input dimension", key.input_dimension(), input.dimension())?;
    ensure_eq("key-switching output dimension", key.output_dimension(), out.dimension())?;
    ensure_eq("batch size", input.batch_size(), out.batch_size())?;

    let decomposer = KeySwitchDecomposer::new(key.params())?;
    let n = out.dimension();
    let entries = key.entries();
    let (out_mask, out_body) = out.parts_mut();
    out_mask
        .par_chunks_mut(n.max(1))
        .zip(out_body.par_iter_mut())
        .enumerate()
        .for_each_init(
            || vec![0usize; decomposer.length()],
            |digits, (sample, (mask, body))| {
                mask.fill(0);
                *body = input.body()[sample];
                for (i, &a) in input.mask_of(sample).iter().enumerate() {
                    decomposer.decompose(a, digits);
                    for (level, &digit) in digits.iter().enumerate() {
                        if digit == 0 {
                            continue;
                        }
                        let index = key.index(i, level, digit);
                        for (m, &e) in mask.iter_mut().zip(entries.mask_of(index)) {
                            *m = m.wrapping_sub(e);
                        }
                        *body = body.wrapping_sub(entries.body()[index]);
                    }
                }
            },
        );
    Ok(())
}

#[instrument(skip_all, fields(batch = input.batch_size()))]
pub fn key_switch<D: Device>(
    device: &D,
    key: &KeySwitchKey,
    input: &LweSampleArray,
) -> TfheResult<LweSampleArray> {
    let mut out = LweSampleArray::zeros_on(device, key.output_dimension(), input.batch_size())?;
    key_switch_into(key, input, &mut out)?;
    Ok(out)
}
