use crate::device::Device;
use crate::errors::{TfheResult, ensure_eq};
use crate::torus::Torus32;

/// A batch of LWE samples `(a, b)` of dimension `n`.
///
/// Masks are stored row-major (`mask[b * n + i]`), bodies separately.
#[derive(Debug, Clone, PartialEq)]
pub struct LweSampleArray {
    dimension: usize,
    mask: Vec<Torus32>,
    body: Vec<Torus32>,
}

impl LweSampleArray {
    pub fn zeros(dimension: usize, batch: usize) -> Self {
        Self {
            dimension,
            mask: vec![0; dimension * batch],
            body: vec![0; batch],
        }
    }

    pub fn zeros_on<D: Device>(device: &D, dimension: usize, batch: usize) -> TfheResult<Self> {
        Ok(Self {
            dimension,
            mask: device.alloc_zeroed(dimension * batch)?,
            body: device.alloc_zeroed(batch)?,
        })
    }

    pub fn from_parts(
        dimension: usize,
        mask: Vec<Torus32>,
        body: Vec<Torus32>,
    ) -> TfheResult<Self> {
        ensure_eq("LWE mask length", dimension * body.len(), mask.len())?;
        Ok(Self {
            dimension,
            mask,
            body,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn batch_size(&self) -> usize {
        self.body.len()
    }

    pub fn mask(&self) -> &[Torus32] {
        &self.mask
    }

    pub fn body(&self) -> &[Torus32] {
        &self.body
    }

    /// Mask of the `index`-th sample.
    pub fn mask_of(&self, index: usize) -> &[Torus32] {
        &self.mask[index * self.dimension..(index + 1) * self.dimension]
    }

    /// Mutable masks and bodies at once, for filling both in one pass.
    pub fn parts_mut(&mut self) -> (&mut [Torus32], &mut [Torus32]) {
        (&mut self.mask, &mut self.body)
    }
}
