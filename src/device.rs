//! Device buffer service used by the pipeline.
//!
//! The pipeline only needs zeroed allocation of batched buffers and a
//! synchronization point where device-side errors surface. `HostDevice`
//! keeps every buffer in host memory.
use crate::errors::{TfheError, TfheResult};

pub trait Device: Send + Sync {
    fn name(&self) -> &'static str;

    /// Allocates `len` default-initialized elements.
    fn alloc_zeroed<T: Clone + Default + Send>(&self, len: usize) -> TfheResult<Vec<T>>;

    /// Waits for outstanding work and reports any device-side error.
    fn synchronize(&self) -> TfheResult<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HostDevice;

impl Device for HostDevice {
    fn name(&self) -> &'static str {
        "host"
    }

    fn alloc_zeroed<T: Clone + Default + Send>(&self, len: usize) -> TfheResult<Vec<T>> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|err| TfheError::DeviceFailure {
                device: self.name(),
                message: format!("cannot allocate {len} elements: {err}"),
            })?;
        buffer.resize(len, T::default());
        Ok(buffer)
    }

    fn synchronize(&self) -> TfheResult<()> {
        Ok(())
    }
}
