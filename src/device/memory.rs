use crate::foundation::error::{LumenError, LumenResult};

/// A flat array owned by a compute device with a host-visible mirror.
///
/// Accumulation kernels write the device side; [`DeviceMemory::host`] only reflects those
/// writes after [`DeviceMemory::copy_to_host`] has transferred them.
pub trait DeviceMemory<T: Copy + Default> {
    /// (Re)allocate storage for exactly `len` elements. Previous contents are discarded.
    fn alloc(&mut self, len: usize) -> LumenResult<()>;

    /// Zero-fill device storage without reallocating. No-op when unallocated.
    fn zero(&mut self) -> LumenResult<()>;

    /// Copy `rows` rows of `row_elems` elements starting at `offset` from device to host.
    fn copy_to_host(&mut self, offset: usize, row_elems: usize, rows: usize) -> LumenResult<()>;

    /// Release device and host storage.
    fn free(&mut self);

    /// Whether device storage currently exists.
    fn is_allocated(&self) -> bool;

    /// Number of allocated elements (`0` when unallocated).
    fn len(&self) -> usize;

    /// Host-visible copy of the data.
    fn host(&self) -> &[T];
}

/// [`DeviceMemory`] backed by process memory, used by the CPU device and in tests.
#[derive(Clone, Debug)]
pub struct HostMemory<T> {
    label: &'static str,
    device: Option<Vec<T>>,
    host: Vec<T>,
}

impl<T: Copy + Default> HostMemory<T> {
    /// Create an unallocated buffer. `label` only shows up in logs and errors.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            device: None,
            host: Vec::new(),
        }
    }

    /// Debug label given at construction.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Mutable device-side storage, the write target of accumulation kernels.
    pub fn device_mut(&mut self) -> Option<&mut [T]> {
        self.device.as_deref_mut()
    }
}

fn zeroed<T: Copy + Default>(label: &str, len: usize) -> LumenResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| LumenError::device(format!("allocate {len} elements for '{label}': {e}")))?;
    v.resize(len, T::default());
    Ok(v)
}

impl<T: Copy + Default> DeviceMemory<T> for HostMemory<T> {
    fn alloc(&mut self, len: usize) -> LumenResult<()> {
        self.free();
        self.device = Some(zeroed(self.label, len)?);
        self.host = zeroed(self.label, len)?;
        tracing::debug!(label = self.label, len, "device memory allocated");
        Ok(())
    }

    fn zero(&mut self) -> LumenResult<()> {
        if let Some(device) = self.device.as_mut() {
            device.fill(T::default());
        }
        Ok(())
    }

    fn copy_to_host(&mut self, offset: usize, row_elems: usize, rows: usize) -> LumenResult<()> {
        let Some(device) = self.device.as_ref() else {
            return Err(LumenError::device(format!(
                "copy from unallocated device memory '{}'",
                self.label
            )));
        };
        let count = row_elems
            .checked_mul(rows)
            .and_then(|n| n.checked_add(offset))
            .ok_or_else(|| LumenError::device("copy extent overflows usize"))?;
        if count > device.len() {
            return Err(LumenError::device(format!(
                "copy of {rows}x{row_elems} at {offset} exceeds '{}' ({} elements)",
                self.label,
                device.len()
            )));
        }
        for row in 0..rows {
            let start = offset + row * row_elems;
            let end = start + row_elems;
            self.host[start..end].copy_from_slice(&device[start..end]);
        }
        Ok(())
    }

    fn free(&mut self) {
        self.device = None;
        self.host = Vec::new();
    }

    fn is_allocated(&self) -> bool {
        self.device.is_some()
    }

    fn len(&self) -> usize {
        self.device.as_ref().map_or(0, Vec::len)
    }

    fn host(&self) -> &[T] {
        &self.host
    }
}

#[cfg(test)]
#[path = "../../tests/unit/device/memory.rs"]
mod tests;
