/// Read-only view over fixed-width records spaced `stride` elements apart in a flat slice.
///
/// Record `i` starts at `base + i * stride`. The stride is signed so the same view walks
/// interleaved pass data forwards and image rows backwards.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StridedView<'a, T> {
    data: &'a [T],
    base: usize,
    stride: isize,
    width: usize,
    len: usize,
}

impl<'a, T> StridedView<'a, T> {
    /// Panics if the first or last record falls outside `data`.
    pub(crate) fn new(data: &'a [T], base: usize, stride: isize, width: usize, len: usize) -> Self {
        if len > 0 {
            let last = base as isize + (len as isize - 1) * stride;
            assert!(
                last >= 0,
                "strided view walks before the start of its buffer"
            );
            let hi = base.max(last as usize);
            assert!(
                hi + width <= data.len(),
                "strided view exceeds buffer: record end {} > len {}",
                hi + width,
                data.len()
            );
        }
        Self {
            data,
            base,
            stride,
            width,
            len,
        }
    }

    /// View over `rows` rows of `row_len` elements, last row first.
    pub(crate) fn rows_bottom_up(data: &'a [T], row_len: usize, rows: usize) -> Self {
        let base = rows.saturating_sub(1) * row_len;
        Self::new(data, base, -(row_len as isize), row_len, rows)
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> &'a [T] {
        debug_assert!(i < self.len, "record {i} out of {}", self.len);
        let start = (self.base as isize + i as isize * self.stride) as usize;
        &self.data[start..start + self.width]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/strided.rs"]
mod tests;
