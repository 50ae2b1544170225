use std::ops::Range;

/// Index window for the batch starting at `start` over `len` examples.
///
/// The final window of an epoch is right-aligned: as soon as `start + size`
/// would run past the end, the window is clamped to the last `size`
/// examples, overlapping the previous batch instead of under-filling. Only
/// a set smaller than `size` yields a short window (the whole set).
pub fn batch_range(start: usize, size: usize, len: usize) -> Range<usize> {
    if start + size >= len {
        len.saturating_sub(size)..len
    } else {
        start..start + size
    }
}
