/// Block-sized I/O buffer shared by every block operation of a phase.
///
/// Even-indexed bytes are `0xFF` and odd-indexed bytes `0x00`, so the data
/// is neither all zeros nor trivially sparse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBuffer {
    bytes: Vec<u8>,
}

impl BlockBuffer {
    pub fn new(block_size: usize) -> Self {
        let bytes = (0..block_size)
            .map(|i| if i % 2 == 0 { 0xFF } else { 0x00 })
            .collect();
        Self { bytes }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
