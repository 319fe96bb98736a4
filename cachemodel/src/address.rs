/// Splits byte addresses into a tag and a set index for a fixed geometry
///
/// The byte offset within a line is discarded, the cache only models whole lines. Decoding uses
/// division rather than bit masks, so neither the line size nor the number of sets needs to be a
/// power of two
///
/// # Examples
///
/// ```
/// use cachemodel::address::AddressDecoder;
/// let decoder = AddressDecoder::new(64, 16);
/// assert_eq!(decoder.split(1024), (1, 0));
/// assert_eq!(decoder.block_address(1, 0), 1024 / 64);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressDecoder {
    line_size: u64,
    num_sets: u64,
}

impl AddressDecoder {
    /// Both arguments must be non-zero, which [`crate::config::CacheConfig::validate`] guarantees
    pub fn new(line_size: u64, num_sets: u64) -> Self {
        debug_assert!(line_size > 0 && num_sets > 0);
        Self { line_size, num_sets }
    }

    /// The set an address maps to
    #[inline]
    pub fn index(&self, address: u64) -> u64 {
        (address / self.line_size) % self.num_sets
    }

    /// The tag distinguishing blocks which share a set
    #[inline]
    pub fn tag(&self, address: u64) -> u64 {
        (address / self.line_size) / self.num_sets
    }

    /// Converts an address into a tag and a set index
    ///
    /// returns: (tag, index)
    #[inline]
    pub fn split(&self, address: u64) -> (u64, u64) {
        let block = address / self.line_size;
        (block / self.num_sets, block % self.num_sets)
    }

    /// Recombines a tag and set index into the block address (the address divided by the line
    /// size) they were decoded from
    ///
    /// Never overflows for values produced by [`AddressDecoder::split`]
    #[inline]
    pub fn block_address(&self, tag: u64, index: u64) -> u64 {
        tag * self.num_sets + index
    }

    pub fn get_line_size(&self) -> u64 {
        self.line_size
    }

    pub fn get_num_sets(&self) -> u64 {
        self.num_sets
    }
}
