//! Image configuration parameters.

/// Configuration for building a memory image.
///
/// Controls the addressable bound of the target memory and how duplicate
/// instance placement is treated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageConfig {
    /// Maximum image size in bytes.
    ///
    /// Default: 256 pages of 64 KiB (16 MiB), the maximum declared for the
    /// emitted module's memory. Values above `u32::MAX` are clamped, since
    /// offsets are 32-bit and `u32::MAX` is reserved as the unset sentinel.
    pub max_bytes: u64,

    /// Reject an instance listed by more than one world.
    ///
    /// When `false` (the default) the last world to list the instance wins
    /// and a warning is logged.
    pub strict_placement: bool,
}

impl ImageConfig {
    /// Size of one linear-memory page in bytes.
    pub const PAGE_SIZE: u64 = 65_536;

    /// Default maximum page count.
    pub const DEFAULT_MAX_PAGES: u64 = 256;

    /// Create a config with the default bound and lenient placement.
    pub fn new() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_PAGES * Self::PAGE_SIZE,
            strict_placement: false,
        }
    }

    /// Bound the image to `pages` linear-memory pages.
    pub fn with_max_pages(mut self, pages: u64) -> Self {
        self.max_bytes = pages.saturating_mul(Self::PAGE_SIZE);
        self
    }

    /// Turn duplicate placement into an error.
    pub fn strict(mut self) -> Self {
        self.strict_placement = true;
        self
    }

    /// The bound actually enforced by the allocator.
    pub fn effective_limit(&self) -> u64 {
        self.max_bytes.min(u64::from(u32::MAX))
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sixteen_mib() {
        assert_eq!(ImageConfig::default().max_bytes, 16 * 1024 * 1024);
        assert!(!ImageConfig::default().strict_placement);
    }

    #[test]
    fn limit_clamped_below_sentinel() {
        let config = ImageConfig::new().with_max_pages(u64::MAX);
        assert_eq!(config.effective_limit(), u64::from(u32::MAX));
    }
}
