//! Model configuration

/// Default number of rows requested per incremental fetch.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Configuration for a [`DicomModel`](crate::DicomModel).
///
/// # Example
///
/// ```
/// use dicomtree_lib::ModelConfig;
///
/// let config = ModelConfig::default().with_page_size(64);
/// assert_eq!(config.page_size, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Rows requested by each `fetch_more`, by the prefetch done before a
    /// value lookup, and by the initial fetch of the root.
    ///
    /// Default: 256
    pub page_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ModelConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_size() {
        assert_eq!(ModelConfig::new().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_zero_page_size_is_raised() {
        assert_eq!(ModelConfig::new().with_page_size(0).page_size, 1);
    }
}
