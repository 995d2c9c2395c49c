//! Frame type

use serde::{Deserialize, Serialize};

/// Single-channel sample frame handed in by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame {
    samples: Vec<u8>,
}

impl Frame {
    /// Create a frame from raw samples
    pub fn new(samples: Vec<u8>) -> Self {
        Self { samples }
    }

    /// Raw samples
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the frame has no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<u8>> for Frame {
    fn from(samples: Vec<u8>) -> Self {
        Self::new(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_kept_verbatim() {
        let frame = Frame::from(vec![0, 255, 128, 64]);
        assert_eq!(frame.samples(), &[0, 255, 128, 64]);
        assert!(!frame.is_empty());
        assert!(Frame::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_transparent_serde() {
        let frame: Frame = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(frame.len(), 3);
    }
}
