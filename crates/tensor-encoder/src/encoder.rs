//! Frame to tensor encoding

use crate::{EncodeError, Frame};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Samples are mapped into [0, 1] by dividing by this value
pub const NORMALIZATION_SCALE: f32 = 255.0;

/// Byte order of a serialized tensor buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
    /// Host byte order, what most runtimes map directly
    #[default]
    Native,
}

/// Normalized float tensor derived from a frame
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTensor {
    values: Vec<f32>,
}

impl EncodedTensor {
    /// Wrap already-normalized values
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Normalized values
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the tensor is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize into a raw float buffer, 4 bytes per element
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.values.len() * std::mem::size_of::<f32>());
        for value in &self.values {
            let bytes = match order {
                ByteOrder::Little => value.to_le_bytes(),
                ByteOrder::Big => value.to_be_bytes(),
                ByteOrder::Native => value.to_ne_bytes(),
            };
            buffer.extend_from_slice(&bytes);
        }
        buffer
    }

    /// Consume into the underlying values
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Encoder bound to a model's expected input length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorEncoder {
    input_len: usize,
}

impl TensorEncoder {
    /// Create an encoder for a model taking `input_len` elements
    pub fn new(input_len: usize) -> Self {
        Self { input_len }
    }

    /// Expected input length
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Encode raw samples into a normalized tensor
    pub fn encode(&self, samples: &[u8]) -> Result<EncodedTensor, EncodeError> {
        if samples.len() != self.input_len {
            return Err(EncodeError::ShapeMismatch {
                expected: self.input_len,
                actual: samples.len(),
            });
        }

        let values = samples
            .iter()
            .map(|&s| s as f32 / NORMALIZATION_SCALE)
            .collect();

        trace!("Encoded {} samples", self.input_len);
        Ok(EncodedTensor { values })
    }

    /// Encode a frame
    pub fn encode_frame(&self, frame: &Frame) -> Result<EncodedTensor, EncodeError> {
        self.encode(frame.samples())
    }
}
