//! Tensor Encoder
//!
//! Converts raw sample frames (0-255 pixel intensities) into normalized
//! float tensors matching a model's declared input length.

mod encoder;
mod error;
mod frame;

pub use encoder::{ByteOrder, EncodedTensor, TensorEncoder, NORMALIZATION_SCALE};
pub use error::EncodeError;
pub use frame::Frame;
