//! Byte stream reassembly and frame decoding
//!
//! [`ReassemblyBuffer`] accumulates the bytes of one origin, and
//! [`FrameDecoder::decode_one`] inspects it for the first complete frame.
//! Neither keeps cross-call state beyond the buffered bytes; the
//! [`StreamDispatcher`](crate::dispatcher::StreamDispatcher) drives the loop.

pub mod buffer;
pub mod frame_decoder;
pub mod identifier;

pub use buffer::ReassemblyBuffer;
pub use frame_decoder::{
    DecodeOutcome, DecoderOptions, FrameDecoder, NO_READING, RssiMode, UnrecognizedReason,
    decode_signal_strength,
};
pub use identifier::{DefaultIdentifierExtractor, IdentifierExtractor};
