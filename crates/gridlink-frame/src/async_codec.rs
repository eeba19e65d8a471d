//! `tokio_util` codec for hosts that drive the serial port asynchronously.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, FrameConfig, Inbound, OutgoingFrame, OUTGOING_FRAME_SIZE};
use crate::error::FrameError;

/// Decodes [`Inbound`] units and encodes [`OutgoingFrame`]s with the same
/// rules as [`crate::Reassembler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GridCodec {
    config: FrameConfig,
}

impl GridCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for GridCodec {
    type Item = Inbound;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_frame(src, &self.config)
    }
}

impl Encoder<OutgoingFrame> for GridCodec {
    type Error = FrameError;

    fn encode(&mut self, item: OutgoingFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(OUTGOING_FRAME_SIZE);
        dst.put_slice(&item.to_bytes());
        Ok(())
    }
}
