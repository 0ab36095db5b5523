//! Encoding messages to the protobuf wire format and decoding them back.
//!
//! Encoding writes known fields in ascending field number order followed by
//! unknown records in the order they were received. Decoding is a single
//! left-to-right pass that fails on the first structural error without
//! producing a message.

mod decode;
mod encode;

use std::io::{self, Read, Write};
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes};

use crate::error::{DecodeError, Error};
use crate::schema::MessageDescriptor;
use crate::wire::{encode_varint, encoded_varint_len};
use crate::Message;

pub use decode::{DecodeOptions, DEFAULT_RECURSION_LIMIT};

/// Encode `message` into a new buffer.
pub fn encode(message: &Message) -> Vec<u8> {
    message.encode_to_vec()
}

/// Decode `data` as a message of type `descriptor` with default options.
pub fn decode<B: Buf>(
    data: B,
    descriptor: &Arc<MessageDescriptor>,
) -> Result<Message, DecodeError> {
    DecodeOptions::default().decode(descriptor, data)
}

impl Message {
    /// Encode this message into `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        encode::encode_message(self, buf);
    }

    /// Number of bytes [`Message::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        encode::encoded_message_len(self)
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf
    }

    pub fn encode_to_bytes(&self) -> Bytes {
        Bytes::from(self.encode_to_vec())
    }

    /// Encode with a varint length prefix, for streams of messages.
    pub fn encode_length_delimited<B: BufMut>(&self, buf: &mut B) {
        encode_varint(self.encoded_len() as u64, buf);
        self.encode(buf);
    }

    /// Write the raw encoding to `writer`, without any framing.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(&self.encode_to_vec())?;
        Ok(())
    }

    /// Write the encoding prefixed with its length as a varint.
    pub fn write_length_delimited_to<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let len = self.encoded_len();
        let mut buf = Vec::with_capacity(encoded_varint_len(len as u64) + len);
        self.encode_length_delimited(&mut buf);
        writer.write_all(&buf)?;
        Ok(())
    }

    /// Decode `data` as a message of type `descriptor`.
    ///
    /// Unknown fields are preserved and unknown enum numbers kept as is.
    /// Fields missing from `data` read as their zero values.
    ///
    /// ```
    /// use protodrift::schema::{FieldKind, MessageDescriptor};
    /// use protodrift::Message;
    ///
    /// let user = MessageDescriptor::builder("User")
    ///     .field(1, "id", FieldKind::Int64)
    ///     .build()
    ///     .unwrap();
    ///
    /// let message = Message::decode(&user, &[0x08, 0x2a][..]).unwrap();
    /// assert_eq!(message.get_i64("id").unwrap(), 42);
    /// ```
    pub fn decode<B: Buf>(
        descriptor: &Arc<MessageDescriptor>,
        data: B,
    ) -> Result<Message, DecodeError> {
        DecodeOptions::default().decode(descriptor, data)
    }

    pub fn decode_with_options<B: Buf>(
        descriptor: &Arc<MessageDescriptor>,
        data: B,
        options: &DecodeOptions,
    ) -> Result<Message, DecodeError> {
        options.decode(descriptor, data)
    }

    /// Decode a length prefixed message from the front of `buf`, advancing
    /// past it.
    pub fn decode_length_delimited<B: Buf>(
        descriptor: &Arc<MessageDescriptor>,
        buf: &mut B,
    ) -> Result<Message, DecodeError> {
        let data = crate::wire::decode_len_delimited(buf)?;
        Message::decode(descriptor, data)
    }

    /// Read `reader` to its end and decode everything read.
    pub fn read_from<R: Read>(
        descriptor: &Arc<MessageDescriptor>,
        mut reader: R,
    ) -> Result<Message, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Message::decode(descriptor, Bytes::from(data))?)
    }

    /// Read one length prefixed message from `reader`.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a new message.
    pub fn read_length_delimited_from<R: Read>(
        descriptor: &Arc<MessageDescriptor>,
        mut reader: R,
    ) -> Result<Option<Message>, Error> {
        let Some(len) = read_length_prefix(&mut reader)? else {
            return Ok(None);
        };
        let len = usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })?;

        let mut data = Vec::new();
        reader.take(len as u64).read_to_end(&mut data)?;
        if data.len() < len {
            return Err(DecodeError::truncated().into());
        }
        Ok(Some(Message::decode(descriptor, Bytes::from(data))?))
    }
}

/// Read a varint byte by byte, `None` on end of stream before the first byte.
fn read_length_prefix<R: Read>(reader: &mut R) -> Result<Option<u64>, Error> {
    let mut scratch = [0u8; 10];
    let mut len = 0;
    loop {
        let mut byte = [0u8; 1];
        match reader.read(&mut byte) {
            Ok(0) if len == 0 => return Ok(None),
            Ok(0) => return Err(DecodeError::truncated().into()),
            Ok(_) => {
                scratch[len] = byte[0];
                len += 1;
                if byte[0] < 0x80 || len == scratch.len() {
                    break;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    let (value, _) = crate::wire::decode_varint(&scratch[..len], 0)?;
    Ok(Some(value))
}
