//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET:    key_len (4 bytes) + key
//! - SET:    key_len (4 bytes) + key + value
//! - DELETE: key_len (4 bytes) + key
//! - PING, LIST, STATUS: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! A LIST response payload is `count (4) + (key_len (4) + key)*`.
//! All lengths are big-endian; keys and values are UTF-8.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CoolDbError, Result};
use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();
    match command {
        Command::Get { key } | Command::Delete { key } => {
            put_string(&mut payload, key);
        }
        Command::Set { key, value } => {
            put_string(&mut payload, key);
            payload.put_slice(value.as_bytes());
        }
        Command::Ping | Command::List | Command::Status => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, mut payload) = split_frame(bytes, "command")?;

    let command = match cmd_type {
        0x01 => Command::Get {
            key: take_string(&mut payload, "GET key")?,
        },
        0x02 => {
            let key = take_string(&mut payload, "SET key")?;
            let value = utf8(payload, "SET value")?;
            payload = &[];
            Command::Set { key, value }
        }
        0x03 => Command::Delete {
            key: take_string(&mut payload, "DELETE key")?,
        },
        0x04 => Command::Ping,
        0x05 => Command::List,
        0x06 => Command::Status,
        _ => {
            return Err(CoolDbError::Protocol(format!(
                "Unknown command type: 0x{:02x}",
                cmd_type
            )))
        }
    };

    if !payload.is_empty() {
        return Err(CoolDbError::Protocol(format!(
            "{:?} command: {} unexpected trailing bytes",
            command.command_type(),
            payload.len()
        )));
    }

    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
///
/// A payload over [`MAX_PAYLOAD_SIZE`] would be rejected by the reader, so it
/// is replaced by an ERROR response saying so.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    if let Err(e) = check_payload_len(payload.len(), "Response payload") {
        tracing::warn!(len = payload.len(), "response exceeds frame limit");
        return frame(Status::Error as u8, e.to_string().as_bytes());
    }
    frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(CoolDbError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

/// Encode a key list for a LIST response payload
pub fn encode_key_list(keys: &[String]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(4 + keys.iter().map(|k| 4 + k.len()).sum::<usize>());
    buf.put_u32(keys.len() as u32);
    for key in keys {
        put_string(&mut buf, key);
    }
    buf.to_vec()
}

/// Decode a LIST response payload
pub fn decode_key_list(mut payload: &[u8]) -> Result<Vec<String>> {
    if payload.remaining() < 4 {
        return Err(CoolDbError::Protocol("LIST payload: missing count".to_string()));
    }
    let count = payload.get_u32() as usize;

    let mut keys = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        keys.push(take_string(&mut payload, "LIST key")?);
    }
    Ok(keys)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, "Payload")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "Response payload")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Internal helpers
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Validate a frame and return its tag and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(CoolDbError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let tag = header.get_u8();
    let payload_len = header.get_u32() as usize;
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(CoolDbError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = (&header[1..]).get_u32() as usize;
    check_payload_len(payload_len, what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;
    Ok(message)
}

fn check_payload_len(len: usize, what: &str) -> Result<()> {
    if len > MAX_PAYLOAD_SIZE as usize {
        return Err(CoolDbError::Protocol(format!(
            "{} too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Consume a length-prefixed UTF-8 string
fn take_string(buf: &mut &[u8], what: &str) -> Result<String> {
    if buf.remaining() < 4 {
        return Err(CoolDbError::Protocol(format!("{}: missing length", what)));
    }
    let len = buf.get_u32() as usize;

    if buf.remaining() < len {
        return Err(CoolDbError::Protocol(format!(
            "{}: incomplete (expected {}, got {})",
            what,
            len,
            buf.remaining()
        )));
    }

    let s = utf8(&buf[..len], what)?;
    buf.advance(len);
    Ok(s)
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CoolDbError::Protocol(format!("{}: invalid UTF-8", what)))
}
