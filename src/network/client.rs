//! Blocking client for the wire protocol

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{CoolDbError, Result};
use crate::protocol::{decode_key_list, read_response, write_command, Command, Response, Status};

/// A single connection to a CoolDB server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| CoolDbError::Network(format!("connect failed: {}", e)))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one command and wait for its response
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        let response = self.request(&Command::Get { key: key.to_string() })?;
        match response.status {
            Status::Ok => Ok(Some(response.payload_str())),
            Status::NotFound => Ok(None),
            Status::Error => Err(server_error(&response)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let response = self.request(&Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        expect_ok(&response)
    }

    pub fn delete(&mut self, key: &str) -> Result<()> {
        let response = self.request(&Command::Delete { key: key.to_string() })?;
        expect_ok(&response)
    }

    pub fn list(&mut self) -> Result<Vec<String>> {
        let response = self.request(&Command::List)?;
        expect_ok(&response)?;
        decode_key_list(response.payload.as_deref().unwrap_or(&[]))
    }

    pub fn status(&mut self) -> Result<String> {
        let response = self.request(&Command::Status)?;
        expect_ok(&response)?;
        Ok(response.payload_str())
    }

    pub fn ping(&mut self) -> Result<()> {
        let response = self.request(&Command::Ping)?;
        expect_ok(&response)
    }
}

fn expect_ok(response: &Response) -> Result<()> {
    match response.status {
        Status::Ok => Ok(()),
        Status::NotFound => Err(CoolDbError::Protocol("unexpected NOT_FOUND".to_string())),
        Status::Error => Err(server_error(response)),
    }
}

fn server_error(response: &Response) -> CoolDbError {
    CoolDbError::Network(format!("server error: {}", response.payload_str()))
}
