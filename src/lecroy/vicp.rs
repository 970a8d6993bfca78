//! VICP framing over TCP.
//!
//! LeCroy instruments wrap every message in one or more blocks, each led by an
//! 8-byte header: operation flags, header version, sequence number, a spare
//! byte and the big-endian payload length. A message ends with the block that
//! carries the EOI flag.

use byteorder::{BigEndian, ByteOrder};
use log::{debug, info, warn};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::transport::Transport;
use crate::error::ScopeError;

pub const DEFAULT_PORT: u16 = 1861;
pub const HEADER_SIZE: usize = 8;
pub const HEADER_VERSION: u8 = 1;
pub const MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024; // 100MB

pub const OP_DATA: u8 = 0x80;
pub const OP_SRQ: u8 = 0x08;
pub const OP_EOI: u8 = 0x01;

/// Connection configuration for the VICP transport.
///
/// `read_timeout` becomes the session's baseline timeout.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,
    /// Timeout for reading one reply from the instrument
    pub read_timeout: Duration,
    /// Timeout for writing one command to the instrument
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockHeader {
    operation: u8,
    sequence: u8,
    length: u32,
}

impl BlockHeader {
    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.operation;
        buf[1] = HEADER_VERSION;
        buf[2] = self.sequence;
        BigEndian::write_u32(&mut buf[4..8], self.length);
        buf
    }

    fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, ScopeError> {
        if buf[1] != HEADER_VERSION {
            return Err(ScopeError::Protocol(format!(
                "Unsupported VICP header version {}",
                buf[1]
            )));
        }
        Ok(Self {
            operation: buf[0],
            sequence: buf[2],
            length: BigEndian::read_u32(&buf[4..8]),
        })
    }
}

/// Low-level VICP block handling
pub struct Vicp;

impl Vicp {
    /// Send `data` as a single block terminated with EOI.
    pub fn write_message(
        writer: &mut dyn Write,
        sequence: u8,
        data: &[u8],
    ) -> Result<(), ScopeError> {
        let length = u32::try_from(data.len()).map_err(|_| {
            ScopeError::InvalidCommand(format!("Command of {} bytes is too long", data.len()))
        })?;
        let header = BlockHeader {
            operation: OP_DATA | OP_EOI,
            sequence,
            length,
        };

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&header.to_bytes());
        frame.extend_from_slice(data);

        writer
            .write_all(&frame)
            .and_then(|_| writer.flush())
            .map_err(|e| ScopeError::io(e, "Writing VICP block"))
    }

    /// Read blocks until one carries EOI and return the concatenated payload.
    ///
    /// Data blocks whose sequence number differs from `sequence` are stale
    /// replies to earlier commands and are discarded. A sequence of 0 in a
    /// block means the instrument does not number its replies.
    ///
    /// `timeout` is only used to label a timed-out read.
    pub fn read_message(
        reader: &mut dyn Read,
        sequence: u8,
        timeout: Duration,
    ) -> Result<Vec<u8>, ScopeError> {
        let mut message = Vec::new();

        loop {
            let mut raw_header = [0u8; HEADER_SIZE];
            reader
                .read_exact(&mut raw_header)
                .map_err(|e| map_read_error(e, timeout, "Reading VICP header"))?;
            let header = BlockHeader::from_bytes(&raw_header)?;
            let length = header.length as usize;

            if message.len() + length > MAX_RESPONSE_SIZE {
                return Err(ScopeError::Protocol(format!(
                    "Response size {} exceeds maximum {}",
                    message.len() + length,
                    MAX_RESPONSE_SIZE
                )));
            }

            let mut payload = vec![0u8; length];
            reader
                .read_exact(&mut payload)
                .map_err(|e| map_read_error(e, timeout, "Reading VICP payload"))?;

            if header.operation & OP_DATA == 0 {
                debug!(
                    "Ignoring non-data block (op {:#04x}, seq {}, {} bytes)",
                    header.operation, header.sequence, length
                );
                continue;
            }
            if header.sequence != 0 && header.sequence != sequence {
                warn!(
                    "Discarding stale reply block (seq {}, expected {sequence}, {} bytes)",
                    header.sequence, length
                );
                continue;
            }

            message.extend_from_slice(&payload);
            if header.operation & OP_EOI != 0 {
                return Ok(message);
            }
        }
    }
}

fn map_read_error(e: io::Error, timeout: Duration, context: &str) -> ScopeError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ScopeError::Timeout(timeout),
        _ => ScopeError::io(e, context),
    }
}

/// Strip one trailing `\n` or `\r\n`.
fn strip_terminator(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    line
}

/// VICP client connection to one instrument.
pub struct VicpTransport {
    stream: TcpStream,
    sequence: u8,
    timeout: Duration,
}

impl VicpTransport {
    pub fn connect(
        address: &str,
        port: u16,
        config: &ConnectionConfig,
    ) -> Result<Self, ScopeError> {
        let socket_addr: SocketAddr = (address, port)
            .to_socket_addrs()
            .map_err(|_| ScopeError::InvalidAddress(address.to_string()))?
            .next()
            .ok_or_else(|| ScopeError::InvalidAddress(address.to_string()))?;

        debug!("Connecting to {socket_addr}");

        let stream =
            TcpStream::connect_timeout(&socket_addr, config.connect_timeout).map_err(|e| {
                warn!("Failed to connect to {socket_addr}: {e}");
                if e.kind() == io::ErrorKind::TimedOut {
                    ScopeError::Timeout(config.connect_timeout)
                } else {
                    ScopeError::io(e, format!("Failed to connect to {socket_addr}"))
                }
            })?;

        stream
            .set_nodelay(true)
            .map_err(|e| ScopeError::io(e, "Disabling Nagle"))?;
        stream
            .set_write_timeout(Some(config.write_timeout))
            .map_err(|e| ScopeError::io(e, "Setting write timeout"))?;

        let mut transport = Self {
            stream,
            sequence: 0,
            timeout: config.read_timeout,
        };
        transport.set_timeout(config.read_timeout)?;

        info!("Connected to instrument at {socket_addr}");
        Ok(transport)
    }

    /// Sequence numbers run 1..=255 and never take the value 0. The current
    /// value is the one used by the last write, which replies must carry.
    fn next_sequence(&mut self) -> u8 {
        self.sequence = if self.sequence == u8::MAX {
            1
        } else {
            self.sequence + 1
        };
        self.sequence
    }
}

impl Transport for VicpTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), ScopeError> {
        let sequence = self.next_sequence();
        Vicp::write_message(&mut self.stream, sequence, data)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ScopeError> {
        Vicp::read_message(&mut self.stream, self.sequence, self.timeout).map(strip_terminator)
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, ScopeError> {
        Vicp::read_message(&mut self.stream, self.sequence, self.timeout)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        if timeout.is_zero() {
            return Err(ScopeError::InvalidValue(
                "Read timeout must be non-zero".to_string(),
            ));
        }
        self.stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| ScopeError::io(e, "Setting read timeout"))?;
        self.timeout = timeout;
        Ok(())
    }
}
