use std::io::{self, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{DongleInfo, DONGLE_INFO_LEN};

/// Pulls fixed-size buffers of raw IQ bytes from an rtl_tcp stream
pub struct IqStreamReader<R: Read> {
    reader: R,
}

impl<R: Read> IqStreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Block until `buffer` is full or the stream ends.
    ///
    /// Returns the number of bytes read. Anything less than `buffer.len()`
    /// means the peer closed the connection or the read failed; the caller
    /// decides how to treat it. Short reads are never retried.
    pub fn read_buffer(&mut self, buffer: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Read failed after {} bytes: {}", filled, e);
                    break;
                }
            }
        }
        filled
    }

    /// Consume the 12-byte rtl_tcp greeting.
    ///
    /// The bytes are discarded even when the magic does not match; the
    /// length is even, so I/Q alignment of the following data is kept.
    pub fn read_dongle_info(&mut self) -> Option<DongleInfo> {
        let mut header = [0u8; DONGLE_INFO_LEN];
        let n = self.read_buffer(&mut header);
        if n < DONGLE_INFO_LEN {
            warn!("Stream ended while reading dongle info ({} bytes)", n);
            return None;
        }

        match DongleInfo::parse(&header) {
            Some(info) => {
                info!(
                    "Tuner: {} ({} gain steps)",
                    info.tuner_name(),
                    info.gain_count
                );
                Some(info)
            }
            None => {
                warn!("No rtl_tcp greeting found, skipped {} bytes", DONGLE_INFO_LEN);
                None
            }
        }
    }
}

/// Data and control halves of a tuner connection
pub struct Connection<R: Read, W: Write> {
    pub stream: IqStreamReader<R>,
    pub control: W,
}

impl Connection<BufReader<TcpStream>, TcpStream> {
    /// Resolve `addr` and connect to the rtl_tcp server
    pub fn open(addr: &str) -> Result<Self> {
        let addrs = resolve(addr)?;

        info!("Connecting to {}", addr);
        let socket = TcpStream::connect(&addrs[..]).map_err(|source| Error::Connection {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_nodelay(true)?;
        info!("Connection established");

        let control = socket.try_clone()?;
        Ok(Self {
            stream: IqStreamReader::new(BufReader::new(socket)),
            control,
        })
    }
}

fn resolve(addr: &str) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|source| Error::Address {
            addr: addr.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(Error::Address {
            addr: addr.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "no addresses resolved"),
        });
    }
    debug!("Resolved {} to {:?}", addr, addrs);
    Ok(addrs)
}
