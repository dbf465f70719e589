//! Socket factory for hub connections

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A bidirectional byte stream to the hub
pub trait Connection: Read + Write + Send {}

impl<T: Read + Write + Send> Connection for T {}

/// Opens connections to a hub.
///
/// The returned stream must already have `timeout` applied to reads and
/// writes, so that a read blocked on an idle hub returns
/// `WouldBlock`/`TimedOut` instead of hanging forever.
pub trait Connector: Send + Sync {
    fn connect(&self, address: &str, port: u16, timeout: Duration) -> io::Result<Box<dyn Connection>>;
}

/// Plain TCP connector
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, address: &str, port: u16, timeout: Duration) -> io::Result<Box<dyn Connection>> {
        let mut last_err = None;
        for addr in (address, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(Box::new(stream));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not resolve to any address", address),
            )
        }))
    }
}
