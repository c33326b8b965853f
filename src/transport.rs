//! Serial line transport
//!
//! The bridge pulls one line at a time through [`LineSource`]. A read that
//! times out with nothing buffered yields `Ok(None)` and the caller simply
//! asks again. Bytes are never carried over between calls: if a timeout cuts
//! a record in half, each half is handed out as its own (undecodable) line.
//! The same applies to a line that runs past [`MAX_LINE_LENGTH`] bytes.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::thread;

use serialport::{SerialPort, SerialPortType};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SerialConfig;

/// Longest line handed out in one piece (including the newline).
pub const MAX_LINE_LENGTH: usize = 256;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("serial device closed the connection")]
    Closed,

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),
}

/// Pull-based source of raw protocol lines.
pub trait LineSource {
    /// Block until a line is available or the read timeout expires.
    ///
    /// `Ok(None)` means the timeout expired with no data.
    fn next_line(&mut self) -> Result<Option<String>, TransportError>;
}

/// Newline splitter over any byte reader.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(64),
        }
    }

    fn take_line(&mut self) -> String {
        let line = decode_lossy(&self.buf);
        self.buf.clear();
        line
    }
}

impl<R: Read> LineSource for LineReader<R> {
    fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        self.buf.clear();
        let mut limited = (&mut self.reader).take(MAX_LINE_LENGTH as u64);
        match limited.read_until(b'\n', &mut self.buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => {
                if n == MAX_LINE_LENGTH && self.buf.last() != Some(&b'\n') {
                    debug!("Line exceeded {} bytes, handing out fragment", MAX_LINE_LENGTH);
                }
                Ok(Some(self.take_line()))
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                if self.buf.is_empty() {
                    Ok(None)
                } else {
                    debug!("Read timed out mid-line ({} bytes)", self.buf.len());
                    Ok(Some(self.take_line()))
                }
            }
            Err(e) => Err(TransportError::Read(e)),
        }
    }
}

/// Decode bytes as UTF-8, dropping anything that isn't.
fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Serial port opened once at startup.
pub struct SerialTransport {
    port: String,
    lines: LineReader<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the configured port and wait out the settle delay.
    ///
    /// Many boards reset when the port is opened, so nothing is read until
    /// `settle_delay_ms` has elapsed.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        info!("Opening serial port {} @ {} baud", config.port, config.baud);

        let port = serialport::new(config.port.as_str(), config.baud)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        let settle = config.settle_delay();
        if !settle.is_zero() {
            debug!("Waiting {:?} for device to settle", settle);
            thread::sleep(settle);
        }

        Ok(Self {
            port: config.port.clone(),
            lines: LineReader::new(port),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port
    }
}

impl LineSource for SerialTransport {
    fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        self.lines.next_line()
    }
}

/// Print available serial ports.
pub fn list_ports_formatted() -> Result<(), TransportError> {
    use colored::*;

    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;

    println!("\n{}", "=== Available Serial Ports ===".bold().cyan());

    if ports.is_empty() {
        println!("  {}", "No serial ports found".dimmed());
        return Ok(());
    }

    for port in ports {
        match port.port_type {
            SerialPortType::UsbPort(usb) => {
                let product = usb.product.unwrap_or_default();
                println!(
                    "  {} {} {:04x}:{:04x} {}",
                    "[USB]".green(),
                    port.port_name.bright_white(),
                    usb.vid,
                    usb.pid,
                    product.dimmed()
                );
            }
            SerialPortType::BluetoothPort => {
                println!("  {} {}", "[BT]".blue(), port.port_name);
            }
            SerialPortType::PciPort => {
                println!("  {} {}", "[PCI]".yellow(), port.port_name);
            }
            SerialPortType::Unknown => {
                println!("  {} {}", "[?]".dimmed(), port.port_name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Reader that replays scripted chunks and errors, then reports EOF.
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(chunk)) => {
                    out[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::TimedOut, "timed out"))
    }

    #[test]
    fn test_reads_complete_lines() {
        let mut reader = LineReader::new(ScriptedReader::new(vec![Ok(
            b"1,2,0,0\r\n3,4,1,0\n".to_vec()
        )]));

        assert_eq!(reader.next_line().unwrap().as_deref(), Some("1,2,0,0\r\n"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("3,4,1,0\n"));
        assert!(matches!(reader.next_line(), Err(TransportError::Closed)));
    }

    #[test]
    fn test_timeout_without_data_is_none() {
        let mut reader = LineReader::new(ScriptedReader::new(vec![
            timeout(),
            Ok(b"0,0,1,0\n".to_vec()),
        ]));

        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("0,0,1,0\n"));
    }

    #[test]
    fn test_timeout_mid_line_yields_fragments() {
        let mut reader = LineReader::new(ScriptedReader::new(vec![
            Ok(b"12,-4".to_vec()),
            timeout(),
            Ok(b",1,0\n".to_vec()),
        ]));

        assert_eq!(reader.next_line().unwrap().as_deref(), Some("12,-4"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some(",1,0\n"));
    }

    #[test]
    fn test_invalid_utf8_dropped() {
        let mut reader = LineReader::new(ScriptedReader::new(vec![Ok(
            b"1,\xff2,0,0\n".to_vec()
        )]));

        assert_eq!(reader.next_line().unwrap().as_deref(), Some("1,2,0,0\n"));
    }

    #[test]
    fn test_runaway_line_is_split_at_cap() {
        let mut long = vec![b'7'; MAX_LINE_LENGTH + 10];
        long.push(b'\n');
        let mut reader = LineReader::new(ScriptedReader::new(vec![
            Ok(long),
            Ok(b"1,1,0,0\n".to_vec()),
        ]));

        let first = reader.next_line().unwrap().unwrap();
        assert_eq!(first.len(), MAX_LINE_LENGTH);
        assert!(!first.ends_with('\n'));

        let rest = reader.next_line().unwrap().unwrap();
        assert_eq!(rest, format!("{}\n", "7".repeat(10)));

        assert_eq!(reader.next_line().unwrap().as_deref(), Some("1,1,0,0\n"));
    }

    #[test]
    fn test_open_missing_device_fails() {
        let config = SerialConfig {
            port: "/dev/does-not-exist".to_string(),
            settle_delay_ms: 0,
            ..SerialConfig::default()
        };

        let err = match SerialTransport::open(&config) {
            Ok(_) => panic!("opening a missing device must fail"),
            Err(e) => e,
        };

        assert!(matches!(
            err,
            TransportError::Open { ref port, .. } if port == "/dev/does-not-exist"
        ));
        assert!(err.to_string().contains("/dev/does-not-exist"));
    }

    #[test]
    fn test_hard_io_error_propagates() {
        let mut reader = LineReader::new(ScriptedReader::new(vec![Err(io::Error::new(
            ErrorKind::BrokenPipe,
            "unplugged",
        ))]));

        assert!(matches!(reader.next_line(), Err(TransportError::Read(_))));
    }
}
