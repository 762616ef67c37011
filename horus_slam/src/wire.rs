//! Line-oriented, NUL-delimited wire protocol spoken with the remote
//! actuator/sensor host: outbound motion and scan commands, inbound
//! per-angle range frames terminated by a literal `END` record.

use crate::datapoint::ObservationType;
use crate::error::{SlamError, SlamResult};
use crate::geometry::Polar;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A single measurement parsed from an inbound `"angle distance [FREE]"`
/// frame.
#[derive(Debug, Clone, Copy)]
pub struct SensorMeasurement {
    pub polar: Polar,
    pub kind: ObservationType,
}

/// Outbound commands, encoded as space-separated tokens terminated by a
/// NUL byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Move { distance: f64 },
    Rotate { angle: f64 },
    Scan { precision: f64, count: f64, increasing: bool },
    RotateSensor { angle: f64 },
}

impl Command {
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let body = match self {
            Command::Move { distance } => format!("MOVE {distance}"),
            Command::Rotate { angle } => format!("ROTATE {angle}"),
            Command::Scan {
                precision,
                count,
                increasing,
            } => {
                let flag = if *increasing { "True" } else { "False" };
                format!("SCAN {precision} {count} {flag}")
            }
            Command::RotateSensor { angle } => format!("ROTATESENSOR {angle}"),
        };
        let mut bytes = body.into_bytes();
        bytes.push(0);
        bytes
    }
}

/// A NUL-delimited duplex connection to the remote host. Mirrors the
/// original `Socket` class: a growable receive buffer is scanned for the
/// next NUL byte rather than assuming one read equals one frame.
pub struct WireConnection<S> {
    stream: S,
    recv_buffer: Vec<u8>,
}

impl<S> WireConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            recv_buffer: Vec::new(),
        }
    }

    pub async fn send_command(&mut self, command: &Command) -> SlamResult<()> {
        self.stream.write_all(&command.to_wire_bytes()).await?;
        Ok(())
    }

    /// Reads bytes until a NUL byte appears in the buffer, then returns
    /// everything before it as a decoded `String`, leaving the remainder
    /// buffered for the next call.
    pub async fn receive_frame(&mut self) -> SlamResult<String> {
        loop {
            if let Some(pos) = self.recv_buffer.iter().position(|&b| b == 0) {
                let frame = self.recv_buffer.drain(..=pos).collect::<Vec<u8>>();
                let frame = &frame[..frame.len() - 1];
                return String::from_utf8(frame.to_vec())
                    .map_err(|e| SlamError::MalformedFrame(e.to_string()));
            }
            let mut chunk = [0u8; 1024];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(SlamError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "socket connection broken",
                )));
            }
            self.recv_buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Reads frames after a `SCAN` command until the literal `END` record,
    /// parsing each as `"angle distance [FREE]"`.
    pub async fn receive_scan(&mut self) -> SlamResult<Vec<SensorMeasurement>> {
        let mut measurements = Vec::new();
        loop {
            let frame = self.receive_frame().await?;
            if frame == "END" {
                return Ok(measurements);
            }
            measurements.push(parse_scan_frame(&frame)?);
        }
    }
}

/// Parses one `"angle distance [FREE]"` record into a [`SensorMeasurement`].
pub fn parse_scan_frame(frame: &str) -> SlamResult<SensorMeasurement> {
    let mut tokens = frame.split_whitespace();
    let angle: f64 = tokens
        .next()
        .ok_or_else(|| SlamError::MalformedFrame(frame.to_string()))?
        .parse()
        .map_err(|_| SlamError::MalformedFrame(frame.to_string()))?;
    let distance: f64 = tokens
        .next()
        .ok_or_else(|| SlamError::MalformedFrame(frame.to_string()))?
        .parse()
        .map_err(|_| SlamError::MalformedFrame(frame.to_string()))?;
    let kind = match tokens.next() {
        Some("FREE") => ObservationType::Free,
        Some(other) => return Err(SlamError::MalformedFrame(format!("unexpected token: {other}"))),
        None => ObservationType::Obstacle,
    };

    let polar = Polar::new(crate::geometry::Angle::new(angle), distance)?;
    Ok(SensorMeasurement { polar, kind })
}
