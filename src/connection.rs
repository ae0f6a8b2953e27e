// ABOUTME: Frame-based I/O for an SMPP session over any async byte stream
// ABOUTME: Plain TCP and TLS-wrapped TCP share the same buffering and parsing path

use crate::codec::{CodecError, Frame, PduHeader};
use crate::datatypes::CommandId;
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::trace;

/// Errors raised while moving frames over the wire.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("connection reset by peer")]
    Reset,

    /// A complete PDU arrived but its content did not decode. The PDU has
    /// been consumed and the stream is still framed.
    #[error("malformed {command_id:?} PDU (sequence {sequence_number}): {source}")]
    Malformed {
        command_id: CommandId,
        sequence_number: u32,
        #[source]
        source: CodecError,
    },
}

/// SMPP v3.4 Connection Management
///
/// Handles frame-based communication for an SMPP session. The stream is
/// usually a `TcpStream`, or a `tokio_rustls::client::TlsStream` when the
/// session is encrypted; tests drive it with `tokio::io::duplex`.
///
/// ## SMPP v3.4 Session States (Section 2.1)
///
/// ```text
/// CLOSED → OPEN → BOUND_TX → UNBOUND → CLOSED
/// ```
///
/// - **OPEN**: connection established but no SMPP bind completed
/// - **BOUND_TX**: bound as transmitter (submit_sm, query_sm, enquire_link, unbind)
/// - **UNBOUND**: unbind initiated, session terminating
///
/// `Connection` does not track session state. The transmitter session task
/// owns the state machine and decides which PDUs are legal when.
#[derive(Debug)]
pub struct Connection<S> {
    // Write level buffering; every frame is flushed once fully written.
    stream: BufWriter<S>,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new `Connection`, backed by `stream`. Read and write buffers
    /// are initialized.
    pub fn new(stream: S) -> Connection<S> {
        Connection {
            stream: BufWriter::new(stream),
            // 4KB comfortably holds several session PDUs, which are all small.
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// Waits until enough data has arrived to parse a frame. Data remaining
    /// in the read buffer after the frame has been parsed is kept for the
    /// next call.
    ///
    /// Returns `None` when the peer closed the stream on a frame boundary.
    /// This method is cancel safe: dropping the future never loses bytes.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // `0` indicates "end of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // A clean shutdown leaves nothing half-read in the buffer.
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ConnectionError::Reset)
                };
            }
        }
    }

    /// Tries to parse a frame from the buffer. If the buffer contains enough
    /// data, the frame is returned and the data removed from the buffer. If not
    /// enough data has been buffered yet, `Ok(None)` is returned. A PDU with a
    /// valid length but undecodable content is dropped from the buffer and
    /// reported as `ConnectionError::Malformed`; any other `Err` leaves the
    /// stream unusable.
    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        let mut buf = Cursor::new(&self.buffer[..]);

        match Frame::check(&mut buf) {
            Ok(len) => {
                buf.set_position(0);
                match Frame::parse(&mut buf) {
                    Ok(frame) => {
                        self.buffer.advance(len);
                        trace!("<- {:?}", frame);
                        Ok(Some(frame))
                    }
                    // command_length was sane, so skip just this PDU
                    Err(source) => {
                        let mut header = &self.buffer[4..PduHeader::SIZE];
                        let command_id = CommandId::from(header.get_u32());
                        header.advance(4);
                        let sequence_number = header.get_u32();

                        self.buffer.advance(len);
                        Err(ConnectionError::Malformed {
                            command_id,
                            sequence_number,
                            source,
                        })
                    }
                }
            }
            // Not a failure: wait for more bytes from the socket.
            Err(CodecError::Incomplete) => Ok(None),
            // Unframeable; the caller drops the session.
            Err(e) => Err(e.into()),
        }
    }

    /// Write a single `Frame` value to the underlying stream and flush it.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        let bytes = frame.to_bytes()?;
        trace!("-> {:?}", frame);

        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// Flush and shut down the write half of the stream.
    ///
    /// For TLS this sends close_notify before the TCP FIN.
    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
