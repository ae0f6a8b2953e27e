// ABOUTME: Background task that owns a transmitter connection from TCP connect to unbind
// ABOUTME: Binds, reports the outcome once, then keeps the session alive until asked to close

use crate::client::error::{SmppError, SmppResult};
use crate::client::keepalive::{KeepAliveConfig, KeepAliveManager};
use crate::client::tls;
use crate::client::transmitter::Transmitter;
use crate::client::types::{BindCredentials, BindStatus};
use crate::codec::{CodecError, Frame};
use crate::connection::{Connection, ConnectionError};
use crate::datatypes::{
    BindTransmitter, BindTransmitterResponse, CommandId, CommandStatus, EnquireLink,
    EnquireLinkResponse, GenericNack, Unbind, UnbindResponse,
};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

/// Handle to a running transmitter session.
///
/// Dropping the handle asks the session task to unbind and disconnect in
/// the background. `close` does the same and waits for it to finish.
#[derive(Debug)]
pub struct Session {
    addr: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn new(addr: String, shutdown: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// SMSC address this session was opened against.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// True once the session task has exited, whether by bind failure,
    /// link loss, SMSC unbind, or close.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Unbind from the SMSC and wait for the connection to be torn down.
    pub async fn close(mut self) {
        self.signal_shutdown();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("session task for {} ended abnormally: {}", self.addr, e);
            }
        }
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The task may already be gone; nothing left to stop then.
            let _ = tx.send(());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

/// Byte stream a session runs over: plain TCP or TLS-wrapped TCP.
pub(crate) trait SessionStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SessionStream for T {}

/// SMPP sequence numbers run 0x00000001..=0x7FFFFFFF and then wrap.
#[derive(Debug)]
pub(crate) struct SequenceNumber(u32);

impl SequenceNumber {
    const MAX: u32 = 0x7FFF_FFFF;

    pub(crate) fn new() -> Self {
        Self(0)
    }

    pub(crate) fn next(&mut self) -> u32 {
        self.0 = if self.0 >= Self::MAX { 1 } else { self.0 + 1 };
        self.0
    }
}

/// Entry point of the task spawned by `Transmitter::bind`.
pub(crate) async fn run(
    transmitter: Transmitter,
    report: oneshot::Sender<BindStatus>,
    shutdown: oneshot::Receiver<()>,
) {
    let Transmitter {
        addr,
        credentials,
        tls,
        keep_alive,
    } = transmitter;
    let mut sequence = SequenceNumber::new();

    let stream = match open(&addr, tls.as_ref()).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!("transport to {} failed: {}", addr, e);
            let _ = report.send(BindStatus::failed(e));
            return;
        }
    };

    let mut connection = Connection::new(stream);
    match bind(&mut connection, &credentials, &mut sequence).await {
        Ok(resp) => {
            info!("bound to {} as transmitter (SMSC system_id '{}')", addr, resp.system_id);
            if report.send(BindStatus::connected()).is_err() {
                debug!("bind result for {} was not awaited", addr);
            }
        }
        Err(e) => {
            debug!("bind to {} failed: {}", addr, e);
            let _ = connection.shutdown().await;
            let _ = report.send(BindStatus::failed(e));
            return;
        }
    }

    serve(connection, shutdown, keep_alive, sequence, &addr).await;
}

/// Connects TCP and, when requested, layers TLS on top.
async fn open(addr: &str, tls: Option<&tls::TlsOptions>) -> SmppResult<Box<dyn SessionStream>> {
    let tcp = TcpStream::connect(addr).await?;
    // Session PDUs are tiny; don't let Nagle hold them back.
    tcp.set_nodelay(true)?;

    match tls {
        Some(options) => Ok(Box::new(tls::handshake(tcp, options).await?)),
        None => Ok(Box::new(tcp)),
    }
}

/// Sends bind_transmitter and waits for its response.
pub(crate) async fn bind<S>(
    connection: &mut Connection<S>,
    credentials: &BindCredentials,
    sequence: &mut SequenceNumber,
) -> SmppResult<BindTransmitterResponse>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut builder = BindTransmitter::builder()
        .sequence_number(sequence.next())
        .system_id(credentials.system_id.as_str())
        .password(credentials.password.as_str());
    if let Some(system_type) = &credentials.system_type {
        builder = builder.system_type(system_type.as_str());
    }
    let pdu = builder.build().map_err(CodecError::from)?;

    connection.write_frame(&Frame::BindTransmitter(pdu)).await?;

    loop {
        match connection.read_frame().await? {
            Some(Frame::BindTransmitterResp(resp)) => {
                if resp.command_status != CommandStatus::Ok {
                    return Err(SmppError::Protocol(resp.command_status));
                }
                return Ok(resp);
            }
            Some(Frame::GenericNack(nack)) => return Err(SmppError::Protocol(nack.command_status)),
            // Some SMSCs ping the link before they answer the bind.
            Some(Frame::EnquireLink(request)) => {
                let resp = EnquireLinkResponse::new(request.sequence_number);
                connection.write_frame(&Frame::EnquireLinkResp(resp)).await?;
            }
            Some(frame) => {
                return Err(SmppError::UnexpectedPdu {
                    expected: "bind_transmitter_resp".to_string(),
                    actual: format!("{:?}", frame.command_id()),
                });
            }
            None => return Err(SmppError::ConnectionClosed),
        }
    }
}

enum Event {
    Shutdown,
    Tick,
    Frame(Result<Option<Frame>, ConnectionError>),
}

/// Drives a bound session until shutdown is requested or the link is lost.
pub(crate) async fn serve<S>(
    mut connection: Connection<S>,
    mut shutdown: oneshot::Receiver<()>,
    config: KeepAliveConfig,
    mut sequence: SequenceNumber,
    addr: &str,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let unbind_timeout = config.timeout;
    let tick_period = config
        .interval
        .min(Duration::from_secs(1))
        .max(Duration::from_millis(10));
    let mut keep_alive = KeepAliveManager::new(config);
    let mut ticker = interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            // A dropped handle closes the channel, which counts as a request too.
            _ = &mut shutdown => Event::Shutdown,
            _ = ticker.tick() => Event::Tick,
            frame = connection.read_frame() => Event::Frame(frame),
        };

        match event {
            Event::Shutdown => {
                unbind(&mut connection, &mut sequence, unbind_timeout, addr).await;
                return;
            }
            Event::Tick => {
                keep_alive.check_timeout();
                if keep_alive.is_connection_failed() {
                    warn!(
                        "session with {} lost: {} enquire_link attempts went unanswered",
                        addr,
                        keep_alive.status().consecutive_failures
                    );
                    let _ = connection.shutdown().await;
                    return;
                }

                if keep_alive.should_ping() {
                    let ping = Frame::EnquireLink(EnquireLink::new(sequence.next()));
                    if let Err(e) = connection.write_frame(&ping).await {
                        warn!("session with {} lost: {}", addr, e);
                        return;
                    }
                    keep_alive.on_ping_sent();
                }
            }
            Event::Frame(Ok(Some(frame))) => {
                keep_alive.on_activity();
                match respond(&mut connection, frame, &mut keep_alive).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Unbound) => {
                        info!("SMSC {} ended the session", addr);
                        let _ = connection.shutdown().await;
                        return;
                    }
                    Err(e) => {
                        warn!("session with {} lost: {}", addr, e);
                        return;
                    }
                }
            }
            Event::Frame(Ok(None)) => {
                warn!("session with {} lost: connection closed by SMSC", addr);
                return;
            }
            Event::Frame(Err(ConnectionError::Malformed {
                command_id,
                sequence_number,
                source,
            })) => {
                keep_alive.on_activity();
                warn!("malformed {:?} from {}: {}", command_id, addr, source);
                // never nack a generic_nack
                if command_id == CommandId::GenericNack {
                    continue;
                }
                let nack = GenericNack::new(source.nack_status(), sequence_number);
                if let Err(e) = connection.write_frame(&Frame::GenericNack(nack)).await {
                    warn!("session with {} lost: {}", addr, e);
                    return;
                }
            }
            Event::Frame(Err(e)) => {
                warn!("session with {} lost: {}", addr, e);
                return;
            }
        }
    }
}

enum Flow {
    Continue,
    Unbound,
}

async fn respond<S>(
    connection: &mut Connection<S>,
    frame: Frame,
    keep_alive: &mut KeepAliveManager,
) -> Result<Flow, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match frame {
        Frame::EnquireLink(request) => {
            let resp = EnquireLinkResponse::new(request.sequence_number);
            connection.write_frame(&Frame::EnquireLinkResp(resp)).await?;
        }
        Frame::EnquireLinkResp(_) => keep_alive.on_ping_success(),
        Frame::Unbind(request) => {
            let resp = UnbindResponse::new(request.sequence_number);
            connection.write_frame(&Frame::UnbindResp(resp)).await?;
            return Ok(Flow::Unbound);
        }
        Frame::GenericNack(nack) => {
            warn!(
                "SMSC rejected PDU {}: {}",
                nack.sequence_number, nack.command_status
            );
        }
        other if !other.is_response() => {
            // A transmitter accepts no requests beyond enquire_link and unbind.
            debug!("rejecting {:?} from SMSC", other.command_id());
            let nack = GenericNack::invalid_command_id(other.sequence_number());
            connection.write_frame(&Frame::GenericNack(nack)).await?;
        }
        other => debug!("ignoring unsolicited {:?}", other.command_id()),
    }
    Ok(Flow::Continue)
}

/// Sends unbind and waits up to `wait` for unbind_resp before disconnecting.
async fn unbind<S>(
    connection: &mut Connection<S>,
    sequence: &mut SequenceNumber,
    wait: Duration,
    addr: &str,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = Frame::Unbind(Unbind::new(sequence.next()));
    if let Err(e) = connection.write_frame(&request).await {
        debug!("unbind to {} not sent: {}", addr, e);
        return;
    }

    let answered = timeout(wait, async {
        loop {
            match connection.read_frame().await {
                Ok(Some(Frame::UnbindResp(_))) => return true,
                Ok(Some(frame)) => debug!("discarding {:?} while unbinding", frame.command_id()),
                Err(ConnectionError::Malformed { command_id, .. }) => {
                    debug!("discarding malformed {:?} while unbinding", command_id)
                }
                Ok(None) | Err(_) => return false,
            }
        }
    })
    .await;

    match answered {
        Ok(true) => info!("unbound from {}", addr),
        Ok(false) => debug!("{} closed the connection before unbind_resp", addr),
        Err(_) => warn!("no unbind_resp from {} within {:?}", addr, wait),
    }
    let _ = connection.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Encodable, PduHeader};
    use bytes::Bytes;
    use tokio::io::{AsyncWriteExt, duplex};

    #[test]
    fn sequence_numbers_skip_zero_and_wrap() {
        let mut sequence = SequenceNumber::new();
        assert_eq!(sequence.next(), 1);
        assert_eq!(sequence.next(), 2);

        let mut sequence = SequenceNumber(SequenceNumber::MAX - 1);
        assert_eq!(sequence.next(), 0x7FFF_FFFF);
        assert_eq!(sequence.next(), 1);
    }

    #[tokio::test]
    async fn bind_sends_credentials_and_accepts_ok() {
        let (client, server) = duplex(1024);
        let mut client = Connection::new(client);
        let mut server = Connection::new(server);

        let smsc = tokio::spawn(async move {
            let request = match server.read_frame().await.unwrap() {
                Some(Frame::BindTransmitter(pdu)) => pdu,
                other => panic!("expected bind_transmitter, got {other:?}"),
            };
            let resp = BindTransmitterResponse::new(request.sequence_number, "SMSC");
            server
                .write_frame(&Frame::BindTransmitterResp(resp))
                .await
                .unwrap();
            request
        });

        let credentials = BindCredentials::transmitter("alice", "");
        let resp = bind(&mut client, &credentials, &mut SequenceNumber::new())
            .await
            .unwrap();
        assert_eq!(resp.system_id, "SMSC");

        let request = smsc.await.unwrap();
        assert_eq!(request.sequence_number, 1);
        assert_eq!(request.system_id, "alice");
        assert_eq!(request.password, None);
    }

    #[tokio::test]
    async fn bind_rejection_carries_the_status() {
        let (client, server) = duplex(1024);
        let mut client = Connection::new(client);
        let mut server = Connection::new(server);

        tokio::spawn(async move {
            let seq = server.read_frame().await.unwrap().unwrap().sequence_number();
            let resp = BindTransmitterResponse::error(seq, CommandStatus::BindFailed);
            server
                .write_frame(&Frame::BindTransmitterResp(resp))
                .await
                .unwrap();
        });

        let credentials = BindCredentials::transmitter("alice", "pw");
        let err = bind(&mut client, &credentials, &mut SequenceNumber::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SmppError::Protocol(CommandStatus::BindFailed)));
    }

    #[tokio::test]
    async fn bind_answers_enquire_link_before_the_response() {
        let (client, server) = duplex(1024);
        let mut client = Connection::new(client);
        let mut server = Connection::new(server);

        let smsc = tokio::spawn(async move {
            let seq = server.read_frame().await.unwrap().unwrap().sequence_number();
            server
                .write_frame(&Frame::EnquireLink(EnquireLink::new(500)))
                .await
                .unwrap();
            let answer = server.read_frame().await.unwrap();
            server
                .write_frame(&Frame::BindTransmitterResp(BindTransmitterResponse::new(
                    seq, "SMSC",
                )))
                .await
                .unwrap();
            answer
        });

        let credentials = BindCredentials::transmitter("alice", "pw");
        bind(&mut client, &credentials, &mut SequenceNumber::new())
            .await
            .unwrap();
        assert_eq!(
            smsc.await.unwrap(),
            Some(Frame::EnquireLinkResp(EnquireLinkResponse::new(500)))
        );
    }

    #[tokio::test]
    async fn bind_fails_when_smsc_hangs_up() {
        let (client, server) = duplex(1024);
        let mut client = Connection::new(client);

        tokio::spawn(async move {
            let mut server = Connection::new(server);
            let _ = server.read_frame().await;
        });

        let credentials = BindCredentials::transmitter("alice", "pw");
        let err = bind(&mut client, &credentials, &mut SequenceNumber::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SmppError::ConnectionClosed));
    }

    #[tokio::test]
    async fn serve_answers_enquire_link_and_unbinds_on_shutdown() {
        let (client, server) = duplex(1024);
        let (stop, stopped) = oneshot::channel();
        let session = tokio::spawn(async move {
            serve(
                Connection::new(client),
                stopped,
                KeepAliveConfig::disabled(),
                SequenceNumber(10),
                "test",
            )
            .await
        });

        let mut server = Connection::new(server);
        server
            .write_frame(&Frame::EnquireLink(EnquireLink::new(42)))
            .await
            .unwrap();
        assert_eq!(
            server.read_frame().await.unwrap(),
            Some(Frame::EnquireLinkResp(EnquireLinkResponse::new(42)))
        );

        stop.send(()).unwrap();
        let request = server.read_frame().await.unwrap();
        assert_eq!(request, Some(Frame::Unbind(Unbind::new(11))));
        server
            .write_frame(&Frame::UnbindResp(UnbindResponse::new(11)))
            .await
            .unwrap();

        session.await.unwrap();
        assert!(server.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn serve_rejects_unsupported_requests() {
        let (client, server) = duplex(1024);
        let (_stop, stopped) = oneshot::channel::<()>();
        tokio::spawn(async move {
            serve(
                Connection::new(client),
                stopped,
                KeepAliveConfig::disabled(),
                SequenceNumber::new(),
                "test",
            )
            .await
        });

        // deliver_sm is not something a transmitter receives
        let mut server = Connection::new(server);
        let deliver = Frame::Unknown {
            header: PduHeader {
                command_length: PduHeader::SIZE as u32,
                command_id: CommandId::DeliverSm,
                command_status: CommandStatus::Ok,
                sequence_number: 7,
            },
            body: Bytes::new(),
        };
        server.write_frame(&deliver).await.unwrap();

        assert_eq!(
            server.read_frame().await.unwrap(),
            Some(Frame::GenericNack(GenericNack::invalid_command_id(7)))
        );
    }

    #[tokio::test]
    async fn serve_nacks_malformed_pdus_and_stays_bound() {
        let (client, server) = duplex(1024);
        let (_stop, stopped) = oneshot::channel::<()>();
        let session = tokio::spawn(async move {
            serve(
                Connection::new(client),
                stopped,
                KeepAliveConfig::disabled(),
                SequenceNumber::new(),
                "test",
            )
            .await
        });

        // enquire_link with a stray body octet, then a well-formed one
        let mut raw = server;
        raw.write_all(&[
            0x00, 0x00, 0x00, 0x11, 0x00, 0x00, 0x00, 0x15, 0, 0, 0, 0, 0x00, 0x00, 0x00, 0x05,
            0xFF,
        ])
        .await
        .unwrap();
        raw.write_all(&EnquireLink::new(6).to_bytes().unwrap())
            .await
            .unwrap();

        let mut server = Connection::new(raw);
        assert_eq!(
            server.read_frame().await.unwrap(),
            Some(Frame::GenericNack(GenericNack::new(
                CommandStatus::InvalidCommandLength,
                5
            )))
        );
        assert_eq!(
            server.read_frame().await.unwrap(),
            Some(Frame::EnquireLinkResp(EnquireLinkResponse::new(6)))
        );
        assert!(!session.is_finished());
    }

    #[tokio::test]
    async fn serve_exits_when_smsc_unbinds() {
        let (client, server) = duplex(1024);
        let (_stop, stopped) = oneshot::channel::<()>();
        let session = tokio::spawn(async move {
            serve(
                Connection::new(client),
                stopped,
                KeepAliveConfig::disabled(),
                SequenceNumber::new(),
                "test",
            )
            .await
        });

        let mut server = Connection::new(server);
        server
            .write_frame(&Frame::Unbind(Unbind::new(3)))
            .await
            .unwrap();
        assert_eq!(
            server.read_frame().await.unwrap(),
            Some(Frame::UnbindResp(UnbindResponse::new(3)))
        );
        session.await.unwrap();
    }

    #[tokio::test]
    async fn serve_gives_up_after_unanswered_pings() {
        let (client, server) = duplex(1024);
        let (_stop, stopped) = oneshot::channel::<()>();
        let config = KeepAliveConfig::new(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(20))
            .with_max_failures(2);
        let session = tokio::spawn(async move {
            serve(
                Connection::new(client),
                stopped,
                config,
                SequenceNumber::new(),
                "test",
            )
            .await
        });

        // read the pings but never answer them
        let mut server = Connection::new(server);
        let mut pings = 0;
        while let Ok(Some(frame)) = server.read_frame().await {
            assert!(matches!(frame, Frame::EnquireLink(_)));
            pings += 1;
        }

        assert_eq!(pings, 2);
        session.await.unwrap();
    }
}
