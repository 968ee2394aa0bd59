//! Loopback activation listener and client.
//!
//! # Responsibility
//! - Bind the well-known control address as the primary instance.
//! - Poll for activation requests without stalling the UI tick.
//! - Send the activation token when another instance is already primary.
//!
//! # Invariants
//! - `poll` returns within roughly `accept_timeout` when nothing is pending.
//! - Accept/read failures are swallowed per attempt; the listener survives.
//! - Only an exact token match yields `ActivationEvent::Activate`.

use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Well-known control address shared by every instance on the machine.
pub const DEFAULT_ACTIVATION_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 65432));
/// Command payload meaning "raise your window".
pub const ACTIVATION_TOKEN: &str = "activate";
/// Maximum bytes read from one control connection.
pub const DEFAULT_READ_BUDGET: usize = 64;

const ACCEPT_POLL_STEP: Duration = Duration::from_millis(2);

/// Control channel settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationConfig {
    pub addr: SocketAddr,
    /// Upper bound for one `poll` when no connection is pending.
    pub accept_timeout: Duration,
    pub connect_timeout: Duration,
    /// Read timeout applied to an accepted connection.
    pub read_timeout: Duration,
    pub read_budget: usize,
    pub token: String,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ACTIVATION_ADDR,
            accept_timeout: Duration::from_millis(10),
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(50),
            read_budget: DEFAULT_READ_BUDGET,
            token: ACTIVATION_TOKEN.to_string(),
        }
    }
}

impl ActivationConfig {
    /// Returns the default config bound to another port on loopback.
    pub fn with_port(port: u16) -> Self {
        Self {
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)),
            ..Self::default()
        }
    }

    /// Checks the channel stays on loopback and can carry its token.
    pub fn validate(&self) -> Result<(), String> {
        if !self.addr.ip().is_loopback() {
            return Err(format!("activation address {} is not loopback", self.addr));
        }
        if self.token.is_empty() || !self.token.is_ascii() {
            return Err("activation token must be non-empty ASCII".to_string());
        }
        if self.read_budget < self.token.len() {
            return Err(format!(
                "read budget {} is smaller than token length {}",
                self.read_budget,
                self.token.len()
            ));
        }
        if self.accept_timeout.is_zero() {
            return Err("accept timeout must be positive".to_string());
        }
        Ok(())
    }
}

/// Result of one listener poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEvent {
    /// No connection arrived within the accept timeout.
    Idle,
    /// A connection carried the activation token.
    Activate,
    /// A connection carried something else, or failed mid-read.
    Ignored,
}

/// Fatal activation failure: neither primary nor client could proceed.
#[derive(Debug)]
pub enum ActivationError {
    Unavailable {
        addr: SocketAddr,
        bind: io::Error,
        connect: io::Error,
    },
}

impl Display for ActivationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable {
                addr,
                bind,
                connect,
            } => write!(
                f,
                "activation channel {addr} unavailable: bind failed ({bind}); connect failed ({connect})"
            ),
        }
    }
}

impl Error for ActivationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { connect, .. } => Some(connect),
        }
    }
}

/// Role this process plays after startup negotiation.
#[derive(Debug)]
pub enum InstanceRole {
    /// This process owns the control address.
    Primary(ActivationListener),
    /// Another instance is primary and has been sent the token.
    Client,
}

/// Binds the control address or, failing that, activates the primary.
///
/// # Errors
/// - `Unavailable` when binding fails and no primary accepts a connection.
pub fn acquire_role(config: &ActivationConfig) -> Result<InstanceRole, ActivationError> {
    let bind_err = match ActivationListener::bind(config.clone()) {
        Ok(listener) => {
            info!(
                "event=activation_bind module=activation status=ok role=primary addr={}",
                config.addr
            );
            return Ok(InstanceRole::Primary(listener));
        }
        Err(err) => err,
    };

    if bind_err.kind() == ErrorKind::AddrInUse {
        info!(
            "event=activation_bind module=activation status=conflict role=client addr={}",
            config.addr
        );
    } else {
        warn!(
            "event=activation_bind module=activation status=error role=client addr={} error={}",
            config.addr, bind_err
        );
    }

    match send_activation(config) {
        Ok(()) => Ok(InstanceRole::Client),
        Err(connect_err) => {
            error!(
                "event=activation_unavailable module=activation status=error addr={} bind_error={} connect_error={}",
                config.addr, bind_err, connect_err
            );
            Err(ActivationError::Unavailable {
                addr: config.addr,
                bind: bind_err,
                connect: connect_err,
            })
        }
    }
}

/// Sends the activation token to the primary and closes the connection.
///
/// No acknowledgment is awaited beyond a successful connect and write.
pub fn send_activation(config: &ActivationConfig) -> io::Result<()> {
    let mut stream = TcpStream::connect_timeout(&config.addr, config.connect_timeout)?;
    stream.write_all(config.token.as_bytes())?;
    stream.flush()?;
    // Primary may already have closed after reading; nothing left to signal.
    let _ = stream.shutdown(Shutdown::Write);
    info!(
        "event=activation_sent module=activation status=ok addr={}",
        config.addr
    );
    Ok(())
}

/// Primary-side control listener.
#[derive(Debug)]
pub struct ActivationListener {
    listener: TcpListener,
    config: ActivationConfig,
}

impl ActivationListener {
    /// Binds `config.addr` in non-blocking mode.
    pub fn bind(config: ActivationConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    /// Waits up to `accept_timeout` for one control connection.
    ///
    /// At most one connection is handled per call; others stay queued for
    /// the next tick.
    pub fn poll(&self) -> ActivationEvent {
        let deadline = Instant::now() + self.config.accept_timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => return self.handle_connection(stream, peer),
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    let now = Instant::now();
                    if now >= deadline {
                        return ActivationEvent::Idle;
                    }
                    thread::sleep(ACCEPT_POLL_STEP.min(deadline - now));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    debug!(
                        "event=activation_poll module=activation status=error stage=accept error={}",
                        err
                    );
                    return ActivationEvent::Ignored;
                }
            }
        }
    }

    fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> ActivationEvent {
        let payload = match read_payload(stream, self.config.read_budget, self.config.read_timeout) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(
                    "event=activation_poll module=activation status=error stage=read peer={} error={}",
                    peer, err
                );
                return ActivationEvent::Ignored;
            }
        };

        if payload.trim_ascii() == self.config.token.as_bytes() {
            info!(
                "event=activation_poll module=activation status=ok action=activate peer={}",
                peer
            );
            ActivationEvent::Activate
        } else {
            debug!(
                "event=activation_poll module=activation status=ignored peer={} payload_bytes={}",
                peer,
                payload.len()
            );
            ActivationEvent::Ignored
        }
    }
}

/// Reads at most `budget` bytes, stopping at EOF or a read timeout after data.
fn read_payload(mut stream: TcpStream, budget: usize, timeout: Duration) -> io::Result<Vec<u8>> {
    // Accepted sockets may inherit the listener's non-blocking flag.
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(timeout))?;

    let mut buf = vec![0_u8; budget];
    let mut filled = 0;
    while filled < budget {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err)
                if filled > 0
                    && matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                break
            }
            Err(err) => return Err(err),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
