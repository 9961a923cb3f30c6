//! Listening-port detection.
//!
//! Reads the operating system's table of active TCP listeners. Nothing is
//! cached; every call reflects the live state.
//!
//! # Platform Behavior
//! - **Linux**: parses `/proc/net/tcp` and `/proc/net/tcp6`
//! - **Windows/macOS/other**: queries the socket table through `netstat2`,
//!   which reports numeric TCP states rather than localized text

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Reports whether a local TCP port is being listened on.
pub trait PortProbe: Send + Sync {
    fn is_listening(&self, port: u16) -> bool;
}

/// [`PortProbe`] backed by the host's listener table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortProbe;

impl SystemPortProbe {
    pub fn new() -> Self {
        Self
    }

    /// All local ports currently in the TCP LISTEN state.
    ///
    /// Read failures are logged and yield an empty set.
    pub fn listening_ports(&self) -> HashSet<u16> {
        #[cfg(target_os = "linux")]
        {
            listening_ports_procfs()
        }

        #[cfg(not(target_os = "linux"))]
        {
            listening_ports_socket_table()
        }
    }
}

impl PortProbe for SystemPortProbe {
    fn is_listening(&self, port: u16) -> bool {
        self.listening_ports().contains(&port)
    }
}

/// Run `probe` on the blocking pool so a slow backend cannot stall the runtime.
pub(crate) async fn check_listening(probe: Arc<dyn PortProbe>, port: u16) -> bool {
    match tokio::task::spawn_blocking(move || probe.is_listening(port)).await {
        Ok(listening) => listening,
        Err(e) => {
            debug!("Port probe task failed: {}", e);
            false
        }
    }
}

#[cfg(target_os = "linux")]
fn listening_ports_procfs() -> HashSet<u16> {
    let mut ports = HashSet::new();
    for table in ["/proc/net/tcp", "/proc/net/tcp6"] {
        match std::fs::read_to_string(table) {
            Ok(contents) => ports.extend(parse_proc_net_tcp(&contents)),
            // tcp6 is absent when IPv6 is disabled
            Err(e) => debug!("Failed to read {}: {}", table, e),
        }
    }
    ports
}

#[cfg(not(target_os = "linux"))]
fn listening_ports_socket_table() -> HashSet<u16> {
    use netstat2::{get_sockets_info, AddressFamilyFlags, ProtocolFlags};

    let families = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
    match get_sockets_info(families, ProtocolFlags::TCP) {
        Ok(sockets) => sockets
            .iter()
            .filter_map(|socket| listener_port(&socket.protocol_socket_info))
            .collect(),
        Err(e) => {
            debug!("Failed to read the socket table: {}", e);
            HashSet::new()
        }
    }
}

/// Local port of a TCP socket in the LISTEN state.
#[cfg(not(target_os = "linux"))]
fn listener_port(info: &netstat2::ProtocolSocketInfo) -> Option<u16> {
    use netstat2::{ProtocolSocketInfo, TcpState};

    match info {
        ProtocolSocketInfo::Tcp(tcp) if matches!(tcp.state, TcpState::Listen) => {
            Some(tcp.local_port)
        }
        _ => None,
    }
}

/// Listening ports from the contents of `/proc/net/tcp` or `/proc/net/tcp6`.
///
/// Each row looks like `0: 0100007F:1F90 00000000:0000 0A ...`; the port is
/// the hex suffix of the local address and `0A` is the LISTEN state.
pub fn parse_proc_net_tcp(contents: &str) -> HashSet<u16> {
    const TCP_LISTEN: &str = "0A";

    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 || fields[3] != TCP_LISTEN {
                return None;
            }
            let (_, port_hex) = fields[1].rsplit_once(':')?;
            u16::from_str_radix(port_hex, 16).ok()
        })
        .collect()
}
