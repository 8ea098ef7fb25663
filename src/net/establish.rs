use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::NetworkConfig;
use crate::net::error::NetError;

/// How the connection gets established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Connect out to `host:port`.
    Connect { host: String, port: u16 },
    /// Listen on `port` and accept a single peer.
    Listen { port: u16 },
}

/// An established stream plus the endpoints for the startup banner.
#[derive(Debug)]
pub struct Established {
    pub stream: TcpStream,
    pub local_addr: SocketAddr,
    pub peer_addr: SocketAddr,
}

pub fn establish(mode: &Mode, network: &NetworkConfig) -> Result<Established, NetError> {
    let stream = match mode {
        Mode::Connect { host, port } => connect(host, *port, network)?,
        Mode::Listen { port } => {
            let listener = listen(network, *port)?;
            accept(&listener)?
        }
    };

    if let Err(err) = stream.set_nodelay(network.nodelay) {
        tracing::debug!("Failed to set TCP_NODELAY: {}", err);
    }

    let local_addr = stream.local_addr().map_err(NetError::Accept)?;
    let peer_addr = stream.peer_addr().map_err(NetError::Accept)?;
    Ok(Established {
        stream,
        local_addr,
        peer_addr,
    })
}

/// Try each resolved address in order until one connects.
pub fn connect(host: &str, port: u16, network: &NetworkConfig) -> Result<TcpStream, NetError> {
    let target = format!("{}:{}", host, port);
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| NetError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(NetError::NoAddress {
            host: host.to_string(),
        });
    }

    let timeout = Duration::from_secs(u64::from(network.connect_timeout_seconds));
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                tracing::info!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(err) => {
                tracing::debug!("Connect to {} failed: {}", addr, err);
                last_err = Some(err);
            }
        }
    }

    Err(NetError::Connect {
        target,
        source: last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no usable address")),
    })
}

pub fn listen(network: &NetworkConfig, port: u16) -> Result<TcpListener, NetError> {
    let ip: IpAddr = network.bind_addr.parse().map_err(|_| NetError::Bind {
        addr: network.bind_addr.clone(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "invalid bind address"),
    })?;
    let addr = SocketAddr::new(ip, port);
    let listener = TcpListener::bind(addr).map_err(|source| NetError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    tracing::info!("Listening on {}", addr);
    Ok(listener)
}

pub fn accept(listener: &TcpListener) -> Result<TcpStream, NetError> {
    let (stream, peer) = listener.accept().map_err(NetError::Accept)?;
    tracing::info!("Accepted connection from {}", peer);
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn loopback() -> NetworkConfig {
        NetworkConfig {
            bind_addr: "127.0.0.1".to_string(),
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn connect_and_accept_over_loopback() {
        let network = loopback();
        let listener = listen(&network, 0).unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || accept(&listener).unwrap());
        let established = establish(
            &Mode::Connect {
                host: "127.0.0.1".to_string(),
                port,
            },
            &network,
        )
        .unwrap();
        let accepted = server.join().unwrap();

        assert_eq!(established.peer_addr.port(), port);
        assert_eq!(
            accepted.peer_addr().unwrap(),
            established.local_addr
        );
    }

    #[test]
    fn connect_refused_is_reported() {
        let network = loopback();
        // Bind then drop to obtain a port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = connect("127.0.0.1", port, &network).unwrap_err();
        assert!(matches!(err, NetError::Connect { .. }));
        assert!(err.to_string().contains(&format!("127.0.0.1:{}", port)));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let network = NetworkConfig {
            bind_addr: "not-an-ip".to_string(),
            ..NetworkConfig::default()
        };
        let err = listen(&network, 0).unwrap_err();
        assert!(matches!(err, NetError::Bind { .. }));
    }
}
