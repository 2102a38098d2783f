//! Connection endpoints.

use std::path::PathBuf;
use std::str::FromStr;

use karma_core::error::{KarmaError, KarmaResult};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// A byte stream the client can talk the DaZeus protocol over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Where the DaZeus core listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `unix:/path/to/socket`, or a bare path.
    Unix(PathBuf),
    /// `tcp:host:port`
    Tcp { host: String, port: u16 },
}

impl FromStr for Endpoint {
    type Err = KarmaError;

    fn from_str(s: &str) -> KarmaResult<Self> {
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(KarmaError::invalid_endpoint(s));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        if let Some(addr) = s.strip_prefix("tcp:") {
            let (host, port) = addr
                .rsplit_once(':')
                .ok_or_else(|| KarmaError::invalid_endpoint(s))?;
            let port = port.parse().map_err(|_| KarmaError::invalid_endpoint(s))?;
            if host.is_empty() {
                return Err(KarmaError::invalid_endpoint(s));
            }
            return Ok(Self::Tcp {
                host: host.to_string(),
                port,
            });
        }

        if s.is_empty() || s.contains(':') {
            return Err(KarmaError::invalid_endpoint(s));
        }
        Ok(Self::Unix(PathBuf::from(s)))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
            Self::Tcp { host, port } => write!(f, "tcp:{}:{}", host, port),
        }
    }
}

impl Endpoint {
    /// Open a stream to the endpoint.
    pub async fn connect(&self) -> KarmaResult<Box<dyn Transport>> {
        let map_err = |e: std::io::Error| KarmaError::Connection {
            message: format!("failed to connect to {}: {}", self, e),
            code: karma_core::ErrorCode::ConnFailed,
            source: Some(Box::new(e)),
        };

        match self {
            Self::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(map_err)?;
                stream.set_nodelay(true).map_err(map_err)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Self::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(map_err)?;
                Ok(Box::new(stream))
            }
            #[cfg(not(unix))]
            Self::Unix(_) => Err(KarmaError::connection(
                "unix sockets are not supported on this platform",
            )),
        }
    }
}
