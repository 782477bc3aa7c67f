use std::io;
use std::ops::Range;
use tokio::net::TcpListener;
use tracing::debug;

/// Ports a worker may pick when none is configured
pub fn port_range(controller_port: u16) -> Range<u16> {
    controller_port.saturating_add(100)..controller_port.saturating_add(300)
}

/// Bind the first free port in `range`; the returned listener holds it
pub async fn bind_first_free(host: &str, range: Range<u16>) -> io::Result<(TcpListener, u16)> {
    for port in range.clone() {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => debug!(port = port, error = %e, "Port unavailable"),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("no free port in {}..{}", range.start, range.end),
    ))
}
