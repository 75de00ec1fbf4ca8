//! Transport link trait and error types.

use core::future::Future;

/// Error type for link operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Radio/communication I/O error.
    Io,
    /// No peer is connected.
    NotConnected,
    /// Outbound queue is full; the packet was dropped.
    BufferFull,
}

/// Async trait for the wireless byte link to the peer.
///
/// The link buffers inbound bytes on its own; the engine drains whatever is
/// buffered once per poll cycle. Connect and disconnect events are delivered
/// separately through [`Engine::on_connect`](crate::Engine::on_connect) and
/// [`Engine::on_disconnect`](crate::Engine::on_disconnect).
pub trait Link {
    /// Whether any inbound bytes are waiting.
    fn is_data_available(&self) -> bool;

    /// Number of inbound bytes waiting.
    fn bytes_buffered(&self) -> usize;

    /// Move up to `buf.len()` buffered bytes into `buf`, returning the count.
    fn read_all(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, LinkError>>;

    /// Send one outbound message (a telemetry packet or a reply).
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), LinkError>>;
}
