//! Observability hooks. Every method defaults to a no-op; the shipped binary
//! wires in [`TracingHooks`] so real deployments get structured logs for
//! free without the engine itself depending on a particular sink.

use std::net::Ipv4Addr;

/// Host-provided instrumentation seam. Every method has a default no-op
/// body so a host can override only what it needs.
pub trait Hooks: Send + Sync + 'static {
    fn connected(&self, _client_ip: Ipv4Addr) {}
    fn disconnected(&self, _client_ip: Ipv4Addr) {}
    fn cmd_begin(&self, _verb: &str) {}
    fn cmd_end(&self, _verb: &str) {}

    /// The link-layer health probe. The session read loop checks this every
    /// iteration; a host with no real link layer to probe simply returns
    /// `true`.
    fn link_up(&self) -> bool {
        true
    }
}

/// Default [`Hooks`] implementation: every event becomes a `tracing` span or
/// event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl Hooks for TracingHooks {
    fn connected(&self, client_ip: Ipv4Addr) {
        tracing::info!(%client_ip, "client connected");
    }

    fn disconnected(&self, client_ip: Ipv4Addr) {
        tracing::info!(%client_ip, "client disconnected");
    }

    fn cmd_begin(&self, verb: &str) {
        tracing::debug!(verb, "command begin");
    }

    fn cmd_end(&self, verb: &str) {
        tracing::debug!(verb, "command end");
    }
}
