//! Protocol upgrades (WebSocket terminals, log tails) across the bridge.

use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;

/// Once both sides have switched protocols, copy bytes in both directions
/// until either side closes.
pub fn splice(client: OnUpgrade, agent: OnUpgrade, path: String) {
    tokio::spawn(async move {
        let (client, agent) = match tokio::try_join!(client, agent) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Upgrade handshake failed");
                return;
            }
        };

        let mut client = TokioIo::new(client);
        let mut agent = TokioIo::new(agent);
        match tokio::io::copy_bidirectional(&mut client, &mut agent).await {
            Ok((sent, received)) => {
                tracing::debug!(path = %path, sent, received, "Upgraded connection closed")
            }
            Err(e) => tracing::debug!(path = %path, error = %e, "Upgraded connection ended"),
        }
    });
}
