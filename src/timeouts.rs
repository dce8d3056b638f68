use crate::prelude::*;

/// Drops connections that have been idle past the client timeout. Invoked
/// by the event loop when a poll cycle comes back empty.
pub fn reap_timed_out(connections: &mut HashMap<Token, HttpConnection>, poll: &Poll) {
    connections.retain(|token, conn| {
        if conn.is_timed_out(CLIENT_TIMEOUT) {
            warn!("connection timed out (token {})", token.0);
            let _ = poll.registry().deregister(&mut conn.stream);
            return false;
        }
        true
    });
}
