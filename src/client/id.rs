use chrono::Utc;

use crate::client::ClientId;

/// Hands out `client_<nanos>` ids for accepted connections.
///
/// Ids are taken from the wall clock in nanoseconds and forced to be strictly
/// increasing, so two accepts inside one clock tick still get distinct ids.
#[derive(Debug, Default)]
pub struct ClientIdGenerator {
    last: i64,
}

impl ClientIdGenerator {
    pub fn next_id(&mut self) -> ClientId {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        self.last = now.max(self.last.saturating_add(1));
        format!("client_{}", self.last)
    }
}
