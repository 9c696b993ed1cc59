use uuid::Uuid;

/// Client-local voting identity. The id is an opaque uuid minted on
/// first use and reused for every request from this client instance,
/// so the one-vote-per-session invariant holds server-side. It is
/// never validated by the server.
///
/// Cleared on logout or auth expiry; the next vote then counts as a
/// fresh session.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: Option<String>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self) -> &str {
        self.current
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .as_str()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
