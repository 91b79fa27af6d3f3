//! Time-bounded unlocked session.

use std::time::{Duration, Instant};

use zeroize::{Zeroize, Zeroizing};

use crate::state::WalletState;
use crate::vault;
use crate::WalletError;

/// Holds the wallet password between unlock and lock/expiry.
///
/// Passed by reference into signing calls instead of living in process-wide
/// state. The password is wiped on [`Session::lock`] and on drop.
pub struct Session {
    password: Zeroizing<String>,
    expires_at: Instant,
    locked: bool,
}

impl Session {
    /// Verify `password` against the stored root key and open a session.
    pub async fn unlock(
        state: &WalletState,
        password: &str,
        ttl: Duration,
    ) -> Result<Self, WalletError> {
        let blob = state.encrypted_key().await?;
        drop(vault::decrypt_root_key(password, &blob)?);
        tracing::debug!(ttl_secs = ttl.as_secs(), "session unlocked");
        Ok(Self {
            password: Zeroizing::new(password.to_string()),
            expires_at: Instant::now() + ttl,
            locked: false,
        })
    }

    pub fn password(&self) -> Result<&str, WalletError> {
        if self.locked {
            return Err(WalletError::SessionLocked);
        }
        if Instant::now() >= self.expires_at {
            return Err(WalletError::SessionExpired);
        }
        Ok(self.password.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.password().is_ok()
    }

    pub fn remaining(&self) -> Duration {
        if self.locked {
            return Duration::ZERO;
        }
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn lock(&mut self) {
        self.password.zeroize();
        self.locked = true;
        tracing::debug!("session locked");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("locked", &self.locked)
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}
