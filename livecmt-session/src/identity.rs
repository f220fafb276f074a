//! Pseudo-identity generation for the handshake
//!
//! The chat server only needs a uid of the right shape; it is not an
//! authenticated user.

use rand::Rng;

const UID_BASE: f64 = 1e14;
const UID_SPAN: f64 = 2e14;

/// Produces the uid sent in the handshake frame
pub trait IdentityGenerator: Send + Sync {
    fn generate_uid(&self) -> u64;
}

/// Random uid in `[1e14, 3e14)`
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentity;

impl IdentityGenerator for RandomIdentity {
    fn generate_uid(&self) -> u64 {
        let sample: f64 = rand::thread_rng().gen();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let uid = (UID_BASE + UID_SPAN * sample) as u64;
        uid
    }
}

/// Always returns the same uid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIdentity(pub u64);

impl IdentityGenerator for FixedIdentity {
    fn generate_uid(&self) -> u64 {
        self.0
    }
}
