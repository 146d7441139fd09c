//! Vote records: a validator's attestation to a block hash at a given
//! height and phase.

use chain_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, CTX_VOTE};
use chain_types::CanonValue;
use serde::{Deserialize, Serialize};

/// The two phases a validator passes through per height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VotePhase {
    /// First round: attest to having accepted a proposed block.
    Prevote,
    /// Second round: attest to having seen prevote quorum.
    Precommit,
}

impl VotePhase {
    /// The wire string for this phase, matching the on-the-wire vote type.
    pub fn as_str(&self) -> &'static str {
        match self {
            VotePhase::Prevote => "PREVOTE",
            VotePhase::Precommit => "PRECOMMIT",
        }
    }
}

impl std::fmt::Display for VotePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validator's attestation to a block hash at a given height and phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Which phase this vote belongs to.
    pub phase: VotePhase,
    /// Height being voted on.
    pub height: u64,
    /// Hex-encoded block hash being attested to.
    pub block_hash: String,
    /// Hex-encoded Ed25519 public key of the voting validator.
    pub voter: String,
    /// Hex-encoded Ed25519 signature over the payload below.
    pub signature: String,
}

impl Vote {
    /// Builds an unsigned draft.
    pub fn new_unsigned(phase: VotePhase, height: u64, block_hash: String, voter: String) -> Self {
        Self {
            phase,
            height,
            block_hash,
            voter,
            signature: String::new(),
        }
    }

    /// The signed payload: every field except `signature`.
    pub fn signed_payload(&self) -> CanonValue {
        CanonValue::map([
            ("type".to_string(), CanonValue::from(self.phase.as_str())),
            ("height".to_string(), CanonValue::from(self.height)),
            ("block_hash".to_string(), CanonValue::from(self.block_hash.as_str())),
            ("voter".to_string(), CanonValue::from(self.voter.as_str())),
        ])
    }

    /// Signs this vote in place under the vote context.
    pub fn sign(&mut self, keypair: &Ed25519KeyPair) {
        let sig = keypair.sign_with_context(CTX_VOTE, &self.signed_payload());
        self.signature = sig.to_hex();
    }

    /// Verifies the signature against the declared voter.
    pub fn validate_signature(&self) -> bool {
        let Ok(pubkey) = Ed25519PublicKey::from_hex(&self.voter) else {
            return false;
        };
        let Ok(sig) = Ed25519Signature::from_hex(&self.signature) else {
            return false;
        };
        pubkey
            .verify_with_context(CTX_VOTE, &self.signed_payload(), &sig)
            .is_ok()
    }

    /// The dedup key a node uses to discard votes it has already tallied:
    /// `(phase, height, block_hash, voter)`.
    pub fn dedup_key(&self) -> (VotePhase, u64, String, String) {
        (self.phase, self.height, self.block_hash.clone(), self.voter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_vote_verifies() {
        let kp = Ed25519KeyPair::generate();
        let mut vote = Vote::new_unsigned(VotePhase::Prevote, 1, "abc123".to_string(), kp.public_key().to_hex());
        vote.sign(&kp);
        assert!(vote.validate_signature());
    }

    #[test]
    fn changing_phase_invalidates_signature() {
        let kp = Ed25519KeyPair::generate();
        let mut vote = Vote::new_unsigned(VotePhase::Prevote, 1, "abc123".to_string(), kp.public_key().to_hex());
        vote.sign(&kp);
        vote.phase = VotePhase::Precommit;
        assert!(!vote.validate_signature());
    }

    #[test]
    fn cross_context_signature_fails() {
        let kp = Ed25519KeyPair::generate();
        let mut vote = Vote::new_unsigned(VotePhase::Prevote, 1, "abc123".to_string(), kp.public_key().to_hex());
        vote.signature = kp
            .sign_with_context(chain_crypto::CTX_TX, &vote.signed_payload())
            .to_hex();
        assert!(!vote.validate_signature());
    }
}
