use crate::*;

use thiserror::Error;

/// Failures of the cryptography and serialization ports
#[derive(Debug, Error)]
pub enum Error {
    #[error("blindvote: RSA error: {0}")]
    RSAError(#[from] rsa::errors::Error),

    #[error("blindvote: message is empty, zero-prefixed or not smaller than the modulus")]
    MessageOutOfRange,

    #[error("blindvote: blinding factor is not invertible modulo the public modulus")]
    NonInvertibleBlindingFactor,

    #[error("blindvote: unable to generate an invertible blinding factor")]
    BlindingFactorGeneration,

    #[error("blindvote: ciphertext is truncated")]
    TruncatedCiphertext,

    #[error("blindvote: symmetric encryption failure")]
    AeadError,

    #[error("blindvote: key derivation failure")]
    KeyDerivation,

    #[error("blindvote: CBOR error: {0}")]
    CBORSerialization(#[from] serde_cbor::Error),
}

/// Protocol errors returned by the commission and the voter
#[derive(Debug, Error)]
pub enum VotingError {
    #[error("blindvote: the voting is already completed")]
    VotingAlreadyCompleted,

    #[error("blindvote: message has wrong format or was incorrectly encrypted")]
    MalformedOrUndecryptableMessage,

    #[error("blindvote: batch does not contain exactly one ballot per registered candidate")]
    CandidateSetMismatch,

    #[error("blindvote: batches name more than one voter")]
    InconsistentBatchVoter,

    #[error("blindvote: expected {expected} ballot batches, found {found}")]
    BatchCountMismatch { expected: usize, found: usize },

    #[error("blindvote: voter {0} was not found")]
    VoterNotFound(VoterId),

    #[error("blindvote: voter {0} is not eligible to vote")]
    VoterIneligible(VoterId),

    #[error("blindvote: voter {0} has already received a ballot")]
    VoterAlreadyReceivedBallot(VoterId),

    #[error("blindvote: the signature is not authentic")]
    SignatureNotAuthentic,

    #[error("blindvote: voter {0} has already cast a vote")]
    VoterAlreadyVoted(VoterId),

    #[error("blindvote: candidate {0} was not found")]
    CandidateNotFound(CandidateId),

    #[error("blindvote: unable to find the right ballot")]
    BallotNotLocatable,

    #[error("blindvote: the blinding factor has already been used up")]
    BlindingFactorUnavailable,

    #[error("blindvote: blinding factor renewal is disabled")]
    BlindingFactorRenewalDisabled,

    #[error("blindvote: candidate {0} is registered more than once")]
    DuplicateCandidate(CandidateId),

    #[error("blindvote: voter {0} is registered more than once")]
    DuplicateVoter(VoterId),

    #[error("blindvote: invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("blindvote: {0}")]
    Crypto(#[from] Error),
}
