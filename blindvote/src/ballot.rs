use crate::*;
use std::fmt;
use uuid::Uuid;

/// Commission-assigned candidate identifier
pub type CandidateId = u32;

/// Opaque, randomly generated voter identifier
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct VoterId(Uuid);

impl VoterId {
    /// Generate a new random (v4) identifier
    pub fn generate() -> Self {
        VoterId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: CandidateId,
    pub full_name: String,
}

impl Candidate {
    pub fn new(id: CandidateId, full_name: impl Into<String>) -> Self {
        Candidate {
            id,
            full_name: full_name.into(),
        }
    }
}

/// The public half of a voter, as known to the commission's registry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoterRegistration {
    pub id: VoterId,
    pub eligible: bool,
}

impl VoterRegistration {
    pub fn new(eligible: bool) -> Self {
        VoterRegistration {
            id: VoterId::generate(),
            eligible,
        }
    }
}

/// A ballot naming a voter and the candidate they vote for.
///
/// This is the only content that is ever masked and signed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ballot {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
}

impl Ballot {
    pub fn new(voter_id: VoterId, candidate_id: CandidateId) -> Self {
        Ballot {
            voter_id,
            candidate_id,
        }
    }
}

/// One masked ballot per registered candidate, all for the same voter
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BallotBatch {
    pub masked_ballots: Vec<Vec<u8>>,
}

impl BallotBatch {
    pub fn new(masked_ballots: Vec<Vec<u8>>) -> Self {
        BallotBatch { masked_ballots }
    }

    pub fn len(&self) -> usize {
        self.masked_ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masked_ballots.is_empty()
    }
}

/// Every batch a voter submits for one voting attempt.
///
/// The collection carries the blinding factor so that the commission can open
/// the batches it audits.
#[derive(Serialize, Deserialize, Debug)]
pub struct BallotBatchesCollection {
    pub batches: Vec<BallotBatch>,
    blinding_factor: BlindingFactor,
}

impl BallotBatchesCollection {
    pub fn new(batches: Vec<BallotBatch>, blinding_factor: BlindingFactor) -> Self {
        BallotBatchesCollection {
            batches,
            blinding_factor,
        }
    }

    pub(crate) fn blinding_factor(&self) -> &BlindingFactor {
        &self.blinding_factor
    }
}

/// A plaintext ballot together with the commission's (unblinded) signature over it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedBallot {
    pub ballot: Ballot,

    #[serde(with = "hex_serde")]
    pub signature: Vec<u8>,
}

impl SignedBallot {
    pub fn new(ballot: Ballot, signature: Vec<u8>) -> Self {
        SignedBallot { ballot, signature }
    }
}

/// Per-voter progress through the protocol. Only ever moves forward.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum VotingAttendanceStatus {
    #[default]
    NotAttended,
    ReceivedBallot,
    Voted,
}

impl fmt::Display for VotingAttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VotingAttendanceStatus::NotAttended => "not_attended",
            VotingAttendanceStatus::ReceivedBallot => "received_ballot",
            VotingAttendanceStatus::Voted => "voted",
        };
        write!(f, "{}", name)
    }
}
