use crate::*;
use indexmap::IndexMap;
use rsa::traits::PublicKeyParts;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The election authority.
///
/// Holds the signing key, blindly signs ballots after a cut-and-choose audit,
/// accepts and tallies final ballots, and tracks every voter's attendance.
///
/// Registries and keys are fixed at construction. Attendance, results and the
/// completion flag sit behind a single lock; every check that guards a mutation
/// is repeated under that lock right before committing, so the expensive RSA
/// work can run unlocked.
pub struct ElectionCommission {
    candidates: IndexMap<CandidateId, Candidate>,
    voters: HashMap<VoterId, VoterRegistration>,
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
    config: ProtocolConfig,
    state: Mutex<CommissionState>,
}

struct CommissionState {
    statuses: HashMap<VoterId, VotingAttendanceStatus>,
    results: VotingResults,
    completed: bool,
}

impl CommissionState {
    fn status(&self, voter_id: VoterId) -> VotingAttendanceStatus {
        self.statuses.get(&voter_id).copied().unwrap_or_default()
    }
}

impl ElectionCommission {
    /// Register candidates and voters and generate the commission's key pair
    pub fn new<G: KeysGenerator>(
        candidates: impl IntoIterator<Item = Candidate>,
        voters: impl IntoIterator<Item = VoterRegistration>,
        keys_generator: &G,
        config: ProtocolConfig,
    ) -> Result<Self, VotingError> {
        config.validate()?;

        let mut candidate_registry = IndexMap::new();
        for candidate in candidates {
            if candidate_registry.contains_key(&candidate.id) {
                return Err(VotingError::DuplicateCandidate(candidate.id));
            }
            candidate_registry.insert(candidate.id, candidate);
        }

        let mut voter_registry = HashMap::new();
        let mut statuses = HashMap::new();
        for voter in voters {
            if voter_registry.contains_key(&voter.id) {
                return Err(VotingError::DuplicateVoter(voter.id));
            }
            voter_registry.insert(voter.id, voter);
            statuses.insert(voter.id, VotingAttendanceStatus::NotAttended);
        }

        let (public_key, private_key) = keys_generator.generate_keys()?;
        let modulus_bits = public_key.size() * 8;
        if modulus_bits != config.key_size {
            return Err(VotingError::InvalidConfig(format!(
                "key_size is {} bits but the generated modulus has {} bits",
                config.key_size, modulus_bits
            )));
        }
        let results = VotingResults::new(candidate_registry.values());

        info!(
            "election commission set up with {} candidates and {} voters",
            candidate_registry.len(),
            voter_registry.len()
        );

        Ok(ElectionCommission {
            candidates: candidate_registry,
            voters: voter_registry,
            public_key,
            private_key,
            config,
            state: Mutex::new(CommissionState {
                statuses,
                results,
                completed: false,
            }),
        })
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Registered candidates, in registration order
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.values()
    }

    pub fn candidate_ids(&self) -> Vec<CandidateId> {
        self.candidates.keys().copied().collect()
    }

    pub fn get_candidate(&self, candidate_id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(&candidate_id)
    }

    pub fn voter_status(&self, voter_id: VoterId) -> Option<VotingAttendanceStatus> {
        if !self.voters.contains_key(&voter_id) {
            return None;
        }
        Some(self.lock_state().status(voter_id))
    }

    pub fn is_voting_completed(&self) -> bool {
        self.lock_state().completed
    }

    /// A snapshot of the tally and ballot log
    pub fn results(&self) -> VotingResults {
        self.lock_state().results.clone()
    }

    /// Close the election. Idempotent.
    pub fn complete_voting(&self) {
        let mut state = self.lock_state();
        if !state.completed {
            state.completed = true;
            info!(
                "voting completed with {} ballots cast",
                state.results.ballots().len()
            );
        }
    }

    /// Audit a voter's batch collection and blindly sign the spared batch.
    ///
    /// One batch is chosen at random to be spared; every other batch is opened
    /// with the collection's blinding factor and must contain exactly one ballot
    /// per registered candidate, all for the same voter. If the audit passes and
    /// the voter may receive a ballot, the voter moves to `ReceivedBallot` and
    /// the signatures over the spared batch are returned in its order.
    pub fn accept_batches<C, T, R>(
        &self,
        collection: &BallotBatchesCollection,
        crypto: &C,
        transformer: &T,
        random: &mut R,
    ) -> Result<Vec<Vec<u8>>, VotingError>
    where
        C: CryptoService,
        T: Transformer,
        R: RandomProvider + ?Sized,
    {
        let result = self.try_accept_batches(collection, crypto, transformer, random);
        if let Err(e) = &result {
            warn!("rejected ballot batches: {}", e);
        }
        result
    }

    fn try_accept_batches<C, T, R>(
        &self,
        collection: &BallotBatchesCollection,
        crypto: &C,
        transformer: &T,
        random: &mut R,
    ) -> Result<Vec<Vec<u8>>, VotingError>
    where
        C: CryptoService,
        T: Transformer,
        R: RandomProvider + ?Sized,
    {
        self.check_voting_not_completed(&self.lock_state())?;

        let batches = &collection.batches;
        if batches.len() != self.config.batches_count {
            return Err(VotingError::BatchCountMismatch {
                expected: self.config.batches_count,
                found: batches.len(),
            });
        }

        // Chosen only now that the whole collection is in hand
        let spared = random.next_index(batches.len()) % batches.len();
        debug!("sparing ballot batch {} of {}", spared, batches.len());

        let mut voter_id: Option<VoterId> = None;
        for (index, batch) in batches.iter().enumerate() {
            if index == spared {
                continue;
            }

            let batch_voter =
                self.audit_batch(batch, collection.blinding_factor(), crypto, transformer)?;
            match voter_id {
                None => voter_id = Some(batch_voter),
                Some(id) if id != batch_voter => return Err(VotingError::InconsistentBatchVoter),
                Some(_) => {}
            }
        }

        let spared_batch = &batches[spared];
        if spared_batch.len() != self.candidates.len() {
            return Err(VotingError::CandidateSetMismatch);
        }

        // There is always at least one audited batch, as batches_count >= 2
        let voter_id = voter_id.ok_or(VotingError::CandidateSetMismatch)?;
        self.check_voter_can_receive_ballot(voter_id, &self.lock_state())?;

        let signatures = spared_batch
            .masked_ballots
            .iter()
            .map(|masked| crypto.sign_hash(masked, &self.private_key))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VotingError::MalformedOrUndecryptableMessage)?;

        {
            let mut state = self.lock_state();
            self.check_voting_not_completed(&state)?;
            self.check_voter_can_receive_ballot(voter_id, &state)?;
            state
                .statuses
                .insert(voter_id, VotingAttendanceStatus::ReceivedBallot);
        }

        info!("issued blindly signed ballots to voter {}", voter_id);
        Ok(signatures)
    }

    /// Open every ballot of an audited batch and return the voter it names
    fn audit_batch<C, T>(
        &self,
        batch: &BallotBatch,
        blinding_factor: &BlindingFactor,
        crypto: &C,
        transformer: &T,
    ) -> Result<VoterId, VotingError>
    where
        C: CryptoService,
        T: Transformer,
    {
        let mut seen = HashSet::with_capacity(batch.len());
        let mut voter_id: Option<VoterId> = None;

        for masked in batch.masked_ballots.iter() {
            let ballot = self.unmask_ballot(masked, blinding_factor, crypto, transformer)?;

            if !self.candidates.contains_key(&ballot.candidate_id)
                || !seen.insert(ballot.candidate_id)
            {
                return Err(VotingError::CandidateSetMismatch);
            }

            match voter_id {
                None => voter_id = Some(ballot.voter_id),
                Some(id) if id != ballot.voter_id => {
                    return Err(VotingError::InconsistentBatchVoter)
                }
                Some(_) => {}
            }
        }

        if seen.len() != self.candidates.len() {
            return Err(VotingError::CandidateSetMismatch);
        }

        voter_id.ok_or(VotingError::CandidateSetMismatch)
    }

    /// Sign, demask and recover a masked ballot, exposing its plaintext
    fn unmask_ballot<C, T>(
        &self,
        masked: &[u8],
        blinding_factor: &BlindingFactor,
        crypto: &C,
        transformer: &T,
    ) -> Result<Ballot, VotingError>
    where
        C: CryptoService,
        T: Transformer,
    {
        let signature = crypto
            .sign_hash(masked, &self.private_key)
            .and_then(|signed| crypto.demask_signature(&signed, &self.public_key, blinding_factor))
            .and_then(|signature| crypto.recover(&signature, &self.public_key))
            .map_err(|_| VotingError::MalformedOrUndecryptableMessage)?;

        transformer
            .reverse_transform(&signature)
            .ok_or(VotingError::MalformedOrUndecryptableMessage)
    }

    /// Decrypt, verify and count a final ballot, returning its ballot number
    pub fn accept_vote<C, T>(
        &self,
        encrypted_signed_ballot: &[u8],
        crypto: &C,
        transformer: &T,
    ) -> Result<usize, VotingError>
    where
        C: CryptoService,
        T: Transformer,
    {
        let result = self.try_accept_vote(encrypted_signed_ballot, crypto, transformer);
        if let Err(e) = &result {
            warn!("rejected vote: {}", e);
        }
        result
    }

    fn try_accept_vote<C, T>(
        &self,
        encrypted_signed_ballot: &[u8],
        crypto: &C,
        transformer: &T,
    ) -> Result<usize, VotingError>
    where
        C: CryptoService,
        T: Transformer,
    {
        self.check_voting_not_completed(&self.lock_state())?;

        let signed_ballot: SignedBallot = crypto
            .decrypt(encrypted_signed_ballot, &self.private_key)
            .ok()
            .and_then(|decrypted| transformer.reverse_transform(&decrypted))
            .ok_or(VotingError::MalformedOrUndecryptableMessage)?;

        let ballot_bytes = transformer.transform(&signed_ballot.ballot)?;
        if !crypto.verify(&ballot_bytes, &signed_ballot.signature, &self.public_key) {
            return Err(VotingError::SignatureNotAuthentic);
        }

        let ballot = signed_ballot.ballot;
        let mut state = self.lock_state();
        self.check_voting_not_completed(&state)?;
        self.check_voter_can_vote(ballot.voter_id, &state)?;
        if !self.candidates.contains_key(&ballot.candidate_id) {
            return Err(VotingError::CandidateNotFound(ballot.candidate_id));
        }

        let ballot_number = state
            .results
            .add_vote(&ballot)
            .ok_or(VotingError::CandidateNotFound(ballot.candidate_id))?;
        state
            .statuses
            .insert(ballot.voter_id, VotingAttendanceStatus::Voted);

        info!("accepted ballot number {}", ballot_number);
        Ok(ballot_number)
    }

    fn check_voting_not_completed(&self, state: &CommissionState) -> Result<(), VotingError> {
        if state.completed {
            return Err(VotingError::VotingAlreadyCompleted);
        }
        Ok(())
    }

    fn check_voter_can_receive_ballot(
        &self,
        voter_id: VoterId,
        state: &CommissionState,
    ) -> Result<(), VotingError> {
        let registration = self
            .voters
            .get(&voter_id)
            .ok_or(VotingError::VoterNotFound(voter_id))?;

        if !registration.eligible {
            return Err(VotingError::VoterIneligible(voter_id));
        }

        match state.status(voter_id) {
            VotingAttendanceStatus::NotAttended => Ok(()),
            VotingAttendanceStatus::ReceivedBallot => {
                Err(VotingError::VoterAlreadyReceivedBallot(voter_id))
            }
            VotingAttendanceStatus::Voted => Err(VotingError::VoterAlreadyVoted(voter_id)),
        }
    }

    fn check_voter_can_vote(
        &self,
        voter_id: VoterId,
        state: &CommissionState,
    ) -> Result<(), VotingError> {
        if !self.voters.contains_key(&voter_id) {
            return Err(VotingError::VoterNotFound(voter_id));
        }

        if state.status(voter_id) == VotingAttendanceStatus::Voted {
            return Err(VotingError::VoterAlreadyVoted(voter_id));
        }

        Ok(())
    }

    // Every critical section commits fully or not at all, so a poisoned lock
    // still guards consistent state.
    fn lock_state(&self) -> MutexGuard<'_, CommissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
