use crate::*;

/// A voter: its registration plus the secret blinding factor for its voting attempt.
///
/// The blinding factor never leaves the voter except as the opening of a batch
/// collection, and is destroyed once the final ballot has been produced.
#[derive(Debug)]
pub struct Voter {
    registration: VoterRegistration,
    blinding_factor: Option<BlindingFactor>,
    batches_count: usize,
}

impl Voter {
    /// Create a voter, deriving its blinding factor against the commission's public key
    pub fn new<G: KeysGenerator>(
        registration: VoterRegistration,
        commission_public_key: &RsaPublicKey,
        keys_generator: &G,
        config: &ProtocolConfig,
    ) -> Result<Self, VotingError> {
        let blinding_factor = keys_generator.generate_blinding_factor(commission_public_key)?;

        Ok(Voter {
            registration,
            blinding_factor: Some(blinding_factor),
            batches_count: config.batches_count,
        })
    }

    pub fn id(&self) -> VoterId {
        self.registration.id
    }

    pub fn is_eligible(&self) -> bool {
        self.registration.eligible
    }

    /// Whether the voter can still take part in the batch protocol
    pub fn has_blinding_factor(&self) -> bool {
        self.blinding_factor.is_some()
    }

    /// Build the batch collection for the commission's cut-and-choose audit.
    ///
    /// Every batch masks one ballot per candidate, in the order given.
    pub fn generate_ballot_batches<C, T>(
        &self,
        candidate_ids: &[CandidateId],
        commission_public_key: &RsaPublicKey,
        crypto: &C,
        transformer: &T,
    ) -> Result<BallotBatchesCollection, VotingError>
    where
        C: CryptoService,
        T: Transformer,
    {
        let blinding_factor = self
            .blinding_factor
            .as_ref()
            .ok_or(VotingError::BlindingFactorUnavailable)?;

        let mut batches = Vec::with_capacity(self.batches_count);
        for _ in 0..self.batches_count {
            let mut masked_ballots = Vec::with_capacity(candidate_ids.len());
            for candidate_id in candidate_ids {
                let ballot = Ballot::new(self.id(), *candidate_id);
                let ballot_bytes = transformer.transform(&ballot)?;
                let masked =
                    crypto.mask(&ballot_bytes, commission_public_key, blinding_factor)?;
                masked_ballots.push(masked);
            }
            batches.push(BallotBatch::new(masked_ballots));
        }

        debug!(
            "voter {} generated {} ballot batches of {} ballots",
            self.id(),
            batches.len(),
            candidate_ids.len()
        );

        Ok(BallotBatchesCollection::new(
            batches,
            blinding_factor.disclose(),
        ))
    }

    /// Unblind the commission's signatures and seal the ballot for `candidate_id`.
    ///
    /// The returned ciphertext is what gets cast with `ElectionCommission::accept_vote`.
    /// On success the blinding factor is destroyed.
    pub fn create_final_ballot<C, T>(
        &mut self,
        signed_masked_ballots: &[Vec<u8>],
        candidate_id: CandidateId,
        commission_public_key: &RsaPublicKey,
        crypto: &C,
        transformer: &T,
    ) -> Result<Vec<u8>, VotingError>
    where
        C: CryptoService,
        T: Transformer,
    {
        let blinding_factor = self
            .blinding_factor
            .as_ref()
            .ok_or(VotingError::BlindingFactorUnavailable)?;

        let signed_ballot = signed_masked_ballots
            .iter()
            .find_map(|signed_masked| {
                let signature = crypto
                    .demask_signature(signed_masked, commission_public_key, blinding_factor)
                    .ok()?;
                let ballot_bytes = crypto.recover(&signature, commission_public_key).ok()?;
                let ballot: Ballot = transformer.reverse_transform(&ballot_bytes)?;

                if ballot.voter_id == self.registration.id && ballot.candidate_id == candidate_id
                {
                    Some(SignedBallot::new(ballot, signature))
                } else {
                    None
                }
            })
            .ok_or(VotingError::BallotNotLocatable)?;

        let signed_ballot_bytes = transformer.transform(&signed_ballot)?;
        let encrypted = crypto.encrypt(&signed_ballot_bytes, commission_public_key)?;

        self.blinding_factor = None;
        debug!("voter {} sealed its final ballot", self.id());

        Ok(encrypted)
    }

    /// Replace the blinding factor, if the configuration allows retries with a fresh one
    pub fn renew_blinding_factor<G: KeysGenerator>(
        &mut self,
        commission_public_key: &RsaPublicKey,
        keys_generator: &G,
        config: &ProtocolConfig,
    ) -> Result<(), VotingError> {
        if !config.allow_blinding_factor_renewal {
            return Err(VotingError::BlindingFactorRenewalDisabled);
        }

        let blinding_factor = keys_generator.generate_blinding_factor(commission_public_key)?;
        self.blinding_factor = Some(blinding_factor);
        debug!("voter {} renewed its blinding factor", self.id());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_keys, CachedKeysGenerator};

    fn test_voter(config: &ProtocolConfig) -> (Voter, RsaPublicKey, RsaPrivateKey) {
        let (public_key, private_key) = test_keys();
        let voter = Voter::new(
            VoterRegistration::new(true),
            &public_key,
            &CachedKeysGenerator,
            config,
        )
        .unwrap();
        (voter, public_key, private_key)
    }

    #[test]
    fn batches_have_one_ballot_per_candidate() {
        let config = ProtocolConfig::default();
        let (voter, public_key, _) = test_voter(&config);

        let collection = voter
            .generate_ballot_batches(&[1, 2, 3], &public_key, &RsaBlindService, &CborTransformer)
            .unwrap();

        assert_eq!(collection.batches.len(), config.batches_count);
        for batch in collection.batches.iter() {
            assert_eq!(batch.len(), 3);
        }
        assert!(voter.has_blinding_factor());
    }

    #[test]
    fn final_ballot_requires_a_matching_signature() {
        let config = ProtocolConfig::default();
        let (mut voter, public_key, private_key) = test_voter(&config);
        let crypto = RsaBlindService;

        let collection = voter
            .generate_ballot_batches(&[1, 2], &public_key, &crypto, &CborTransformer)
            .unwrap();
        let signed: Vec<Vec<u8>> = collection.batches[0]
            .masked_ballots
            .iter()
            .map(|masked| crypto.sign_hash(masked, &private_key).unwrap())
            .collect();

        // No ballot for candidate 3 was ever signed
        assert!(matches!(
            voter.create_final_ballot(&signed, 3, &public_key, &crypto, &CborTransformer),
            Err(VotingError::BallotNotLocatable)
        ));

        // Garbage signatures are skipped
        assert!(matches!(
            voter.create_final_ballot(&[vec![1, 2, 3]], 1, &public_key, &crypto, &CborTransformer),
            Err(VotingError::BallotNotLocatable)
        ));
        assert!(voter.has_blinding_factor());

        let encrypted = voter
            .create_final_ballot(&signed, 2, &public_key, &crypto, &CborTransformer)
            .unwrap();
        assert!(!voter.has_blinding_factor());

        let decrypted = crypto.decrypt(&encrypted, &private_key).unwrap();
        let signed_ballot: SignedBallot = CborTransformer.reverse_transform(&decrypted).unwrap();
        assert_eq!(signed_ballot.ballot, Ballot::new(voter.id(), 2));

        let ballot_bytes = CborTransformer.transform(&signed_ballot.ballot).unwrap();
        assert!(crypto.verify(&ballot_bytes, &signed_ballot.signature, &public_key));

        // The blinding factor is gone
        assert!(matches!(
            voter.generate_ballot_batches(&[1, 2], &public_key, &crypto, &CborTransformer),
            Err(VotingError::BlindingFactorUnavailable)
        ));
        assert!(matches!(
            voter.create_final_ballot(&signed, 2, &public_key, &crypto, &CborTransformer),
            Err(VotingError::BlindingFactorUnavailable)
        ));
    }

    #[test]
    fn blinding_factor_renewal_follows_config() {
        let config = ProtocolConfig::default();
        let (mut voter, public_key, _) = test_voter(&config);

        assert!(matches!(
            voter.renew_blinding_factor(&public_key, &CachedKeysGenerator, &config),
            Err(VotingError::BlindingFactorRenewalDisabled)
        ));

        let config = ProtocolConfig {
            allow_blinding_factor_renewal: true,
            ..ProtocolConfig::default()
        };
        voter
            .renew_blinding_factor(&public_key, &CachedKeysGenerator, &config)
            .unwrap();
        assert!(voter.has_blinding_factor());
    }
}
