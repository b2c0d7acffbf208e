use crate::*;
use indexmap::IndexMap;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandidateVotingResults {
    pub candidate: Candidate,
    pub votes: usize,
}

/// One accepted vote in the chronological ballot log
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotRecord {
    pub voter_id: VoterId,
    pub ballot_number: usize,
    pub candidate_id: CandidateId,
}

/// Running tally and ballot log of an election.
///
/// Candidates keep their registration order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VotingResults {
    candidates: IndexMap<CandidateId, CandidateVotingResults>,
    ballots: Vec<BallotRecord>,
}

impl VotingResults {
    pub(crate) fn new<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|candidate| {
                let results = CandidateVotingResults {
                    candidate: candidate.clone(),
                    votes: 0,
                };
                (candidate.id, results)
            })
            .collect();

        VotingResults {
            candidates,
            ballots: vec![],
        }
    }

    /// Count a vote and append it to the log, returning its ballot number.
    ///
    /// The candidate must already be registered.
    pub(crate) fn add_vote(&mut self, ballot: &Ballot) -> Option<usize> {
        let results = self.candidates.get_mut(&ballot.candidate_id)?;
        results.votes += 1;

        let ballot_number = self.ballots.len() + 1;
        self.ballots.push(BallotRecord {
            voter_id: ballot.voter_id,
            ballot_number,
            candidate_id: ballot.candidate_id,
        });

        Some(ballot_number)
    }

    /// Per-candidate results in registration order
    pub fn candidates(&self) -> impl Iterator<Item = &CandidateVotingResults> {
        self.candidates.values()
    }

    pub fn votes_for(&self, candidate_id: CandidateId) -> Option<usize> {
        self.candidates.get(&candidate_id).map(|r| r.votes)
    }

    /// Candidates by descending vote count, ties kept in registration order
    pub fn ranked(&self) -> Vec<&CandidateVotingResults> {
        let mut ranked: Vec<&CandidateVotingResults> = self.candidates.values().collect();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked
    }

    /// The ballot log, ordered by ballot number
    pub fn ballots(&self) -> &[BallotRecord] {
        &self.ballots
    }

    pub fn total_votes(&self) -> usize {
        self.candidates.values().map(|r| r.votes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(1, "Ishaan Allison"),
            Candidate::new(2, "Oliver Mendez"),
            Candidate::new(3, "Naomi Winter"),
        ]
    }

    #[test]
    fn ranking_breaks_ties_by_registration_order() {
        let candidates = candidates();
        let mut results = VotingResults::new(&candidates);
        let voter = VoterId::generate();

        results.add_vote(&Ballot::new(voter, 3)).unwrap();
        results.add_vote(&Ballot::new(voter, 2)).unwrap();
        results.add_vote(&Ballot::new(voter, 3)).unwrap();

        let ranked: Vec<CandidateId> = results.ranked().iter().map(|r| r.candidate.id).collect();
        assert_eq!(ranked, vec![3, 2, 1]);

        results.add_vote(&Ballot::new(voter, 1)).unwrap();
        let in_registration_order: Vec<(CandidateId, usize)> = results
            .candidates()
            .map(|r| (r.candidate.id, r.votes))
            .collect();
        assert_eq!(in_registration_order, vec![(1, 1), (2, 1), (3, 2)]);

        let ranked: Vec<CandidateId> = results.ranked().iter().map(|r| r.candidate.id).collect();
        assert_eq!(ranked, vec![3, 1, 2]);
    }

    #[test]
    fn ballot_numbers_are_sequential() {
        let candidates = candidates();
        let mut results = VotingResults::new(&candidates);

        for i in 0..5 {
            let number = results
                .add_vote(&Ballot::new(VoterId::generate(), 1 + (i % 3)))
                .unwrap();
            assert_eq!(number, i as usize + 1);
        }

        let numbers: Vec<usize> = results.ballots().iter().map(|b| b.ballot_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(results.total_votes(), 5);
        assert_eq!(results.votes_for(1), Some(2));
        assert_eq!(results.votes_for(9), None);
    }

    #[test]
    fn unknown_candidate_is_not_counted() {
        let candidates = candidates();
        let mut results = VotingResults::new(&candidates);
        assert!(results.add_vote(&Ballot::new(VoterId::generate(), 9)).is_none());
        assert!(results.ballots().is_empty());
        assert_eq!(results.total_votes(), 0);
    }
}
