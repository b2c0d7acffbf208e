use blindvote::*;

/// Number of voters taking part in the usual voting scenario. The remaining
/// two are kept fresh for the double voting scenarios.
pub const USUAL_VOTERS: usize = 7;

pub fn candidates() -> Vec<Candidate> {
    vec![
        Candidate::new(1, "Ishaan Allison"),
        Candidate::new(2, "Oliver Mendez"),
        Candidate::new(3, "Naomi Winter"),
    ]
}

/// Nine voters. The second one is not eligible.
pub fn registrations() -> Vec<VoterRegistration> {
    (0..9)
        .map(|position| VoterRegistration::new(position != 1))
        .collect()
}

/// The candidate chosen by the voter at `position`
pub fn candidate_for(position: usize) -> CandidateId {
    match position % 7 {
        0 | 1 | 3 => 1,
        2 => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_pattern() {
        let choices: Vec<CandidateId> = (0..9).map(candidate_for).collect();
        assert_eq!(choices, vec![1, 1, 2, 1, 3, 3, 3, 1, 1]);
    }

    #[test]
    fn second_voter_is_ineligible() {
        let registrations = registrations();
        assert_eq!(registrations.len(), 9);
        assert!(!registrations[1].eligible);
        assert_eq!(registrations.iter().filter(|r| r.eligible).count(), 8);
    }
}
