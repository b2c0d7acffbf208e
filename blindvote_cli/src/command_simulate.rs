use crate::demo;
use blindvote::*;

const COMMAND: &str = "simulate";

pub fn command_simulate(matches: &clap::ArgMatches) {
    let config = match matches.value_of("config") {
        Some(filename) => {
            let bytes = std::fs::read(filename).unwrap_or_else(|e| {
                crate::fail(COMMAND, format!("unable to read {}: {}", filename, e))
            });
            ProtocolConfig::from_json(&bytes).unwrap_or_else(|e| crate::fail(COMMAND, e))
        }
        None => ProtocolConfig::from_env().unwrap_or_else(|e| crate::fail(COMMAND, e)),
    };

    match matches.value_of("seed") {
        Some(seed) => {
            let seed: u64 = seed
                .parse()
                .unwrap_or_else(|_| crate::fail(COMMAND, format!("invalid seed: {}", seed)));
            simulate(config, &mut SeededRandomProvider::new(seed));
        }
        None => simulate(config, &mut OsRandomProvider),
    }
}

fn simulate<R: RandomProvider>(config: ProtocolConfig, random: &mut R) {
    let keys_generator = RsaKeysGenerator::new(config.key_size);
    let registrations = demo::registrations();

    let commission = ElectionCommission::new(
        demo::candidates(),
        registrations.iter().copied(),
        &keys_generator,
        config.clone(),
    )
    .unwrap_or_else(|e| crate::fail(COMMAND, e));

    let mut voters = registrations
        .into_iter()
        .map(|registration| {
            Voter::new(
                registration,
                commission.public_key(),
                &keys_generator,
                &config,
            )
        })
        .collect::<Result<Vec<Voter>, VotingError>>()
        .unwrap_or_else(|e| crate::fail(COMMAND, e));

    let candidate_ids = commission.candidate_ids();
    let (usual, reserved) = voters.split_at_mut(demo::USUAL_VOTERS);

    print_usual_voting(&commission, usual, random);
    print_voting_with_incorrect_ballot(&commission);
    print_double_ballot_case_1(&commission, &reserved[0], random);

    let candidate_id = random.next_item(&candidate_ids).copied().unwrap_or(1);
    print_double_ballot_case_2(&commission, &mut reserved[1], candidate_id, random);

    print_voting_results(&commission);
    print_voting_after_completion(&commission, &reserved[0], random);
}

fn print_error(error: &VotingError) {
    println!("Error: {}", error);
}

fn request_signed_batch<R: RandomProvider>(
    commission: &ElectionCommission,
    voter: &Voter,
    random: &mut R,
) -> Result<Vec<Vec<u8>>, VotingError> {
    let collection = voter.generate_ballot_batches(
        &commission.candidate_ids(),
        commission.public_key(),
        &RsaBlindService,
        &CborTransformer,
    )?;
    commission.accept_batches(&collection, &RsaBlindService, &CborTransformer, random)
}

fn vote<R: RandomProvider>(
    commission: &ElectionCommission,
    voter: &mut Voter,
    candidate_id: CandidateId,
    random: &mut R,
) -> Result<usize, VotingError> {
    let signed_batch = request_signed_batch(commission, voter, random)?;
    let final_ballot = voter.create_final_ballot(
        &signed_batch,
        candidate_id,
        commission.public_key(),
        &RsaBlindService,
        &CborTransformer,
    )?;
    commission.accept_vote(&final_ballot, &RsaBlindService, &CborTransformer)
}

fn print_usual_voting<R: RandomProvider>(
    commission: &ElectionCommission,
    voters: &mut [Voter],
    random: &mut R,
) {
    println!("Candidates:");
    for candidate in commission.candidates() {
        println!("{} (id: {})", candidate.full_name, candidate.id);
    }
    println!();

    println!("Usual voting:");

    for (position, voter) in voters.iter_mut().enumerate() {
        match vote(commission, voter, demo::candidate_for(position), random) {
            Ok(_) => println!("Voter {} has cast their vote successfully.", voter.id()),
            Err(e) => print_error(&e),
        }
    }

    println!();
}

fn print_voting_with_incorrect_ballot(commission: &ElectionCommission) {
    println!("Voting with incorrect ballot:");

    let final_ballot = [4u8, 6, 8, 0];
    if let Err(e) = commission.accept_vote(&final_ballot, &RsaBlindService, &CborTransformer) {
        print_error(&e);
    }

    println!();
}

fn print_double_ballot_case_1<R: RandomProvider>(
    commission: &ElectionCommission,
    voter: &Voter,
    random: &mut R,
) {
    println!("Trying to vote two times (case 1: generate 2 ballots):");

    let collection = match voter.generate_ballot_batches(
        &commission.candidate_ids(),
        commission.public_key(),
        &RsaBlindService,
        &CborTransformer,
    ) {
        Ok(collection) => collection,
        Err(e) => {
            print_error(&e);
            println!();
            return;
        }
    };

    match commission.accept_batches(&collection, &RsaBlindService, &CborTransformer, random) {
        Ok(_) => println!("Batch has been signed for the first time."),
        Err(e) => print_error(&e),
    }
    if let Err(e) =
        commission.accept_batches(&collection, &RsaBlindService, &CborTransformer, random)
    {
        print_error(&e);
    }

    println!();
}

fn print_double_ballot_case_2<R: RandomProvider>(
    commission: &ElectionCommission,
    voter: &mut Voter,
    candidate_id: CandidateId,
    random: &mut R,
) {
    println!("Trying to vote two times (case 2: vote with same ballot two times):");

    let final_ballot = request_signed_batch(commission, voter, random).and_then(|signed_batch| {
        println!("Batch has been signed for the first time.");
        voter.create_final_ballot(
            &signed_batch,
            candidate_id,
            commission.public_key(),
            &RsaBlindService,
            &CborTransformer,
        )
    });
    let final_ballot = match final_ballot {
        Ok(final_ballot) => final_ballot,
        Err(e) => {
            print_error(&e);
            println!();
            return;
        }
    };

    for attempt in ["first", "second"] {
        match commission.accept_vote(&final_ballot, &RsaBlindService, &CborTransformer) {
            Ok(_) => println!("Vote has been accepted for the {} time.", attempt),
            Err(e) => print_error(&e),
        }
    }

    println!();
}

fn print_voting_results(commission: &ElectionCommission) {
    println!("Results:");
    commission.complete_voting();

    let results = commission.results();
    println!("Ballots:");
    for record in results.ballots() {
        println!(
            "Ballot {} Voter {} Candidate {}",
            record.ballot_number, record.voter_id, record.candidate_id
        );
    }

    println!("Candidates:");
    for candidate_results in results.ranked() {
        println!(
            "{} (id: {}): {} votes",
            candidate_results.candidate.full_name,
            candidate_results.candidate.id,
            candidate_results.votes
        );
    }

    println!();
}

fn print_voting_after_completion<R: RandomProvider>(
    commission: &ElectionCommission,
    voter: &Voter,
    random: &mut R,
) {
    println!("Trying to vote after the completion of voting:");
    if !commission.is_voting_completed() {
        commission.complete_voting();
    }

    if let Err(e) = request_signed_batch(commission, voter, random) {
        print_error(&e);
    }

    let fake_final_ballot = [4u8, 6, 8, 0];
    if let Err(e) = commission.accept_vote(&fake_final_ballot, &RsaBlindService, &CborTransformer)
    {
        print_error(&e);
    }

    println!();
}
