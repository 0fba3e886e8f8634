use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use super::{Pairing, Participant, SantaError};

/// Shuffles tried before giving up on finding a derangement.
pub const MAX_ATTEMPTS: usize = 1000;

/// Draws a random pairing where nobody gifts themselves.
///
/// Participants sharing a user id are counted once.
pub fn match_participants(participants: Vec<Participant>) -> Result<Pairing, SantaError> {
    match_with_rng(participants, &mut rand::rng())
}

pub(crate) fn match_with_rng<R: Rng + ?Sized>(
    participants: Vec<Participant>,
    rng: &mut R,
) -> Result<Pairing, SantaError> {
    let participants: BTreeMap<_, _> = participants
        .into_iter()
        .map(|participant| (participant.user_id, participant))
        .collect();

    if participants.len() < 2 {
        return Err(SantaError::InsufficientParticipants(participants.len()));
    }

    let givers: Vec<_> = participants.keys().copied().collect();
    let mut recipients = givers.clone();

    for attempt in 1..=MAX_ATTEMPTS {
        recipients.shuffle(rng);

        if givers.iter().zip(&recipients).all(|(giver, recipient)| giver != recipient) {
            debug!(attempt, participants = givers.len(), "Found derangement");
            let assignments = givers.iter().copied().zip(recipients).collect();
            return Ok(Pairing::from_parts(participants, assignments));
        }
    }

    Err(SantaError::MatchingFailed(MAX_ATTEMPTS))
}
