use crate::{
    config::KeyBindings,
    state::{
        round::{CHOICES_PER_ROUND, Player},
        state_machine::{AnswerSelection, RoundEvent},
    },
};

/// Resolve a key name into the round event it is bound to.
///
/// Digits `1` to `4` always select the answer at that position. Bindings are matched
/// case-insensitively for single letters so Caps Lock does not break the buzzers.
pub fn event_for_key(bindings: &KeyBindings, key: &str) -> Option<RoundEvent> {
    if let Some(position) = key
        .parse::<usize>()
        .ok()
        .filter(|position| (1..=CHOICES_PER_ROUND).contains(position))
    {
        return Some(RoundEvent::SelectAnswer(AnswerSelection::Position(position)));
    }

    let table = [
        (&bindings.start_round, RoundEvent::StartRound),
        (&bindings.advance, RoundEvent::Advance),
        (&bindings.player1_buzz, RoundEvent::Buzz(Player::One)),
        (&bindings.player2_buzz, RoundEvent::Buzz(Player::Two)),
        (&bindings.hint, RoundEvent::RequestHint),
        (&bindings.quit, RoundEvent::Quit),
    ];

    table
        .into_iter()
        .find(|(bound, _)| key_matches(bound, key))
        .map(|(_, event)| event)
}

fn key_matches(bound: &str, key: &str) -> bool {
    if bound.chars().count() == 1 {
        bound.to_lowercase() == key.to_lowercase()
    } else {
        bound == key
    }
}
