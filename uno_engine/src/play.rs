//! Per-play legality checking.

use crate::deck::{Card, CardColor};
use crate::errors::GameError;

/// Decides whether a proposed play is legal against the current lead.
///
/// `lead_color` is the effective lead color: the chosen color when the lead
/// card is wild, the lead card's own color otherwise.
///
/// A play is legal when it is exactly one card and that card
/// - is a wild card (the caller records the chosen color separately), or
/// - matches the lead color, or
/// - is a number card of the same number as a number lead, or
/// - is a function card of the same effect as a function lead.
///
/// Multi-card plays are not supported yet and are rejected up front.
pub fn check_play(play: &[Card], lead_color: CardColor, lead_card: &Card) -> Result<(), GameError> {
    let played_card = match play {
        [] => return Err(GameError::EmptyPlay),
        [card] => card,
        _ => return Err(GameError::MultiCardPlay),
    };

    if played_card.is_wild() {
        return Ok(());
    }

    if played_card.color() == Some(lead_color) {
        return Ok(());
    }

    match (lead_card, played_card) {
        (Card::Number { number: lead, .. }, Card::Number { number, .. }) if lead == number => {
            Ok(())
        }
        (Card::Function { effect: lead, .. }, Card::Function { effect, .. }) if lead == effect => {
            Ok(())
        }
        _ => Err(GameError::IllegalPlay),
    }
}
