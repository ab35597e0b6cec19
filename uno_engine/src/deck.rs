//! Cards and deck construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The four basic card colors. Wild cards carry no color at all; the chosen
/// color of an active wild lives on the game as the lead color.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Red,
    Green,
    Blue,
    Yellow,
}

pub const BASIC_CARD_COLORS: [CardColor; 4] = [
    CardColor::Red,
    CardColor::Green,
    CardColor::Blue,
    CardColor::Yellow,
];

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Yellow => "Yellow",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum FunctionEffect {
    #[serde(rename = "skip")]
    Skip,
    #[serde(rename = "+2")]
    DrawTwo,
    #[serde(rename = "reverse")]
    Reverse,
}

pub const FUNCTION_CARD_EFFECTS: [FunctionEffect; 3] = [
    FunctionEffect::Skip,
    FunctionEffect::DrawTwo,
    FunctionEffect::Reverse,
];

impl fmt::Display for FunctionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Skip => "skip",
            Self::DrawTwo => "+2",
            Self::Reverse => "reverse",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum WildEffect {
    #[serde(rename = "+4")]
    DrawFour,
    #[serde(rename = "color")]
    ChooseColor,
}

pub const WILD_CARD_EFFECTS: [WildEffect; 2] = [WildEffect::DrawFour, WildEffect::ChooseColor];

impl fmt::Display for WildEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::DrawFour => "+4",
            Self::ChooseColor => "color",
        };
        write!(f, "{repr}")
    }
}

/// A single card. Number and function cards always carry a basic color;
/// wild cards never do, which makes the color/wild invariant structural.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Card {
    Number {
        id: Uuid,
        color: CardColor,
        number: u8,
    },
    Function {
        id: Uuid,
        color: CardColor,
        effect: FunctionEffect,
    },
    Wild {
        id: Uuid,
        effect: WildEffect,
    },
}

impl Card {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Number { id, .. } | Self::Function { id, .. } | Self::Wild { id, .. } => *id,
        }
    }

    /// The card's own color; `None` for wild cards.
    pub fn color(&self) -> Option<CardColor> {
        match self {
            Self::Number { color, .. } | Self::Function { color, .. } => Some(*color),
            Self::Wild { .. } => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number { .. })
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, Self::Wild { .. })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { color, number, .. } => write!(f, "{color}-{number}"),
            Self::Function { color, effect, .. } => write!(f, "{color}-{effect}"),
            Self::Wild { effect, .. } => write!(f, "{effect}"),
        }
    }
}

/// Builds one unshuffled standard deck: per color one zero, two of each 1-9,
/// and two of each function effect; plus four of each wild effect. 108 cards,
/// each with a freshly generated id.
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(108);
    for color in BASIC_CARD_COLORS {
        deck.push(Card::Number {
            id: Uuid::new_v4(),
            color,
            number: 0,
        });
        for number in 1..=9 {
            for _ in 0..2 {
                deck.push(Card::Number {
                    id: Uuid::new_v4(),
                    color,
                    number,
                });
            }
        }
        for effect in FUNCTION_CARD_EFFECTS {
            for _ in 0..2 {
                deck.push(Card::Function {
                    id: Uuid::new_v4(),
                    color,
                    effect,
                });
            }
        }
    }
    for effect in WILD_CARD_EFFECTS {
        for _ in 0..4 {
            deck.push(Card::Wild {
                id: Uuid::new_v4(),
                effect,
            });
        }
    }
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deck_size() {
        assert_eq!(create_deck().len(), 108);
    }

    #[test]
    fn test_deck_composition() {
        let deck = create_deck();
        let numbers = deck.iter().filter(|c| c.is_number()).count();
        let functions = deck
            .iter()
            .filter(|c| matches!(c, Card::Function { .. }))
            .count();
        let wilds = deck.iter().filter(|c| c.is_wild()).count();
        assert_eq!(numbers, 4 * 19);
        assert_eq!(functions, 4 * 6);
        assert_eq!(wilds, 8);
    }

    #[test]
    fn test_deck_ids_are_unique() {
        let deck = create_deck();
        let ids: HashSet<_> = deck.iter().map(Card::id).collect();
        assert_eq!(ids.len(), deck.len());
    }

    #[test]
    fn test_card_display() {
        let five = Card::Number {
            id: Uuid::new_v4(),
            color: CardColor::Red,
            number: 5,
        };
        let skip = Card::Function {
            id: Uuid::new_v4(),
            color: CardColor::Blue,
            effect: FunctionEffect::Skip,
        };
        let wild = Card::Wild {
            id: Uuid::new_v4(),
            effect: WildEffect::DrawFour,
        };
        assert_eq!(five.to_string(), "Red-5");
        assert_eq!(skip.to_string(), "Blue-skip");
        assert_eq!(wild.to_string(), "+4");
    }

    #[test]
    fn test_wild_cards_have_no_color() {
        for card in create_deck() {
            assert_eq!(card.color().is_none(), card.is_wild());
        }
    }

    #[test]
    fn test_card_serde_shape() {
        let card = Card::Function {
            id: Uuid::nil(),
            color: CardColor::Yellow,
            effect: FunctionEffect::DrawTwo,
        };
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["color"], "yellow");
        assert_eq!(json["effect"], "+2");
    }
}
