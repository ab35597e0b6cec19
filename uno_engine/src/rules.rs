//! Game rules and their declarative schema.
//!
//! Each rule carries a validator in [`RULE_SPECS`]: a type plus an optional
//! numeric range. Rule updates are two-phase: every proposed key is validated
//! against the schema first, and only if all pass is the whole batch committed
//! into a fresh copy of the rule set. The live rules are therefore always
//! fully valid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_INITIAL_HAND_SIZE, DEFAULT_PLAYER_CAPACITY, MAX_INITIAL_HAND_SIZE, MAX_PLAYER_CAPACITY,
    MIN_INITIAL_HAND_SIZE, MIN_PLAYER_CAPACITY,
};
use crate::errors::GameError;

/// Expected shape of one rule value.
#[derive(Clone, Copy, Debug)]
pub enum RuleKind {
    Int { min: i64, max: i64 },
    Bool,
}

/// One entry of the rule schema: name, expected type/range, and a short
/// human-readable hint (surfaced by clients next to the rule editor).
#[derive(Clone, Copy, Debug)]
pub struct RuleSpec {
    pub name: &'static str,
    pub kind: RuleKind,
    pub hint: &'static str,
}

pub const RULE_SPECS: [RuleSpec; 4] = [
    RuleSpec {
        name: "player_capacity",
        kind: RuleKind::Int {
            min: MIN_PLAYER_CAPACITY as i64,
            max: MAX_PLAYER_CAPACITY as i64,
        },
        hint: "maximum number of seats at the table",
    },
    RuleSpec {
        name: "shuffle_players",
        kind: RuleKind::Bool,
        hint: "shuffle players before starting",
    },
    RuleSpec {
        name: "initial_hand_size",
        kind: RuleKind::Int {
            min: MIN_INITIAL_HAND_SIZE as i64,
            max: MAX_INITIAL_HAND_SIZE as i64,
        },
        hint: "cards dealt to each player at start",
    },
    RuleSpec {
        name: "any_last_play",
        kind: RuleKind::Bool,
        hint: "allow non-number card as last play",
    },
];

pub fn rule_spec(name: &str) -> Option<&'static RuleSpec> {
    RULE_SPECS.iter().find(|spec| spec.name == name)
}

/// Validates one proposed rule value against the schema.
pub fn check_rule_update(key: &str, value: &Value) -> Result<(), GameError> {
    let spec = rule_spec(key).ok_or_else(|| GameError::UnknownRule {
        rule: key.to_string(),
    })?;
    match spec.kind {
        RuleKind::Int { min, max } => {
            let got = value.as_i64().ok_or_else(|| GameError::RuleType {
                rule: key.to_string(),
                expected: "an integer".to_string(),
            })?;
            if got < min || got > max {
                return Err(GameError::RuleRange {
                    rule: key.to_string(),
                    min,
                    max,
                    got,
                });
            }
        }
        RuleKind::Bool => {
            if !value.is_boolean() {
                return Err(GameError::RuleType {
                    rule: key.to_string(),
                    expected: "a boolean".to_string(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameRules {
    pub player_capacity: usize,
    pub shuffle_players: bool,
    pub initial_hand_size: usize,
    pub any_last_play: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            player_capacity: DEFAULT_PLAYER_CAPACITY,
            shuffle_players: false,
            initial_hand_size: DEFAULT_INITIAL_HAND_SIZE,
            any_last_play: false,
        }
    }
}

impl GameRules {
    /// Returns a copy with the proposed partial update applied. Validation
    /// runs over the whole batch before anything is applied, so an update
    /// with one invalid key changes nothing.
    pub fn with_updates(&self, updates: &Map<String, Value>) -> Result<Self, GameError> {
        for (key, value) in updates {
            check_rule_update(key, value)?;
        }
        let mut rules = self.clone();
        for (key, value) in updates {
            match (key.as_str(), value.as_i64(), value.as_bool()) {
                ("player_capacity", Some(n), _) => rules.player_capacity = n as usize,
                ("initial_hand_size", Some(n), _) => rules.initial_hand_size = n as usize,
                ("shuffle_players", _, Some(b)) => rules.shuffle_players = b,
                ("any_last_play", _, Some(b)) => rules.any_last_play = b,
                _ => {}
            }
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn updates(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_valid_update() {
        let rules = GameRules::default()
            .with_updates(&updates(json!({
                "player_capacity": 4,
                "shuffle_players": true,
            })))
            .unwrap();
        assert_eq!(rules.player_capacity, 4);
        assert!(rules.shuffle_players);
        // Untouched keys keep their defaults.
        assert_eq!(rules.initial_hand_size, DEFAULT_INITIAL_HAND_SIZE);
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let err = GameRules::default()
            .with_updates(&updates(json!({"house_rule": 1})))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::UnknownRule {
                rule: "house_rule".to_string()
            }
        );
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let defaults = GameRules::default();
        assert!(matches!(
            defaults.with_updates(&updates(json!({"player_capacity": "many"}))),
            Err(GameError::RuleType { .. })
        ));
        assert!(matches!(
            defaults.with_updates(&updates(json!({"player_capacity": 4.5}))),
            Err(GameError::RuleType { .. })
        ));
        assert!(matches!(
            defaults.with_updates(&updates(json!({"any_last_play": 1}))),
            Err(GameError::RuleType { .. })
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = GameRules::default()
            .with_updates(&updates(json!({"initial_hand_size": 99})))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::RuleRange {
                rule: "initial_hand_size".to_string(),
                min: MIN_INITIAL_HAND_SIZE as i64,
                max: MAX_INITIAL_HAND_SIZE as i64,
                got: 99,
            }
        );
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let defaults = GameRules::default();
        let result = defaults.with_updates(&updates(json!({
            "player_capacity": 4,
            "initial_hand_size": 99,
        })));
        assert!(result.is_err());
        // The failed batch must not have touched the source rules.
        assert_eq!(defaults, GameRules::default());
    }

    #[test]
    fn test_schema_covers_every_rule_field() {
        let as_json = serde_json::to_value(GameRules::default()).unwrap();
        let keys: Vec<&String> = as_json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), RULE_SPECS.len());
        for key in keys {
            assert!(rule_spec(key).is_some(), "no spec for rule {key}");
        }
    }
}
