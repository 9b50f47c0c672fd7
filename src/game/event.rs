//! Game event stream payloads and kill attribution.
//!
//! Kill feeds arrive in several shapes depending on which game event fired:
//! either a positional `(killer, victim)` pair, or a single object whose keys
//! vary by event name, sometimes with the interesting part nested one level
//! down. [`KillPayload::extract`] normalizes all of them into a [`KillEvent`].

use serde_json::Value;

/// An event observed inside a game.
#[derive(Clone, Debug)]
pub enum GameEvent {
    Kill(KillPayload),
    PlayerJoin(String),
    PlayerLeave(String),
}

/// Raw kill feed payload before attribution.
#[derive(Clone, Debug)]
pub enum KillPayload {
    /// The event delivered killer and victim as two positional arguments.
    Positional { killer: Value, victim: Value },
    /// The event delivered a single object payload.
    Object(Value),
}

/// A normalized kill: who did it, and who died if that could be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KillEvent {
    pub killer: String,
    pub victim: Option<String>,
}

/// Resolves a display name from a value that is either a plain string or a
/// player-shaped object.
fn pick_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => ["name", "playerName", "username", "nick"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(pick_name),
        _ => None,
    }
}

/// Key priority for the killer side of an object payload.
const KILLER_KEYS: [&str; 6] = ["killer", "attacker", "from", "by", "player", "k"];
/// Key priority for the victim side of an object payload.
const VICTIM_KEYS: [&str; 5] = ["victim", "target", "to", "dead", "v"];
/// Flat name fallbacks checked when no killer-shaped value resolved.
const KILLER_NAME_KEYS: [&str; 3] = ["killerName", "attackerName", "fromName"];
const VICTIM_NAME_KEYS: [&str; 3] = ["victimName", "targetName", "toName"];

/// Containers a payload may nest the kill data under.
const NESTED_KEYS: [&str; 4] = ["data", "payload", "event", "kill"];

fn find_by_keys(payload: &Value, keys: &[&str]) -> Option<String> {
    let obj = payload.as_object()?;

    // Top-level keys win over nested containers.
    for key in keys {
        if let Some(name) = obj.get(*key).and_then(pick_name) {
            return Some(name);
        }
    }

    for container in NESTED_KEYS {
        if let Some(nested) = obj.get(container).filter(|v| v.is_object()) {
            for key in keys {
                if let Some(name) = nested.get(*key).and_then(pick_name) {
                    return Some(name);
                }
            }
        }
    }

    None
}

impl KillPayload {
    /// Attributes the kill, returning `None` when no killer can be resolved.
    ///
    /// An unresolvable victim still yields a kill; an unresolvable killer
    /// drops the event entirely.
    pub fn extract(&self) -> Option<KillEvent> {
        match self {
            KillPayload::Positional { killer, victim } => {
                let killer = pick_name(killer)?;
                Some(KillEvent {
                    killer,
                    victim: pick_name(victim),
                })
            }
            KillPayload::Object(payload) => {
                let killer = find_by_keys(payload, &KILLER_KEYS)
                    .or_else(|| find_by_keys(payload, &KILLER_NAME_KEYS))?;
                let victim = find_by_keys(payload, &VICTIM_KEYS)
                    .or_else(|| find_by_keys(payload, &VICTIM_NAME_KEYS));
                Some(KillEvent { killer, victim })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_positional_string_pair() {
        let payload = KillPayload::Positional {
            killer: json!("Alice"),
            victim: json!("Bob"),
        };

        assert_eq!(
            payload.extract(),
            Some(KillEvent {
                killer: "Alice".to_string(),
                victim: Some("Bob".to_string()),
            })
        );
    }

    #[test]
    fn extracts_positional_object_pair() {
        let payload = KillPayload::Positional {
            killer: json!({ "name": "Alice", "score": 12 }),
            victim: json!({ "playerName": "Bob" }),
        };

        let kill = payload.extract().unwrap();
        assert_eq!(kill.killer, "Alice");
        assert_eq!(kill.victim.as_deref(), Some("Bob"));
    }

    #[test]
    fn object_payload_killer_key_priority() {
        // "killer" outranks "attacker" even when both are present.
        let payload = KillPayload::Object(json!({
            "attacker": "Second",
            "killer": "First",
            "victim": "Dead",
        }));

        let kill = payload.extract().unwrap();
        assert_eq!(kill.killer, "First");
        assert_eq!(kill.victim.as_deref(), Some("Dead"));
    }

    #[test]
    fn object_payload_reads_nested_container() {
        let payload = KillPayload::Object(json!({
            "data": { "from": "Alice", "to": "Bob" },
        }));

        let kill = payload.extract().unwrap();
        assert_eq!(kill.killer, "Alice");
        assert_eq!(kill.victim.as_deref(), Some("Bob"));
    }

    #[test]
    fn top_level_keys_win_over_nested() {
        let payload = KillPayload::Object(json!({
            "killer": "Outer",
            "kill": { "killer": "Inner" },
        }));

        assert_eq!(payload.extract().unwrap().killer, "Outer");
    }

    #[test]
    fn falls_back_to_flat_name_keys() {
        let payload = KillPayload::Object(json!({
            "killerName": "Alice",
            "victimName": "Bob",
        }));

        let kill = payload.extract().unwrap();
        assert_eq!(kill.killer, "Alice");
        assert_eq!(kill.victim.as_deref(), Some("Bob"));
    }

    #[test]
    fn unresolvable_killer_drops_event() {
        let payload = KillPayload::Object(json!({ "victim": "Bob" }));
        assert_eq!(payload.extract(), None);

        let blank = KillPayload::Object(json!({ "killer": "   " }));
        assert_eq!(blank.extract(), None);
    }

    #[test]
    fn missing_victim_still_counts() {
        let payload = KillPayload::Object(json!({ "killer": "Alice" }));

        let kill = payload.extract().unwrap();
        assert_eq!(kill.killer, "Alice");
        assert_eq!(kill.victim, None);
    }

    #[test]
    fn names_are_trimmed() {
        let payload = KillPayload::Positional {
            killer: json!("  Alice "),
            victim: json!(""),
        };

        let kill = payload.extract().unwrap();
        assert_eq!(kill.killer, "Alice");
        assert_eq!(kill.victim, None);
    }
}
