fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use companion_animation::AnimState;
    use companion_client::{CompanionState, Role};
    use companion_protocol::{
        AnimationAction, EmotionState, IncomingMessage, OutgoingMessage, decode,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Loads a fixture holding an array of frames, one JSON text per element.
    fn load_frames(name: &str) -> Vec<String> {
        match load_fixture(name) {
            serde_json::Value::Array(frames) => frames.iter().map(|f| f.to_string()).collect(),
            other => panic!("fixture {name} is not an array: {other}"),
        }
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// The backend may send `0` where Rust serializes `0.0`.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, float-normalized comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  backend: {fixture}\n  rust:    {reserialized}"
        );
    }

    // --- Payload shapes ---

    #[test]
    fn fixture_user_message() {
        roundtrip_test::<OutgoingMessage>("user_message.json");
    }

    #[test]
    fn fixture_response_text() {
        roundtrip_test::<IncomingMessage>("response_text.json");
    }

    #[test]
    fn fixture_emotion_update() {
        roundtrip_test::<IncomingMessage>("emotion_update.json");
    }

    #[test]
    fn fixture_animation_command() {
        roundtrip_test::<IncomingMessage>("animation_command.json");
    }

    #[test]
    fn fixture_error_with_request() {
        roundtrip_test::<IncomingMessage>("error_with_request.json");
    }

    #[test]
    fn fixture_error_without_request() {
        roundtrip_test::<IncomingMessage>("error_without_request.json");
    }

    // --- Decoding behavior ---

    #[test]
    fn out_of_range_emotion_is_clamped() {
        match decode(&read_fixture("emotion_out_of_range.json")).unwrap() {
            IncomingMessage::EmotionUpdate(emotion) => {
                assert_eq!(emotion, EmotionState::new(1.0, -1.0, "ecstatic"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_rejected() {
        for frame in load_frames("rejected_frames.json") {
            assert!(decode(&frame).is_err(), "frame should not decode: {frame}");
        }
    }

    #[test]
    fn conversation_turn_drives_state() {
        let mut state = CompanionState::new();
        let mut anim = Vec::new();
        for frame in load_frames("conversation_turn.json") {
            let msg = decode(&frame).unwrap_or_else(|e| panic!("{frame}: {e}"));
            state.apply(msg);
            anim.push(state.anim_state());
        }

        assert_eq!(
            anim,
            [
                AnimState::Thinking,
                AnimState::Thinking,
                AnimState::Talking,
                AnimState::Talking,
                AnimState::Happy,
            ]
        );
        assert_eq!(state.action(), AnimationAction::Idle);

        let entries = state.transcript().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "turn-1-resp");
        assert_eq!(entries[0].role, Role::Companion);
    }
}
