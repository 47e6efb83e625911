#![no_main]
use libfuzzer_sys::fuzz_target;
use schimp_attacker::{AttackerState, StateSchema, StateVector};

fuzz_target!(|data: (bool, bool, Vec<i64>)| {
    let (track_time, track_power, values) = data;
    let Ok(schema) = StateSchema::new(track_time, track_power, &["x", "y"]) else {
        return;
    };
    // Decoding must never panic, and anything that decodes must survive re-encoding.
    if let Ok(state) = AttackerState::decode(&schema, &StateVector::new(values)) {
        let encoded = state.encode(&schema);
        assert_eq!(AttackerState::decode(&schema, &encoded).ok(), Some(state));
    }
});
