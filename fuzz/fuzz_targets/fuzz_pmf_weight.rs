#![no_main]
use libfuzzer_sys::fuzz_target;
use schimp_prob::ProbabilityMassFunction;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Weight parsing and finalisation must never panic on any input.
        let mut pmf = ProbabilityMassFunction::new();
        if pmf.add_str(0u8, s).is_ok() {
            let _ = pmf.finalise();
        }
    }
});
