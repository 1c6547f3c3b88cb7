#![no_main]

use libfuzzer_sys::fuzz_target;

// Stress anchors, aliases and merge keys assembled from fuzz input. The
// loader must either produce values or fail cleanly; self-referential
// structures must not recurse forever.
fuzz_target!(|data: &[u8]| {
    let Ok(seed) = std::str::from_utf8(data) else {
        return;
    };
    let trimmed: String = seed.chars().take(64).filter(|c| c.is_alphanumeric()).collect();
    if trimmed.is_empty() {
        return;
    }
    let yaml = format!(
        "base: &{trimmed} {{a: 1, self: *{trimmed}}}\nuses:\n  <<: *{trimmed}\n  b: 2\n"
    );
    let _ = safe_yaml::load(&yaml);
    let _ = safe_yaml::load_all(seed);
});
