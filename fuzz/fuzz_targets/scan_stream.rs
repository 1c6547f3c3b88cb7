#![no_main]

use libfuzzer_sys::fuzz_target;

// Scanning arbitrary text must terminate with either a token stream or a
// scan error, never a panic.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let mut scanner = safe_yaml::Scanner::new(input);
    loop {
        match scanner.next_token() {
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }
});
