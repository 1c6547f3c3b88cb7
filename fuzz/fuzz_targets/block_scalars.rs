#![no_main]

use libfuzzer_sys::fuzz_target;

// This fuzzer stresses block and plain scalar handling with long folded
// lines. Constructed sizes are capped to avoid pathological memory usage.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let cap: usize = 1 << 18;
    let mut line = String::new();
    while line.len() < cap {
        if line.len() + data.len() > cap {
            break;
        }
        line.push_str(&String::from_utf8_lossy(data));
    }
    let line: String = line.chars().filter(|c| !c.is_control()).collect();

    let yaml_plain = format!("{line}\n");
    let yaml_literal = format!("|\n  {line}\n  {line}\n");
    let yaml_folded = format!(">-\n  {line}\n\n  {line}\n");
    for yaml in [&yaml_plain, &yaml_literal, &yaml_folded] {
        let _ = safe_yaml::load(yaml);
    }
});
