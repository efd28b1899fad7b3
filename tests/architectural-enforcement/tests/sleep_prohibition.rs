//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Time in the core
//! only moves through `Stage::advance`; the terminal surface may sleep only
//! to pace its frame tick.
//! **Exceptions**: Frame pacing (TUI app loop only), test code

use std::path::Path;

use architectural_enforcement::{code_part, read_lines, rust_sources};

struct SleepPolicy {
    allow_frame_limiting: bool,
}

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for path in rust_sources("companion/core/src") {
        check_file(&path, &mut violations, &SleepPolicy { allow_frame_limiting: false });
    }
    for path in rust_sources("tui/src") {
        check_file(&path, &mut violations, &SleepPolicy { allow_frame_limiting: true });
    }

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nAcceptable: the frame tick in tui/src/app.rs, test code.");
        eprintln!("Everything else waits on events or the stage clock.");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

#[test]
fn test_sources_are_found() {
    assert!(!rust_sources("companion/core/src").is_empty());
    assert!(!rust_sources("tui/src").is_empty());
}

fn check_file(path: &Path, violations: &mut Vec<String>, policy: &SleepPolicy) {
    let lines = read_lines(path);
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

    for (idx, line) in lines.iter().enumerate() {
        let code = code_part(line);
        if !(code.contains("::sleep(") || code.contains(".sleep(")) {
            continue;
        }
        if is_in_test_module(&lines, idx) {
            continue;
        }
        if policy.allow_frame_limiting
            && path.ends_with("tui/src/app.rs")
            && is_frame_limiting_context(&lines, idx)
        {
            continue;
        }
        violations.push(format!("{}:{} - {}", path.display(), idx + 1, line.trim()));
    }
}

/// Check if a line sits below a `#[cfg(test)]` module or inside a test fn
fn is_in_test_module(lines: &[&str], current_idx: usize) -> bool {
    for line in lines[..current_idx].iter().rev() {
        let line = line.trim();
        if line.starts_with("#[cfg(test)]")
            || line.starts_with("#[test]")
            || line.starts_with("#[tokio::test")
        {
            return true;
        }
        if line.starts_with("impl ") || line.starts_with("pub fn ") {
            return false;
        }
    }
    false
}

/// Check if sleep paces the frame loop
fn is_frame_limiting_context(lines: &[&str], current_idx: usize) -> bool {
    let start = current_idx.saturating_sub(5);
    let end = (current_idx + 3).min(lines.len());
    lines[start..end].iter().any(|line| {
        let line = line.to_lowercase();
        line.contains("frame") || line.contains("tick")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_plain_sleep() {
        let code = [
            "pub fn wait_for_fade() {",
            "    std::thread::sleep(Duration::from_millis(600));",
            "}",
        ];
        assert!(!is_in_test_module(&code, 1));
        assert!(!is_frame_limiting_context(&code, 1));
    }

    #[test]
    fn test_accepts_frame_tick() {
        let code = [
            "            // Frame tick",
            "            _ = tokio::time::sleep(TICK) => {}",
        ];
        assert!(is_frame_limiting_context(&code, 1));
    }

    #[test]
    fn test_accepts_test_module() {
        let code = [
            "#[cfg(test)]",
            "mod tests {",
            "    fn slow() { std::thread::sleep(d); }",
            "}",
        ];
        assert!(is_in_test_module(&code, 2));
    }
}
