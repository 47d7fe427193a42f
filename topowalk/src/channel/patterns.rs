//! Pattern helpers for prompt and pager detection.

use regex::bytes::Regex;

/// Pager prompts seen across the supported switch CLIs.
///
/// Kontron/iStaX prints `-- more --, next page: Space, continue: g, quit: ^C`,
/// HiOS and Lantech print `--More--`.
pub const DEFAULT_PAGER_PATTERN: &str = r"(?i)--\s?more\s?--(?:[^\n]*next page: space[^\n]*)?|next page: space[^\n]*";

/// Compile a prompt pattern string into a regex.
///
/// Prompts are always at the end of the buffer, so the pattern is anchored
/// to the end if it is not already.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!(r"{}\s*$", pattern)
    };

    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_prompt_pattern() {
        // Pattern without anchor gets one added
        let pattern = compile_prompt_pattern(r"EthernetSwitch#").unwrap();
        assert!(pattern.is_match(b"EthernetSwitch# "));
        assert!(!pattern.is_match(b"EthernetSwitch# show version"));

        // Pattern with anchor stays as-is
        let pattern = compile_prompt_pattern(r"(?m)^\(BOBCAT\) >$").unwrap();
        assert!(pattern.is_match(b"output\n(BOBCAT) >"));
    }

    #[test]
    fn test_default_pager_pattern() {
        let pager = Regex::new(DEFAULT_PAGER_PATTERN).unwrap();
        assert!(pager.is_match(b"--More--"));
        assert!(pager.is_match(b"-- more --, next page: Space, continue: g, quit: ^C"));
        assert!(!pager.is_match(b"System name....sw1"));
    }
}
