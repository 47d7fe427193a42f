//! Platform definition for vendor-specific session behavior.

use std::fmt;

use regex::bytes::Regex;

use crate::channel::{DEFAULT_PAGER_PATTERN, compile_prompt_pattern};
use crate::error::{PlatformError, Result};
use crate::model::Vendor;

/// Command used to confirm a vendor, and the markers its output must carry.
#[derive(Debug, Clone)]
pub struct Identification {
    /// Command run right after login.
    pub command: String,

    /// Case-insensitive substrings; any one of them confirms the vendor.
    pub signatures: Vec<String>,
}

impl Identification {
    /// Return the first signature found in `output`, if any.
    pub fn matched_signature(&self, output: &str) -> Option<&str> {
        let haystack = output.to_lowercase();
        self.signatures
            .iter()
            .find(|sig| haystack.contains(&sig.to_lowercase()))
            .map(String::as_str)
    }
}

/// Everything the session layer needs to know about a vendor's CLI.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Vendor this platform belongs to.
    pub vendor: Vendor,

    /// Prompt pattern, matched against the tail of the output.
    pub prompt: Regex,

    /// Pager prompt pattern; answered with a space.
    pub pager: Option<Regex>,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established (disable paging etc).
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// How the vendor is recognized.
    pub identification: Identification,
}

impl PlatformDefinition {
    /// Create a platform definition with the given prompt pattern.
    pub fn new(vendor: Vendor, prompt: &str) -> Result<Self> {
        let prompt = compile_prompt_pattern(prompt).map_err(|e| PlatformError::InvalidDefinition {
            message: format!("bad prompt pattern for {}: {}", vendor, e),
        })?;
        let pager = Regex::new(DEFAULT_PAGER_PATTERN).map_err(|e| PlatformError::InvalidDefinition {
            message: e.to_string(),
        })?;

        Ok(Self {
            vendor,
            prompt,
            pager: Some(pager),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            identification: Identification {
                command: String::new(),
                signatures: vec![],
            },
        })
    }

    /// Set the identification command.
    pub fn with_identify_command(mut self, command: impl Into<String>) -> Self {
        self.identification.command = command.into();
        self
    }

    /// Add a vendor signature.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.identification.signatures.push(signature.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Replace the pager pattern.
    pub fn with_pager(mut self, pager: Option<Regex>) -> Self {
        self.pager = pager;
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Strip the command echo from the start and the prompt from the end.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let mut lines: Vec<&str> = raw.lines().collect();

        // Command echo
        if let Some(first) = lines.first() {
            let first = first.trim();
            if first.is_empty() || (!command.is_empty() && first.ends_with(command.trim())) {
                lines.remove(0);
            }
        }

        // Trailing prompt
        if let Some(last) = lines.last() {
            if self.prompt.is_match(last.as_bytes()) {
                lines.pop();
            }
        }

        lines.join("\n").trim_end().to_string()
    }

    /// Detect command failure from output.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .cloned()
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("vendor", &self.vendor)
            .field("prompt", &self.prompt.as_str())
            .field("pager", &self.pager.as_ref().map(|p| p.as_str()))
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .field("identification", &self.identification)
            .finish()
    }
}
