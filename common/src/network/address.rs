//! Strict dotted-quad validation.
//!
//! Every address written to a temp file or copied into a final artifact must
//! pass [`is_dotted_quad`]. The pattern is intentionally syntactic: four groups
//! of one to three ASCII digits separated by dots, nothing else on the line.

use std::sync::LazyLock;

use regex::Regex;

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").expect("dotted-quad pattern is valid")
});

/// Returns `true` when `candidate` is exactly one dotted-quad IPv4 address.
pub fn is_dotted_quad(candidate: &str) -> bool {
    DOTTED_QUAD.is_match(candidate)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
