//! Demo Script
//!
//! What the companion says for each expression, plus the text of the
//! overlay panels. Primary lines are Arabic (the learner's language),
//! secondary lines are the English gloss.

use companion_core::Expression;

/// A pair of caption lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub primary: &'static str,
    pub secondary: &'static str,
}

/// Caption lines for an expression
#[must_use]
pub fn line(expression: Expression) -> Line {
    let (primary, secondary) = match expression {
        Expression::Greet => ("مرحبا! هيا نتعلم معا", "Hello! Let's learn together"),
        Expression::Encourage => ("أحسنت، استمر!", "Nice work, keep going!"),
        Expression::Think => ("فكر جيدا...", "Think it through..."),
        Expression::Warning => ("انتبه!", "Careful!"),
        Expression::Success => ("رائع! إجابة صحيحة", "Great! That's correct"),
    };
    Line { primary, secondary }
}

/// Intro panel title
pub const INTRO_TITLE: &str = "Desert Caravan";

/// Intro panel body
pub const INTRO_LINES: &[&str] = &[
    "Guide the caravan across the dunes.",
    "Answer each question to keep moving.",
    "Keys: 1-5 moods, c anchor, t timed warning, h hide, r results",
];

/// Intro confirm label
pub const INTRO_CONFIRM: &str = "Start";

/// Results panel title
pub const RESULTS_TITLE: &str = "Stage Complete";

/// Results continue label
pub const RESULTS_CONTINUE: &str = "Continue";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_expression_has_both_lines() {
        for expression in Expression::ALL {
            let line = line(expression);
            assert!(!line.primary.is_empty());
            assert!(!line.secondary.is_empty());
        }
    }
}
