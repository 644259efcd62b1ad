//! Built-in title rules.
//!
//! Markers and denylist terms match as case-insensitive substrings;
//! grade and card number match as whole-token regexes.

use regex::Regex;
use std::sync::OnceLock;

use super::{RejectReason, TitleContext, TitleRule, Verdict};
use crate::types::Grade;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Drops Japanese-market listings unless the query asks for them.
pub struct LanguageRule {
    markers: Vec<String>,
}

impl LanguageRule {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    fn mentions_marker(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

impl TitleRule for LanguageRule {
    fn classify(&self, title: &str, ctx: &TitleContext) -> Verdict {
        if self.mentions_marker(&ctx.query) || !self.mentions_marker(title) {
            Verdict::Accept
        } else {
            Verdict::Reject(RejectReason::Language)
        }
    }
}

// ---------------------------------------------------------------------------
// Denylist
// ---------------------------------------------------------------------------

/// Drops titles containing any disqualifying keyword.
pub struct KeywordRule {
    denylist: Vec<String>,
}

impl KeywordRule {
    pub fn new(denylist: &[String]) -> Self {
        Self {
            denylist: denylist
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl TitleRule for KeywordRule {
    fn classify(&self, title: &str, _ctx: &TitleContext) -> Verdict {
        let lower = title.to_lowercase();
        if self.denylist.iter().any(|k| lower.contains(k.as_str())) {
            Verdict::Reject(RejectReason::Keyword)
        } else {
            Verdict::Accept
        }
    }
}

// ---------------------------------------------------------------------------
// Grade
// ---------------------------------------------------------------------------

/// Requires the context grade as a whole token ("PSA 10", "psa-10", "PSA10").
pub struct GradeRule;

impl GradeRule {
    fn pattern(grade: Grade) -> &'static Regex {
        static ACE: OnceLock<Regex> = OnceLock::new();
        static PSA: OnceLock<Regex> = OnceLock::new();

        let cell = match grade {
            Grade::Ace10 => &ACE,
            Grade::Psa10 => &PSA,
        };
        cell.get_or_init(|| {
            Regex::new(&format!(
                r"(?i)\b{}[-\s]*{}\b",
                grade.service(),
                grade.score()
            ))
            .expect("grade pattern is valid")
        })
    }

    pub fn matches(grade: Grade, title: &str) -> bool {
        Self::pattern(grade).is_match(title)
    }
}

impl TitleRule for GradeRule {
    fn classify(&self, title: &str, ctx: &TitleContext) -> Verdict {
        if Self::matches(ctx.grade, title) {
            Verdict::Accept
        } else {
            Verdict::Reject(RejectReason::Grade)
        }
    }
}

// ---------------------------------------------------------------------------
// Card number
// ---------------------------------------------------------------------------

/// Requires the query's trailing card number as a standalone token.
/// A context without a card number passes everything.
pub struct CardNumberRule;

impl TitleRule for CardNumberRule {
    fn classify(&self, title: &str, ctx: &TitleContext) -> Verdict {
        match &ctx.card_number {
            Some(number) if !number.appears_in(title) => {
                Verdict::Reject(RejectReason::CardNumber)
            }
            _ => Verdict::Accept,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
