//! Title filtering.
//!
//! Marketplace titles are free text that inconsistently encode grade,
//! card number and condition. A [`TitleFilter`] runs an ordered chain of
//! [`TitleRule`]s over every listing and keeps only those that every rule
//! accepts. Rules are pluggable so the matching strategy can change
//! without touching aggregation.

pub mod rules;

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::config::FilterConfig;
use crate::types::{Grade, Listing};
use rules::{CardNumberRule, GradeRule, KeywordRule, LanguageRule};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Trailing card number taken from a query, with its title matcher.
#[derive(Debug, Clone)]
pub struct CardNumber {
    pub digits: String,
    pattern: Regex,
}

impl CardNumber {
    /// Extract the trailing numeric token, e.g. `"Mew ex 151"` → `151`.
    pub fn from_query(query: &str) -> Option<Self> {
        let trimmed = query.trim_end();
        let start = trimmed
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)?;
        let digits = &trimmed[start..];

        // Standalone token: optional '#', optional space, optional "/<set size>".
        let pattern = Regex::new(&format!(
            r"(?:^|\D)#?\s?{}(?:/\d+)?(?:\D|$)",
            regex::escape(digits)
        ))
        .ok()?;

        Some(Self {
            digits: digits.to_string(),
            pattern,
        })
    }

    pub fn appears_in(&self, title: &str) -> bool {
        self.pattern.is_match(title)
    }
}

/// What a listing is being judged against.
#[derive(Debug, Clone)]
pub struct TitleContext {
    pub query: String,
    pub grade: Grade,
    pub card_number: Option<CardNumber>,
}

impl TitleContext {
    pub fn new(query: impl Into<String>, grade: Grade) -> Self {
        Self {
            query: query.into(),
            grade,
            card_number: None,
        }
    }

    /// Attach the trailing card number parsed from `source`, if any.
    pub fn with_card_number_from(mut self, source: &str) -> Self {
        self.card_number = CardNumber::from_query(source);
        self
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Why a listing was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    Language,
    Keyword,
    Grade,
    CardNumber,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Language => write!(f, "language"),
            RejectReason::Keyword => write!(f, "keyword"),
            RejectReason::Grade => write!(f, "grade"),
            RejectReason::CardNumber => write!(f, "card_number"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

/// A title-classification policy: title + context → accept/reject.
pub trait TitleRule: Send + Sync {
    fn classify(&self, title: &str, ctx: &TitleContext) -> Verdict;
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Listings that survived, plus rejection counts per reason.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<Listing>,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl FilterOutcome {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Ordered rule chain; the first rejecting rule decides the reason.
#[derive(Default)]
pub struct TitleFilter {
    rules: Vec<Box<dyn TitleRule>>,
}

impl TitleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl TitleRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Filter for active buy-side listings.
    ///
    /// Language and keyword rules always apply; grade confirmation is on
    /// unless `confirm_buy_grade` is disabled.
    pub fn for_active(cfg: &FilterConfig) -> Self {
        let filter = Self::new()
            .with_rule(LanguageRule::new(&cfg.language_markers))
            .with_rule(KeywordRule::new(&cfg.denylist));
        if cfg.confirm_buy_grade {
            filter.with_rule(GradeRule)
        } else {
            filter
        }
    }

    /// Filter for sold sell-side listings: all four rules.
    pub fn for_sold(cfg: &FilterConfig) -> Self {
        let filter = Self::new()
            .with_rule(LanguageRule::new(&cfg.language_markers))
            .with_rule(KeywordRule::new(&cfg.denylist))
            .with_rule(GradeRule);
        if cfg.confirm_card_number {
            filter.with_rule(CardNumberRule)
        } else {
            filter
        }
    }

    /// Judge a single title.
    pub fn classify(&self, title: &str, ctx: &TitleContext) -> Verdict {
        self.rules
            .iter()
            .map(|rule| rule.classify(title, ctx))
            .find(|v| *v != Verdict::Accept)
            .unwrap_or(Verdict::Accept)
    }

    /// Keep listings every rule accepts, preserving order.
    pub fn apply(&self, listings: Vec<Listing>, ctx: &TitleContext) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for listing in listings {
            match self.classify(&listing.title, ctx) {
                Verdict::Accept => outcome.kept.push(listing),
                Verdict::Reject(reason) => {
                    debug!(
                        query = %ctx.query,
                        reason = %reason,
                        title = %listing.title,
                        "Listing rejected"
                    );
                    *outcome.rejected.entry(reason).or_insert(0) += 1;
                }
            }
        }

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn listings(titles: &[&str]) -> Vec<Listing> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Listing::new(*t, dec!(10) + rust_decimal::Decimal::from(i)))
            .collect()
    }

    fn titles(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.kept.iter().map(|l| l.title.as_str()).collect()
    }

    // -- Card number extraction --

    #[test]
    fn test_card_number_from_query() {
        assert_eq!(CardNumber::from_query("Mew ex 151").unwrap().digits, "151");
        assert_eq!(CardNumber::from_query("Pikachu 25  ").unwrap().digits, "25");
        assert!(CardNumber::from_query("Charizard Base Set").is_none());
        assert!(CardNumber::from_query("").is_none());
    }

    #[test]
    fn test_card_number_standalone_token() {
        let n = CardNumber::from_query("Mewtwo 150").unwrap();
        assert!(n.appears_in("Mewtwo PSA 10 #150"));
        assert!(n.appears_in("Mewtwo 150/165 PSA 10"));
        assert!(n.appears_in("150 Mewtwo"));
        assert!(n.appears_in("Mewtwo # 150 PSA 10"));
        assert!(!n.appears_in("Mewtwo PSA 10 #250"));
        assert!(!n.appears_in("Mewtwo PSA 10 #15"));
        assert!(!n.appears_in("Mewtwo 1500"));
        assert!(!n.appears_in("Mewtwo 2150"));
    }

    // -- Filter chain --

    #[test]
    fn test_active_filter_example() {
        let filter = TitleFilter::for_active(&FilterConfig::default());
        let ctx = TitleContext::new("Pikachu 25 ACE 10", Grade::Ace10);
        let input = vec![
            Listing::new("Pikachu ACE 10 #25", dec!(50)),
            Listing::new("Pikachu raw #25", dec!(10)),
            Listing::new("Pikachu ACE 10 likely #25", dec!(5)),
        ];
        let outcome = filter.apply(input, &ctx);
        assert_eq!(titles(&outcome), vec!["Pikachu ACE 10 #25"]);
        assert_eq!(outcome.rejected_total(), 2);
    }

    #[test]
    fn test_sold_filter_requires_grade_and_number() {
        let filter = TitleFilter::for_sold(&FilterConfig::default());
        let ctx = TitleContext::new("Umbreon VMAX 215", Grade::Psa10)
            .with_card_number_from("Umbreon VMAX 215");
        let outcome = filter.apply(
            listings(&[
                "Umbreon VMAX 215/203 PSA 10 Evolving Skies",
                "Umbreon VMAX 215/203 PSA 9 Evolving Skies",
                "Umbreon VMAX 095/203 PSA 10",
                "Umbreon VMAX 215 Japanese PSA 10",
                "Umbreon VMAX PSA10 #215",
            ]),
            &ctx,
        );
        assert_eq!(
            titles(&outcome),
            vec!["Umbreon VMAX 215/203 PSA 10 Evolving Skies", "Umbreon VMAX PSA10 #215"]
        );
        assert_eq!(outcome.rejected.get(&RejectReason::Keyword), Some(&1));
        assert_eq!(outcome.rejected.get(&RejectReason::CardNumber), Some(&1));
        assert_eq!(outcome.rejected.get(&RejectReason::Language), Some(&1));
    }

    #[test]
    fn test_sold_filter_without_number_skips_number_rule() {
        let filter = TitleFilter::for_sold(&FilterConfig::default());
        let ctx = TitleContext::new("Charizard Base Set", Grade::Psa10)
            .with_card_number_from("Charizard Base Set");
        let outcome = filter.apply(listings(&["Charizard Base Set PSA 10 #4"]), &ctx);
        assert_eq!(outcome.kept.len(), 1);
    }

    #[test]
    fn test_everything_filtered_is_empty_not_error() {
        let filter = TitleFilter::for_active(&FilterConfig::default());
        let ctx = TitleContext::new("Pikachu ACE 10", Grade::Ace10);
        let outcome = filter.apply(listings(&["raw pikachu", "pikachu psa 9"]), &ctx);
        assert!(outcome.kept.is_empty());
    }

    #[test]
    fn test_denylist_monotonic() {
        let input = [
            "Gengar ACE 10 #94",
            "Gengar ACE 10 mint #94",
            "Gengar ACE 10 gem #94",
            "Gengar ACE 10 looks clean",
            "Gengar ACE10 fresh slab",
        ];
        let ctx = TitleContext::new("Gengar 94 ACE 10", Grade::Ace10);

        let mut cfg = FilterConfig::default();
        let mut previous = TitleFilter::for_active(&cfg).apply(listings(&input), &ctx).kept;

        for extra in ["mint", "gem", "slab", "gengar"] {
            cfg.denylist.push(extra.to_string());
            let current = TitleFilter::for_active(&cfg).apply(listings(&input), &ctx).kept;
            assert!(current.len() <= previous.len());
            assert!(current.iter().all(|l| previous.contains(l)));
            previous = current;
        }
        assert!(previous.is_empty());
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = TitleFilter::new();
        let ctx = TitleContext::new("anything", Grade::Psa10);
        assert_eq!(filter.classify("raw JPN psa 9", &ctx), Verdict::Accept);
    }
}
