use std::sync::Arc;

/// Terms that disqualify an item outright under the strict policy.
const EXCLUDED_KEYWORDS: &[&str] = &[
    // Entertainment
    "bollywood",
    "movie",
    "film",
    "actor",
    "actress",
    "celebrity",
    "entertainment",
    "music",
    "song",
    "album",
    "concert",
    "performance",
    "show",
    "reality show",
    // Sports
    "cricket",
    "football",
    "soccer",
    "hockey",
    "tennis",
    "sports",
    "match",
    "tournament",
    "championship",
    "league",
    "player",
    "team",
    "coach",
    // Business and economy
    "stock market",
    "share market",
    "sensex",
    "nifty",
    "trading",
    "investment",
    "business",
    "economy",
    "market",
    "stock",
    "share",
    "profit",
    "loss",
    // General exclusions
    "weather",
    "forecast",
    "climate",
    "temperature",
    "rain",
    "flood",
    "education",
    "school",
    "college",
    "university",
    "exam",
    "result",
    "technology",
    "gadget",
    "mobile",
    "phone",
    "computer",
    "software",
    "health",
    "medical",
    "hospital",
    "doctor",
    "patient",
    "disease",
    "lifestyle",
    "fashion",
    "beauty",
    "food",
    "recipe",
    "cooking",
];

/// Contextual phrases: at least one must be present under the strict policy.
const PRIMARY_TERMS: &[&str] = &[
    "india pakistan conflict",
    "india pakistan border",
    "india pakistan tension",
    "indian pakistani forces",
    "indian pakistani military",
    "indian pakistani army",
    "loc",
    "line of control",
    "international border",
    "ceasefire line",
    "jammu kashmir conflict",
    "pok",
    "pakistan occupied kashmir",
];

/// Military/conflict phrases: at least one must accompany a primary term.
const SECONDARY_TERMS: &[&str] = &[
    "ceasefire violation",
    "border skirmish",
    "cross border firing",
    "shelling",
    "artillery fire",
    "mortar shelling",
    "bombardment",
    "retaliatory fire",
    "military operation",
    "surgical strike",
    "counter terrorism operation",
    "terrorist attack",
    "militant attack",
    "infiltration attempt",
    "cross border terrorism",
    "proxy war",
    "sleeper cell",
    "drone attack",
    "radar detection",
    "airspace violation",
];

/// Outcome of classifying one item's combined text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Relevant { matched: Vec<String> },
    NotRelevant,
}

impl Classification {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Classification::Relevant { .. })
    }
}

/// Relevance decision over (item text, source keyword set). Matching is
/// case-insensitive substring containment, not tokenized.
pub trait ClassifierPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, text: &str, keywords: &[String]) -> Classification;
}

/// Keywords from `keywords` found in `text`, source-list order, duplicates
/// removed.
pub fn matched_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut matched: Vec<String> = Vec::new();
    for keyword in keywords {
        if keyword.is_empty() || matched.contains(keyword) {
            continue;
        }
        if haystack.contains(&keyword.to_lowercase()) {
            matched.push(keyword.clone());
        }
    }
    matched
}

fn contains_any(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| haystack.contains(term))
}

/// Relevant iff the text contains at least one keyword from the source's
/// set.
pub struct AnyKeywordPolicy;

impl ClassifierPolicy for AnyKeywordPolicy {
    fn name(&self) -> &'static str {
        "any-keyword"
    }

    fn classify(&self, text: &str, keywords: &[String]) -> Classification {
        let matched = matched_keywords(text, keywords);
        if matched.is_empty() {
            Classification::NotRelevant
        } else {
            Classification::Relevant { matched }
        }
    }
}

/// Rejects anything containing an excluded term, then requires at least one
/// primary contextual phrase and one secondary military phrase. Exclusion
/// dominates inclusion.
pub struct StrictContextPolicy;

impl ClassifierPolicy for StrictContextPolicy {
    fn name(&self) -> &'static str {
        "strict-context"
    }

    fn classify(&self, text: &str, keywords: &[String]) -> Classification {
        let haystack = text.to_lowercase();
        if contains_any(&haystack, EXCLUDED_KEYWORDS) {
            return Classification::NotRelevant;
        }
        if !contains_any(&haystack, PRIMARY_TERMS) {
            return Classification::NotRelevant;
        }
        if !contains_any(&haystack, SECONDARY_TERMS) {
            return Classification::NotRelevant;
        }
        Classification::Relevant {
            matched: matched_keywords(text, keywords),
        }
    }
}

/// Deployment-selectable classifier policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    /// Any source keyword present marks the item relevant.
    Any,
    /// Exclusion list plus primary and secondary phrase requirements.
    Strict,
}

impl PolicyKind {
    pub fn policy(self) -> Arc<dyn ClassifierPolicy> {
        match self {
            PolicyKind::Any => Arc::new(AnyKeywordPolicy),
            PolicyKind::Strict => Arc::new(StrictContextPolicy),
        }
    }
}
