/// Topical keyword list shared by every configured source. Matching is
/// case-insensitive substring containment, so short entries like "loc" can
/// match inside unrelated words; that imprecision is accepted.
pub const NEWS_KEYWORDS: &[&str] = &[
    // India-Pakistan specific (primary terms)
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
    // Military actions (secondary terms)
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
    // Key locations
    "jammu",
    "srinagar",
    "muzaffarabad",
    "skardu",
    "gilgit",
    "punjab border",
    "rajasthan border",
    "gujarat border",
    // Military units
    "border security force",
    "bsf",
    "pakistan rangers",
    "pakistan army",
    "indian army",
    "indian air force",
    "pakistan air force",
    // Diplomatic terms
    "ceasefire agreement",
    "peace talks",
    "dialogue",
    "de-escalation",
    "foreign secretary talks",
    "high commissioner",
    "diplomatic tension",
    // Key figures
    "modi",
    "sharif",
    "imran khan",
    "jaishankar",
    "bajwa",
    "munir",
    "rawat",
    "naravane",
    "chauhan",
    "asif",
    "qureshi",
    // Incidents
    "cross border terrorism",
    "proxy war",
    "sleeper cell",
    "drone attack",
    "radar detection",
    "airspace violation",
    // Casualties and damage
    "civilian casualty",
    "military casualty",
    "injured",
    "wounded",
    "damage",
    "destruction",
    "evacuation",
    "displacement",
];

/// One entry of the source registry: a named feed URL plus the keyword set
/// used to classify its items. Immutable, loaded at process start.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub keywords: Vec<String>,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The built-in source registry.
pub fn default_sources() -> Vec<FeedSource> {
    [
        (
            "Economic Times",
            "https://economictimes.indiatimes.com/rssfeedstopstories.cms",
        ),
        ("NDTV", "https://feeds.feedburner.com/ndtvnews-top-stories"),
        ("CNN", "http://rss.cnn.com/rss/edition.rss"),
        ("BBC", "http://feeds.bbci.co.uk/news/world/rss.xml"),
        (
            "MoneyControl",
            "https://www.moneycontrol.com/rss/latestnews.xml",
        ),
        (
            "The Hindu",
            "https://www.thehindu.com/news/national/feeder/default.rss",
        ),
        (
            "Times of India",
            "https://timesofindia.indiatimes.com/rssfeedstopstories.cms",
        ),
        ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
        ("The Guardian", "https://www.theguardian.com/world/rss"),
        ("The Indian Express", "https://indianexpress.com/feed/"),
    ]
    .iter()
    .map(|(name, url)| FeedSource::new(name, url, NEWS_KEYWORDS))
    .collect()
}
