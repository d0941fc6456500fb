//! Fuzzy matching of free-text actions.
//!
//! Constraint heads and tails are short action phrases ("check invoice",
//! "the invoice is checked") that cannot be compared exactly. Two actions
//! match when they are equal after normalization, or when their main verbs
//! line up, see [`action_matches`].
//!
//! Finding the main verb of a prediction needs part-of-speech tags. The
//! [`PosTagger`] trait keeps the tagger pluggable; [`HeuristicTagger`] is a
//! small rule-based tagger tuned for imperative and passive action phrases.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Coarse part-of-speech classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PosTag {
    Verb,
    /// Auxiliaries and modals ("is", "has", "must").
    Auxiliary,
    Noun,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Preposition,
    Conjunction,
    Number,
    Punctuation,
}

/// A word with its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaggedWord<'a> {
    pub word: &'a str,
    pub tag: PosTag,
}

/// Assigns part-of-speech tags to whitespace-separated words.
pub trait PosTagger {
    fn tag<'a>(&self, text: &'a str) -> Vec<TaggedWord<'a>>;
}

/// Returns true if a predicted action matches a gold action.
///
/// - Both absent: match. One absent: no match.
/// - Equal after lower-casing and collapsing whitespace: match.
/// - The gold action's first word (its head verb) occurs in the prediction:
///   match.
/// - The prediction's first verb, or its first word if no verb is found,
///   occurs in the gold action: match.
///
/// Substring checks ignore case.
pub fn action_matches(predicted: Option<&str>, gold: Option<&str>, tagger: &dyn PosTagger) -> bool {
    match (predicted, gold) {
        (None, None) => true,
        (Some(predicted), Some(gold)) => text_matches(predicted, gold, tagger),
        _ => false,
    }
}

fn text_matches(predicted: &str, gold: &str, tagger: &dyn PosTagger) -> bool {
    let predicted = normalize(predicted);
    let gold = normalize(gold);

    if predicted == gold {
        return true;
    }

    if let Some(head_verb) = gold.split_whitespace().next() {
        if predicted.contains(head_verb) {
            return true;
        }
    }

    let tagged = tagger.tag(&predicted);
    let verb = tagged
        .iter()
        .find(|w| w.tag == PosTag::Verb)
        .or_else(|| tagged.first());
    match verb {
        Some(verb) => gold.contains(verb.word),
        None => false,
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

static DETERMINERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any",
        "all", "no", "another", "both", "either", "neither",
    ]
    .into_iter()
    .collect()
});

static PREPOSITIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "to", "of", "in", "on", "at", "by", "for", "with", "from", "into", "onto", "about",
        "after", "before", "during", "until", "via", "through", "over", "under", "between",
        "within", "without", "upon", "per", "against", "towards",
    ]
    .into_iter()
    .collect()
});

static PRONOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "his",
        "its", "their", "our", "my", "your", "who", "whom", "which", "what", "itself",
        "themselves",
    ]
    .into_iter()
    .collect()
});

static CONJUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "or", "but", "if", "then", "else", "when", "while", "whether", "because", "so",
        "once", "unless", "otherwise",
    ]
    .into_iter()
    .collect()
});

static AUXILIARIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "is", "are", "was", "were", "be", "been", "being", "am", "has", "have", "had", "do",
        "does", "did", "will", "would", "shall", "should", "can", "could", "may", "might",
        "must", "gets", "get", "got",
    ]
    .into_iter()
    .collect()
});

static ADVERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "not", "never", "always", "also", "again", "first", "finally", "immediately", "then",
        "afterwards", "subsequently", "already", "only",
    ]
    .into_iter()
    .collect()
});

/// Base forms of verbs common in process descriptions.
static ACTION_VERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "accept", "add", "analyze", "analyse", "approve", "archive", "arrange", "ask", "assess",
        "assign", "book", "calculate", "call", "cancel", "change", "charge", "check", "choose",
        "close", "collect", "complete", "confirm", "contact", "create", "decide", "define",
        "deliver", "determine", "discuss", "document", "draft", "enter", "evaluate", "examine",
        "fill", "finish", "forward", "give", "handle", "inform", "inspect", "invoice", "issue",
        "leave", "load", "make", "notify", "obtain", "open", "order", "pack", "pay", "perform",
        "place", "prepare", "print", "process", "produce", "provide", "publish", "receive",
        "record", "register", "reject", "remove", "repair", "report", "request", "retrieve",
        "return", "review", "schedule", "select", "sell", "send", "ship", "sign", "start",
        "store", "submit", "take", "test", "transfer", "update", "upload", "validate", "verify",
        "wait", "write",
    ]
    .into_iter()
    .collect()
});

/// A rule-based tagger for short action phrases.
///
/// Closed word classes come from fixed lists. Open-class words are verbs
/// when they follow an auxiliary or "to", when they are known action verbs
/// outside a noun phrase, or when their suffix marks them as verb forms.
/// Everything else is a noun.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTagger;

impl HeuristicTagger {
    fn tag_word(&self, word: &str, previous: Option<PosTag>, previous_word: Option<&str>) -> PosTag {
        let lower = word.to_lowercase();
        let lower = lower.as_str();

        if !lower.chars().any(char::is_alphanumeric) {
            return PosTag::Punctuation;
        }
        if lower.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
            return PosTag::Number;
        }
        if DETERMINERS.contains(lower) {
            return PosTag::Determiner;
        }
        if AUXILIARIES.contains(lower) {
            return PosTag::Auxiliary;
        }
        if previous_word == Some("to") && is_action_verb(lower) {
            return PosTag::Verb;
        }
        if PREPOSITIONS.contains(lower) {
            return PosTag::Preposition;
        }
        if PRONOUNS.contains(lower) {
            return PosTag::Pronoun;
        }
        if CONJUNCTIONS.contains(lower) {
            return PosTag::Conjunction;
        }
        if ADVERBS.contains(lower) {
            return PosTag::Adverb;
        }

        let in_noun_phrase = matches!(
            previous,
            Some(PosTag::Determiner | PosTag::Adjective | PosTag::Verb | PosTag::Number)
        );

        if previous == Some(PosTag::Auxiliary) && !in_noun_phrase {
            return PosTag::Verb;
        }
        if !in_noun_phrase && is_action_verb(lower) {
            return PosTag::Verb;
        }
        if lower.len() > 4 && (lower.ends_with("ed") || lower.ends_with("ing")) {
            return PosTag::Verb;
        }
        if ["ize", "ise", "ify"].iter().any(|s| lower.ends_with(s)) && lower.len() > 5 {
            return PosTag::Verb;
        }
        if lower.len() > 4 && lower.ends_with("ly") {
            return PosTag::Adverb;
        }
        if ["ous", "ful", "able", "ible", "ive", "al"]
            .iter()
            .any(|s| lower.ends_with(s))
            && lower.len() > 5
        {
            return PosTag::Adjective;
        }
        PosTag::Noun
    }
}

impl PosTagger for HeuristicTagger {
    fn tag<'a>(&self, text: &'a str) -> Vec<TaggedWord<'a>> {
        let mut tagged: Vec<TaggedWord<'a>> = Vec::new();
        for word in text.split_whitespace() {
            let previous = tagged.last().map(|w| w.tag);
            let previous_word = tagged.last().map(|w| w.word.to_lowercase());
            let tag = self.tag_word(word, previous, previous_word.as_deref());
            tagged.push(TaggedWord { word, tag });
        }
        tagged
    }
}

/// Known action verb, also in third person ("checks") form.
fn is_action_verb(lower: &str) -> bool {
    if ACTION_VERBS.contains(lower) {
        return true;
    }
    let stem = lower
        .strip_suffix("es")
        .filter(|s| ACTION_VERBS.contains(*s))
        .or_else(|| lower.strip_suffix('s'));
    stem.is_some_and(|s| ACTION_VERBS.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<PosTag> {
        HeuristicTagger.tag(text).into_iter().map(|w| w.tag).collect()
    }

    fn first_verb(text: &str) -> Option<&str> {
        HeuristicTagger
            .tag(text)
            .into_iter()
            .find(|w| w.tag == PosTag::Verb)
            .map(|w| w.word)
    }

    #[test]
    fn tags_imperative_phrase() {
        assert_eq!(
            tags("check the invoice"),
            vec![PosTag::Verb, PosTag::Determiner, PosTag::Noun]
        );
    }

    #[test]
    fn verb_lexicon_does_not_fire_inside_noun_phrase() {
        assert_eq!(first_verb("send the order"), Some("send"));
        assert_eq!(
            tags("send the order"),
            vec![PosTag::Verb, PosTag::Determiner, PosTag::Noun]
        );
    }

    #[test]
    fn finds_verb_in_passive_and_declarative_phrases() {
        assert_eq!(first_verb("the invoice is checked"), Some("checked"));
        assert_eq!(first_verb("clerk checks invoice"), Some("checks"));
        assert_eq!(first_verb("the customer must sign contract"), Some("sign"));
        assert_eq!(first_verb("decides to archive the file"), Some("decides"));
    }

    #[test]
    fn action_equality_ignores_case_and_spacing() {
        assert!(action_matches(
            Some("Check   the Invoice"),
            Some("check the invoice"),
            &HeuristicTagger
        ));
    }

    #[test]
    fn action_matches_on_gold_head_verb() {
        assert!(action_matches(
            Some("the clerk will check all invoices"),
            Some("check invoice"),
            &HeuristicTagger
        ));
    }

    #[test]
    fn action_matches_on_predicted_verb() {
        // Gold head "warehouse" is not in the prediction, but the predicted
        // verb "ship" is in the gold action.
        assert!(action_matches(
            Some("ship parcel"),
            Some("warehouse ships goods"),
            &HeuristicTagger
        ));
    }

    #[test]
    fn unrelated_actions_do_not_match() {
        assert!(!action_matches(
            Some("archive the file"),
            Some("pay supplier"),
            &HeuristicTagger
        ));
    }

    #[test]
    fn missing_actions() {
        assert!(action_matches(None, None, &HeuristicTagger));
        assert!(!action_matches(Some("pay"), None, &HeuristicTagger));
        assert!(!action_matches(None, Some("pay"), &HeuristicTagger));
    }
}
