//! The stop-word set used by keyword extraction.
//!
//! Covers articles, prepositions, pronouns, auxiliary and high-frequency
//! verbs, adverbs, contractions, counting words, generic filler nouns,
//! and the navigation chrome that appears on virtually every web page.

use once_cell::sync::Lazy;
use std::collections::HashSet;

pub static STOP_WORDS: &[&str] = &[
    // Articles and determiners
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "either",
    "neither", "some", "any", "no", "all", "both", "few", "many", "much", "more",
    "most", "other", "others", "another", "such", "what", "which", "whose", "certain", "several",
    // Pronouns
    "i", "me", "my", "mine", "myself", "we", "us", "our", "ours", "ourselves",
    "you", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she",
    "her", "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs",
    "themselves", "who", "whom", "one", "ones", "oneself", "somebody", "someone", "something", "anybody",
    "anyone", "anything", "everybody", "everyone", "everything", "nobody", "none", "nothing", "whatever", "whoever",
    // Prepositions
    "about", "above", "across", "after", "against", "along", "amid", "among", "around", "at",
    "before", "behind", "below", "beneath", "beside", "besides", "between", "beyond", "by", "concerning",
    "despite", "down", "during", "except", "for", "from", "in", "inside", "into", "near",
    "of", "off", "on", "onto", "out", "outside", "over", "past", "per", "since",
    "through", "throughout", "till", "to", "toward", "towards", "under", "underneath", "until", "unto",
    "up", "upon", "via", "with", "within", "without",
    // Conjunctions
    "and", "because", "although", "though", "nor", "or", "so", "yet", "if", "unless",
    "whereas", "while", "whether", "once", "than", "as", "but", "neither", "provided", "lest",
    // Auxiliary and high-frequency verbs
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "done", "will", "would", "shall",
    "should", "may", "might", "must", "can", "could", "ought", "need", "needs", "needed",
    "dare", "get", "gets", "got", "gotten", "getting", "go", "goes", "went", "gone",
    "going", "come", "comes", "came", "coming", "make", "makes", "made", "making", "take",
    "takes", "took", "taken", "taking", "see", "sees", "saw", "seen", "seeing", "know",
    "knows", "knew", "known", "knowing", "think", "thinks", "thought", "thinking", "want", "wants",
    "wanted", "wanting", "use", "used", "uses", "using", "say", "says", "said", "saying",
    "look", "looks", "looked", "looking", "find", "finds", "found", "finding", "give", "gives",
    "gave", "given", "giving", "tell", "tells", "told", "telling", "work", "works", "worked",
    "working", "call", "calls", "called", "calling", "try", "tries", "tried", "trying", "ask",
    "asks", "asked", "asking", "put", "puts", "putting", "keep", "keeps", "kept", "keeping",
    "let", "lets", "letting", "begin", "begins", "began", "begun", "show", "shows", "showed",
    "shown", "turn", "turns", "turned", "start", "starts", "started", "starting", "help", "helps",
    "helped", "helping", "talk", "talks", "talked", "seem", "seems", "seemed", "feel", "feels",
    "felt", "leave", "leaves", "left", "mean", "means", "meant", "become", "becomes", "became",
    "include", "includes", "included", "including", "follow", "follows", "followed", "following", "add", "added",
    "set", "sets", "run", "runs", "ran", "move", "moves", "moved", "play", "plays",
    "played", "bring", "brings", "brought", "happen", "happens", "happened", "write", "writes", "wrote",
    "written", "provide", "provides", "provided", "sit", "stand", "lose", "pay", "meet", "continue",
    // Adverbs and qualifiers
    "not", "very", "too", "also", "just", "only", "quite", "rather", "really", "almost",
    "always", "never", "often", "sometimes", "usually", "again", "already", "still", "then", "there",
    "here", "now", "today", "tomorrow", "yesterday", "soon", "later", "early", "late", "ever",
    "hardly", "nearly", "perhaps", "maybe", "possibly", "probably", "certainly", "definitely", "indeed", "instead",
    "meanwhile", "moreover", "however", "therefore", "thus", "hence", "otherwise", "anyway", "anywhere", "everywhere",
    "somewhere", "nowhere", "away", "back", "forth", "even", "else", "far", "further", "well",
    "better", "best", "worse", "worst", "less", "least", "enough", "together", "apart", "especially",
    "particularly", "generally", "mostly", "mainly", "simply", "actually", "basically", "literally", "currently", "recently",
    "finally", "eventually", "immediately", "quickly", "slowly", "easily", "exactly", "directly", "likely", "unlikely",
    // Question words
    "how", "when", "where", "why",
    // Contractions
    "ain't", "aren't", "can't", "couldn't", "didn't", "doesn't", "don't", "hadn't", "hasn't", "haven't",
    "he'd", "he'll", "he's", "here's", "how's", "i'd", "i'll", "i'm", "i've", "isn't",
    "it'd", "it'll", "it's", "let's", "mightn't", "mustn't", "shan't", "she'd", "she'll", "she's",
    "shouldn't", "that's", "there's", "they'd", "they'll", "they're", "they've", "wasn't", "we'd", "we'll",
    "we're", "we've", "weren't", "what's", "when's", "where's", "who'd", "who'll", "who's", "why's",
    "won't", "wouldn't", "you'd", "you'll", "you're", "you've",
    // Counting and ordering words
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "first", "second", "third", "fourth", "fifth", "next", "last", "previous", "former", "latter",
    "single", "double", "triple", "half", "dozen", "hundred", "thousand", "million", "billion", "zero",
    // Web chrome
    "home", "page", "pages", "site", "sites", "website", "websites", "web", "online", "click",
    "clicks", "link", "links", "menu", "nav", "navigation", "search", "login", "logout", "signin",
    "signup", "sign", "register", "account", "profile", "settings", "contact", "privacy", "policy", "terms",
    "conditions", "cookie", "cookies", "copyright", "rights", "reserved", "subscribe", "subscription", "newsletter", "email",
    "read", "share", "shares", "comment", "comments", "post", "posts", "view", "views", "new",
    "latest", "popular", "trending", "top", "featured", "free", "official", "welcome", "loading", "please",
    "wait", "skip", "content", "main", "footer", "header", "sidebar", "widget", "button", "submit",
    "cancel", "close", "open", "download", "downloads", "upload", "faq", "faqs", "support", "feedback",
    "sitemap", "language", "english", "homepage", "untitled", "default", "misc", "archive", "archives", "tags",
    "tagged", "category", "categories", "related", "recommended", "sponsored", "advertisement", "ads", "menu", "more",
    // Generic filler nouns
    "thing", "things", "way", "ways", "time", "times", "day", "days", "week", "weeks",
    "month", "months", "year", "years", "people", "person", "man", "woman", "men", "women",
    "item", "items", "list", "lists", "info", "information", "detail", "details", "example", "examples",
    "part", "parts", "number", "numbers", "group", "groups", "case", "cases", "fact", "facts",
    "place", "places", "world", "area", "areas", "lot", "lots", "bit", "bits", "kind",
    "kinds", "sort", "sorts", "type", "types", "name", "names", "word", "words", "text",
    "line", "lines", "point", "points", "end", "ends", "side", "sides", "hand", "hands",
    "eye", "eyes", "head", "face", "body", "life", "lives", "house", "room", "door",
    "water", "air", "question", "questions", "answer", "answers", "problem", "problems", "reason", "reasons",
    "result", "results", "idea", "ideas", "story", "stories", "section", "sections", "version", "versions",
    // Common adjectives with little signal
    "good", "great", "big", "small", "large", "little", "long", "short", "high", "low",
    "old", "young", "right", "wrong", "same", "different", "able", "sure", "real", "true",
    "false", "full", "empty", "easy", "hard", "simple", "complex", "important", "possible", "impossible",
    "available", "recent", "current", "general", "special", "common", "various", "typical", "entire", "whole",
];

static STOP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// Whether a lowercased token is in the stop-word set.
pub fn is_stop_word(word: &str) -> bool {
    STOP_SET.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_words_are_stopped() {
        for w in ["the", "and", "don't", "website", "about"] {
            assert!(is_stop_word(w), "{w} should be a stop word");
        }
    }

    #[test]
    fn test_signal_words_pass() {
        for w in ["rust", "recipe", "pharmaceutical", "kubernetes"] {
            assert!(!is_stop_word(w), "{w} should not be a stop word");
        }
    }

    #[test]
    fn test_set_size_is_in_expected_range() {
        let unique: HashSet<_> = STOP_WORDS.iter().collect();
        assert!(unique.len() > 600, "got {}", unique.len());
    }
}
