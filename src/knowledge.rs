//! Lexical question matching over a small fixed Q&A table.

use std::collections::HashSet;

/// A match must score strictly above this to be answered.
pub const MATCH_THRESHOLD: f64 = 0.3;

pub const FALLBACK_RESPONSE: &str = "I'm Gesture AI. While I couldn't find an exact match for your query, I'm always learning. Could you rephrase or ask about sign language basics?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
}

impl QaEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

const DEFAULT_TABLE: [(&str, &str); 10] = [
    (
        "What is sign language?",
        "Sign language is a complete, natural language that uses visual-gestural communication through hand shapes, facial expressions, and body language. It's not universal - each country has its own sign language with unique grammar and syntax.",
    ),
    (
        "How many hand shapes are there in sign language?",
        "In American Sign Language (ASL), there are approximately 40-60 basic hand shapes called 'cheremes'. These hand shapes are fundamental building blocks, similar to how phonemes work in spoken languages.",
    ),
    (
        "What is the difference between ASL and other sign languages?",
        "Each sign language is unique to its country or region. For example, ASL is different from British Sign Language (BSL) or Australian Sign Language (Auslan). They have distinct grammatical structures, vocabulary, and regional variations.",
    ),
    (
        "How do deaf people communicate internationally?",
        "Deaf individuals use various methods for international communication, including International Sign (a pidgin sign language), visual gesture communication, writing, and increasingly, technology like translation apps and video interpretation services.",
    ),
    (
        "What is deaf culture?",
        "Deaf culture is a rich, vibrant community with its own unique identity, values, and social norms. It celebrates visual communication, linguistic heritage, and emphasizes community bonds beyond hearing ability.",
    ),
    (
        "How can I start learning sign language?",
        "Begin by learning the manual alphabet (fingerspelling), practice basic vocabulary, watch sign language videos, take online courses, engage with deaf community events, and use language learning apps. Consistency and immersion are key.",
    ),
    (
        "Are facial expressions important in sign language?",
        "Absolutely! Facial expressions are crucial in sign language. They convey grammatical information, emotional tone, and can completely change the meaning of a sign. They're as important as hand movements.",
    ),
    (
        "How fast can people communicate in sign language?",
        "Experienced sign language users can communicate as quickly as spoken language speakers, typically around 150-250 words per minute. The visual nature of sign language allows for rapid, nuanced communication.",
    ),
    (
        "Can sign language be written?",
        "While sign languages are primarily visual, there are notation systems like SignWriting that can represent signs in written form. However, most deaf communities use the written language of their country.",
    ),
    (
        "What is the history of sign language?",
        "Sign language has existed as long as human communication. The first formal sign language education began in the 18th century in France with the work of Abbé Charles-Michel de l'Épée, who established the first public school for the deaf.",
    ),
];

/// Jaccard similarity of two token sets; 0 when both are empty.
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn tokens(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

pub struct KnowledgeMatcher {
    entries: Vec<QaEntry>,
    // lowercased questions, parallel to `entries`
    questions: Vec<String>,
}

impl Default for KnowledgeMatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_TABLE
                .iter()
                .map(|(q, a)| QaEntry::new(*q, *a))
                .collect(),
        )
    }
}

impl KnowledgeMatcher {
    pub fn new(entries: Vec<QaEntry>) -> Self {
        let questions = entries.iter().map(|e| e.question.to_lowercase()).collect();
        Self { entries, questions }
    }

    pub fn entries(&self) -> &[QaEntry] {
        &self.entries
    }

    /// Best entry and its score. Only a strictly higher score replaces the current
    /// best, so ties keep the earlier entry.
    pub fn best_match(&self, query: &str) -> Option<(&QaEntry, f64)> {
        let query = query.trim().to_lowercase();
        let query_words = tokens(&query);

        let mut best: Option<(&QaEntry, f64)> = None;
        let mut max_score = 0.0;
        for (entry, question) in self.entries.iter().zip(&self.questions) {
            let s = jaccard(&query_words, &tokens(question));
            if s > max_score {
                max_score = s;
                best = Some((entry, s));
            }
        }
        best
    }

    pub fn answer(&self, query: &str) -> String {
        match self.best_match(query) {
            Some((entry, s)) if s > MATCH_THRESHOLD => entry.answer.clone(),
            _ => FALLBACK_RESPONSE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_ten_entries() {
        assert_eq!(KnowledgeMatcher::default().entries().len(), 10);
    }

    #[test]
    fn matches_what_is_sign_language() {
        let m = KnowledgeMatcher::default();
        let (entry, s) = m.best_match("what is sign language").unwrap();
        assert_eq!(entry.question, "What is sign language?");
        // {what, is, sign} shared out of {what, is, sign, language, language?}
        assert!((s - 0.6).abs() < 1e-9);
        assert_eq!(m.answer("  What is SIGN language  "), m.entries()[0].answer);
    }

    #[test]
    fn unrelated_queries_get_the_fallback() {
        let m = KnowledgeMatcher::default();
        assert_eq!(m.answer("xyz completely unrelated"), FALLBACK_RESPONSE);
        assert_eq!(m.answer(""), FALLBACK_RESPONSE);
        assert_eq!(m.answer("   "), FALLBACK_RESPONSE);
    }

    #[test]
    fn threshold_is_strict() {
        // 3 shared of 10 total tokens scores exactly 0.3
        let m = KnowledgeMatcher::new(vec![QaEntry::new("a b c d e f g", "hit")]);
        assert!((m.best_match("a b c x y z").unwrap().1 - 0.3).abs() < 1e-12);
        assert_eq!(m.answer("a b c x y z"), FALLBACK_RESPONSE);
        assert_eq!(m.answer("a b c d x y"), "hit");
    }

    #[test]
    fn ties_keep_table_order() {
        let m = KnowledgeMatcher::new(vec![
            QaEntry::new("red apple", "first"),
            QaEntry::new("green apple", "second"),
        ]);
        for _ in 0..5 {
            assert_eq!(m.answer("apple"), "first");
            assert_eq!(m.best_match("apple pie").unwrap().0.answer, "first");
        }
    }

    #[test]
    fn duplicate_tokens_collapse() {
        let a = tokens("sign sign sign");
        let b = tokens("sign");
        assert_eq!(jaccard(&a, &b), 1.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }
}
