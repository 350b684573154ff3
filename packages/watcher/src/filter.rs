//! Keyword predicate deciding which orders are worth relaying.
//!
//! The hard part is the stem rule: "бот" and "bot" appear inside plenty of
//! words that have nothing to do with bots (работа, разработчик, bottom).
//! A token counts as a hit only when the stem carries a short prefix and a
//! recognizable word ending, and survives the explicit veto lists.

use std::collections::HashSet;

use monitor::{Record, RecordFilter};

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    stems: Vec<String>,

    /// Longest prefix (in chars) a token may carry before the stem:
    /// "chat-bot" passes, "разработчик" does not.
    max_prefix: usize,

    /// Phrases that match outright, even when the stem rule would not fire
    /// ("телеграм-" is longer than any allowed prefix).
    allow_phrases: Vec<String>,

    /// Endings accepted after the stem, so declensions and plurals pass.
    allowed_suffixes: Vec<String>,

    /// Tokens that contain a stem by accident. A veto only disqualifies the
    /// token, never the whole record.
    stop_tokens: HashSet<String>,

    /// Substrings that disqualify any token containing them.
    stop_substrings: Vec<String>,
}

impl KeywordFilter {
    pub fn new(stems: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            stems: stems.into_iter().map(|s| fold(&s.into())).collect(),
            max_prefix: 4,
            allow_phrases: Vec::new(),
            allowed_suffixes: vec![String::new()],
            stop_tokens: HashSet::new(),
            stop_substrings: Vec::new(),
        }
    }

    /// Preset tuned for chat-bot development orders, in both scripts the
    /// board mixes.
    pub fn bots() -> Self {
        Self::new(["bot", "бот"])
            .with_allow_phrases([
                "telegram bot",
                "telegram-bot",
                "tg bot",
                "tg-bot",
                "телеграм бот",
                "телеграм-бот",
                "тг-бот",
                "чат-бот",
            ])
            .with_allowed_suffixes([
                "", "s", "а", "ы", "у", "ом", "ов", "е", "ам", "ами", "ах", "ик", "ика", "ики",
                "иков",
            ])
            .with_stop_tokens([
                "работа",
                "работы",
                "работу",
                "работой",
                "доработка",
                "доработки",
                "доработку",
                "доработать",
                "разработка",
                "разработки",
                "разработку",
                "разработать",
                "разработчик",
                "разработчика",
                "разработчики",
                "разработчиков",
                "подработка",
                "подработки",
                "подработку",
                "переработка",
                "переработки",
                "both",
                "bother",
                "bottom",
                "bottle",
            ])
            .with_stop_substrings(["работ", "ботан", "ботокс", "botan"])
    }

    pub fn with_max_prefix(mut self, max_prefix: usize) -> Self {
        self.max_prefix = max_prefix;
        self
    }

    pub fn with_allow_phrases(
        mut self,
        phrases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allow_phrases = phrases.into_iter().map(|p| fold(&p.into())).collect();
        self
    }

    pub fn with_allowed_suffixes(
        mut self,
        suffixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_suffixes = suffixes.into_iter().map(|s| fold(&s.into())).collect();
        self
    }

    pub fn with_stop_tokens(
        mut self,
        tokens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.stop_tokens = tokens.into_iter().map(|t| fold(&t.into())).collect();
        self
    }

    pub fn with_stop_substrings(
        mut self,
        substrings: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.stop_substrings = substrings.into_iter().map(|s| fold(&s.into())).collect();
        self
    }

    fn token_matches(&self, token: &str) -> bool {
        if self.stop_tokens.contains(token) {
            return false;
        }
        if self.stop_substrings.iter().any(|bad| token.contains(bad.as_str())) {
            return false;
        }

        for stem in &self.stems {
            let Some(idx) = token.find(stem.as_str()) else {
                continue;
            };
            let prefix = &token[..idx];
            let suffix = &token[idx + stem.len()..];

            if prefix.chars().count() > self.max_prefix {
                continue;
            }
            if self.suffix_allowed(suffix) {
                return true;
            }
        }
        false
    }

    fn suffix_allowed(&self, suffix: &str) -> bool {
        self.allowed_suffixes
            .iter()
            .any(|s| suffix == s.as_str() || (!s.is_empty() && suffix.starts_with(s.as_str())))
    }
}

impl RecordFilter for KeywordFilter {
    fn matches(&self, record: &Record) -> bool {
        let text = fold(&record.search_text());
        if text.is_empty() {
            return false;
        }

        if self.allow_phrases.iter().any(|p| text.contains(p.as_str())) {
            return true;
        }

        tokenize(&text).iter().any(|token| self.token_matches(token))
    }
}

/// Case folding plus "ё"->"е", so spelling variants compare equal.
fn fold(s: &str) -> String {
    s.to_lowercase()
        .replace('ё', "е")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep alphanumerics, hyphen, and underscore; everything else separates.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(title: &str) -> Record {
        Record::new("1").with_title(title)
    }

    fn accepts(title: &str) -> bool {
        KeywordFilter::bots().matches(&order(title))
    }

    #[test]
    fn short_prefix_stem_hits_match() {
        assert!(accepts("Нужен чат-бот для записи клиентов"));
        assert!(accepts("chat-bot helper"));
        assert!(accepts("Доделать бота в телеграме"));
        assert!(accepts("Webbot setup"));
    }

    #[test]
    fn allow_phrases_bypass_the_prefix_bound() {
        // "телеграм-" is longer than any allowed prefix; only the phrase
        // list lets this one through.
        assert!(accepts("Сделать телеграм-бот"));
        assert!(accepts("Need a telegram bot for my shop"));
    }

    #[test]
    fn work_words_do_not_fire() {
        assert!(!accepts("Разработка сайта под ключ"));
        assert!(!accepts("Нужен разработчик на подработку"));
        assert!(!accepts("Доработать личный кабинет"));
    }

    #[test]
    fn latin_lookalikes_do_not_fire() {
        assert!(!accepts("Both options need bother-free bottle labels"));
        assert!(!accepts("Botanical garden website"));
    }

    #[test]
    fn declensions_pass_the_suffix_rule() {
        assert!(accepts("Настройка ботов для рассылки"));
        assert!(accepts("Починить чат-ботик"));
        assert!(accepts("Writing bots for Discord"));
    }

    #[test]
    fn long_prefix_is_rejected() {
        // Five chars before the stem and not on the phrase list.
        assert!(!accepts("держибот на полке"));
    }

    #[test]
    fn empty_and_unrelated_records_do_not_match() {
        assert!(!accepts(""));
        assert!(!accepts("Уборка квартиры"));
        assert!(!KeywordFilter::bots().matches(&Record::new("1")));
    }

    #[test]
    fn scans_description_and_location_too() {
        let filter = KeywordFilter::bots();
        let record = Record::new("1")
            .with_title("Автоматизация")
            .with_description("нужен бот для ответов в чате");
        assert!(filter.matches(&record));
    }

    #[test]
    fn yo_folding_matches_both_spellings() {
        let filter = KeywordFilter::new(["щетк"]).with_allowed_suffixes(["а", "и"]);
        assert!(filter.matches(&order("Продаю щётки")));
    }

    #[test]
    fn veto_only_disqualifies_the_token() {
        // A work word next to a real hit does not ban the record.
        assert!(accepts("Разработка чат-бота для поддержки"));
    }
}
