//! Lenient multilingual text matching.
//!
//! Some exercises are accepted in either of two languages: the target markup
//! is the same but the visible text is written in Kazakh or Russian. A
//! [`PhraseTable`] lists known-equivalent phrases per non-default language,
//! and [`LenientMatcher`] uses it to produce comparable variants of a text.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::model::LanguageTag;

/// A phrase and its counterpart in the default language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasePair {
    pub phrase: String,
    pub counterpart: String,
}

impl PhrasePair {
    pub fn new(phrase: impl Into<String>, counterpart: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            counterpart: counterpart.into(),
        }
    }
}

/// Equivalent-phrase lists keyed by the language the phrases are written in.
///
/// In TOML every language is an array of tables:
///
/// ```toml
/// [[kz]]
/// phrase = "Сәлем"
/// counterpart = "Привет"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhraseTable {
    pairs: BTreeMap<LanguageTag, Vec<PhrasePair>>,
}

impl PhraseTable {
    /// A table with no phrases: only case-folding applies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The Kazakh/Russian phrases used by the bundled course content.
    pub fn builtin() -> Self {
        let kz = [
            ("Менің бірінші бетім", "Моя первая страница"),
            ("Қош келдіңіз", "Добро пожаловать"),
            ("Басты бет", "Главная страница"),
            ("Сәлем әлем", "Привет мир"),
            ("Сәлем", "Привет"),
            ("әлем", "мир"),
            ("Тақырып", "Заголовок"),
            ("Мәтін", "Текст"),
            ("Тізім", "Список"),
            ("Сілтеме", "Ссылка"),
            ("Сурет", "Изображение"),
            ("Кесте", "Таблица"),
            ("Батырма", "Кнопка"),
            ("Жіберу", "Отправить"),
            ("Аты", "Имя"),
        ];
        Self::empty().with_pairs(
            LanguageTag::Kz,
            kz.iter().map(|(p, c)| PhrasePair::new(*p, *c)),
        )
    }

    /// Add pairs for a language, keeping any already present.
    pub fn with_pairs(
        mut self,
        language: LanguageTag,
        pairs: impl IntoIterator<Item = PhrasePair>,
    ) -> Self {
        self.pairs.entry(language).or_default().extend(pairs);
        self
    }

    pub fn pairs(&self, language: LanguageTag) -> &[PhrasePair] {
        self.pairs.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.values().all(Vec::is_empty)
    }

    /// Parse a phrase table from TOML.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let table: PhraseTable = toml::from_str(content).context("failed to parse phrase table")?;
        table.validate()?;
        Ok(table)
    }

    /// Load a phrase table from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read phrase table: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid phrase table: {}", path.display()))
    }

    /// Reject pairs that would make substitution meaningless.
    pub fn validate(&self) -> Result<(), GradeError> {
        for (language, pairs) in &self.pairs {
            if language.is_default() && !pairs.is_empty() {
                return Err(GradeError::InvalidPhrase {
                    language: language.to_string(),
                    reason: "phrases are keyed by the non-default language".into(),
                });
            }
            for pair in pairs {
                if pair.phrase.trim().is_empty() || pair.counterpart.trim().is_empty() {
                    return Err(GradeError::InvalidPhrase {
                        language: language.to_string(),
                        reason: format!(
                            "empty phrase in pair ({:?}, {:?})",
                            pair.phrase, pair.counterpart
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One direction of substitution: a single alternation over all phrases,
/// longest first, with a lookup of the lower-cased replacement.
#[derive(Debug, Clone)]
struct Substitution {
    pattern: Regex,
    replacements: HashMap<String, String>,
}

impl Substitution {
    fn compile<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Result<Self, GradeError> {
        let mut replacements = HashMap::new();
        for (from, to) in pairs {
            replacements
                .entry(from.trim().to_lowercase())
                .or_insert_with(|| to.trim().to_lowercase());
        }

        let mut alternatives: Vec<&String> = replacements.keys().collect();
        alternatives.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        let alternation = alternatives
            .iter()
            .map(|phrase| regex::escape(phrase))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            pattern,
            replacements,
        })
    }

    fn apply(&self, folded: &str) -> String {
        self.pattern
            .replace_all(folded, |caps: &Captures<'_>| {
                let matched = &caps[0];
                self.replacements
                    .get(&matched.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

#[derive(Debug, Clone)]
struct LanguagePairs {
    forward: Substitution,
    reverse: Substitution,
}

/// Produces case-folded variants of a text and compares them.
#[derive(Debug, Clone, Default)]
pub struct LenientMatcher {
    languages: HashMap<LanguageTag, LanguagePairs>,
}

impl LenientMatcher {
    /// Compile the substitutions of a phrase table.
    pub fn new(table: &PhraseTable) -> Result<Self, GradeError> {
        table.validate()?;

        let mut languages = HashMap::new();
        for (language, pairs) in &table.pairs {
            if pairs.is_empty() {
                continue;
            }
            let forward = Substitution::compile(
                pairs
                    .iter()
                    .map(|p| (p.phrase.as_str(), p.counterpart.as_str())),
            )?;
            let reverse = Substitution::compile(
                pairs
                    .iter()
                    .map(|p| (p.counterpart.as_str(), p.phrase.as_str())),
            )?;
            languages.insert(*language, LanguagePairs { forward, reverse });
        }

        Ok(Self { languages })
    }

    /// Whether `language` has compiled phrase substitutions.
    pub fn has_phrases(&self, language: LanguageTag) -> bool {
        !language.is_default() && self.languages.contains_key(&language)
    }

    /// Case-folded variants of `text`.
    ///
    /// The first variant is always the lower-cased text. For a non-default
    /// language with known phrases, the text with every phrase replaced by
    /// its counterpart and the text with every counterpart replaced by its
    /// phrase follow.
    pub fn variants(&self, text: &str, language: LanguageTag) -> Vec<String> {
        let folded = text.to_lowercase();
        let mut variants = vec![folded.clone()];

        if language.is_default() {
            return variants;
        }
        if let Some(pairs) = self.languages.get(&language) {
            for substituted in [pairs.forward.apply(&folded), pairs.reverse.apply(&folded)] {
                if !variants.contains(&substituted) {
                    variants.push(substituted);
                }
            }
        }
        variants
    }

    /// Whether some variant of `a` exactly equals some variant of `b`.
    pub fn matches_exactly(&self, a: &str, b: &str, language: LanguageTag) -> bool {
        let left = self.variants(a, language);
        let right = self.variants(b, language);
        left.iter().any(|l| right.iter().any(|r| l == r))
    }

    /// Whether some variant pair is equal or one contains the other.
    ///
    /// An empty variant is only equivalent to another empty variant.
    pub fn equivalent(&self, a: &str, b: &str, language: LanguageTag) -> bool {
        let left = self.variants(a, language);
        let right = self.variants(b, language);
        left.iter().any(|l| {
            right.iter().any(|r| {
                l == r || (!r.is_empty() && l.contains(r.as_str())) || (!l.is_empty() && r.contains(l.as_str()))
            })
        })
    }
}
