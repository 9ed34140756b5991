//! Localized learner-facing messages.

use crate::model::LanguageTag;

/// Message catalogue for one UI language.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    language: LanguageTag,
}

impl Messages {
    pub fn for_language(language: LanguageTag) -> Self {
        Self { language }
    }

    pub fn language(&self) -> LanguageTag {
        self.language
    }

    pub fn correct(&self) -> &'static str {
        match self.language {
            LanguageTag::Ru => "Правильно! Задание выполнено.",
            LanguageTag::Kz => "Дұрыс! Тапсырма орындалды.",
            LanguageTag::En => "Correct! Assignment completed.",
        }
    }

    pub fn incorrect(&self) -> &'static str {
        match self.language {
            LanguageTag::Ru => "Неправильно. Повторите попытку.",
            LanguageTag::Kz => "Қате. Қайталап көріңіз.",
            LanguageTag::En => "Incorrect. Please try again.",
        }
    }

    /// Marker used in place of a tag name the learner did not produce.
    pub fn absent(&self) -> &'static str {
        match self.language {
            LanguageTag::Ru => "отсутствует",
            LanguageTag::Kz => "жоқ",
            LanguageTag::En => "absent",
        }
    }

    pub fn expected_output(&self, expected: &str, actual: &str) -> String {
        match self.language {
            LanguageTag::Ru => format!("Ожидался вывод \"{expected}\", получено \"{actual}\""),
            LanguageTag::Kz => format!("Күтілген нәтиже \"{expected}\", алынғаны \"{actual}\""),
            LanguageTag::En => format!("Expected output \"{expected}\", got \"{actual}\""),
        }
    }

    pub fn expected_element(&self, missing: &str, got: &str) -> String {
        match self.language {
            LanguageTag::Ru => format!("Ожидался элемент <{missing}>, получено <{got}>"),
            LanguageTag::Kz => format!("Күтілген элемент <{missing}>, алынғаны <{got}>"),
            LanguageTag::En => format!("Expected element <{missing}>, got <{got}>"),
        }
    }

    pub fn missing_element(&self, missing: &str) -> String {
        match self.language {
            LanguageTag::Ru => format!("Отсутствует элемент <{missing}>"),
            LanguageTag::Kz => format!("<{missing}> элементі жоқ"),
            LanguageTag::En => format!("Missing element <{missing}>"),
        }
    }

    pub fn console_mismatch(&self, expected: &str, actual: &str) -> String {
        match self.language {
            LanguageTag::Ru => format!("Ожидался: \"{expected}\", получено: \"{actual}\""),
            LanguageTag::Kz => format!("Күтілгені: \"{expected}\", алынғаны: \"{actual}\""),
            LanguageTag::En => format!("Expected: \"{expected}\", got: \"{actual}\""),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::for_language(LanguageTag::default())
    }
}
