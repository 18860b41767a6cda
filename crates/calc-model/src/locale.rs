//! Locales and caller-supplied localized strings.
//!
//! The core never translates; it only selects the string for a locale.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported display locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "ja")]
    Ja,
}

impl Locale {
    pub const fn all() -> &'static [Self] {
        &[Self::ZhTw, Self::En, Self::Ja]
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ZhTw => "zh-TW",
            Self::En => "en",
            Self::Ja => "ja",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh-tw" | "zh_tw" | "zh" => Ok(Self::ZhTw),
            "en" => Ok(Self::En),
            "ja" => Ok(Self::Ja),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// A string supplied in every supported locale.
///
/// English is mandatory; empty translations fall back to English.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: Cow<'static, str>,
    #[serde(rename = "zh-TW", default)]
    pub zh_tw: Cow<'static, str>,
    #[serde(default)]
    pub ja: Cow<'static, str>,
}

impl LocalizedText {
    /// Build from static strings, usable in `const` tables.
    pub const fn new(en: &'static str, zh_tw: &'static str, ja: &'static str) -> Self {
        Self {
            en: Cow::Borrowed(en),
            zh_tw: Cow::Borrowed(zh_tw),
            ja: Cow::Borrowed(ja),
        }
    }

    /// Build from owned strings.
    pub fn owned(en: String, zh_tw: String, ja: String) -> Self {
        Self {
            en: Cow::Owned(en),
            zh_tw: Cow::Owned(zh_tw),
            ja: Cow::Owned(ja),
        }
    }

    /// The same text in every locale (units, numbers).
    pub fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::owned(text.clone(), text.clone(), text)
    }

    /// Text for `locale`, falling back to English.
    pub fn get(&self, locale: Locale) -> &str {
        let text = match locale {
            Locale::ZhTw => &self.zh_tw,
            Locale::En => &self.en,
            Locale::Ja => &self.ja,
        };
        if text.is_empty() { &self.en } else { text }
    }

    /// Apply `f` to each locale's text.
    pub fn map(&self, mut f: impl FnMut(Locale, &str) -> String) -> Self {
        Self::owned(
            f(Locale::En, self.get(Locale::En)),
            f(Locale::ZhTw, self.get(Locale::ZhTw)),
            f(Locale::Ja, self.get(Locale::Ja)),
        )
    }

    /// Case-insensitive substring match against any locale.
    pub fn contains_ignore_case(&self, needle_lower: &str) -> bool {
        [&self.en, &self.zh_tw, &self.ja]
            .iter()
            .any(|text| text.to_lowercase().contains(needle_lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english() {
        let text: LocalizedText = toml::from_str(r#"en = "Weight""#).expect("parse text");
        assert_eq!(text.get(Locale::En), "Weight");
        assert_eq!(text.get(Locale::ZhTw), "Weight");
        assert_eq!(text.get(Locale::Ja), "Weight");
    }

    #[test]
    fn selects_requested_locale() {
        let text = LocalizedText::new("Weight", "體重", "体重");
        assert_eq!(text.get(Locale::ZhTw), "體重");
        assert_eq!(text.get(Locale::Ja), "体重");
    }

    #[test]
    fn parses_locale_codes() {
        assert_eq!("zh-TW".parse::<Locale>(), Ok(Locale::ZhTw));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn map_formats_each_locale() {
        let text = LocalizedText::new("{} is required", "{}為必填", "{}は必須です");
        let mapped = text.map(|_, t| t.replace("{}", "X"));
        assert_eq!(mapped.get(Locale::En), "X is required");
        assert_eq!(mapped.get(Locale::ZhTw), "X為必填");
    }

    #[test]
    fn search_matches_any_locale() {
        let text = LocalizedText::new("Body Mass Index", "身體質量指數", "体格指数");
        assert!(text.contains_ignore_case("mass"));
        assert!(text.contains_ignore_case("質量"));
        assert!(!text.contains_ignore_case("kidney"));
    }
}
