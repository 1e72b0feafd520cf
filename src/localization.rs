//! # Localization Module
//!
//! Fluent-based message catalogue. Resources are compiled into the binary
//! from `locales/<lang>/main.ftl`; English is the fallback language.

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{error, warn};
use unic_langid::LanguageIdentifier;

/// Default language used when the user's language is not supported
pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages with a bundled resource, paired with their Fluent source
const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("ru", include_str!("../locales/ru/main.ftl")),
];

/// Localization manager holding one bundle per supported language
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager, failing on any resource error
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (lang, source) in RESOURCES {
            let bundle = Self::create_bundle(lang, source)?;
            bundles.insert((*lang).to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    fn empty() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(lang: &str, source: &str) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = lang.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Plain Telegram text, no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for '{lang}': {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for '{lang}': {errors:?}"))?;

        Ok(bundle)
    }

    /// Whether `lang` itself (without fallback) defines `key`
    pub fn has_message(&self, lang: &str, key: &str) -> bool {
        self.bundles
            .get(lang)
            .is_some_and(|bundle| bundle.has_message(key))
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Supported language codes, default language first
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        languages.sort_by_key(|lang| (*lang != DEFAULT_LANGUAGE, *lang));
        languages
    }

    /// Get a localized message in a specific language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        lang: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        // Per-message fallback: a key missing in the user's language comes from English
        let found = [lang, DEFAULT_LANGUAGE].into_iter().find_map(|lang| {
            let bundle = self.bundles.get(lang)?;
            bundle.get_message(key).map(|msg| (bundle, msg))
        });

        let (bundle, msg) = match found {
            Some(found) => found,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = Vec::new();
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key, lang, errors = ?errors, "Fluent formatting reported errors");
        }

        value.into_owned()
    }
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // A concurrent initializer may have won; either manager is equivalent
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager, loading it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| match LocalizationManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "Failed to load localization resources");
            LocalizationManager::empty()
        }
    })
}

/// Map a Telegram language code (e.g. `ru-RU`) to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    RESOURCES
        .iter()
        .map(|(lang, _)| *lang)
        .find(|lang| *lang == primary)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Convenience function to get a localized message for a user language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(
        key,
        detect_language(language_code),
        Some(&args_map),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources_parse() {
        let manager = LocalizationManager::new().expect("bundled resources must parse");
        assert!(manager.is_language_supported("en"));
        assert!(manager.is_language_supported("ru"));
        assert_eq!(manager.languages(), vec!["en", "ru"]);
    }

    #[test]
    fn test_every_english_key_is_translated() {
        let manager = LocalizationManager::new().unwrap();
        let keys = RESOURCES[0]
            .1
            .lines()
            .filter(|line| line.starts_with(|c: char| c.is_ascii_lowercase()))
            .filter_map(|line| line.split_once(" =").map(|(key, _)| key.trim()));

        for key in keys {
            assert!(manager.has_message("ru", key), "missing Russian message for {key}");
        }
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(detect_language(Some("ru")), "ru");
        assert_eq!(detect_language(Some("ru-RU")), "ru");
        assert_eq!(detect_language(Some("EN_us")), "en");
        assert_eq!(detect_language(Some("de")), "en");
        assert_eq!(detect_language(None), "en");
    }
}
