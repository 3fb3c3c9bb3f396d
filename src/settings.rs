use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub max_dimension: u32,
    pub keyword_weight: usize,
    pub keywords: Vec<String>,
    pub ocr_binary: String,
    pub ocr_language: String,
    pub ocr_psm: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_dimension: 3000,
            keyword_weight: 100,
            keywords: [
                "total", "tax", "subtotal", "receipt", "date", "store", "invoice", "paid",
                "change", "cash", "card", "amount", "qty", "price",
            ]
            .iter()
            .map(|value| value.to_string())
            .collect(),
            ocr_binary: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            ocr_psm: 3,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    image: Option<ImageSettings>,
    scoring: Option<ScoringSettings>,
    ocr: Option<OcrSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageSettings {
    max_dimension: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScoringSettings {
    keyword_weight: Option<usize>,
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OcrSettings {
    binary: Option<String>,
    language: Option<String>,
    psm: Option<u32>,
}

/// Loads the built-in defaults, then merges `extra_path` over them when given.
///
/// No file is looked up implicitly.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        let content = fs::read_to_string(extra)
            .with_context(|| format!("failed to read settings: {}", extra.display()))?;
        settings
            .merge_str(&content)
            .with_context(|| format!("failed to parse settings: {}", extra.display()))?;
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(image) = incoming.image {
            if let Some(max) = image.max_dimension {
                if max > 0 {
                    self.max_dimension = max;
                }
            }
        }
        if let Some(scoring) = incoming.scoring {
            if let Some(weight) = scoring.keyword_weight {
                self.keyword_weight = weight;
            }
            if let Some(keywords) = scoring.keywords {
                self.keywords = normalize_keywords(keywords);
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(binary) = ocr.binary {
                if !binary.trim().is_empty() {
                    self.ocr_binary = binary.trim().to_string();
                }
            }
            if let Some(language) = ocr.language {
                if !language.trim().is_empty() {
                    self.ocr_language = language.trim().to_string();
                }
            }
            if let Some(psm) = ocr.psm {
                self.ocr_psm = psm;
            }
        }
    }
}

fn normalize_keywords(raw: Vec<String>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for value in raw {
        let keyword = value.trim().to_lowercase();
        if keyword.is_empty() || keywords.contains(&keyword) {
            continue;
        }
        keywords.push(keyword);
    }
    keywords
}
