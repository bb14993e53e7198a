//! Locale resolution from `Accept-Language`.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use super::{Flow, Interceptor, RequestContext};

/// Locale tags the dashboard ships translations for.
const SUPPORTED: [&str; 10] = [
    "zh", "zh-Hant", "en", "ja", "ko", "ru", "ms", "pt-BR", "tr", "es-ES",
];

/// A supported locale tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale(&'static str);

impl Locale {
    /// Match a language tag against the supported set, case-insensitively.
    /// Region variants fall back to their language (`en-US` → `en`), and
    /// traditional Chinese regions map to `zh-Hant`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        if let Some(exact) = SUPPORTED.iter().find(|s| s.eq_ignore_ascii_case(tag)) {
            return Some(Self(*exact));
        }

        let lower = tag.to_ascii_lowercase();
        if ["zh-tw", "zh-hk", "zh-mo"].contains(&lower.as_str()) || lower.starts_with("zh-hant") {
            return Some(Self("zh-Hant"));
        }
        let language = lower.split(['-', '_']).next()?;
        SUPPORTED
            .iter()
            .find(|s| s.eq_ignore_ascii_case(language))
            .or_else(|| {
                let prefix = format!("{}-", language);
                SUPPORTED
                    .iter()
                    .find(|s| s.to_ascii_lowercase().starts_with(&prefix))
            })
            .map(|s| Self(*s))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// The dashboard's own language, used when nothing else matches.
impl Default for Locale {
    fn default() -> Self {
        Self("zh")
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

pub struct LocaleResolver {
    default: Locale,
}

impl LocaleResolver {
    pub fn new(default: Locale) -> Self {
        Self { default }
    }

    /// Pick the highest-weighted supported language, else the default.
    pub fn resolve(&self, headers: &HeaderMap) -> Locale {
        let Some(value) = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
        else {
            return self.default;
        };

        let mut candidates: Vec<(&str, f32)> = value
            .split(',')
            .filter_map(|item| {
                let mut pieces = item.split(';');
                let tag = pieces.next()?.trim();
                let weight = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (weight > 0.0 && !tag.is_empty()).then_some((tag, weight))
            })
            .collect();
        // Stable sort keeps header order among equal weights.
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        candidates
            .into_iter()
            .find_map(|(tag, _)| Locale::from_tag(tag))
            .unwrap_or(self.default)
    }
}

#[async_trait]
impl Interceptor for LocaleResolver {
    fn name(&self) -> &'static str {
        "locale"
    }

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow {
        let locale = self.resolve(ctx.headers());
        ctx.insert(locale);
        Flow::Continue
    }
}
