//! # Source Registry
//!
//! Static, compiled-in catalog of monitored outlets, grouped into three fixed
//! categories. It is the universe a [`Selection`](crate::selection::Selection)
//! draws from and the default selection for a fresh session.
//!
//! Identity is the exact display string; there is no alias or fuzzy matching.

use serde::{Deserialize, Serialize};

/// Outlet category as shown in the source picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Domestic,
    International,
    Social,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 3] = [
        SourceCategory::Domestic,
        SourceCategory::International,
        SourceCategory::Social,
    ];

    /// Outlets registered under this category, in catalog order.
    pub fn sources(self) -> &'static [&'static str] {
        match self {
            SourceCategory::Domestic => DOMESTIC,
            SourceCategory::International => INTERNATIONAL,
            SourceCategory::Social => SOCIAL,
        }
    }
}

const DOMESTIC: &[&str] = &[
    "خبرگزاری فارس (Fars News)",
    "خبرگزاری تسنیم (Tasnim)",
    "ایرنا (IRNA)",
    "ایسنا (ISNA)",
    "خبرگزاری مهر (Mehr News)",
    "انتخاب (Entekhab)",
    "روزنامه قدس (Quds Daily)",
    "عصر ایران (Asriran)",
    "تابناک (Tabnak)",
    "همشهری آنلاین",
    "روزنامه شرق",
];

const INTERNATIONAL: &[&str] = &[
    "بی‌بی‌سی فارسی (BBC Persian)",
    "ایران اینترنشنال (Iran Intl)",
    "رادیو فردا (Radio Farda)",
    "یورونیوز فارسی (Euronews)",
    "صدای آمریکا (VOA Farsi)",
    "دویچه‌وله فارسی (DW)",
];

const SOCIAL: &[&str] = &[
    "توییتر: اکانت‌های رسمی خبرگزاری‌ها",
    "توییتر: روزنامه‌نگاران و تحلیل‌گران",
    "اینستاگرام: صفحات خبری پربازدید",
    "اینستاگرام: صفحات سبک زندگی و اجتماعی",
    "کانال‌های تلگرامی خبری برجسته",
];

/// Every registered outlet: domestic, then international, then social.
pub fn all_sources() -> impl Iterator<Item = &'static str> {
    SourceCategory::ALL
        .into_iter()
        .flat_map(|c| c.sources().iter().copied())
}

/// Number of registered outlets across all categories.
pub fn registry_len() -> usize {
    DOMESTIC.len() + INTERNATIONAL.len() + SOCIAL.len()
}

/// Category of an exact registry name; `None` for anything outside the catalog.
pub fn category_of(source: &str) -> Option<SourceCategory> {
    SourceCategory::ALL
        .into_iter()
        .find(|c| c.sources().iter().any(|s| *s == source))
}

pub fn is_registered(source: &str) -> bool {
    category_of(source).is_some()
}

/// Position of an outlet in catalog order. Used to render selections deterministically.
pub fn catalog_index(source: &str) -> Option<usize> {
    all_sources().position(|s| s == source)
}

/// Registry grouped by category, shaped for the source-picker UI.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryView {
    pub domestic: Vec<&'static str>,
    pub international: Vec<&'static str>,
    pub social: Vec<&'static str>,
}

pub fn registry_view() -> RegistryView {
    RegistryView {
        domestic: DOMESTIC.to_vec(),
        international: INTERNATIONAL.to_vec(),
        social: SOCIAL.to_vec(),
    }
}
