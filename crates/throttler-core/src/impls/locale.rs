//! LocaleSource 実装
//!
//! - **StaticLocale**: 設定ファイルで指定された固定ロケール
//! - **EnvLocale**: `LC_ALL` / `LC_MESSAGES` / `LANG` から読む

use crate::ports::LocaleSource;

#[derive(Debug, Clone)]
pub struct StaticLocale(Option<String>);

impl StaticLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(Some(locale.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl LocaleSource for StaticLocale {
    fn locale(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Variables consulted in order; the first usable one wins.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLocale;

impl LocaleSource for EnvLocale {
    fn locale(&self) -> Option<String> {
        LOCALE_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| normalize_posix_locale(&value))
    }
}

/// `en_US.UTF-8@euro` -> `en-US`. `C` / `POSIX` / empty carry no locale.
pub fn normalize_posix_locale(value: &str) -> Option<String> {
    let base = value
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}
