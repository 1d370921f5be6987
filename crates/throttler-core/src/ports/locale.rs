//! LocaleSource port - ホストのロケール設定（同期読み取り）

pub trait LocaleSource: Send + Sync {
    /// Active locale, e.g. `"en-US"`. `None` when the host has none configured.
    fn locale(&self) -> Option<String>;
}
