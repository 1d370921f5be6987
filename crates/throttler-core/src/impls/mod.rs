//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: テスト・ephemeral 実行用のストア
//! - **JsonFileStore**: 本番用のストア（単一 JSON ファイル）
//! - **HttpParamsSource**: reqwest による params 取得
//! - **StaticLocale / EnvLocale**: ロケール
//! - **DryRunInstaller**: ログだけ出す Installer

pub mod dry_run;
pub mod file_store;
pub mod http_source;
pub mod inmem_store;
pub mod locale;

// 主要な型を再エクスポート
pub use self::dry_run::DryRunInstaller;
pub use self::file_store::JsonFileStore;
pub use self::http_source::{DEFAULT_PARAMS_URL, HttpParamsSource};
pub use self::inmem_store::InMemoryStore;
pub use self::locale::{EnvLocale, StaticLocale, normalize_posix_locale};
