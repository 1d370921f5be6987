//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 外部の読み取り・書き込み（ストア、ネットワーク、ロケール、時刻、乱数、
//! インストール機構）はすべてここの trait を経由し、
//! Cohort Evaluator をテストで明示的な入力だけから駆動できるようにします。

pub mod clock;
pub mod installer;
pub mod locale;
pub mod params_source;
pub mod randomizer;
pub mod store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::installer::{INSTALL_MIME_TYPE, InstallHandle, Installer};
pub use self::locale::LocaleSource;
pub use self::params_source::{FetchError, ParamsSource};
pub use self::randomizer::{FixedRandom, Randomizer, ThreadRandom};
pub use self::store::{KeyValueStore, StoreError};
