//! throttler-core
//!
//! リモート配布の cohort ポリシーで、オプション機能（add-on）のインストールを絞る。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（candidate, gating params, cache entry, decision, errors）
//! - **ports**: 抽象化レイヤー（KeyValueStore, ParamsSource, Installer, LocaleSource, Clock, Randomizer）
//! - **app**: アプリケーションロジック（builder, config_cache, evaluator, orchestrator, idle_loop）
//! - **impls**: ports の実装（InMemoryStore, JsonFileStore, HttpParamsSource, ...）
//! - **config**: 設定ファイル

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
