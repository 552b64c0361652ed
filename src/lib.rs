//! # ttsim
//!
//! 段階的ライフサイクルを持つ決定論的シミュレーションフレームワークです。
//!
//! 独立に書かれた物理モデル・センサーモデルを一つの同期ループにまとめ、
//! 共有データチャネル（[`channel::BusData`]）でモデル間のデータを受け渡し、
//! 階層的な座標変換（[`transform::Transform`]）で相対位置・姿勢を扱います。
//!
//! ## モジュール構成
//!
//! - [`simulation`]: ライフサイクル状態機械とモデル実行順序の管理
//! - [`channel`]: 名前付き共有値セルとハンドル
//! - [`transform`]: 4x4 同次変換行列の親子ツリー
//! - [`models`]: モデル契約と代表的なモデル（レーダー、機体運動）
//! - [`data`]: モデル間で共有されるチャネル定義
//! - [`rpr_fom`]: 環境エンティティレコード
//! - [`scenario`]: YAMLシナリオ設定
//! - [`logging`]: tracingによるログ出力設定

pub mod channel;
pub mod data;
pub mod logging;
pub mod math;
pub mod models;
pub mod rpr_fom;
pub mod scenario;
pub mod simulation;
pub mod transform;

pub use channel::{BusData, DataChannel, Handle};
pub use models::Model;
pub use simulation::{Simulation, State};
pub use transform::Transform;
