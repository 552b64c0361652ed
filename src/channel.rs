//! # Channel モジュール
//!
//! モデル間でコンパイル時の依存なしにデータを受け渡すための、名前付き共有値セルを
//! 提供します。
//!
//! [`BusData`] はチャネル構築時に初期値とともに作成され、読み取り・書き込み
//! ハンドルを払い出します。ハンドルはすべて同じ記憶領域を指し、書き込みは
//! 未解放のすべてのハンドルから即座に観測できます（読み出し時のコピーはしません）。
//!
//! ## ハンドルの区別
//!
//! 読み取り・書き込みハンドルの区別は監査ログ上のものだけで、アクセス制御は
//! 行いません。どちらのハンドルからでも読み書きできます。
//!
//! ## スレッド安全性
//!
//! 各セルは `Arc<RwLock<T>>` で保持され、1回のアクセス単位では排他されます。
//! ただし複数セル間の整合性、バージョン管理、更新順序の保証はありません。
//! シミュレーションスレッドとコマンド入力スレッドが同じセルを操作する場合、
//! 複数フィールドをまとめて更新する整合性は呼び出し側の責任です。

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

/// BusData フィールドをまとめた名前付きチャネル
pub trait DataChannel {
    /// チャネルの診断用名称
    fn get_name(&self) -> &str;
}

/// 名前付きの共有値セル
pub struct BusData<T> {
    data: Arc<RwLock<T>>,
    name: String,
}

impl<T> BusData<T> {
    /// 初期値と診断用名称からセルを作成
    pub fn new(initial_value: T, name: impl Into<String>) -> Self {
        Self {
            data: Arc::new(RwLock::new(initial_value)),
            name: name.into(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// 読み取りハンドルを取得
    ///
    /// # 引数
    ///
    /// * `requester` - 要求元モデルの名前（監査ログ用、`None` は Anonymous）
    pub fn get_read_handle(&self, requester: Option<&str>) -> Handle<T> {
        info!(
            "Read Handle: {} << {}",
            requester.unwrap_or("Anonymous"),
            self.name
        );
        self.handle()
    }

    /// 書き込みハンドルを取得
    ///
    /// # 引数
    ///
    /// * `requester` - 要求元モデルの名前（監査ログ用、`None` は Anonymous）
    pub fn get_write_handle(&self, requester: Option<&str>) -> Handle<T> {
        info!(
            "Write Handle: {} >> {}",
            requester.unwrap_or("Anonymous"),
            self.name
        );
        self.handle()
    }

    fn handle(&self) -> Handle<T> {
        Handle {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BusData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusData")
            .field("name", &self.name)
            .field("data", &*self.handle().read())
            .finish()
    }
}

/// BusData の値へのアクセサ
///
/// クローンしても同じ値を指します。
pub struct Handle<T> {
    data: Arc<RwLock<T>>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> Handle<T> {
    /// 値を読み取りロックして参照を返します
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        // 書き込み中のパニックでポイズンされても値自体は返す
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// 値を書き込みロックして可変参照を返します
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 値を置き換えます
    pub fn set(&self, value: T) {
        *self.write() = value;
    }

    /// 2つのハンドルが同じセルを指しているか
    pub fn ptr_eq(&self, other: &Handle<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl<T: Clone> Handle<T> {
    /// 値のコピーを取得
    pub fn get(&self) -> T {
        self.read().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&*self.read()).finish()
    }
}
