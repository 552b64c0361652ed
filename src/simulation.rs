//! # Simulation モジュール
//!
//! 登録されたモデル群を共通のライフサイクル状態機械で駆動するシミュレーション
//! エンジンを提供します。
//!
//! ## ライフサイクル
//!
//! ステージは `PreLoad → Loaded → Initialised → Running → Holding → Unloaded`
//! の順に全順序を持ちます。[`Simulation`] は実際の状態 `current_state` と、外部から
//! 設定される目標状態 `target_state` を別々に保持し、`current_state` は全モデルが
//! 該当ステージに成功したときだけ進みます。
//!
//! ## ステップ処理
//!
//! [`Simulation::step`] は1回の呼び出しで高々1つのステージ処理を行います。
//! 優先順位は次のとおりです。
//!
//! 1. **実行（高速パス）**: 目標が Running で現在が Initialised / Running なら全モデルの `run()`
//! 2. **読み込み**: 目標が Loaded 以上で現在が Loaded 未満なら全モデルの `load()`
//! 3. **初期化**: 目標が Initialised 以上で現在が Initialised 未満なら全モデルの `init()`
//!
//! どれにも当てはまらなければ何もしません。各ステージでのモデル呼び出し順は
//! 登録順で、並べ替えは行いません。
//!
//! ## 既知の未完成部分
//!
//! `hold()` / `unload()` の一巡処理は `step()` から到達しません。そのため
//! `current_state` が `Unloaded` になる経路はなく、[`Simulation::main`] は
//! 現状の遷移ロジックでは終了しません。`set_target_state` も遷移の妥当性を
//! 検証しません。
//!
//! ## 使用例
//!
//! ```rust
//! use ttsim::models::Model;
//! use ttsim::simulation::{Simulation, State};
//!
//! struct Clock;
//!
//! impl Model for Clock {
//!     fn get_name(&self) -> &str { "Clock" }
//!     fn get_target_frame_interval(&self) -> u32 { 10 }
//! }
//!
//! let mut clock = Clock;
//! let mut simulation = Simulation::new();
//! simulation.add_model(&mut clock);
//! simulation.set_target_state(State::Running);
//!
//! simulation.step(); // load
//! simulation.step(); // init
//! simulation.step(); // run
//! assert_eq!(simulation.get_current_state(), State::Running);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::models::Model;

/// シミュレーションのライフサイクルステージ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    PreLoad,
    Loaded,
    Initialised,
    Running,
    Holding,
    Unloaded,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::PreLoad => "PreLoad",
            State::Loaded => "Loaded",
            State::Initialised => "Initialised",
            State::Running => "Running",
            State::Holding => "Holding",
            State::Unloaded => "Unloaded",
        };
        f.write_str(name)
    }
}

/// 登録されたモデルとそのモデル個別のステージ
struct SimModel<'a> {
    model: &'a mut dyn Model,
    current_state: State,
}

/// ライフサイクル状態機械によるシミュレーションエンジン
///
/// モデルは借用で登録され、所有権は構成ルート（呼び出し側）に残ります。
pub struct Simulation<'a> {
    current_state: State,
    target_state: State,
    models: Vec<SimModel<'a>>,
}

impl Default for Simulation<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Simulation<'a> {
    pub fn new() -> Self {
        Self {
            current_state: State::PreLoad,
            target_state: State::PreLoad,
            models: Vec::new(),
        }
    }

    /// モデルを実行リストの末尾に追加します
    ///
    /// 追加順は実行時にも保持されます。例えば制御入力モデルを先に追加すると、
    /// 機体運動モデルは最新の制御値を使って計算できます。重複の検出は行いません。
    pub fn add_model(&mut self, model: &'a mut dyn Model) {
        debug!("モデル登録: {}", model.get_name());
        self.models.push(SimModel {
            model,
            current_state: State::PreLoad,
        });
    }

    pub fn get_current_state(&self) -> State {
        self.current_state
    }

    pub fn get_target_state(&self) -> State {
        self.target_state
    }

    /// 目標状態を設定します
    ///
    /// 遷移の妥当性は検証せず、常に受け付けて `true` を返します。
    // TODO: 不正な遷移（現在より前のステージ、Holding/Unloaded への遷移）で false を返す
    pub fn set_target_state(&mut self, target_state: State) -> bool {
        self.target_state = target_state;
        true
    }

    /// 登録済みモデルの数
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// 各モデルの名前と個別ステージを登録順に返します
    ///
    /// 部分的な読み込み失敗の確認に使えます。
    pub fn get_model_states(&self) -> Vec<(&str, State)> {
        self.models
            .iter()
            .map(|sim_model| (sim_model.model.get_name(), sim_model.current_state))
            .collect()
    }

    /// ステージを高々1つ進めます
    pub fn step(&mut self) {
        // 最も頻度の高いケース
        if self.target_state == State::Running
            && matches!(self.current_state, State::Running | State::Initialised)
        {
            if self.run() {
                self.current_state = State::Running;
            }
            return;
        }

        if self.target_state >= State::Loaded && self.current_state < State::Loaded {
            if self.load() {
                self.current_state = State::Loaded;
            }
            return;
        }

        if self.target_state >= State::Initialised && self.current_state < State::Initialised {
            if self.init() {
                self.current_state = State::Initialised;
            }
        }
    }

    /// `current_state` が `Unloaded` になるまで `step()` を繰り返します
    ///
    /// 専用スレッドで呼ぶことを想定しています。現状の遷移ロジックでは `Unloaded` に
    /// 到達しないため、この関数は戻りません。
    pub fn main(&mut self) {
        info!("main()");

        while self.current_state != State::Unloaded {
            self.step();
        }
    }

    /// 全モデルの読み込み
    ///
    /// 既に Loaded 以上のモデルは飛ばします。失敗したモデルがあっても残りの
    /// モデルの読み込みは続け、失敗したモデルは次回の読み込みで再試行されます。
    fn load(&mut self) -> bool {
        info!("load()");
        let mut all_loaded = true;
        for sim_model in self.models.iter_mut() {
            if sim_model.current_state >= State::Loaded {
                continue;
            }
            if sim_model.model.load() {
                sim_model.current_state = State::Loaded;
            } else {
                warn!("読み込み失敗: {}", sim_model.model.get_name());
                all_loaded = false;
            }
        }
        all_loaded
    }

    fn init(&mut self) -> bool {
        info!("init()");
        self.sweep("init", |model| model.init())
    }

    fn run(&mut self) -> bool {
        trace!("run()");
        self.sweep("run", |model| model.run())
    }

    #[allow(dead_code)] // step() からは到達しない
    fn hold(&mut self) -> bool {
        self.sweep("hold", |model| model.hold())
    }

    #[allow(dead_code)] // step() からは到達しない
    fn unload(&mut self) -> bool {
        self.sweep("unload", |model| model.unload())
    }

    /// 登録順に全モデルのフックを呼び、最初の失敗で打ち切ります
    fn sweep(&mut self, stage: &str, mut hook: impl FnMut(&mut dyn Model) -> bool) -> bool {
        for sim_model in self.models.iter_mut() {
            if !hook(&mut *sim_model.model) {
                debug!("{}失敗: {}", stage, sim_model.model.get_name());
                return false;
            }
        }
        true
    }
}
