use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::math::vector_from_array;
use crate::models::{AircraftPaths, RadarConfig};
use crate::rpr_fom::PhysicalEntity;
use crate::simulation::State;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// 目標状態
    #[serde(default = "default_target_state")]
    pub target_state: State,
    /// 実行ステップ数。未指定の場合は `Simulation::main()` で回し続ける
    #[serde(default)]
    pub max_steps: Option<u64>,
}

fn default_target_state() -> State {
    State::Running
}

/// 自機の初期状態とレーダー取り付け
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OwnshipConfig {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub velocity: [f64; 3],
    pub radar_offset: [f64; 3],
    pub radar_rotation: [f64; 3],
}

/// 機体運動モデル設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AircraftConfig {
    pub airframe: String,
    pub aircraft_path: PathBuf,
    pub engine_path: PathBuf,
    pub systems_path: PathBuf,
    /// 1ステップの時間刻み（ミリ秒）
    pub frame_interval_ms: u32,
}

impl Default for AircraftConfig {
    fn default() -> Self {
        Self {
            airframe: "f16".to_string(),
            aircraft_path: PathBuf::from("aircraft"),
            engine_path: PathBuf::from("engine"),
            systems_path: PathBuf::from("systems"),
            frame_interval_ms: 100,
        }
    }
}

impl AircraftConfig {
    pub fn paths(&self) -> AircraftPaths {
        AircraftPaths {
            aircraft: self.aircraft_path.clone(),
            engine: self.engine_path.clone(),
            systems: self.systems_path.clone(),
        }
    }

    pub fn dt_s(&self) -> f64 {
        f64::from(self.frame_interval_ms) / 1000.0
    }
}

/// 環境（他エンティティ）設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub entities: Vec<PhysicalEntity>,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    #[serde(default)]
    pub ownship: OwnshipConfig,
    #[serde(default)]
    pub aircraft: AircraftConfig,
    #[serde(default)]
    pub radar: RadarConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.aircraft.airframe.trim().is_empty() {
            return Err(ScenarioError::ValidationError("airframe must not be empty".to_string()));
        }

        let radar = &self.radar;
        if !(radar.horizontal_field_of_view > 0.0) || !(radar.vertical_field_of_view > 0.0) {
            return Err(ScenarioError::ValidationError(
                "radar field of view must be positive".to_string(),
            ));
        }
        let non_negative = [
            ("power", radar.power),
            ("gain", radar.gain),
            ("effective_area", radar.effective_area),
            ("minimum_detectable_signal", radar.minimum_detectable_signal),
            ("radar_cross_section", radar.radar_cross_section),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ScenarioError::ValidationError(format!(
                    "radar {} must be a finite non-negative value (got {})",
                    name, value
                )));
            }
        }

        let ownship = &self.ownship;
        let triples = [
            ("position", ownship.position),
            ("rotation", ownship.rotation),
            ("velocity", ownship.velocity),
            ("radar_offset", ownship.radar_offset),
            ("radar_rotation", ownship.radar_rotation),
        ];
        for (name, value) in triples {
            if value.iter().any(|v| !v.is_finite()) {
                return Err(ScenarioError::ValidationError(format!(
                    "ownship {} must be finite",
                    name
                )));
            }
        }

        for (index, entity) in self.environment.entities.iter().enumerate() {
            let finite = entity.position().iter().all(|v| v.is_finite())
                && entity.rotation().iter().all(|v| v.is_finite())
                && entity.velocity().iter().all(|v| v.is_finite());
            if !finite {
                return Err(ScenarioError::ValidationError(format!(
                    "entity #{} has non-finite spatial values",
                    index
                )));
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("目標状態: {}", self.sim.target_state);
        match self.sim.max_steps {
            Some(steps) => println!("ステップ数: {}", steps),
            None => println!("ステップ数: 無制限"),
        }
        println!();

        println!("=== 自機 ===");
        println!("機体: {}", self.aircraft.airframe);
        let position = vector_from_array(self.ownship.position);
        println!("位置: ({:.1}, {:.1}, {:.1})", position.x, position.y, position.z);
        println!("レーダー送信電力: {:.0}W", self.radar.power);
        println!();

        println!("=== 環境 ===");
        println!("エンティティ数: {}", self.environment.entities.len());
        for (index, entity) in self.environment.entities.iter().enumerate() {
            let p = entity.position();
            println!("  #{}: ({:.1}, {:.1}, {:.1})", index, p.x, p.y, p.z);
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(PathBuf),
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}
