use std::path::PathBuf;

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::channel::Handle;
use crate::data::OwnshipChannel;
use crate::models::traits::Model;

const AIRCRAFT_NAME: &str = "AircraftModel";

/// 機体運動エンジンが参照するデータディレクトリ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AircraftPaths {
    pub aircraft: PathBuf,
    pub engine: PathBuf,
    pub systems: PathBuf,
}

/// 外部の機体運動（フライトダイナミクス）エンジンのインターフェース
///
/// 内部の物理状態は不透明で、コアが利用するのはワールド座標の位置だけです。
pub trait FlightDynamics: Send {
    /// 機体モデルの読み込み
    fn load_model(&mut self, paths: &AircraftPaths, airframe: &str) -> bool;

    /// 初期条件の適用
    fn run_ic(&mut self) -> bool;

    /// 1物理ステップの実行
    fn run(&mut self) -> bool;

    /// ワールド座標位置（メートル）
    fn position(&self) -> Vector3<f64>;

    /// ワールド座標速度（m/s）。提供しないエンジンは `None`
    fn velocity(&self) -> Option<Vector3<f64>> {
        None
    }

    /// デバッグ用のプロパティ一覧。提供しないエンジンは空
    fn properties(&self) -> Vec<String> {
        Vec::new()
    }
}

/// 機体運動エンジンをラップし、自機チャネルへ位置を書き込むモデル
pub struct AircraftModel<F: FlightDynamics> {
    fdm: F,
    paths: AircraftPaths,
    airframe: String,
    out_aircraft_position: Handle<Vector3<f64>>,
    out_aircraft_velocity: Handle<Vector3<f64>>,
}

impl<F: FlightDynamics> AircraftModel<F> {
    pub fn new(ownship_channel: &OwnshipChannel, fdm: F, paths: AircraftPaths, airframe: impl Into<String>) -> Self {
        let requester = Some(AIRCRAFT_NAME);
        Self {
            fdm,
            paths,
            airframe: airframe.into(),
            out_aircraft_position: ownship_channel.aircraft_position.get_write_handle(requester),
            out_aircraft_velocity: ownship_channel.aircraft_velocity.get_write_handle(requester),
        }
    }

    pub fn flight_dynamics(&self) -> &F {
        &self.fdm
    }
}

impl<F: FlightDynamics> Model for AircraftModel<F> {
    fn get_name(&self) -> &str {
        AIRCRAFT_NAME
    }

    fn get_target_frame_interval(&self) -> u32 {
        0
    }

    fn load(&mut self) -> bool {
        let loaded = self.fdm.load_model(&self.paths, &self.airframe);
        if loaded {
            info!("機体モデル読み込み: {}", self.airframe);
        } else {
            warn!("機体モデル読み込み失敗: {}", self.airframe);
        }
        loaded
    }

    fn init(&mut self) -> bool {
        for property in self.fdm.properties() {
            debug!("{} プロパティ: {}", AIRCRAFT_NAME, property);
        }
        self.fdm.run_ic()
    }

    fn run(&mut self) -> bool {
        let result = self.fdm.run();

        // 失敗時も最新の位置を書き込んでから結果を返す
        self.out_aircraft_position.set(self.fdm.position());
        if let Some(velocity) = self.fdm.velocity() {
            self.out_aircraft_velocity.set(velocity);
        }

        result
    }
}

/// 等速直線運動の機体運動エンジン
///
/// 外部の物理エンジンを結合しない場合の代替として使います。
#[derive(Debug, Clone)]
pub struct KinematicFlightDynamics {
    initial_position: Vector3<f64>,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    /// 1ステップの時間（秒）
    dt: f64,
    loaded: bool,
}

impl KinematicFlightDynamics {
    pub fn new(initial_position: Vector3<f64>, velocity: Vector3<f64>, dt: f64) -> Self {
        Self {
            initial_position,
            position: initial_position,
            velocity,
            dt,
            loaded: false,
        }
    }
}

impl FlightDynamics for KinematicFlightDynamics {
    fn load_model(&mut self, paths: &AircraftPaths, airframe: &str) -> bool {
        debug!(
            "等速モデル: {} (aircraft={}, engine={}, systems={})",
            airframe,
            paths.aircraft.display(),
            paths.engine.display(),
            paths.systems.display()
        );
        self.loaded = !airframe.is_empty();
        self.loaded
    }

    fn run_ic(&mut self) -> bool {
        self.position = self.initial_position;
        self.loaded
    }

    fn run(&mut self) -> bool {
        self.position += self.velocity * self.dt;
        self.loaded
    }

    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn velocity(&self) -> Option<Vector3<f64>> {
        Some(self.velocity)
    }

    fn properties(&self) -> Vec<String> {
        vec![
            format!("position/x-m = {}", self.position.x),
            format!("position/y-m = {}", self.position.y),
            format!("position/z-m = {}", self.position.z),
            format!("velocity/x-mps = {}", self.velocity.x),
            format!("velocity/y-mps = {}", self.velocity.y),
            format!("velocity/z-mps = {}", self.velocity.z),
            format!("simulation/dt-sec = {}", self.dt),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinematic() -> KinematicFlightDynamics {
        KinematicFlightDynamics::new(Vector3::new(0.0, 0.0, 1000.0), Vector3::new(200.0, 0.0, 0.0), 0.5)
    }

    #[test]
    fn test_run_writes_position_and_velocity() {
        let ownship = OwnshipChannel::new();
        let mut aircraft = AircraftModel::new(&ownship, kinematic(), AircraftPaths::default(), "f16");
        let position = ownship.aircraft_position.get_read_handle(None);
        let velocity = ownship.aircraft_velocity.get_read_handle(None);

        assert!(aircraft.load());
        assert!(aircraft.init());
        assert!(aircraft.run());
        assert_eq!(position.get(), Vector3::new(100.0, 0.0, 1000.0));
        assert_eq!(velocity.get(), Vector3::new(200.0, 0.0, 0.0));

        assert!(aircraft.run());
        assert_eq!(position.get(), Vector3::new(200.0, 0.0, 1000.0));
    }

    #[test]
    fn test_empty_airframe_fails_to_load() {
        let ownship = OwnshipChannel::new();
        let mut aircraft = AircraftModel::new(&ownship, kinematic(), AircraftPaths::default(), "");
        assert!(!aircraft.load());
        assert!(!aircraft.init());
    }

    #[test]
    fn test_property_catalog() {
        let fdm = kinematic();
        let properties = fdm.properties();
        assert_eq!(properties.len(), 7);
        assert_eq!(properties[2], "position/z-m = 1000");
        assert_eq!(properties[6], "simulation/dt-sec = 0.5");
    }

    #[test]
    fn test_init_resets_position() {
        let ownship = OwnshipChannel::new();
        let mut aircraft = AircraftModel::new(&ownship, kinematic(), AircraftPaths::default(), "f16");
        assert!(aircraft.load());
        assert!(aircraft.run());
        assert!(aircraft.init());
        assert_eq!(aircraft.flight_dynamics().position(), Vector3::new(0.0, 0.0, 1000.0));
    }
}
