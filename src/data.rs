//! 共通合成環境チャネルの定義

use nalgebra::Vector3;

use crate::channel::{BusData, DataChannel};
use crate::rpr_fom::PhysicalEntity;

/// 自機（シミュレーション対象の航空機）に関する情報を保持するチャネル
#[derive(Debug)]
pub struct OwnshipChannel {
    name: String,
    pub aircraft_position: BusData<Vector3<f64>>,
    pub aircraft_rotation: BusData<Vector3<f64>>,
    pub aircraft_velocity: BusData<Vector3<f64>>,
    /// 機体に対するレーダー取り付け位置
    pub radar_offset: BusData<Vector3<f64>>,
    /// 機体に対するレーダー取り付け姿勢
    pub radar_rotation: BusData<Vector3<f64>>,
}

impl OwnshipChannel {
    pub fn new() -> Self {
        Self {
            name: "OwnshipChannel".to_string(),
            aircraft_position: BusData::new(Vector3::zeros(), "Ownship.Position"),
            aircraft_rotation: BusData::new(Vector3::zeros(), "Ownship.Rotation"),
            aircraft_velocity: BusData::new(Vector3::zeros(), "Ownship.Velocity"),
            radar_offset: BusData::new(Vector3::zeros(), "Radar.Offset"),
            radar_rotation: BusData::new(Vector3::zeros(), "Radar.Rotation"),
        }
    }
}

impl Default for OwnshipChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataChannel for OwnshipChannel {
    fn get_name(&self) -> &str {
        &self.name
    }
}

/// 他エンティティの情報を保持するチャネル
#[derive(Debug)]
pub struct EnvironmentChannel {
    name: String,
    pub physical_entities: BusData<Vec<PhysicalEntity>>,
}

impl EnvironmentChannel {
    pub fn new() -> Self {
        Self {
            name: "EnvironmentChannel".to_string(),
            physical_entities: BusData::new(Vec::new(), "Environment.Entities"),
        }
    }
}

impl Default for EnvironmentChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataChannel for EnvironmentChannel {
    fn get_name(&self) -> &str {
        &self.name
    }
}
