//! 環境エンティティレコード（RPR FOM の物理エンティティ属性の一部）
//!
//! レーダーなどのセンサーモデルが読み取り専用で消費します。

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 推測航法アルゴリズム
///
/// 更新間のエンティティ運動を外挿するモデルを示すタグです。コアでは解釈しません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[repr(u8)]
pub enum DeadReckoningAlgorithm {
    Other = 0,
    Static = 1,
    DrmFpw = 2,
    DrmRpw = 3,
    #[default]
    DrmRvw = 4,
    DrmFvw = 5,
    DrmFpb = 6,
    DrmRpb = 7,
    DrmRvb = 8,
    DrmFvb = 9,
}

/// 姿勢（psi = yaw, theta = pitch, phi = roll、ラジアン）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Orientation {
    pub psi: f32,
    pub theta: f32,
    pub phi: f32,
}

/// ワールド座標位置（メートル）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 速度ベクトル（m/s）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VelocityVector {
    pub x_velocity: f32,
    pub y_velocity: f32,
    pub z_velocity: f32,
}

/// 加速度ベクトル（m/s²）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AccelerationVector {
    pub x_acceleration: f32,
    pub y_acceleration: f32,
    pub z_acceleration: f32,
}

/// 角速度ベクトル（rad/s）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AngularVelocityVector {
    pub x_angular_velocity: f32,
    pub y_angular_velocity: f32,
    pub z_angular_velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SpatialRv {
    pub world_location: WorldLocation,
    pub is_frozen: bool,
    pub orientation: Orientation,
    pub velocity_vector: VelocityVector,
    pub acceleration_vector: AccelerationVector,
    pub angular_velocity: AngularVelocityVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SpatialVariant {
    pub dead_reckoning_algorithm: DeadReckoningAlgorithm,
    pub spatial_rvw: SpatialRv,
}

/// 物理エンティティ
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicalEntity {
    /// レーダー反射断面積シグネチャのインデックス（-1 は未設定）
    pub radar_cross_section_signature_index: i16,
    pub spatial: SpatialVariant,
}

impl Default for PhysicalEntity {
    fn default() -> Self {
        Self {
            radar_cross_section_signature_index: -1,
            spatial: SpatialVariant::default(),
        }
    }
}

impl PhysicalEntity {
    /// 指定位置に静止した無回転のエンティティを作成
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        let mut entity = Self::default();
        entity.spatial.spatial_rvw.world_location = WorldLocation { x, y, z };
        entity
    }

    pub fn with_velocity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.spatial.spatial_rvw.velocity_vector = VelocityVector {
            x_velocity: x,
            y_velocity: y,
            z_velocity: z,
        };
        self
    }

    /// ワールド位置
    pub fn position(&self) -> Vector3<f64> {
        let location = &self.spatial.spatial_rvw.world_location;
        Vector3::new(location.x, location.y, location.z)
    }

    /// 姿勢を (roll, pitch, yaw) = (phi, theta, psi) の順で返します
    pub fn rotation(&self) -> Vector3<f64> {
        let orientation = &self.spatial.spatial_rvw.orientation;
        Vector3::new(
            f64::from(orientation.phi),
            f64::from(orientation.theta),
            f64::from(orientation.psi),
        )
    }

    /// ワールド速度
    pub fn velocity(&self) -> Vector3<f64> {
        let velocity = &self.spatial.spatial_rvw.velocity_vector;
        Vector3::new(
            f64::from(velocity.x_velocity),
            f64::from(velocity.y_velocity),
            f64::from(velocity.z_velocity),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entity() {
        let entity = PhysicalEntity::default();
        assert_eq!(entity.radar_cross_section_signature_index, -1);
        assert_eq!(
            entity.spatial.dead_reckoning_algorithm,
            DeadReckoningAlgorithm::DrmRvw
        );
        assert_eq!(entity.position(), Vector3::zeros());
    }

    #[test]
    fn test_rotation_order_is_roll_pitch_yaw() {
        let mut entity = PhysicalEntity::at(1.0, 2.0, 3.0);
        entity.spatial.spatial_rvw.orientation = Orientation {
            psi: 0.5,
            theta: 0.25,
            phi: 0.125,
        };
        assert_eq!(entity.rotation(), Vector3::new(0.125, 0.25, 0.5));
        assert_eq!(entity.position(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = "spatial:\n  spatial_rvw:\n    world_location: { x: 10000.0, y: 2.0 }\n";
        let entity: PhysicalEntity = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entity.position(), Vector3::new(10000.0, 2.0, 0.0));
        assert_eq!(entity.radar_cross_section_signature_index, -1);
    }
}
