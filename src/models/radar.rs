use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_4;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::channel::{BusData, Handle};
use crate::data::{EnvironmentChannel, OwnshipChannel};
use crate::models::traits::Model;
use crate::rpr_fom::PhysicalEntity;
use crate::transform::Transform;

const RADAR_NAME: &str = "Radar";
const RADAR_FRAME_INTERVAL_MS: u32 = 100;

/// レーダーエコー（検知記録）
///
/// 生成後は変更されず、出力キューから取り出して消費します。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Echo {
    /// 距離（メートル）
    pub range: f64,
    /// 水平角（ラジアン）
    pub horizontal_angle: f64,
    /// 垂直角（ラジアン）
    pub vertical_angle: f64,
    /// 受信電力（ワット）
    pub return_power: f64,
    /// 視線方向の相対速度（m/s、正は遠ざかる方向）
    pub radial_velocity: f64,
}

/// レーダーの諸元
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RadarConfig {
    /// 水平視野角（ラジアン、全幅）
    pub horizontal_field_of_view: f64,
    /// 垂直視野角（ラジアン、全幅）
    pub vertical_field_of_view: f64,
    /// 送信電力（ワット）
    pub power: f64,
    /// 送信アンテナ利得
    pub gain: f64,
    /// 受信アンテナ有効面積（平方メートル）
    pub effective_area: f64,
    /// 最小検知信号（ワット）
    pub minimum_detectable_signal: f64,
    /// 全エンティティ共通の反射断面積
    pub radar_cross_section: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            horizontal_field_of_view: 50.0,
            vertical_field_of_view: 50.0,
            power: 1500.0,
            gain: 1.0,
            effective_area: 1.0,
            minimum_detectable_signal: 9.0e-14,
            radar_cross_section: 3.5,
        }
    }
}

impl RadarConfig {
    /// 距離 `distance` の目標からの受信電力を計算
    ///
    /// `distance` が 0 の場合は無限大を返します（常に検知閾値を上回ります）。
    pub fn return_power(&self, distance: f64) -> f64 {
        let spread = FRAC_PI_4 * (distance * distance);
        ((self.power * self.gain) / spread) * self.radar_cross_section * (1.0 / spread) * self.effective_area
    }
}

/// 機体搭載レーダーモデル
///
/// 自機チャネルと環境チャネルを読み取り、視野内かつ検知可能なエンティティごとに
/// [`Echo`] を出力キューへ追加します。出力キューはこのインスタンスが所有し、
/// [`RadarModel::echo_handle`] で取得したハンドルから取り出します。
///
/// 自機 → レーダーの親子関係は保持せず、`run()` のたびに借用で組み直します。
pub struct RadarModel {
    config: RadarConfig,

    /// 自機のワールド Transform
    ownship_xform: Transform<'static>,
    /// 自機に対するレーダーのローカル Transform
    radar_xform: Transform<'static>,

    in_aircraft_position: Handle<Vector3<f64>>,
    in_aircraft_rotation: Handle<Vector3<f64>>,
    in_aircraft_velocity: Handle<Vector3<f64>>,
    in_radar_offset: Handle<Vector3<f64>>,
    in_radar_rotation: Handle<Vector3<f64>>,
    in_environment_entities: Handle<Vec<PhysicalEntity>>,

    echoes: BusData<VecDeque<Echo>>,
    out_echoes: Handle<VecDeque<Echo>>,
}

impl RadarModel {
    /// 新しいレーダーモデルを作成します
    ///
    /// # 引数
    ///
    /// * `ownship_channel` - 自機位置・姿勢・速度とレーダー取り付け情報
    /// * `environment_channel` - 他エンティティのリスト
    /// * `config` - レーダー諸元
    pub fn new(
        ownship_channel: &OwnshipChannel,
        environment_channel: &EnvironmentChannel,
        config: RadarConfig,
    ) -> Self {
        let requester = Some(RADAR_NAME);
        let echoes = BusData::new(VecDeque::new(), "Radar.Echoes");
        let out_echoes = echoes.get_write_handle(requester);

        Self {
            config,
            ownship_xform: Transform::identity(),
            radar_xform: Transform::identity(),
            in_aircraft_position: ownship_channel.aircraft_position.get_read_handle(requester),
            in_aircraft_rotation: ownship_channel.aircraft_rotation.get_read_handle(requester),
            in_aircraft_velocity: ownship_channel.aircraft_velocity.get_read_handle(requester),
            in_radar_offset: ownship_channel.radar_offset.get_read_handle(requester),
            in_radar_rotation: ownship_channel.radar_rotation.get_read_handle(requester),
            in_environment_entities: environment_channel.physical_entities.get_read_handle(requester),
            echoes,
            out_echoes,
        }
    }

    pub fn get_config(&self) -> &RadarConfig {
        &self.config
    }

    /// 出力キューのハンドルを取得
    pub fn echo_handle(&self, requester: Option<&str>) -> Handle<VecDeque<Echo>> {
        self.echoes.get_read_handle(requester)
    }

    /// 1エンティティの検知処理
    ///
    /// `radar_xform` は親を持たないワールド空間の Transform です。
    /// 後方・視野外・検知閾値未満の場合は `None` を返します。
    fn detect(
        &self,
        radar_xform: &Transform<'_>,
        entity: &PhysicalEntity,
        own_velocity_local: &Vector3<f64>,
    ) -> Option<Echo> {
        let rotation = entity.rotation();
        let entity_world_xform = Transform::from_vectors(&entity.position(), &rotation);
        let offset = radar_xform
            .to_local_transform(&entity_world_xform)
            .get_local_translation();

        // 後方
        if offset.x < 0.0 {
            return None;
        }

        let half_horizontal_fov = self.config.horizontal_field_of_view * 0.5;
        let half_vertical_fov = self.config.vertical_field_of_view * 0.5;
        let horizontal_angle = offset.y.atan2(offset.x);
        let vertical_angle = offset.z.atan2(offset.x);
        if horizontal_angle.abs() > half_horizontal_fov || vertical_angle.abs() > half_vertical_fov {
            return None;
        }

        let distance = offset.norm();
        // TODO: radar_cross_section_signature_index による反射断面積テーブル参照
        let return_power = self.config.return_power(distance);
        if return_power < self.config.minimum_detectable_signal {
            return None;
        }

        let entity_velocity_local = radar_xform.to_local_vector(&entity.velocity());
        let relative_velocity = entity_velocity_local - own_velocity_local;

        Some(Echo {
            range: distance,
            horizontal_angle,
            vertical_angle,
            return_power,
            radial_velocity: relative_velocity.x,
        })
    }
}

impl Model for RadarModel {
    fn get_name(&self) -> &str {
        RADAR_NAME
    }

    fn get_target_frame_interval(&self) -> u32 {
        RADAR_FRAME_INTERVAL_MS
    }

    fn load(&mut self) -> bool {
        self.ownship_xform =
            Transform::from_vectors(&self.in_aircraft_position.get(), &self.in_aircraft_rotation.get());
        self.radar_xform =
            Transform::from_vectors(&self.in_radar_offset.get(), &self.in_radar_rotation.get());
        true
    }

    fn run(&mut self) -> bool {
        self.ownship_xform
            .set_local_translation(&self.in_aircraft_position.get());
        self.ownship_xform
            .set_local_rotation_euler(&self.in_aircraft_rotation.get());
        self.radar_xform.set_local_translation(&self.in_radar_offset.get());
        self.radar_xform
            .set_local_rotation_euler(&self.in_radar_rotation.get());

        // 自機 → レーダーの親子関係を平坦化し、レーダーのワールド姿勢を得る
        let radar_xform = self
            .radar_xform
            .with_parent(&self.ownship_xform)
            .to_world_transform();
        let own_velocity_local = radar_xform.to_local_vector(&self.in_aircraft_velocity.get());

        let entities = self.in_environment_entities.read();
        let new_echoes: Vec<Echo> = entities
            .iter()
            .filter_map(|entity| self.detect(&radar_xform, entity, &own_velocity_local))
            .collect();
        drop(entities);

        trace!("レーダー: エコー {}件", new_echoes.len());
        if !new_echoes.is_empty() {
            debug!("レーダー検知: {}件", new_echoes.len());
        }
        self.out_echoes.write().extend(new_echoes);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn run_radar(entities: Vec<PhysicalEntity>, config: RadarConfig) -> Vec<Echo> {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        environment.physical_entities.get_write_handle(None).set(entities);
        run_with_channels(&ownship, &environment, config)
    }

    fn run_with_channels(
        ownship: &OwnshipChannel,
        environment: &EnvironmentChannel,
        config: RadarConfig,
    ) -> Vec<Echo> {
        let mut radar = RadarModel::new(ownship, environment, config);
        assert!(radar.load());
        assert!(radar.init());
        assert!(radar.reinit());
        assert!(radar.run());
        let echoes = radar.echo_handle(None);
        let result = echoes.write().drain(..).collect();
        result
    }

    #[test]
    fn test_default_hooks_succeed() {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        let mut radar = RadarModel::new(&ownship, &environment, RadarConfig::default());

        assert!(radar.load());
        assert!(radar.init());
        assert!(radar.reinit());
        assert!(radar.run());
        assert!(radar.hold());
        assert!(radar.unload());
        assert_eq!(radar.get_name(), "Radar");
        assert_eq!(radar.get_target_frame_interval(), 100);
        assert!(radar.echo_handle(None).read().is_empty());
    }

    #[test]
    fn test_enemy_in_view() {
        let echoes = run_radar(vec![PhysicalEntity::at(10000.0, 2.0, 2.0)], RadarConfig::default());

        assert_eq!(echoes.len(), 1);
        let echo = echoes[0];
        assert!((echo.range - (10000.0_f64 * 10000.0 + 8.0).sqrt()).abs() < 1e-6);
        assert!((echo.horizontal_angle - 2.0_f64.atan2(10000.0)).abs() < 1e-12);
        assert!((echo.vertical_angle - 2.0_f64.atan2(10000.0)).abs() < 1e-12);
        assert!(echo.return_power >= RadarConfig::default().minimum_detectable_signal);
        assert_eq!(echo.radial_velocity, 0.0);
    }

    #[test]
    fn test_enemy_out_of_range() {
        let echoes = run_radar(vec![PhysicalEntity::at(20000.0, 0.0, 0.0)], RadarConfig::default());
        assert!(echoes.is_empty());
    }

    #[test]
    fn test_enemy_behind() {
        let echoes = run_radar(vec![PhysicalEntity::at(-100.0, 0.0, 0.0)], RadarConfig::default());
        assert!(echoes.is_empty());
    }

    #[test]
    fn test_enemy_outside_field_of_view() {
        let config = RadarConfig {
            horizontal_field_of_view: 0.2,
            vertical_field_of_view: 0.2,
            ..RadarConfig::default()
        };
        let echoes = run_radar(
            vec![
                PhysicalEntity::at(1000.0, 500.0, 0.0),
                PhysicalEntity::at(1000.0, 0.0, 500.0),
                PhysicalEntity::at(1000.0, 10.0, 10.0),
            ],
            config,
        );
        assert_eq!(echoes.len(), 1);
        assert!((echoes[0].horizontal_angle - 10.0_f64.atan2(1000.0)).abs() < 1e-12);
    }

    #[test]
    fn test_echoes_follow_entity_order() {
        let echoes = run_radar(
            vec![
                PhysicalEntity::at(3000.0, 0.0, 0.0),
                PhysicalEntity::at(20000.0, 0.0, 0.0),
                PhysicalEntity::at(1000.0, 0.0, 0.0),
            ],
            RadarConfig::default(),
        );
        assert_eq!(echoes.len(), 2);
        assert!((echoes[0].range - 3000.0).abs() < 1e-9);
        assert!((echoes[1].range - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_radial_velocity() {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        ownship
            .aircraft_velocity
            .get_write_handle(None)
            .set(Vector3::new(100.0, 0.0, 0.0));
        environment
            .physical_entities
            .get_write_handle(None)
            .set(vec![PhysicalEntity::at(5000.0, 0.0, 0.0).with_velocity(-50.0, 0.0, 0.0)]);

        let echoes = run_with_channels(&ownship, &environment, RadarConfig::default());
        assert_eq!(echoes.len(), 1);
        assert!((echoes[0].radial_velocity - (-150.0)).abs() < 1e-9);
    }

    #[test]
    fn test_radar_mounted_on_rotated_ownship() {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        // 自機は (1000, 0, 0) で左 90 度を向き、レーダーは機首方向に 10m 前
        ownship
            .aircraft_position
            .get_write_handle(None)
            .set(Vector3::new(1000.0, 0.0, 0.0));
        ownship
            .aircraft_rotation
            .get_write_handle(None)
            .set(Vector3::new(0.0, 0.0, FRAC_PI_2));
        ownship
            .radar_offset
            .get_write_handle(None)
            .set(Vector3::new(10.0, 0.0, 0.0));
        environment.physical_entities.get_write_handle(None).set(vec![
            PhysicalEntity::at(1000.0, 2010.0, 0.0),
            PhysicalEntity::at(3000.0, 0.0, 0.0),
        ]);

        let echoes = run_with_channels(&ownship, &environment, RadarConfig::default());
        assert_eq!(echoes.len(), 1);
        assert!((echoes[0].range - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn test_radar_rotated_backwards() {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        ownship
            .radar_rotation
            .get_write_handle(None)
            .set(Vector3::new(0.0, 0.0, PI));
        environment
            .physical_entities
            .get_write_handle(None)
            .set(vec![PhysicalEntity::at(-1000.0, 0.0, 0.0), PhysicalEntity::at(1000.0, 0.0, 0.0)]);

        let echoes = run_with_channels(&ownship, &environment, RadarConfig::default());
        assert_eq!(echoes.len(), 1);
        assert!((echoes[0].range - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_channel_updates_are_picked_up_each_run() {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        let entities = environment.physical_entities.get_write_handle(Some("Test"));
        let mut radar = RadarModel::new(&ownship, &environment, RadarConfig::default());
        let echoes = radar.echo_handle(Some("Test"));

        assert!(radar.load());
        assert!(radar.run());
        assert!(echoes.read().is_empty());

        entities.write().push(PhysicalEntity::at(1000.0, 0.0, 0.0));
        assert!(radar.run());
        assert!(radar.run());
        // キューは自動では空にならない
        assert_eq!(echoes.read().len(), 2);
        assert!(echoes.write().pop_front().is_some());
        assert_eq!(echoes.read().len(), 1);
    }

    #[test]
    fn test_simulation_pipeline_with_aircraft() {
        use crate::models::{AircraftModel, AircraftPaths, KinematicFlightDynamics};
        use crate::simulation::{Simulation, State};

        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        environment
            .physical_entities
            .get_write_handle(None)
            .set(vec![PhysicalEntity::at(10000.0, 2.0, 2.0)]);

        // 1ステップで 1000m 前進する自機
        let fdm = KinematicFlightDynamics::new(Vector3::zeros(), Vector3::new(1000.0, 0.0, 0.0), 1.0);
        let mut aircraft = AircraftModel::new(&ownship, fdm, AircraftPaths::default(), "f16");
        let mut radar = RadarModel::new(&ownship, &environment, RadarConfig::default());
        let echoes = radar.echo_handle(Some("Test"));

        let mut simulation = Simulation::new();
        simulation.add_model(&mut aircraft);
        simulation.add_model(&mut radar);
        simulation.set_target_state(State::Running);
        for _ in 0..4 {
            simulation.step();
        }
        assert_eq!(simulation.get_current_state(), State::Running);

        let ranges: Vec<f64> = echoes.read().iter().map(|echo| echo.range).collect();
        assert_eq!(ranges.len(), 2);
        assert!((ranges[0] - (9000.0_f64 * 9000.0 + 8.0).sqrt()).abs() < 1e-6);
        assert!((ranges[1] - (8000.0_f64 * 8000.0 + 8.0).sqrt()).abs() < 1e-6);
        assert!(echoes.read().iter().all(|echo| (echo.radial_velocity + 1000.0).abs() < 1e-9));
    }

    #[test]
    fn test_entity_at_radar_origin() {
        let echoes = run_radar(vec![PhysicalEntity::at(0.0, 0.0, 0.0)], RadarConfig::default());

        assert_eq!(echoes.len(), 1);
        assert_eq!(echoes[0].range, 0.0);
        assert_eq!(echoes[0].horizontal_angle, 0.0);
        assert!(echoes[0].return_power.is_infinite());
    }

    #[test]
    fn test_get_config() {
        let ownship = OwnshipChannel::new();
        let environment = EnvironmentChannel::new();
        let config = RadarConfig {
            power: 3000.0,
            ..RadarConfig::default()
        };
        let radar = RadarModel::new(&ownship, &environment, config);
        assert_eq!(*radar.get_config(), config);
    }

    #[test]
    fn test_return_power_threshold() {
        let config = RadarConfig::default();
        assert!(config.return_power(10000.0) > config.minimum_detectable_signal);
        assert!(config.return_power(20000.0) < config.minimum_detectable_signal);
    }
}
