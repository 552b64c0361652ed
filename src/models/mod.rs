// モデルの基本インターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod aircraft;
pub mod radar;

// 便利な re-export
pub use traits::Model;
pub use aircraft::{AircraftModel, AircraftPaths, FlightDynamics, KinematicFlightDynamics};
pub use radar::{Echo, RadarConfig, RadarModel};
