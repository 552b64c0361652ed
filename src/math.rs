//! 同次座標と角度のユーティリティ

use nalgebra::{Vector3, Vector4};

/// 位置ベクトルを同次座標に変換（w = 1、平行移動が適用される）
pub fn homogeneous_point(x: f64, y: f64, z: f64) -> Vector4<f64> {
    Vector4::new(x, y, z, 1.0)
}

/// 方向ベクトルを同次座標に変換（w = 0、平行移動は無視される）
pub fn homogeneous_vector(x: f64, y: f64, z: f64) -> Vector4<f64> {
    Vector4::new(x, y, z, 0.0)
}

/// 同次座標の先頭3成分を取り出す
pub fn truncate(v: &Vector4<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.y, v.z)
}

/// `[x, y, z]` 配列から3次元ベクトルを作成
pub fn vector_from_array(values: [f64; 3]) -> Vector3<f64> {
    Vector3::new(values[0], values[1], values[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogeneous_w_component() {
        assert_eq!(homogeneous_point(1.0, 2.0, 3.0).w, 1.0);
        assert_eq!(homogeneous_vector(1.0, 2.0, 3.0).w, 0.0);
    }

    #[test]
    fn test_truncate_drops_w() {
        let v = homogeneous_point(4.0, 5.0, 6.0);
        assert_eq!(truncate(&v), Vector3::new(4.0, 5.0, 6.0));
    }
}
