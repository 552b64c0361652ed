//! # Transform モジュール
//!
//! 4x4 同次アフィン変換行列による階層的な座標変換を提供します。
//!
//! 各 [`Transform`] は回転（左上3x3）と平行移動（右列）を持ち、任意で親の
//! Transform を借用参照として保持します。親を辿ることでローカル空間と
//! ワールド空間を相互に変換できます。
//!
//! ## 座標系
//!
//! HLA / DIS 規格のワールド座標系（ECEF）に従い、各軸の回転を次のように呼びます。
//!
//! - X = 前方、Y = 左、Z = 上
//! - Roll = X軸回転、Pitch = Y軸回転、Yaw = Z軸回転
//!
//! オイラー角からの回転行列は Rz(yaw) · Ry(pitch) · Rx(roll) で構成されます。
//!
//! ## 親参照
//!
//! 親は所有されません。借用のライフタイム `'p` により、親が子の利用期間より
//! 長く生存することがコンパイル時に保証されます。親子関係は木構造である必要が
//! あり、ワールド変換の計算は根（親なし）まで再帰します。

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};

use crate::math::{homogeneous_point, homogeneous_vector, truncate};

/// 親を持ちうる 4x4 同次変換
#[derive(Debug, Clone, Copy)]
pub struct Transform<'p> {
    xform: Matrix4<f64>,
    parent: Option<&'p Transform<'p>>,
}

impl Default for Transform<'_> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<'p> Transform<'p> {
    /// 原点・無回転・親なしの Transform（4x4 単位行列）を作成
    pub fn identity() -> Self {
        Self {
            xform: Matrix4::identity(),
            parent: None,
        }
    }

    /// 平行移動とオイラー角から Transform を作成
    ///
    /// # 引数
    ///
    /// * `x`, `y`, `z` - 平行移動成分
    /// * `roll`, `pitch`, `yaw` - X, Y, Z 軸回りの回転（ラジアン）
    pub fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        let mut xform = Matrix4::identity();
        xform
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&rotation_from_euler(roll, pitch, yaw));
        xform
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&Vector3::new(x, y, z));
        Self {
            xform,
            parent: None,
        }
    }

    /// 平行移動ベクトルと (roll, pitch, yaw) ベクトルから Transform を作成
    pub fn from_vectors(translation: &Vector3<f64>, rotation: &Vector3<f64>) -> Self {
        Self::new(
            translation.x,
            translation.y,
            translation.z,
            rotation.x,
            rotation.y,
            rotation.z,
        )
    }

    /// 生の 4x4 行列から Transform を作成
    pub fn from_matrix(xform: Matrix4<f64>) -> Self {
        Self {
            xform,
            parent: None,
        }
    }

    /// 親を付け替えた Transform を返します
    ///
    /// 元の親参照は破棄されるため、新しい親の借用期間だけが結果に残ります。
    pub fn with_parent<'q>(self, parent: &'q Transform<'q>) -> Transform<'q> {
        Transform {
            xform: self.xform,
            parent: Some(parent),
        }
    }

    pub fn set_parent(&mut self, parent: Option<&'p Transform<'p>>) {
        self.parent = parent;
    }

    pub fn get_parent(&self) -> Option<&'p Transform<'p>> {
        self.parent
    }

    /// ワールド空間の Transform をこの Transform から見た相対 Transform に変換
    ///
    /// 例えば自身がレーダーで、引数が敵エンティティのワールド Transform の場合、
    /// レーダーから見た敵のオフセットが得られます。結果は親を持ちません。
    ///
    /// 自身と引数の行列のみを使い、親は辿りません。親を持つ Transform の場合は
    /// 先に [`Transform::to_world_transform`] で平坦化してから呼び出してください。
    pub fn to_local_transform(&self, world_space_transform: &Transform<'_>) -> Transform<'static> {
        Transform::from_matrix(self.inverse_matrix() * world_space_transform.xform)
    }

    /// ワールド空間の方向ベクトルをローカル空間に変換（平行移動は無視）
    ///
    /// 他エンティティの速度をこの Transform から見た速度に変換する用途で使います。
    pub fn to_local_vector(&self, world_space_vector: &Vector3<f64>) -> Vector3<f64> {
        let v = homogeneous_vector(world_space_vector.x, world_space_vector.y, world_space_vector.z);
        truncate(&(self.inverse_matrix() * v))
    }

    /// ワールド空間の位置をローカル空間に変換（平行移動を適用）
    pub fn to_local_position(&self, world_space_position: &Vector3<f64>) -> Vector3<f64> {
        let p = homogeneous_point(
            world_space_position.x,
            world_space_position.y,
            world_space_position.z,
        );
        truncate(&(self.inverse_matrix() * p))
    }

    /// 親階層を平坦化し、ワールド空間を表す親なしの Transform を返します
    ///
    /// 再帰の深さは根までの木の深さに等しくなります。
    pub fn to_world_transform(&self) -> Transform<'p> {
        match self.parent {
            None => *self,
            Some(parent) => Transform::from_matrix(parent.to_world_transform().xform * self.xform),
        }
    }

    /// この Transform のローカル空間で表された Transform をワールド空間に変換
    ///
    /// `to_local_transform` の逆変換です。親は辿りません。
    pub fn to_world_transform_of(&self, local_space_transform: &Transform<'_>) -> Transform<'static> {
        Transform::from_matrix(self.xform * local_space_transform.xform)
    }

    /// ローカル空間の方向ベクトルをワールド空間に変換（平行移動は無視）
    pub fn to_world_vector(&self, local_space_vector: &Vector3<f64>) -> Vector3<f64> {
        let v = homogeneous_vector(local_space_vector.x, local_space_vector.y, local_space_vector.z);
        truncate(&(self.xform * v))
    }

    /// ローカル空間の位置をワールド空間に変換（平行移動を適用）
    pub fn to_world_position(&self, local_space_position: &Vector3<f64>) -> Vector3<f64> {
        let p = homogeneous_point(
            local_space_position.x,
            local_space_position.y,
            local_space_position.z,
        );
        truncate(&(self.xform * p))
    }

    /// 親に対する平行移動成分
    pub fn get_local_translation(&self) -> Vector3<f64> {
        self.xform.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// 回転成分（左上3x3）。親の有無に影響されません。
    pub fn get_local_rotation_matrix(&self) -> Matrix3<f64> {
        self.xform.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// ローカル回転行列からオイラー角 (roll, pitch, yaw) を計算
    ///
    /// 設定時の角度と ±π 異なる値が返ることがありますが、表す回転は同一です。
    pub fn get_local_rotation_euler(&self) -> Vector3<f64> {
        euler_from_rotation(&self.get_local_rotation_matrix())
    }

    /// 平行移動成分を置き換えます（回転成分は変更しません）
    pub fn set_local_translation(&mut self, translation: &Vector3<f64>) {
        self.xform.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    }

    /// 回転成分を回転行列で置き換えます（平行移動成分は変更しません）
    pub fn set_local_rotation_matrix(&mut self, rotation: &Matrix3<f64>) {
        self.xform.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    }

    /// 回転成分をオイラー角 (roll, pitch, yaw) で置き換えます
    pub fn set_local_rotation_euler(&mut self, rotation: &Vector3<f64>) {
        let matrix = rotation_from_euler(rotation.x, rotation.y, rotation.z);
        self.set_local_rotation_matrix(&matrix);
    }

    /// ワールド空間での位置
    ///
    /// 例えばローカル {5, 0, 0} の Transform が {0, 10, 0} の親を持つ場合、
    /// 回転がなければ {5, 10, 0} を返します。
    pub fn get_world_translation(&self) -> Vector3<f64> {
        self.to_world_transform().get_local_translation()
    }

    pub fn get_world_rotation_matrix(&self) -> Matrix3<f64> {
        self.to_world_transform().get_local_rotation_matrix()
    }

    pub fn get_world_rotation_euler(&self) -> Vector3<f64> {
        self.to_world_transform().get_local_rotation_euler()
    }

    /// 内部の 4x4 行列
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.xform
    }

    pub fn matrix_mut(&mut self) -> &mut Matrix4<f64> {
        &mut self.xform
    }

    fn inverse_matrix(&self) -> Matrix4<f64> {
        affine_inverse(&self.xform)
    }
}

/// Rz(yaw) · Ry(pitch) · Rx(roll)
fn rotation_from_euler(roll: f64, pitch: f64, yaw: f64) -> Matrix3<f64> {
    Rotation3::from_euler_angles(roll, pitch, yaw).into_inner()
}

fn euler_from_rotation(rotation: &Matrix3<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = Rotation3::from_matrix_unchecked(*rotation).euler_angles();
    Vector3::new(roll, pitch, yaw)
}

/// アフィン行列の逆行列
///
/// 線形部が特異な場合は転置で代用します（回転行列なら転置が逆行列）。
fn affine_inverse(xform: &Matrix4<f64>) -> Matrix4<f64> {
    let linear = xform.fixed_view::<3, 3>(0, 0).into_owned();
    let translation = xform.fixed_view::<3, 1>(0, 3).into_owned();
    let linear_inv = linear.try_inverse().unwrap_or_else(|| linear.transpose());

    let mut inverse = Matrix4::identity();
    inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&linear_inv);
    inverse
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&(-(linear_inv * translation)));
    inverse
}
