// src/math/discrete.rs

use nalgebra::{Matrix2, Matrix4, Matrix4x2, Vector2, Vector4};

/// 相対運動の離散時間モデル
///
/// 相対状態 x = [r_x, r_y, v_x, v_y]（目標 − ミサイル）に対して
///
/// ```text
/// r_{k+1} = r_k + dt·v_k + ½dt²·(a_t,k − u_k)
/// v_{k+1} = v_k + dt·(a_t,k − u_k)
/// ```
///
/// を x_{k+1} = A·x_k + B·u_k + G·a_t,k の形で表す。
/// ステップ内で加速度が一定なら厳密な離散化になる。
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeDynamics {
    pub dt: f64,
    pub a: Matrix4<f64>,
    pub b: Matrix4x2<f64>,
    pub g: Matrix4x2<f64>,
}

impl RelativeDynamics {
    /// 時間ステップ `dt` に対する A, B, G を組み立てる
    pub fn new(dt: f64) -> Self {
        let i2 = Matrix2::<f64>::identity();
        let half_dt2 = 0.5 * dt * dt;

        let mut a = Matrix4::<f64>::identity();
        a.fixed_view_mut::<2, 2>(0, 2).copy_from(&(i2 * dt));

        let mut g = Matrix4x2::<f64>::zeros();
        g.fixed_view_mut::<2, 2>(0, 0).copy_from(&(i2 * half_dt2));
        g.fixed_view_mut::<2, 2>(2, 0).copy_from(&(i2 * dt));

        // 制御はミサイル側の加速度なので相対加速度には負号で効く
        let b = -g;

        RelativeDynamics { dt, a, b, g }
    }

    /// 1ステップ先の相対状態を予測する
    pub fn predict(&self, x: &Vector4<f64>, u: &Vector2<f64>, a_t: &Vector2<f64>) -> Vector4<f64> {
        self.a * x + self.b * u + self.g * a_t
    }
}
