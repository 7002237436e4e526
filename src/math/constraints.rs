// src/math/constraints.rs

use nalgebra::Vector2;

/// 各軸独立の飽和（ボックス制約）
///
/// # 引数
/// - `u`: 制御入力 (m/s²)
/// - `u_max`: 各軸の上限値（対称範囲 [-u_max, u_max]）
///
/// # 戻り値
/// - 飽和後の制御入力
pub fn clip_box(u: &Vector2<f64>, u_max: f64) -> Vector2<f64> {
    u.map(|c| c.clamp(-u_max, u_max))
}

/// 各軸独立の変化率制限（スルーレート制約）
///
/// # 引数
/// - `u`: 今回の制御入力候補
/// - `u_prev`: 前回適用した制御入力
/// - `du_max`: 1ステップあたりの各軸の最大変化量
///
/// # 戻り値
/// - `u_prev` から各軸 `du_max` 以内に収めた制御入力
pub fn clip_slew(u: &Vector2<f64>, u_prev: &Vector2<f64>, du_max: f64) -> Vector2<f64> {
    u_prev + clip_box(&(u - u_prev), du_max)
}

/// スルーレート制限の後に再度ボックス制約を掛ける
pub fn clip_slew_then_box(
    u: &Vector2<f64>,
    u_prev: &Vector2<f64>,
    du_max: f64,
    u_max: f64,
) -> Vector2<f64> {
    clip_box(&clip_slew(u, u_prev, du_max), u_max)
}
