// src/models/pd.rs

use nalgebra::Vector2;

use crate::config::SimConfig;
use crate::math::constraints::{clip_box, clip_slew_then_box};
use crate::models::agent::{AgentState, RelativeState};
use crate::models::controller::Controller;

/// 相対状態に対するPD誘導則（比較用のベースライン）
///
/// u = kp·r + kd·v を飽和 → 変化率制限 → 飽和の順に制約する。
/// ゲイン以外の内部状態は持たない。
#[derive(Debug, Clone, Default)]
pub struct PdController;

impl PdController {
    pub fn new() -> Self {
        PdController
    }
}

/// PD誘導則による加速度指令を計算する純粋な関数
///
/// # 引数
/// - `missile`: ミサイルの現在状態
/// - `target`: 目標の現在状態
/// - `u_prev`: 前回適用した制御入力
/// - `config`: ゲインと制約値
///
/// # 戻り値
/// - 制約を満たした加速度指令 (m/s²)
pub fn pd_command(
    missile: &AgentState,
    target: &AgentState,
    u_prev: &Vector2<f64>,
    config: &SimConfig,
) -> Vector2<f64> {
    let rel = RelativeState::between(missile, target);
    let u_raw = rel.position() * config.pd.kp_pos + rel.velocity() * config.pd.kd_vel;

    let u = clip_box(&u_raw, config.a_max);
    clip_slew_then_box(&u, u_prev, config.du_max, config.a_max)
}

impl Controller for PdController {
    fn command(
        &mut self,
        _t: f64,
        missile: &AgentState,
        target: &AgentState,
        u_prev: &Vector2<f64>,
        config: &SimConfig,
    ) -> Vector2<f64> {
        pd_command(missile, target, u_prev, config)
    }

    fn name(&self) -> &str {
        "PD_baseline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> SimConfig {
        SimConfig::default()
    }

    /// 制約に掛からない範囲では kp·r + kd·v そのもの
    #[test]
    fn test_linear_region() {
        let missile = AgentState::at_rest();
        let target = AgentState::new(Vector2::new(5.0, -2.0), Vector2::new(-1.0, 0.5));
        let u = pd_command(&missile, &target, &Vector2::zeros(), &config());
        // x: 0.8*5 - 1.6 = 2.4, y: -1.6 + 0.8 = -0.8
        assert_relative_eq!(u, Vector2::new(2.4, -0.8), epsilon = 1e-12);
    }

    /// 初期ステップは前回値ゼロから du_max までしか動けない
    #[test]
    fn test_slew_limited_from_rest() {
        let s = crate::config::Scenario::straight();
        let u = pd_command(&s.missile, &s.target, &Vector2::zeros(), &config());
        // 生の指令は (147.2, 40) だが変化率制限で (10, 10)
        assert_eq!(u, Vector2::new(10.0, 10.0));
    }

    #[test]
    fn test_saturates_at_a_max() {
        let missile = AgentState::at_rest();
        let target = AgentState::new(Vector2::new(-500.0, 500.0), Vector2::zeros());
        let u_prev = Vector2::new(-25.0, 28.0);
        let u = pd_command(&missile, &target, &u_prev, &config());
        assert_eq!(u, Vector2::new(-30.0, 30.0));
    }

    /// 前回値が上限を超えていても出力は上限内に戻る
    #[test]
    fn test_box_after_slew() {
        let missile = AgentState::at_rest();
        let target = AgentState::new(Vector2::new(100.0, 0.0), Vector2::zeros());
        let u_prev = Vector2::new(38.0, 0.0);
        let u = pd_command(&missile, &target, &u_prev, &config());
        assert_eq!(u.x, 30.0);
        assert!((u - u_prev).abs().max() <= config().du_max);
    }

    #[test]
    fn test_name() {
        assert_eq!(PdController::new().name(), "PD_baseline");
    }
}
