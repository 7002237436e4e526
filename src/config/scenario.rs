// src/config/scenario.rs

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::models::agent::AgentState;

/// 目標の機動則
///
/// 時刻と目標の現在状態から目標加速度を返す純粋な関数として振る舞う。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetManeuver {
    /// 等速直線運動（加速度ゼロ）
    #[default]
    Straight,
    /// 速度方向に垂直な一定の横加速度で旋回する（左旋回が正）
    Turning { a_lat: f64 },
}

impl TargetManeuver {
    /// 目標加速度を計算する
    ///
    /// # 引数
    /// - `t`: 時刻（秒）
    /// - `target`: 目標の現在状態
    ///
    /// # 戻り値
    /// - 目標加速度 [ax, ay] (m/s²)
    pub fn acceleration(&self, _t: f64, target: &AgentState) -> Vector2<f64> {
        match *self {
            TargetManeuver::Straight => Vector2::zeros(),
            TargetManeuver::Turning { a_lat } => {
                // 静止時のゼロ割りを避ける
                let v_hat = target.velocity / (target.speed() + 1e-9);
                Vector2::new(-v_hat.y, v_hat.x) * a_lat
            }
        }
    }
}

/// 交戦シナリオ（初期条件と目標の機動則）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub missile: AgentState,
    pub target: AgentState,
    #[serde(default)]
    pub maneuver: TargetManeuver,
}

impl Scenario {
    /// 直進目標：(200, 50) から (-8, 0) m/s で等速直線運動
    pub fn straight() -> Self {
        Scenario {
            name: "straight_target".to_string(),
            missile: AgentState::at_rest(),
            target: AgentState::new(Vector2::new(200.0, 50.0), Vector2::new(-8.0, 0.0)),
            maneuver: TargetManeuver::Straight,
        }
    }

    /// 旋回目標：(200, 0) から (-8, 2) m/s で横加速度 `a_lat` の旋回
    pub fn turning(a_lat: f64) -> Self {
        Scenario {
            name: "turning_target".to_string(),
            missile: AgentState::at_rest(),
            target: AgentState::new(Vector2::new(200.0, 0.0), Vector2::new(-8.0, 2.0)),
            maneuver: TargetManeuver::Turning { a_lat },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_has_zero_acceleration() {
        let s = Scenario::straight();
        assert_eq!(s.maneuver.acceleration(3.0, &s.target), Vector2::zeros());
        assert_eq!(s.missile, AgentState::at_rest());
    }

    /// 旋回加速度は速度に直交し、大きさは a_lat
    #[test]
    fn test_turning_acceleration_is_perpendicular() {
        let s = Scenario::turning(1.5);
        let a = s.maneuver.acceleration(0.0, &s.target);
        assert_relative_eq!(a.norm(), 1.5, epsilon = 1e-9);
        assert_relative_eq!(a.dot(&s.target.velocity), 0.0, epsilon = 1e-12);
        // (-8, 2) の左側 = (-2, -8) 方向
        assert!(a.x < 0.0 && a.y < 0.0);
    }

    #[test]
    fn test_turning_at_rest_is_finite() {
        let m = TargetManeuver::Turning { a_lat: 2.0 };
        let a = m.acceleration(0.0, &AgentState::at_rest());
        assert_eq!(a, Vector2::zeros());
    }

    #[test]
    fn test_scenario_from_yaml() {
        let yaml = r#"
name: crossing
missile:
  position: [0.0, 0.0]
  velocity: [0.0, 0.0]
target:
  position: [150.0, -40.0]
  velocity: [-5.0, 3.0]
maneuver:
  kind: turning
  a_lat: 2.0
"#;
        let s: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.name, "crossing");
        assert_eq!(s.target.position, Vector2::new(150.0, -40.0));
        assert_eq!(s.maneuver, TargetManeuver::Turning { a_lat: 2.0 });

        let yaml = "name: plain\nmissile: {position: [0, 0], velocity: [0, 0]}\ntarget: {position: [10, 0], velocity: [1, 0]}\n";
        let s: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.maneuver, TargetManeuver::Straight);
    }
}
