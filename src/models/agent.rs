// src/models/agent.rs

use nalgebra::{Vector2, Vector4};
use serde::{Deserialize, Serialize};

/// 平面内を運動する質点（ミサイル・目標共通）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Vector2<f64>, // [x, y] 座標 (m)
    pub velocity: Vector2<f64>, // [vx, vy] 速度 (m/s)
}

impl AgentState {
    pub fn new(position: Vector2<f64>, velocity: Vector2<f64>) -> Self {
        AgentState { position, velocity }
    }

    /// 原点で静止している状態
    pub fn at_rest() -> Self {
        AgentState::new(Vector2::zeros(), Vector2::zeros())
    }

    /// [p_x, p_y, v_x, v_y] 形式に変換する
    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(
            self.position.x,
            self.position.y,
            self.velocity.x,
            self.velocity.y,
        )
    }

    /// [p_x, p_y, v_x, v_y] 形式から復元する
    pub fn from_vector(state: &Vector4<f64>) -> Self {
        AgentState::new(
            Vector2::new(state[0], state[1]),
            Vector2::new(state[2], state[3]),
        )
    }

    /// 速さ (m/s)
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

/// 相対状態（目標 − ミサイル）
///
/// 内部表現は [r_x, r_y, v_x, v_y]。毎ステップ絶対状態から計算し直す。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeState(pub Vector4<f64>);

impl RelativeState {
    pub fn between(missile: &AgentState, target: &AgentState) -> Self {
        RelativeState(target.to_vector() - missile.to_vector())
    }

    /// 相対位置
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.0[0], self.0[1])
    }

    /// 相対速度
    pub fn velocity(&self) -> Vector2<f64> {
        Vector2::new(self.0[2], self.0[3])
    }

    /// 両者の距離 (m)
    pub fn distance(&self) -> f64 {
        self.position().norm()
    }

    pub fn as_vector(&self) -> &Vector4<f64> {
        &self.0
    }
}

/// ミサイルと目標の距離 ‖p_t − p_m‖
pub fn distance(missile: &AgentState, target: &AgentState) -> f64 {
    (target.position - missile.position).norm()
}

/// 捕捉判定（距離が捕捉半径以下）
pub fn is_captured(missile: &AgentState, target: &AgentState, r_capture: f64) -> bool {
    distance(missile, target) <= r_capture
}
