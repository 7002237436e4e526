// src/simulation/mod.rs

pub mod csv;
pub mod framework;
pub mod load_parameters;
pub mod metrics;

use nalgebra::Vector2;
use serde::Serialize;

use crate::models::agent::AgentState;

pub use framework::run_episode;
pub use metrics::EpisodeMetrics;

/// 1ステップ分の記録
///
/// 状態は積分後の値、時刻はそのステップの開始時刻 t = k·dt。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    pub time: f64,
    pub missile: AgentState,
    pub target: AgentState,
    pub control: Vector2<f64>,             // 適用したミサイル加速度
    pub target_acceleration: Vector2<f64>, // 目標の機動加速度
    pub distance: f64,
}

/// 1エピソード分のログ
///
/// 迎撃後も打ち切らないので、記録数は常に設定のステップ数と等しい。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeLog {
    pub scenario: String,
    pub controller: String,
    pub dt: f64,
    pub records: Vec<StepRecord>,
    pub intercepted: bool,
    pub time_to_intercept: Option<f64>,
}

impl EpisodeLog {
    pub fn new(scenario: impl Into<String>, controller: impl Into<String>, dt: f64, capacity: usize) -> Self {
        EpisodeLog {
            scenario: scenario.into(),
            controller: controller.into(),
            dt,
            records: Vec::with_capacity(capacity),
            intercepted: false,
            time_to_intercept: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.time).collect()
    }

    pub fn missile_positions(&self) -> Vec<Vector2<f64>> {
        self.records.iter().map(|r| r.missile.position).collect()
    }

    pub fn missile_velocities(&self) -> Vec<Vector2<f64>> {
        self.records.iter().map(|r| r.missile.velocity).collect()
    }

    pub fn target_positions(&self) -> Vec<Vector2<f64>> {
        self.records.iter().map(|r| r.target.position).collect()
    }

    pub fn target_velocities(&self) -> Vec<Vector2<f64>> {
        self.records.iter().map(|r| r.target.velocity).collect()
    }

    pub fn controls(&self) -> Vec<Vector2<f64>> {
        self.records.iter().map(|r| r.control).collect()
    }

    pub fn target_accelerations(&self) -> Vec<Vector2<f64>> {
        self.records.iter().map(|r| r.target_acceleration).collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.distance).collect()
    }

    /// 最接近距離。記録が無ければ `None`
    pub fn min_distance(&self) -> Option<f64> {
        self.records.iter().map(|r| r.distance).reduce(f64::min)
    }
}
