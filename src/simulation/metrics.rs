// src/simulation/metrics.rs

use serde::Serialize;

use crate::config::SimConfig;
use crate::simulation::EpisodeLog;

/// 制約に張り付いているとみなす余裕
const ACTIVE_MARGIN: f64 = 1e-6;

/// エピソードの評価指標
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeMetrics {
    pub controller: String,
    pub scenario: String,
    pub intercepted: bool,
    pub time_to_intercept: Option<f64>,
    pub min_distance: f64,
    pub control_energy: f64,     // Σ‖u‖²·dt
    pub saturation_pct: f64,     // いずれかの軸が a_max に達したステップの割合 (%)
    pub slew_activity_pct: f64,  // いずれかの軸の変化量が du_max に達した割合 (%)
}

impl EpisodeMetrics {
    /// ログから評価指標を計算する
    ///
    /// # 引数
    /// - `log`: エピソードのログ
    /// - `config`: ログを生成したときの設定（制約値と dt）
    ///
    /// # 戻り値
    /// - 評価指標。記録が空なら最接近距離は無限大
    pub fn compute(log: &EpisodeLog, config: &SimConfig) -> Self {
        let controls = log.controls();

        let control_energy = controls.iter().map(|u| u.norm_squared()).sum::<f64>() * log.dt;

        let saturated = controls
            .iter()
            .filter(|u| u.iter().any(|c| c.abs() >= config.a_max - ACTIVE_MARGIN))
            .count();
        let saturation_pct = percent(saturated, controls.len());

        let slewing = controls
            .windows(2)
            .filter(|w| (w[1] - w[0]).iter().any(|d| d.abs() >= config.du_max - ACTIVE_MARGIN))
            .count();
        let slew_activity_pct = percent(slewing, controls.len().saturating_sub(1));

        EpisodeMetrics {
            controller: log.controller.clone(),
            scenario: log.scenario.clone(),
            intercepted: log.intercepted,
            time_to_intercept: log.time_to_intercept,
            min_distance: log.min_distance().unwrap_or(f64::INFINITY),
            control_energy,
            saturation_pct,
            slew_activity_pct,
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::agent::AgentState;
    use crate::simulation::StepRecord;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn log_with_controls(controls: &[[f64; 2]], distances: &[f64]) -> EpisodeLog {
        let mut log = EpisodeLog::new("test", "manual", 0.1, controls.len());
        for (k, (u, d)) in controls.iter().zip(distances).enumerate() {
            log.records.push(StepRecord {
                time: k as f64 * 0.1,
                missile: AgentState::at_rest(),
                target: AgentState::at_rest(),
                control: Vector2::new(u[0], u[1]),
                target_acceleration: Vector2::zeros(),
                distance: *d,
            });
        }
        log
    }

    #[test]
    fn test_metrics_from_manual_log() {
        let config = SimConfig::default();
        let log = log_with_controls(&[[30.0, 0.0], [20.0, 0.0], [10.0, 5.0]], &[12.0, 7.5, 9.0]);
        let m = EpisodeMetrics::compute(&log, &config);

        assert_eq!(m.controller, "manual");
        assert!(!m.intercepted);
        assert_eq!(m.time_to_intercept, None);
        assert_eq!(m.min_distance, 7.5);
        // (900 + 400 + 125) × 0.1
        assert_relative_eq!(m.control_energy, 142.5, epsilon = 1e-9);
        assert_relative_eq!(m.saturation_pct, 100.0 / 3.0, epsilon = 1e-9);
        // 差分は (-10, 0) と (-10, 5) でどちらも du_max に達している
        assert_relative_eq!(m.slew_activity_pct, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_step_has_no_slew_activity() {
        let config = SimConfig::default();
        let log = log_with_controls(&[[-30.0, 30.0]], &[3.0]);
        let m = EpisodeMetrics::compute(&log, &config);
        assert_eq!(m.slew_activity_pct, 0.0);
        assert_eq!(m.saturation_pct, 100.0);
    }

    #[test]
    fn test_empty_log() {
        let log = log_with_controls(&[], &[]);
        let m = EpisodeMetrics::compute(&log, &SimConfig::default());
        assert_eq!(m.min_distance, f64::INFINITY);
        assert_eq!(m.control_energy, 0.0);
        assert_eq!(m.saturation_pct, 0.0);
    }
}
