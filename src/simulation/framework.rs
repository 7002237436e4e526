// src/simulation/framework.rs

use nalgebra::Vector2;
use tracing::{info, trace};

use crate::config::{Scenario, SimConfig};
use crate::error::SimError;
use crate::models::agent::{distance, is_captured};
use crate::models::controller::Controller;
use crate::simulation::{EpisodeLog, StepRecord};

/// 1エピソードを最後まで実行する
///
/// 各ステップで目標加速度 → 制御入力 → 両者の積分 → 記録 → 捕捉判定の順に処理する。
/// 捕捉後も設定時間の最後まで続け、最初に捕捉半径に入った時刻だけを記録する。
///
/// # 引数
/// - `controller`: 誘導制御器
/// - `scenario`: 初期条件と目標の機動則
/// - `config`: シミュレーション設定
///
/// # 戻り値
/// - 全ステップ分のログ。設定エラーや不正な制御入力の場合はログを返さずエラー
pub fn run_episode<C>(
    controller: &mut C,
    scenario: &Scenario,
    config: &SimConfig,
) -> Result<EpisodeLog, SimError>
where
    C: Controller + ?Sized,
{
    config.validate()?;
    let integrator = config.integrator()?;
    let steps = config.steps();
    let dt = config.dt;

    info!(
        scenario = %scenario.name,
        controller = controller.name(),
        steps,
        %integrator,
        "エピソードを開始します"
    );

    let mut log = EpisodeLog::new(scenario.name.as_str(), controller.name(), dt, steps);
    let mut missile = scenario.missile;
    let mut target = scenario.target;
    let mut u_prev = Vector2::zeros();

    for step in 0..steps {
        let t = step as f64 * dt;
        let a_t = scenario.maneuver.acceleration(t, &target);
        let u = controller.command(t, &missile, &target, &u_prev, config);
        if !u.iter().all(|v| v.is_finite()) {
            return Err(SimError::MalformedControl { step });
        }

        missile = integrator.step(&missile, &u, dt);
        target = integrator.step(&target, &a_t, dt);
        let d = distance(&missile, &target);

        log.records.push(StepRecord {
            time: t,
            missile,
            target,
            control: u,
            target_acceleration: a_t,
            distance: d,
        });
        trace!(step, t, distance = d, u_x = u.x, u_y = u.y, "ステップ完了");

        if !log.intercepted && is_captured(&missile, &target, config.r_capture) {
            log.intercepted = true;
            log.time_to_intercept = Some(t);
            info!(controller = controller.name(), t, distance = d, "目標を捕捉しました");
        }

        u_prev = u;
    }

    info!(
        controller = controller.name(),
        intercepted = log.intercepted,
        min_distance = log.min_distance().unwrap_or(f64::NAN),
        "エピソードを終了しました"
    );
    Ok(log)
}
