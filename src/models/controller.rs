// src/models/controller.rs

use nalgebra::Vector2;

use crate::config::{Scenario, SimConfig};
use crate::models::agent::AgentState;
use crate::models::mpc::MpcController;
use crate::models::pd::PdController;

/// 誘導制御器の共通インターフェース
///
/// 前回の制御入力 `u_prev` は呼び出し側（シミュレータ）が保持して渡す。
/// 戻り値は各軸 `a_max` と `du_max` の制約を満たした加速度指令 (m/s²)。
pub trait Controller {
    fn command(
        &mut self,
        t: f64,
        missile: &AgentState,
        target: &AgentState,
        u_prev: &Vector2<f64>,
        config: &SimConfig,
    ) -> Vector2<f64>;

    /// ログやメトリクスに使う名前
    fn name(&self) -> &str;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn command(
        &mut self,
        t: f64,
        missile: &AgentState,
        target: &AgentState,
        u_prev: &Vector2<f64>,
        config: &SimConfig,
    ) -> Vector2<f64> {
        (**self).command(t, missile, target, u_prev, config)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 制御器の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Pd,
    Mpc,
}

impl ControllerKind {
    /// シナリオに合わせた制御器を生成する
    ///
    /// MPCは目標加速度の予測にシナリオの機動則を使う。
    pub fn build(self, scenario: &Scenario) -> Box<dyn Controller + Send> {
        match self {
            ControllerKind::Pd => Box::new(PdController::new()),
            ControllerKind::Mpc => Box::new(MpcController::new(scenario.maneuver)),
        }
    }
}
