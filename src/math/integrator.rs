// src/math/integrator.rs

use std::fmt;
use std::str::FromStr;

use nalgebra::{Vector2, Vector4};

use crate::error::SimError;
use crate::models::agent::AgentState;

/// 数値積分法の種類
///
/// 1エピソードの中ではミサイルと目標の両方に同じ積分法を使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrator {
    /// 陽的オイラー法（1次精度）
    Euler,
    /// 古典的4次ルンゲ・クッタ法
    Rk4,
}

impl FromStr for Integrator {
    type Err = SimError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(Integrator::Euler),
            "rk4" => Ok(Integrator::Rk4),
            _ => Err(SimError::UnknownIntegrator(name.to_string())),
        }
    }
}

impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integrator::Euler => write!(f, "euler"),
            Integrator::Rk4 => write!(f, "rk4"),
        }
    }
}

impl Integrator {
    /// エージェントを1ステップ進める
    ///
    /// # 引数
    /// - `agent`: 現在の位置・速度
    /// - `accel`: ステップ中一定とみなす加速度 (m/s²)
    /// - `dt`: 時間ステップ（秒）
    ///
    /// # 戻り値
    /// - `dt` 秒後の位置・速度
    pub fn step(self, agent: &AgentState, accel: &Vector2<f64>, dt: f64) -> AgentState {
        let state = agent.to_vector();
        let f = |_t: f64, x: &Vector4<f64>| point_mass_derivative(x, accel);
        let next = match self {
            Integrator::Euler => euler_step(f, 0.0, &state, dt),
            Integrator::Rk4 => rk4_step(f, 0.0, &state, dt),
        };
        AgentState::from_vector(&next)
    }
}

/// 2次元質点の運動方程式
///
/// state = [p_x, p_y, v_x, v_y] に対して d/dt state = [v_x, v_y, a_x, a_y] を返す。
pub fn point_mass_derivative(state: &Vector4<f64>, accel: &Vector2<f64>) -> Vector4<f64> {
    Vector4::new(state[2], state[3], accel.x, accel.y)
}

/// 陽的オイラー法による1ステップ
pub fn euler_step<F>(f: F, t: f64, state: &Vector4<f64>, dt: f64) -> Vector4<f64>
where
    F: Fn(f64, &Vector4<f64>) -> Vector4<f64>,
{
    state + f(t, state) * dt
}

/// 4次ルンゲ・クッタ法による1ステップ
pub fn rk4_step<F>(f: F, t: f64, state: &Vector4<f64>, dt: f64) -> Vector4<f64>
where
    F: Fn(f64, &Vector4<f64>) -> Vector4<f64>,
{
    let k1 = f(t, state);
    let k2 = f(t + 0.5 * dt, &(state + k1 * (0.5 * dt)));
    let k3 = f(t + 0.5 * dt, &(state + k2 * (0.5 * dt)));
    let k4 = f(t + dt, &(state + k3 * dt));
    state + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn agent(p: [f64; 2], v: [f64; 2]) -> AgentState {
        AgentState::new(Vector2::new(p[0], p[1]), Vector2::new(v[0], v[1]))
    }

    /// 一定加速度で t_end まで積分したときの位置誤差（放物線の厳密解との差）
    fn position_error(method: Integrator, dt: f64) -> f64 {
        let accel = Vector2::new(2.0, -1.0);
        let t_end = 2.0;
        let steps = (t_end / dt).round() as usize;
        let mut a = agent([0.0, 0.0], [1.0, 3.0]);
        for _ in 0..steps {
            a = method.step(&a, &accel, dt);
        }
        let exact = Vector2::new(1.0, 3.0) * t_end + accel * (0.5 * t_end * t_end);
        (a.position - exact).norm()
    }

    /// 単振動 x'' = -x を位相平面で積分したときの誤差
    fn oscillator_error(rk4: bool, dt: f64) -> f64 {
        let f = |_t: f64, x: &Vector4<f64>| Vector4::new(x[2], x[3], -x[0], -x[1]);
        let t_end = 2.0;
        let steps = (t_end / dt).round() as usize;
        let mut x = Vector4::new(1.0, 0.0, 0.0, 1.0);
        for k in 0..steps {
            let t = k as f64 * dt;
            x = if rk4 {
                rk4_step(f, t, &x, dt)
            } else {
                euler_step(f, t, &x, dt)
            };
        }
        let exact = Vector4::new(t_end.cos(), t_end.sin(), -t_end.sin(), t_end.cos());
        (x - exact).norm()
    }

    #[test]
    fn test_parse_integrator_names() {
        assert_eq!("euler".parse::<Integrator>().unwrap(), Integrator::Euler);
        assert_eq!("RK4".parse::<Integrator>().unwrap(), Integrator::Rk4);
        assert_eq!(Integrator::Rk4.to_string(), "rk4");
    }

    #[test]
    fn test_unknown_integrator_is_rejected() {
        match "midpoint".parse::<Integrator>() {
            Err(SimError::UnknownIntegrator(name)) => assert_eq!(name, "midpoint"),
            other => panic!("Expected SimError::UnknownIntegrator, got {:?}", other),
        }
    }

    /// 加速度ゼロなら両方法とも等速直線運動になる
    #[test]
    fn test_zero_acceleration_is_straight_line() {
        let start = agent([10.0, -5.0], [3.0, 4.0]);
        let zero = Vector2::zeros();
        for method in [Integrator::Euler, Integrator::Rk4] {
            let next = method.step(&start, &zero, 0.37);
            assert_relative_eq!(
                next.position,
                Vector2::new(10.0 + 3.0 * 0.37, -5.0 + 4.0 * 0.37),
                epsilon = 1e-12
            );
            assert_eq!(next.velocity, start.velocity);
        }
    }

    /// 一定加速度に対して RK4 は放物線軌道と一致する
    #[test]
    fn test_rk4_is_exact_for_constant_acceleration() {
        assert!(position_error(Integrator::Rk4, 0.1) < 1e-12);
    }

    /// dt を半分にするとオイラー法の位置誤差はほぼ半分になる
    #[test]
    fn test_euler_first_order_convergence() {
        let e1 = position_error(Integrator::Euler, 0.1);
        let e2 = position_error(Integrator::Euler, 0.05);
        assert!(e1 > 0.0);
        assert_relative_eq!(e1 / e2, 2.0, epsilon = 0.05);
    }

    /// 滑らかに変化する加速度では RK4 の誤差比はおよそ 16
    #[test]
    fn test_rk4_fourth_order_convergence() {
        let e1 = oscillator_error(true, 0.1);
        let e2 = oscillator_error(true, 0.05);
        let ratio = e1 / e2;
        assert!(ratio > 14.0 && ratio < 18.0, "ratio = {}", ratio);

        let euler_ratio = oscillator_error(false, 0.1) / oscillator_error(false, 0.05);
        assert!(euler_ratio > 1.8 && euler_ratio < 2.2, "ratio = {}", euler_ratio);
    }
}
