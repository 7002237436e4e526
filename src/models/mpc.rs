// src/models/mpc.rs

use nalgebra::{DMatrix, DVector, Vector2, Vector4};
use tracing::{debug, warn};

use crate::config::{SimConfig, TargetManeuver};
use crate::math::clarabel_qp::ClarabelSolver;
use crate::math::constraints::{clip_box, clip_slew_then_box};
use crate::math::discrete::RelativeDynamics;
use crate::math::error::SolverError;
use crate::math::qp::{QpProblem, QpSolver};
use crate::models::agent::{AgentState, RelativeState};
use crate::models::controller::Controller;

const STATE_DIM: usize = 4;
const CONTROL_DIM: usize = 2;

/// 決定変数 z = [X_0 … X_N, U_0 … U_{N−1}] の並び
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizonLayout {
    pub horizon: usize,
}

impl HorizonLayout {
    pub fn new(horizon: usize) -> Self {
        HorizonLayout { horizon }
    }

    /// X_k の先頭インデックス
    pub fn state(&self, k: usize) -> usize {
        STATE_DIM * k
    }

    /// U_k の先頭インデックス
    pub fn control(&self, k: usize) -> usize {
        STATE_DIM * (self.horizon + 1) + CONTROL_DIM * k
    }

    pub fn num_variables(&self) -> usize {
        STATE_DIM * (self.horizon + 1) + CONTROL_DIM * self.horizon
    }

    /// 初期条件とダイナミクスの等式制約の行数
    pub fn num_equalities(&self) -> usize {
        STATE_DIM * (self.horizon + 1)
    }

    /// 制約行の総数（等式・ボックス・スルーレート）
    pub fn num_constraints(&self) -> usize {
        self.num_equalities() + 2 * CONTROL_DIM * self.horizon
    }
}

/// 1制御周期分のQPを組み立てる
///
/// 目的関数は k = 0..N−1 について
/// w_r‖r_k‖² + w_v‖v_k‖² + w_u‖u_k‖² + w_du‖u_k − u_{k−1}‖²（u_{−1} = u_prev）
/// の和。定数項 w_du‖u_prev‖² は含めない。
///
/// 制約行の並びは
/// 1. X_0 = x0
/// 2. X_{k+1} − A X_k − B U_k = G a_t
/// 3. −a_max ≤ U_k ≤ a_max
/// 4. u_prev − du_max ≤ U_0 ≤ u_prev + du_max
/// 5. −du_max ≤ U_k − U_{k−1} ≤ du_max
///
/// # 引数
/// - `x0`: 現在の相対状態
/// - `u_prev`: 前回適用した制御入力
/// - `a_t`: ホライズン全体で一定とみなす目標加速度
/// - `model`: 相対運動の離散モデル
/// - `config`: ホライズン長・制約値・重み
///
/// # 戻り値
/// - OSQP形式の二次計画問題
pub fn build_problem(
    x0: &Vector4<f64>,
    u_prev: &Vector2<f64>,
    a_t: &Vector2<f64>,
    model: &RelativeDynamics,
    config: &SimConfig,
) -> QpProblem {
    let layout = HorizonLayout::new(config.horizon);
    let horizon = layout.horizon;
    let n = layout.num_variables();
    let m = layout.num_constraints();
    let w = &config.mpc;

    let mut p = DMatrix::<f64>::zeros(n, n);
    let mut q = DVector::<f64>::zeros(n);
    for k in 0..horizon {
        let xk = layout.state(k);
        let uk = layout.control(k);
        for i in 0..2 {
            p[(xk + i, xk + i)] += 2.0 * w.w_r;
            p[(xk + 2 + i, xk + 2 + i)] += 2.0 * w.w_v;
            p[(uk + i, uk + i)] += 2.0 * (w.w_u + w.w_du);
            if k > 0 {
                let uj = layout.control(k - 1);
                p[(uj + i, uj + i)] += 2.0 * w.w_du;
                p[(uk + i, uj + i)] -= 2.0 * w.w_du;
                p[(uj + i, uk + i)] -= 2.0 * w.w_du;
            }
        }
    }
    for i in 0..CONTROL_DIM {
        q[layout.control(0) + i] = -2.0 * w.w_du * u_prev[i];
    }

    let mut a = DMatrix::<f64>::zeros(m, n);
    let mut l = DVector::<f64>::zeros(m);
    let mut u = DVector::<f64>::zeros(m);
    let mut row = 0;

    for i in 0..STATE_DIM {
        a[(row + i, layout.state(0) + i)] = 1.0;
        l[row + i] = x0[i];
        u[row + i] = x0[i];
    }
    row += STATE_DIM;

    let drift = model.g * a_t;
    for k in 0..horizon {
        let (xk, xk1, uk) = (layout.state(k), layout.state(k + 1), layout.control(k));
        for i in 0..STATE_DIM {
            a[(row + i, xk1 + i)] = 1.0;
            for j in 0..STATE_DIM {
                a[(row + i, xk + j)] -= model.a[(i, j)];
            }
            for j in 0..CONTROL_DIM {
                a[(row + i, uk + j)] -= model.b[(i, j)];
            }
            l[row + i] = drift[i];
            u[row + i] = drift[i];
        }
        row += STATE_DIM;
    }

    for k in 0..horizon {
        for i in 0..CONTROL_DIM {
            a[(row + i, layout.control(k) + i)] = 1.0;
            l[row + i] = -config.a_max;
            u[row + i] = config.a_max;
        }
        row += CONTROL_DIM;
    }

    for k in 0..horizon {
        for i in 0..CONTROL_DIM {
            a[(row + i, layout.control(k) + i)] = 1.0;
            if k == 0 {
                l[row + i] = u_prev[i] - config.du_max;
                u[row + i] = u_prev[i] + config.du_max;
            } else {
                a[(row + i, layout.control(k - 1) + i)] = -1.0;
                l[row + i] = -config.du_max;
                u[row + i] = config.du_max;
            }
        }
        row += CONTROL_DIM;
    }

    QpProblem { p, q, a, l, u }
}

/// ソルバが解を返せなかったときの穏やかな線形則 box(0.4·r + 0.8·v)
pub fn fallback_command(rel: &RelativeState, a_max: f64) -> Vector2<f64> {
    clip_box(&(rel.position() * 0.4 + rel.velocity() * 0.8), a_max)
}

/// 制約付きモデル予測制御（後退ホライズン）
///
/// 毎周期QPを解き直し、最初の制御入力だけを適用する。
/// 目標加速度は現在値をホライズン全体で保持して予測する（0次ホールド）。
/// 既定のソルバは Clarabel。
pub struct MpcController<S = ClarabelSolver> {
    maneuver: TargetManeuver,
    solver: S,
    /// 診断用のフォールバック回数。制御入力の計算には使わない
    fallbacks: usize,
}

impl MpcController<ClarabelSolver> {
    pub fn new(maneuver: TargetManeuver) -> Self {
        MpcController::with_solver(maneuver, ClarabelSolver::default())
    }
}

impl<S: QpSolver> MpcController<S> {
    pub fn with_solver(maneuver: TargetManeuver, solver: S) -> Self {
        MpcController {
            maneuver,
            solver,
            fallbacks: 0,
        }
    }

    /// フォールバック則を使った回数（ログ・テスト用）
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }
}

impl<S: QpSolver> Controller for MpcController<S> {
    fn command(
        &mut self,
        t: f64,
        missile: &AgentState,
        target: &AgentState,
        u_prev: &Vector2<f64>,
        config: &SimConfig,
    ) -> Vector2<f64> {
        let rel = RelativeState::between(missile, target);
        let a_t = self.maneuver.acceleration(t, target);
        let model = RelativeDynamics::new(config.dt);
        let problem = build_problem(rel.as_vector(), u_prev, &a_t, &model, config);
        let first = HorizonLayout::new(config.horizon).control(0);

        let solved = self.solver.solve(&problem).and_then(|sol| {
            match (sol.x.get(first), sol.x.get(first + 1)) {
                (Some(&ux), Some(&uy)) if ux.is_finite() && uy.is_finite() => {
                    debug!(t, iterations = sol.iterations, "QPを解きました");
                    Ok(Vector2::new(ux, uy))
                }
                _ => Err(SolverError::NonFinite),
            }
        });

        let u = match solved {
            Ok(u0) => u0,
            Err(err) => {
                self.fallbacks += 1;
                warn!(t, error = %err, "QPが解けなかったためフォールバック則を使います");
                fallback_command(&rel, config.a_max)
            }
        };

        clip_slew_then_box(&u, u_prev, config.du_max, config.a_max)
    }

    fn name(&self) -> &str {
        "MPC_QP"
    }
}
