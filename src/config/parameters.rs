// src/config/parameters.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::Integrator;

/// 1エピソードの最大ステップ数（ログの確保量の上限）
pub const MAX_STEPS: usize = 1_000_000;

/// PD誘導則のゲイン
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdGains {
    pub kp_pos: f64, // 相対位置ゲイン (1/s²)
    pub kd_vel: f64, // 相対速度ゲイン (1/s)
}

impl Default for PdGains {
    fn default() -> Self {
        PdGains {
            kp_pos: 0.8,
            kd_vel: 1.6,
        }
    }
}

/// MPCのステージコスト重み
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcWeights {
    pub w_r: f64,  // 相対位置
    pub w_v: f64,  // 相対速度
    pub w_u: f64,  // 制御入力
    pub w_du: f64, // 制御入力の変化量
}

impl Default for MpcWeights {
    fn default() -> Self {
        MpcWeights {
            w_r: 10.0,
            w_v: 1.0,
            w_u: 0.05,
            w_du: 0.5,
        }
    }
}

/// シミュレーション設定
///
/// エピソード中は読み取り専用で、制御器・シミュレータの各呼び出しに渡す。
/// ゲインと重みはフラット化して、YAML / JSON 上では1階層のキーとして扱う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f64,    // 時間ステップ (s)
    pub t_max: f64, // エピソード長 (s)
    #[serde(alias = "N", alias = "N_mpc")]
    pub horizon: usize, // MPCの予測ホライズン（ステップ数）
    #[serde(alias = "R_capture")]
    pub r_capture: f64, // 捕捉半径 (m)
    pub a_max: f64,  // 各軸の加速度上限 (m/s²)
    pub du_max: f64, // 1ステップあたりの各軸の加速度変化上限 (m/s²)
    pub integrator: String,
    #[serde(flatten)]
    pub pd: PdGains,
    #[serde(flatten)]
    pub mpc: MpcWeights,
    /// 認識できなかったキー（`validate` でエラーにする）
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            dt: 0.05,
            t_max: 25.0,
            horizon: 25,
            r_capture: 5.0,
            a_max: 30.0,
            du_max: 10.0,
            integrator: Integrator::Rk4.to_string(),
            pd: PdGains::default(),
            mpc: MpcWeights::default(),
            unknown: BTreeMap::new(),
        }
    }
}

impl SimConfig {
    /// 加速度制約を厳しくした比較用設定
    pub fn stressed() -> Self {
        SimConfig {
            a_max: 15.0,
            du_max: 5.0,
            mpc: MpcWeights {
                w_du: 0.2,
                ..MpcWeights::default()
            },
            ..SimConfig::default()
        }
    }

    /// エピソードのステップ数 ceil(t_max / dt)
    pub fn steps(&self) -> usize {
        (self.t_max / self.dt).ceil() as usize
    }

    /// 積分法名を解釈する
    pub fn integrator(&self) -> Result<Integrator, SimError> {
        self.integrator.parse()
    }

    /// 設定値の範囲チェック
    ///
    /// シミュレーション開始前に呼び、状態を変更する前にエラーを返す。
    pub fn validate(&self) -> Result<(), SimError> {
        positive("dt", self.dt)?;
        positive("t_max", self.t_max)?;
        positive("a_max", self.a_max)?;
        positive("du_max", self.du_max)?;
        non_negative("r_capture", self.r_capture)?;
        non_negative("kp_pos", self.pd.kp_pos)?;
        non_negative("kd_vel", self.pd.kd_vel)?;
        non_negative("w_r", self.mpc.w_r)?;
        non_negative("w_v", self.mpc.w_v)?;
        non_negative("w_u", self.mpc.w_u)?;
        non_negative("w_du", self.mpc.w_du)?;
        let ratio = self.t_max / self.dt;
        if !ratio.is_finite() || ratio.ceil() > MAX_STEPS as f64 {
            return Err(SimError::InvalidConfig {
                field: "dt",
                reason: format!("ステップ数 t_max/dt が上限 {} を超えます", MAX_STEPS),
            });
        }
        if !self.unknown.is_empty() {
            let keys: Vec<&str> = self.unknown.keys().map(String::as_str).collect();
            return Err(SimError::InvalidConfig {
                field: "unknown_keys",
                reason: format!("未知のキーがあります: {}", keys.join(", ")),
            });
        }
        if self.horizon < 1 {
            return Err(SimError::InvalidConfig {
                field: "horizon",
                reason: "1以上である必要があります".to_string(),
            });
        }
        self.integrator()?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig {
            field,
            reason: format!("正の有限値である必要があります (値: {})", value),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig {
            field,
            reason: format!("0以上の有限値である必要があります (値: {})", value),
        })
    }
}
