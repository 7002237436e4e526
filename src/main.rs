// src/main.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::thread;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use intercept_sim::simulation::csv::{episode_file_name, write_episode_csv, write_metrics_csv};
use intercept_sim::simulation::load_parameters::{load_config, load_scenario, save_config_snapshot};
use intercept_sim::{run_episode, ControllerKind, EpisodeLog, EpisodeMetrics, Scenario, SimConfig};

/// 比較に使う制御器
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ControllerChoice {
    Pd,
    Mpc,
    Both,
}

impl ControllerChoice {
    fn kinds(self) -> Vec<ControllerKind> {
        match self {
            ControllerChoice::Pd => vec![ControllerKind::Pd],
            ControllerChoice::Mpc => vec![ControllerKind::Mpc],
            ControllerChoice::Both => vec![ControllerKind::Pd, ControllerKind::Mpc],
        }
    }
}

/// 設定ファイルを指定しないときの制約プリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Limits {
    /// a_max 15, du_max 5, w_du 0.2
    Stressed,
    /// a_max 30, du_max 10, w_du 0.5
    Default,
}

/// 平面迎撃シミュレーション（PD誘導とMPC誘導の比較）
///
/// 引数なしでは旋回目標 (a_lat 1.5) と厳しい加速度制約で PD と MPC を比較する。
#[derive(Debug, Parser)]
#[command(name = "intercept-sim", version)]
struct Args {
    /// 設定YAMLファイル（省略時は既定値）
    #[arg(long)]
    config: Option<PathBuf>,

    /// --config が無いときに使う制約プリセット
    #[arg(long, value_enum, default_value_t = Limits::Stressed)]
    limits: Limits,

    /// straight / turning / シナリオYAMLのパス
    #[arg(long, default_value = "turning")]
    scenario: String,

    /// turning シナリオの横加速度 (m/s²)
    #[arg(long, default_value_t = 1.5)]
    a_lat: f64,

    #[arg(long, value_enum, default_value_t = ControllerChoice::Both)]
    controller: ControllerChoice,

    /// euler / rk4
    #[arg(long)]
    integrator: Option<String>,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    #[arg(long)]
    a_max: Option<f64>,

    #[arg(long)]
    du_max: Option<f64>,

    #[arg(long)]
    horizon: Option<usize>,
}

/// 設定ファイルとコマンドライン引数から設定を組み立てる
fn build_config(args: &Args) -> Result<SimConfig, Box<dyn Error>> {
    let mut config = match (&args.config, args.limits) {
        (Some(path), _) => load_config(path)?,
        (None, Limits::Stressed) => SimConfig::stressed(),
        (None, Limits::Default) => SimConfig::default(),
    };
    if let Some(integrator) = &args.integrator {
        config.integrator = integrator.clone();
    }
    if let Some(a_max) = args.a_max {
        config.a_max = a_max;
    }
    if let Some(du_max) = args.du_max {
        config.du_max = du_max;
    }
    if let Some(horizon) = args.horizon {
        config.horizon = horizon;
    }
    config.validate()?;
    Ok(config)
}

fn build_scenario(name: &str, a_lat: f64) -> Result<Scenario, Box<dyn Error>> {
    let scenario = match name {
        "straight" => Scenario::straight(),
        "turning" => Scenario::turning(a_lat),
        path => load_scenario(path)?,
    };
    Ok(scenario)
}

/// 各制御器のエピソードを別スレッドで実行する
fn run_all(
    kinds: &[ControllerKind],
    scenario: &Scenario,
    config: &SimConfig,
) -> Result<Vec<EpisodeLog>, Box<dyn Error>> {
    thread::scope(|s| -> Result<Vec<EpisodeLog>, Box<dyn Error>> {
        let handles: Vec<_> = kinds
            .iter()
            .map(|&kind| {
                s.spawn(move || {
                    let mut controller = kind.build(scenario);
                    run_episode(controller.as_mut(), scenario, config)
                })
            })
            .collect();

        let mut logs = Vec::with_capacity(handles.len());
        for handle in handles {
            let log = handle
                .join()
                .map_err(|_| "シミュレーションスレッドが異常終了しました")??;
            logs.push(log);
        }
        Ok(logs)
    })
}

fn print_table(metrics: &[EpisodeMetrics]) {
    println!(
        "{:<12} {:>11} {:>10} {:>10} {:>12} {:>8} {:>8}",
        "controller", "intercepted", "t_hit(s)", "min_d(m)", "energy", "sat(%)", "slew(%)"
    );
    for m in metrics {
        let t_hit = m
            .time_to_intercept
            .map(|t| format!("{:.2}", t))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>11} {:>10} {:>10.2} {:>12.1} {:>8.1} {:>8.1}",
            m.controller, m.intercepted, t_hit, m.min_distance, m.control_energy, m.saturation_pct, m.slew_activity_pct
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // 設定とシナリオの読み込み
    let config = build_config(&args)?;
    let scenario = build_scenario(&args.scenario, args.a_lat)?;

    fs::create_dir_all(&args.output_dir)?;
    save_config_snapshot(args.output_dir.join("config_final.json"), &config)?;

    // シミュレーションの実行
    let logs = run_all(&args.controller.kinds(), &scenario, &config)?;

    // CSV出力
    let mut metrics = Vec::with_capacity(logs.len());
    for log in &logs {
        let path = args
            .output_dir
            .join(episode_file_name(&log.scenario, &log.controller));
        write_episode_csv(&path, log)?;
        info!(path = %path.display(), "ログを書き出しました");
        metrics.push(EpisodeMetrics::compute(log, &config));
    }
    write_metrics_csv(args.output_dir.join("metrics.csv"), &metrics)?;

    print_table(&metrics);
    Ok(())
}
