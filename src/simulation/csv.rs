// src/simulation/csv.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::SimError;
use crate::simulation::{EpisodeLog, EpisodeMetrics, StepRecord};

const LOG_HEADER: &str = "time,pm_x,pm_y,vm_x,vm_y,pt_x,pt_y,vt_x,vt_y,u_x,u_y,at_x,at_y,distance";
const METRICS_HEADER: &str = "controller,scenario,intercepted,time_to_intercept,min_distance,control_energy,saturation_pct,slew_activity_pct";

/// CSV出力ファイルを開いてヘッダーを書き込む
pub fn setup_csv_output<P: AsRef<Path>>(path: P, header: &str) -> Result<BufWriter<File>, SimError> {
    let output_file = File::create(path)?;
    let mut writer = BufWriter::new(output_file);
    writeln!(writer, "{}", header)?;
    Ok(writer)
}

/// ログ1行分の文字列を作成
pub fn create_csv_row(record: &StepRecord) -> String {
    let m = &record.missile;
    let t = &record.target;
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
        record.time,
        m.position.x,
        m.position.y,
        m.velocity.x,
        m.velocity.y,
        t.position.x,
        t.position.y,
        t.velocity.x,
        t.velocity.y,
        record.control.x,
        record.control.y,
        record.target_acceleration.x,
        record.target_acceleration.y,
        record.distance
    )
}

/// 文字列セルをCSV用に整形する（区切り文字・引用符・改行を含む場合は引用符で囲む）
pub fn quote_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// エピソードログのファイル名 `<シナリオ>_<制御器>.csv`
///
/// 名前は設定ファイル由来なので、英数字と `-` `_` 以外は `_` に置き換えて
/// 出力ディレクトリの外を指せないようにする。
pub fn episode_file_name(scenario: &str, controller: &str) -> String {
    let sanitize = |name: &str| -> String {
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    };
    format!("{}_{}.csv", sanitize(scenario), sanitize(&controller.to_lowercase()))
}

/// 評価指標1行分の文字列を作成（捕捉時刻が無ければ空欄）
pub fn create_metrics_row(metrics: &EpisodeMetrics) -> String {
    let t_hit = metrics
        .time_to_intercept
        .map(|t| t.to_string())
        .unwrap_or_default();
    format!(
        "{},{},{},{},{},{},{},{}\n",
        quote_field(&metrics.controller),
        quote_field(&metrics.scenario),
        metrics.intercepted,
        t_hit,
        metrics.min_distance,
        metrics.control_energy,
        metrics.saturation_pct,
        metrics.slew_activity_pct
    )
}

/// エピソードログをCSVに書き出す
pub fn write_episode_csv<P: AsRef<Path>>(path: P, log: &EpisodeLog) -> Result<(), SimError> {
    let mut writer = setup_csv_output(path, LOG_HEADER)?;
    for record in &log.records {
        writer.write_all(create_csv_row(record).as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// 制御器ごとの評価指標を比較表としてCSVに書き出す
pub fn write_metrics_csv<P: AsRef<Path>>(path: P, metrics: &[EpisodeMetrics]) -> Result<(), SimError> {
    let mut writer = setup_csv_output(path, METRICS_HEADER)?;
    for m in metrics {
        writer.write_all(create_metrics_row(m).as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
