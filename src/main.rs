// ==========================================
// 施工材料预测系统 - 命令行入口
// ==========================================
// 用法: material-forecast-aps [db_path] <project_id>[,<project_id>...] [today]
// - db_path 省略时使用默认数据库路径
// - today 省略时取本地日期 (YYYY-MM-DD)
// 输出: 每个项目一段 JSON（stdout），日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use material_forecast_aps::api::ForecastApi;
use material_forecast_aps::db::default_db_path;
use material_forecast_aps::domain::numeric::parse_date;
use material_forecast_aps::logging;
use serde_json::json;

const USAGE: &str = "用法: material-forecast-aps [db_path] <project_id>[,<project_id>...] [today]";

/// 命令行参数
struct CliArgs {
    db_path: String,
    project_ids: Vec<i64>,
    today: NaiveDate,
}

fn looks_like_project_list(arg: &str) -> bool {
    !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit() || c == ',')
}

fn parse_project_ids(arg: &str) -> Result<Vec<i64>> {
    let ids = arg
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<i64>()
                .with_context(|| format!("无效的 project_id: {}", s))
        })
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        bail!("未指定 project_id\n{}", USAGE);
    }
    Ok(ids)
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let (db_path, rest) = match args.first() {
        Some(first) if !looks_like_project_list(first) => (first.clone(), &args[1..]),
        Some(_) => (default_db_path(), args),
        None => bail!("{}", USAGE),
    };

    let Some(ids_arg) = rest.first() else {
        bail!("{}", USAGE);
    };
    let project_ids = parse_project_ids(ids_arg)?;

    let today = match rest.get(1) {
        Some(raw) => parse_date(raw).with_context(|| format!("无效的日期: {}", raw))?,
        None => chrono::Local::now().date_naive(),
    };

    Ok(CliArgs {
        db_path,
        project_ids,
        today,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", material_forecast_aps::APP_NAME, material_forecast_aps::VERSION);
    tracing::info!(db_path = %cli.db_path, projects = cli.project_ids.len(), today = %cli.today, "开始预测");
    tracing::info!("==================================================");

    let api = ForecastApi::open(&cli.db_path)
        .with_context(|| format!("无法打开数据库: {}", cli.db_path))?;

    let mut failures = 0usize;
    for (project_id, result) in api.project_forecasts(&cli.project_ids, cli.today).await {
        match result {
            Ok(output) => {
                let doc = json!({ "project_id": project_id, "forecast": output });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
            Err(e) => {
                failures += 1;
                tracing::error!(project_id, error = %e, "项目预测失败");
            }
        }
    }

    if failures > 0 {
        bail!("{} 个项目预测失败", failures);
    }
    Ok(())
}
