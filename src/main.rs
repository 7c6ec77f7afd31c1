// ==========================================
// 员工导入系统 - 命令行入口
// ==========================================
// 用法:
//   employee-import import <file> [db_path]
//   employee-import companies [db_path]
//   employee-import employees [db_path]
//   employee-import delete-company <name> [db_path]
//   employee-import config <key> <value> [db_path]
// 输出: stdout 为 JSON（报告/列表/错误响应），日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use employee_import::api::ApiError;
use employee_import::app::{get_default_db_path, AppState};
use employee_import::config::ConfigManager;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "用法: employee-import <import <file> | companies | employees | delete-company <name> | config <key> <value>> [db_path]";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("序列化输出失败")?;
    println!("{}", json);
    Ok(())
}

fn open_state(db_path: Option<String>) -> Result<AppState> {
    let db_path = db_path.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);
    AppState::new(db_path).map_err(anyhow::Error::msg)
}

async fn run(args: Vec<String>) -> Result<()> {
    let mut args = args.into_iter();
    let command = args.next().context(USAGE)?;

    match command.as_str() {
        "import" => {
            let file = args.next().context(USAGE)?;
            let state = open_state(args.next())?;
            let report = state.import_api.import_path(&PathBuf::from(file)).await?;
            print_json(&report)
        }
        "companies" => {
            let state = open_state(args.next())?;
            print_json(&state.import_api.list_companies()?)
        }
        "employees" => {
            let state = open_state(args.next())?;
            print_json(&state.import_api.list_employees()?)
        }
        "delete-company" => {
            let name = args.next().context(USAGE)?;
            let state = open_state(args.next())?;
            state.import_api.delete_company(&name)?;
            print_json(&serde_json::json!({ "deleted": name }))
        }
        "config" => {
            let key = args.next().context(USAGE)?;
            let value = args.next().context(USAGE)?;
            let db_path = args.next().unwrap_or_else(get_default_db_path);
            let config = ConfigManager::new(&db_path)
                .map_err(|e| anyhow::anyhow!("打开配置失败: {}", e))?;
            config
                .set_global_config_value(&key, &value)
                .map_err(|e| anyhow::anyhow!("写入配置失败: {}", e))?;
            print_json(&serde_json::json!({ "key": key, "value": value }))
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    employee_import::logging::init();

    tracing::info!("{} v{}", employee_import::APP_NAME, employee_import::VERSION);

    match run(std::env::args().skip(1).collect()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // API 错误输出结构化响应，其余输出纯文本
            match err.downcast_ref::<ApiError>() {
                Some(api_err) => {
                    let response = api_err.to_response();
                    match serde_json::to_string_pretty(&response) {
                        Ok(json) => println!("{}", json),
                        Err(_) => eprintln!("error: {}", api_err),
                    }
                }
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
