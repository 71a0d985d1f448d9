// ==========================================
// 库存同步系统 - 命令行入口
// ==========================================
// 职责: 装配配置/传输/基线仓库,执行一次同步运行,
//       以 JSON 输出 RunReport 供下游报告系统消费
// 说明: 正式部署由外部调度器周期触发本入口
// ==========================================

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stock_sync::{
    BaselineStore, ConfigManager, JobOrchestrator, LocalDirTransport, RunOptions,
};

struct CliArgs {
    config_path: String,
    baseline_dir: String,
    remote_dir: String,
    options: RunOptions,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut cli = CliArgs {
        config_path: "config/sync_config.json".to_string(),
        baseline_dir: "data/original_platform_files".to_string(),
        remote_dir: "data/remote".to_string(),
        options: RunOptions::default(),
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                cli.config_path = args.next().ok_or("--config 需要参数")?;
            }
            "--baseline-dir" => {
                cli.baseline_dir = args.next().ok_or("--baseline-dir 需要参数")?;
            }
            "--remote-dir" => {
                cli.remote_dir = args.next().ok_or("--remote-dir 需要参数")?;
            }
            "--dry-run" => {
                cli.options.dry_run = true;
            }
            "--suppliers" => {
                let list = args.next().ok_or("--suppliers 需要参数")?;
                cli.options.supplier_scope =
                    list.split(',').map(|s| s.trim().to_string()).collect();
            }
            "--platforms" => {
                let list = args.next().ok_or("--platforms 需要参数")?;
                cli.options.platform_scope =
                    list.split(',').map(|s| s.trim().to_string()).collect();
            }
            other => return Err(format!("未知参数: {}", other)),
        }
    }

    Ok(cli)
}

#[tokio::main]
async fn main() -> ExitCode {
    stock_sync::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", stock_sync::APP_NAME, stock_sync::VERSION);
    tracing::info!("==================================================");

    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            tracing::error!(error = %e, "参数解析失败");
            return ExitCode::from(2);
        }
    };

    // 配置加载失败是唯一的运行级故障,发生在任何任务启动之前
    let config = match ConfigManager::load(&cli.config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(config = %cli.config_path, error = %e, "配置加载失败,运行中止");
            return ExitCode::from(2);
        }
    };

    let transport = Arc::new(LocalDirTransport::new(&cli.remote_dir));
    let baselines = Arc::new(BaselineStore::new(&cli.baseline_dir));
    let orchestrator = JobOrchestrator::new(config, transport, baselines, cli.options);

    // Ctrl-C 置中止位: 在途任务完成,不再启动新任务
    let abort = orchestrator.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("收到中止信号,等待在途任务完成");
            abort.store(true, Ordering::SeqCst);
        }
    });

    let report = orchestrator.run().await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!(error = %e, "报告序列化失败");
            return ExitCode::from(2);
        }
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        // 任务级失败不是运行级故障,但以退出码提示调度器
        ExitCode::from(1)
    }
}
