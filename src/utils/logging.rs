/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则默认 `info`，详细模式下为 `debug`。
/// 重复调用不会报错（测试中可能多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 运行模式（批量 / 交互）
/// - `model_name`: 使用的模型
pub fn log_startup(mode: &str, model_name: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("🤖 分析模型: {}", model_name);
    info!("{}", "=".repeat(60));
}

/// 记录清单加载信息
pub fn log_manifests_loaded(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 个待分析的批次", folder, total);
    info!("💡 批次将按文件名顺序逐个处理\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `label`: 批次名称
/// - `documents`: 文档数量
pub fn log_batch_start(batch_num: usize, total_batches: usize, label: &str, documents: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批: {}", batch_num, total_batches, label);
    info!("📄 本批文档: {} 个", documents);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: bool, warnings: usize) {
    info!("\n{}", "─".repeat(60));
    if success {
        info!("✓ 第 {} 批完成 (警告: {})", batch_num, warnings);
    } else {
        info!("✗ 第 {} 批失败", batch_num);
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `report_path`: 报告文件路径（没有写报告时为 None）
pub fn print_final_stats(success: usize, failed: usize, total: usize, report_path: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    if let Some(path) = report_path {
        info!("\n报告已保存至: {}", path);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
