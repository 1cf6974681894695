use anyhow::Result;
use tender_analyzer::utils::logging;
use tender_analyzer::{build_session, App, Config, Console};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(false);
            error!("❌ 配置加载失败: {}", e);
            return Err(e.into());
        }
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    let interactive = std::env::args()
        .nth(1)
        .map_or(false, |arg| arg == "interactive" || arg == "-i");

    if interactive {
        logging::log_startup("交互模式", &config.model_name);
        let session = build_session(&config)?;
        Console::new(session).run().await?;
    } else {
        // 初始化并运行应用
        App::initialize(config).await?.run().await?;
    }

    Ok(())
}
