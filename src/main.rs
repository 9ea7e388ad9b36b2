use clap::Parser;
use tokio::io::BufReader;
use tracing::{debug, error, info};

use ytdl::cli::{self, Cli, Command};
use ytdl::common::logger::init_tracing;
use ytdl::config::AppConfig;
use ytdl::downloader::DownloadHandler;
use ytdl::ui::prompt;
use ytdl::{log_error, log_info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut config = AppConfig::from_env();
    args.apply(&mut config);
    debug!("配置: {:?}", config);

    let handler = DownloadHandler::new(&config);

    match args.command {
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            let summary = prompt::run_prompt(&handler, stdin, &mut stdout, true).await?;
            info!("本次共完成 {} 个，失败 {} 个", summary.completed, summary.failed);
        }
        Some(Command::Get {
            url,
            format,
            playlist,
        }) => {
            let request = cli::build_request(&url, format, playlist);
            log_info!("开始下载: {}", request.url());
            match prompt::run_once(&handler, &request, true).await {
                Ok(result) => prompt::write_result(&mut std::io::stdout(), &result)?,
                Err(e) => {
                    error!("下载失败: {}", e);
                    log_error!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
        Some(Command::Serve { bind, port }) => serve(&config, handler, bind, port).await?,
    }
    Ok(())
}

#[cfg(feature = "http")]
async fn serve(
    config: &AppConfig,
    handler: DownloadHandler,
    bind: std::net::IpAddr,
    port: u16,
) -> anyhow::Result<()> {
    ytdl::http::serve(config, handler, std::net::SocketAddr::new(bind, port)).await
}

#[cfg(not(feature = "http"))]
async fn serve(
    _config: &AppConfig,
    _handler: DownloadHandler,
    _bind: std::net::IpAddr,
    _port: u16,
) -> anyhow::Result<()> {
    anyhow::bail!("此版本未启用 http 特性，无法启动网页界面")
}
