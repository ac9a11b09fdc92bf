//! H&E 细胞核批量分割与真值评估.
//!
//! 环境变量:
//!
//! - `HE_IMAGE_DIR`, `HE_GT_DIR`, `HE_XML_DIR`, `HE_OUTPUT_DIR`: 各目录, 见 `utils::loader`;
//! - `HE_CONFIG`: JSON 配置文件路径, 可选;
//! - `HE_LOG`: 日志级别, 默认 `info`.

mod config;
mod profile;
mod result;
mod runner;

use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> anyhow::Result<()> {
    let level = std::env::var("HE_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    SimpleLogger::new().with_level(level).init()?;

    let cfg = config::RunConfig::from_env()?;
    let dirs = runner::Dirs::from_env_or_home()?;
    log::debug!("{cfg:?}");

    println!("Running nucleus segmentation...");
    let report = runner::run(&cfg, &dirs)?;
    report.save_to(&dirs.output)?;
    report.analyze();
    log::info!("results written to {}", dirs.output.display());
    Ok(())
}
