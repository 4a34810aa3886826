// 日志初始化，输出到 stderr 与数据目录下的日志文件

use log::LevelFilter;
use std::path::Path;

pub fn build_dispatch(level: LevelFilter, log_file: Option<&Path>) -> Result<fern::Dispatch, fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("tao", LevelFilter::Warn)
        .level_for("wry", LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    Ok(dispatch)
}

/// 安装全局日志
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), fern::InitError> {
    build_dispatch(level, log_file)?.apply()?;
    Ok(())
}
