// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/output/json_lines.rs - JSON Lines 检测报告输出
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
  sync::{Mutex, PoisonError},
};

use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::ImageFileInput,
  output::{DetectReport, Detections, OutputError, Render},
};

/// 每张图片写一行 JSON
///
/// 支持 `stdout:` 与 `file:///path/report.jsonl` 两种 URI。
pub struct JsonLinesOutput {
  sink: Mutex<Box<dyn Write + Send>>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "file";
}

impl JsonLinesOutput {
  pub const STDOUT_SCHEME: &'static str = "stdout";

  pub fn stdout() -> Self {
    Self::from_writer(std::io::stdout())
  }

  pub fn create(path: &Path) -> Result<Self, OutputError> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    info!("检测报告写入文件: {}", path.display());
    Ok(Self::from_writer(BufWriter::new(file)))
  }

  pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
    Self {
      sink: Mutex::new(Box::new(writer)),
    }
  }

  fn write_line(&self, report: &DetectReport<'_>) -> Result<(), OutputError> {
    let line = serde_json::to_string(report)?;
    let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(sink, "{}", line)?;
    sink.flush()?;
    debug!("写入检测报告: {}", report.image);
    Ok(())
  }
}

impl FromUrl for JsonLinesOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      Self::STDOUT_SCHEME => Ok(Self::stdout()),
      Self::SCHEME => {
        let path = url
          .to_file_path()
          .map_err(|()| OutputError::InvalidUri(url.to_string()))?;
        Self::create(&path)
      }
      other => Err(OutputError::SchemeMismatch(format!(
        "期望输出方式 '{}' 或 '{}', 实际输出方式 '{}'",
        Self::STDOUT_SCHEME,
        Self::SCHEME,
        other
      ))),
    }
  }
}

impl Render<ImageFileInput, Detections> for JsonLinesOutput {
  type Error = OutputError;

  fn render_result(&self, frame: &ImageFileInput, result: &Detections) -> Result<(), Self::Error> {
    self.write_line(&DetectReport::new(frame, result))
  }
}
