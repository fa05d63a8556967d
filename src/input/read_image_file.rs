// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::PreprocessError};

/// 已解码的本地图像文件
#[derive(Debug, Clone)]
pub struct ImageFileInput {
  path: PathBuf,
  image: DynamicImage,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "file";
}

impl FromUrl for ImageFileInput {
  type Error = PreprocessError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(PreprocessError::UnsupportedScheme(url.scheme().to_string()));
    }

    let path = url
      .to_file_path()
      .map_err(|()| PreprocessError::InvalidUri(url.to_string()))?;
    Self::open(path)
  }
}

impl ImageFileInput {
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreprocessError> {
    let path = path.into();
    let image = ImageReader::open(&path)?.with_guessed_format()?.decode()?;
    debug!(
      "读取图像 {}: {}x{}",
      path.display(),
      image.width(),
      image.height()
    );

    Ok(Self { path, image })
  }

  /// 路径或 `file://` URI
  pub fn from_location(location: &str) -> Result<Self, PreprocessError> {
    Self::open(resolve_image_location(location)?)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn image(&self) -> &DynamicImage {
    &self.image
  }

  pub fn into_image(self) -> DynamicImage {
    self.image
  }
}

/// 将文件系统路径或 `file://` URI 解析为本地路径，不接受需要网络的方案
pub fn resolve_image_location(location: &str) -> Result<PathBuf, PreprocessError> {
  match Url::parse(location) {
    Ok(url) if url.scheme() == ImageFileInput::SCHEME => url
      .to_file_path()
      .map_err(|()| PreprocessError::InvalidUri(location.to_string())),
    // 单字母方案是 Windows 盘符
    Ok(url) if url.scheme().len() > 1 => {
      Err(PreprocessError::UnsupportedScheme(url.scheme().to_string()))
    }
    _ => Ok(PathBuf::from(location)),
  }
}
