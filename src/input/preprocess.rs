// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/input/preprocess.rs - 图像预处理
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

use image::{DynamicImage, imageops::FilterType};
use tracing::debug;

use crate::{frame::InputTensor, input::PreprocessError};

/// 将任意尺寸的图像转换为 `[1, S, S, 3]` 输入张量
///
/// 1. 直接拉伸到 S×S，不保持宽高比（模型按拉伸后的正方形输入训练）
/// 2. 转换为 RGB 字节，每像素 3 字节，无 alpha
/// 3. 按 `byte / 255.0` 归一化，行优先、通道在后
pub fn preprocess<const S: usize>(image: &DynamicImage) -> Result<InputTensor<S>, PreprocessError> {
  let (width, height) = (image.width(), image.height());
  let resize_error = || PreprocessError::Resize {
    width,
    height,
    size: S,
  };

  let edge = u32::try_from(S).map_err(|_| resize_error())?;
  if width == 0 || height == 0 || edge == 0 {
    return Err(resize_error());
  }

  debug!("缩放图像 {}x{} -> {}x{}", width, height, edge, edge);
  let resized = image.resize_exact(edge, edge, FilterType::Triangle);

  let rgb = resized.to_rgb8().into_raw();
  if rgb.len() != InputTensor::<S>::LEN {
    return Err(PreprocessError::Rgb {
      expected: InputTensor::<S>::LEN,
      actual: rgb.len(),
    });
  }

  let data: Vec<f32> = rgb.iter().map(|&b| f32::from(b) / 255.0).collect();
  Ok(InputTensor::try_from(data)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage, RgbaImage};

  #[test]
  fn output_has_fixed_length_and_unit_range() {
    let image = RgbImage::from_fn(37, 11, |x, y| Rgb([(x * 7) as u8, (y * 23) as u8, 255]));
    let tensor = preprocess::<16>(&DynamicImage::ImageRgb8(image)).unwrap();

    assert_eq!(tensor.as_slice().len(), 16 * 16 * 3);
    assert_eq!(tensor.shape(), [1, 16, 16, 3]);
    assert!(tensor.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
  }

  #[test]
  fn layout_is_channel_last() {
    let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 51]));
    let tensor = preprocess::<2>(&DynamicImage::ImageRgb8(image)).unwrap();

    for pixel in tensor.as_slice().chunks(3) {
      assert_eq!(pixel, &[1.0, 0.0, 0.2]);
    }
  }

  #[test]
  fn alpha_channel_is_dropped() {
    let image = RgbaImage::from_pixel(3, 5, image::Rgba([0, 255, 0, 10]));
    let tensor = preprocess::<4>(&DynamicImage::ImageRgba8(image)).unwrap();

    assert_eq!(tensor.as_slice().len(), 4 * 4 * 3);
    assert_eq!(&tensor.as_slice()[..3], &[0.0, 1.0, 0.0]);
  }

  #[test]
  fn empty_image_fails_at_resize() {
    let image = DynamicImage::new_rgb8(0, 5);
    let err = preprocess::<4>(&image).unwrap_err();
    assert!(matches!(err, PreprocessError::Resize { width: 0, height: 5, size: 4 }));
  }
}
