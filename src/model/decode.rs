// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/decode.rs - 输出张量解码
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

use tracing::debug;

use crate::{
  frame::{BOX_CHANNELS, OutputTensor},
  model::RawDetection,
};

/// 坐标绝对值不超过该值时认为模型输出的是归一化坐标
const NORMALIZED_COORDINATE_LIMIT: f32 = 2.0;

/// 模型输出坐标所用的坐标系
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateScale {
  /// 坐标已归一化到 `[0, 1]`
  Normalized,
  /// 坐标位于 `[0, S]` 像素空间
  Pixel(f32),
}

impl CoordinateScale {
  pub fn divisor(&self) -> f32 {
    match self {
      CoordinateScale::Normalized => 1.0,
      CoordinateScale::Pixel(size) => *size,
    }
  }
}

/// 根据全部锚点四个坐标通道的最大绝对值判断坐标系
///
/// 同一个模型可能以归一化坐标或像素坐标导出，这里不依赖配置，
/// 最大绝对值 ≤ 2 视为归一化，否则视为以输入边长 `input_size` 为单位的像素坐标。
pub fn detect_coordinate_scale<const C: usize, const N: usize>(
  output: &OutputTensor<C, N>,
  input_size: usize,
) -> CoordinateScale {
  let max_abs = (0..BOX_CHANNELS)
    .flat_map(|channel| output.channel(channel).iter())
    .filter(|v| v.is_finite())
    .fold(0f32, |acc, v| acc.max(v.abs()));

  if max_abs <= NORMALIZED_COORDINATE_LIMIT {
    CoordinateScale::Normalized
  } else {
    CoordinateScale::Pixel(input_size as f32)
  }
}

/// 将 `[1, 4 + C, N]` 输出解码为候选框
///
/// 置信度取各类别分数的最大值，低于 `confidence_threshold` 的锚点被丢弃，
/// 不保留类别标签。输出坐标按原图宽高归一化并截断到 `[0, 1]`。
pub fn decode_output<const C: usize, const N: usize>(
  output: &OutputTensor<C, N>,
  input_size: usize,
  confidence_threshold: f32,
) -> Vec<RawDetection> {
  let scale = detect_coordinate_scale(output, input_size);
  debug!("输出坐标系: {:?}", scale);
  let divisor = scale.divisor();

  let mut items = Vec::new();

  for anchor in 0..N {
    let max_conf = (0..C)
      .map(|c| output.get(BOX_CHANNELS + c, anchor))
      .fold(f32::NEG_INFINITY, f32::max);

    // NaN 也在这里被过滤
    if !(max_conf >= confidence_threshold) {
      continue;
    }

    let cx = output.get(0, anchor);
    let cy = output.get(1, anchor);
    let w = output.get(2, anchor);
    let h = output.get(3, anchor);

    if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
      debug!("锚点 {} 坐标无效，跳过", anchor);
      continue;
    }

    let xa = ((cx - w / 2.0) / divisor).clamp(0.0, 1.0);
    let ya = ((cy - h / 2.0) / divisor).clamp(0.0, 1.0);
    let xb = ((cx + w / 2.0) / divisor).clamp(0.0, 1.0);
    let yb = ((cy + h / 2.0) / divisor).clamp(0.0, 1.0);

    items.push(RawDetection {
      bbox: [xa.min(xb), ya.min(yb), xa.max(xb), ya.max(yb)],
      confidence: max_conf,
    });
  }

  debug!("解码得到 {} 个候选框", items.len());
  items
}
