// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/frame.rs - 输入/输出张量定义
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

use thiserror::Error;

const RGB_CHANNELS: usize = 3;
/// 每个锚点的坐标通道数 (cx, cy, w, h)
pub const BOX_CHANNELS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("张量长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
pub struct TensorShapeError {
  pub expected: usize,
  pub actual: usize,
}

/// 形状为 `[1, S, S, 3]` 的 NHWC 浮点输入张量，取值范围 `[0, 1]`
#[derive(Debug, Clone)]
pub struct InputTensor<const S: usize> {
  data: Box<[f32]>,
}

impl<const S: usize> InputTensor<S> {
  pub const LEN: usize = S * S * RGB_CHANNELS;

  pub fn shape(&self) -> [usize; 4] {
    [1, S, S, RGB_CHANNELS]
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

impl<const S: usize> TryFrom<Vec<f32>> for InputTensor<S> {
  type Error = TensorShapeError;

  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(TensorShapeError {
        expected: Self::LEN,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const S: usize> Default for InputTensor<S> {
  fn default() -> Self {
    let data = vec![0f32; Self::LEN].into_boxed_slice();
    Self { data }
  }
}

/// 形状为 `[1, 4 + C, N]` 的输出张量
///
/// 内存布局为通道优先：先是通道 0 的全部 N 个值，然后是通道 1，依此类推。
#[derive(Debug, Clone)]
pub struct OutputTensor<const C: usize, const N: usize> {
  data: Box<[f32]>,
}

impl<const C: usize, const N: usize> OutputTensor<C, N> {
  pub const LEN: usize = (BOX_CHANNELS + C) * N;

  pub fn shape(&self) -> [usize; 3] {
    [1, BOX_CHANNELS + C, N]
  }

  pub fn num_classes(&self) -> usize {
    C
  }

  pub fn num_anchors(&self) -> usize {
    N
  }

  /// 读取某一通道上某一锚点的值
  #[inline]
  pub fn get(&self, channel: usize, anchor: usize) -> f32 {
    self.data[channel * N + anchor]
  }

  /// 某一通道上全部 N 个锚点的值
  pub fn channel(&self, channel: usize) -> &[f32] {
    &self.data[channel * N..(channel + 1) * N]
  }
}

impl<const C: usize, const N: usize> TryFrom<Vec<f32>> for OutputTensor<C, N> {
  type Error = TensorShapeError;

  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(TensorShapeError {
        expected: Self::LEN,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const C: usize, const N: usize> Default for OutputTensor<C, N> {
  fn default() -> Self {
    let data = vec![0f32; Self::LEN].into_boxed_slice();
    Self { data }
  }
}

impl<const C: usize, const N: usize> AsMut<[f32]> for OutputTensor<C, N> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}
