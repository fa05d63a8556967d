// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/task.rs - 检测任务
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

use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::{info, warn};

use crate::{
  detector::Detect,
  input::ImageFileInput,
  output::{Detections, Render},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 对每个输入图像各检测一次
pub struct OneShotTask;

impl<
  S: AsRef<str>,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: IntoIterator<Item = S>,
  M: Detect<DynamicImage, Error = ME>,
  O: Render<ImageFileInput, Detections, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let mut count = 0usize;
    for location in input {
      let frame = ImageFileInput::from_location(location.as_ref())?;
      info!("图像读取成功: {}，开始推理...", frame.path().display());
      let now = Instant::now();
      let boxes = model.detect(frame.image())?;
      let elapsed = now.elapsed();
      info!("推理完成，耗时: {:.2?}", elapsed);
      output.render_result(&frame, &Detections { boxes, elapsed })?;
      count += 1;
    }

    if count == 0 {
      return Err(anyhow::anyhow!("没有输入图像"));
    }
    info!("任务完成，共处理 {} 张图像", count);
    Ok(())
  }
}

/// 对同一张图像重复检测，统计平均推理时间
#[derive(Debug, Clone, Copy)]
pub struct RepeatShotTask {
  repeat: usize,
}

impl RepeatShotTask {
  /// 不计入平均值的预热次数
  pub const WARMUP: usize = 2;

  pub fn new(repeat: usize) -> Self {
    Self {
      repeat: repeat.max(1),
    }
  }

  pub fn repeat(&self) -> usize {
    self.repeat
  }
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self::new(100)
  }
}

/// 去掉预热轮次后的平均耗时，轮次不足时使用全部样本
pub fn mean_duration(times: &[Duration], warmup: usize) -> Option<Duration> {
  let samples = if times.len() > warmup {
    &times[warmup..]
  } else {
    times
  };
  let count = u32::try_from(samples.len()).ok().filter(|&n| n > 0)?;
  Some(samples.iter().sum::<Duration>() / count)
}

impl<
  S: AsRef<str>,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: IntoIterator<Item = S>,
  M: Detect<DynamicImage, Error = ME>,
  O: Render<ImageFileInput, Detections, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let location = input
      .into_iter()
      .next()
      .ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    let frame = ImageFileInput::from_location(location.as_ref())?;
    info!("图像读取成功: {}，开始推理...", frame.path().display());

    let mut times = Vec::with_capacity(self.repeat);
    let mut last = Vec::new();
    for i in 0..self.repeat {
      let now = Instant::now();
      last = model.detect(frame.image())?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
    }

    let mean = mean_duration(&times, Self::WARMUP).unwrap_or_default();
    warn!("平均推理时间: {:.2?}", mean);
    output.render_result(
      &frame,
      &Detections {
        boxes: last,
        elapsed: mean,
      },
    )?;

    Ok(())
  }
}
