//! 滚动模拟
//!
//! 在内存页面上按固定步长滚动，同时按帧推进时钟。

use collision_runtime::{Bootstrap, Dom, Journal, MemoryDom, Viewport};
use serde::Serialize;
use tracing::{debug, info};

/// 模拟参数
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// 滚动终点，缺省为页面最大滚动距离
    pub to: Option<f32>,
    /// 每次滚动的距离
    pub step: f32,
    /// 每帧时长（ms）
    pub dt_ms: f32,
    /// 每次滚动之间推进的帧数
    pub frames_per_step: u32,
    /// 滚动结束后继续推进的时长（ms）
    pub settle_ms: f32,
    /// 到达终点后滚回顶部
    pub round_trip: bool,
    /// 到达终点后改变视口宽度
    pub resize_to: Option<f32>,
}

impl SimOptions {
    /// 时间与距离参数必须是有限值，帧时长必须为正
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.dt_ms.is_finite() && self.dt_ms > 0.0) {
            anyhow::bail!("帧时长必须为正数: {}", self.dt_ms);
        }
        if !self.step.is_finite() {
            anyhow::bail!("滚动步长无效: {}", self.step);
        }
        if !self.settle_ms.is_finite() {
            anyhow::bail!("收尾时长无效: {}", self.settle_ms);
        }
        if let Some(to) = self.to
            && !to.is_finite()
        {
            anyhow::bail!("滚动终点无效: {to}");
        }
        if let Some(width) = self.resize_to
            && !(width.is_finite() && width > 0.0)
        {
            anyhow::bail!("视口宽度无效: {width}");
        }
        Ok(())
    }
}

/// 单个实例的结果
#[derive(Debug, Serialize)]
pub struct EngineReport {
    pub id: String,
    pub triggers: usize,
    pub pauses: usize,
    pub resumes: usize,
    /// 卸载前 logo 是否处于原始状态
    pub pristine: bool,
    pub journal: Journal,
}

/// 初始化失败的实例
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SimReport {
    pub engines: Vec<EngineReport>,
    pub failures: Vec<FailureReport>,
}

/// 执行模拟并卸载全部实例
pub fn run(
    mut bootstrap: Bootstrap,
    dom: &mut MemoryDom,
    options: &SimOptions,
) -> anyhow::Result<SimReport> {
    options.validate()?;
    let end = options.to.unwrap_or_else(|| dom.max_scroll()).max(0.0);
    info!(end, step = options.step, "开始滚动");

    scroll(&mut bootstrap, dom, 0.0, end, options);

    if let Some(width) = options.resize_to {
        let height = dom.viewport().height;
        dom.set_viewport(Viewport { width, height });
        info!(width, "视口宽度已改变");
        bootstrap.refresh(dom);
    }

    if options.round_trip {
        scroll(&mut bootstrap, dom, end, 0.0, options);
    }

    let mut settled = 0.0;
    while settled < options.settle_ms {
        bootstrap.advance(dom, options.dt_ms);
        settled += options.dt_ms;
    }

    let failures = bootstrap
        .failures()
        .iter()
        .map(|f| FailureReport {
            id: f.instance.clone(),
            error: f.error.to_string(),
        })
        .collect();
    let summaries: Vec<_> = bootstrap
        .engines()
        .iter()
        .map(|engine| {
            (
                engine.triggers().len(),
                engine.pause_count(),
                engine.resume_count(),
                engine.is_pristine(&*dom),
            )
        })
        .collect();

    let engines = bootstrap
        .teardown(dom)
        .into_iter()
        .zip(summaries)
        .map(|((id, journal), (triggers, pauses, resumes, pristine))| EngineReport {
            id,
            triggers,
            pauses,
            resumes,
            pristine,
            journal,
        })
        .collect();

    Ok(SimReport { engines, failures })
}

fn scroll(
    bootstrap: &mut Bootstrap,
    dom: &mut MemoryDom,
    from: f32,
    to: f32,
    options: &SimOptions,
) {
    let step = options.step.abs().max(1.0);
    let mut y = from;
    while y != to {
        y = if to > y { (y + step).min(to) } else { (y - step).max(to) };
        debug!(scroll_y = y, "滚动");
        bootstrap.on_scroll(dom, y);
        for _ in 0..options.frames_per_step {
            bootstrap.advance(dom, options.dt_ms);
        }
    }
}
