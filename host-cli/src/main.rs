//! collision-sim - 命令行模拟器
//!
//! 读取页面描述与实例配置，在内存页面上模拟滚动，输出每个实例的决策记录。

mod sim;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use collision_runtime::{
    Bootstrap, CharSplitter, DeferredSplitter, Dom, MemoryDom, PageConfig, PageSpec, TextSplitter,
    UnavailableSplitter, analyze_config,
};
use tracing::{info, warn};

use sim::{SimOptions, SimReport};

/// 拆字模块的模拟方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SplitterMode {
    /// 同步就绪
    Ready,
    /// 按 `--split-delay` 延迟就绪
    Deferred,
    /// 模块不可用
    Unavailable,
}

#[derive(Debug, Parser)]
#[command(name = "collision-sim", version, about = "logo 碰撞效果模拟器")]
struct Cli {
    /// 页面描述（JSON）
    #[arg(long)]
    page: PathBuf,

    /// 实例配置（JSON），缺省时与页面描述同目录的 config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖页面描述中的视口宽度
    #[arg(long)]
    viewport_width: Option<f32>,

    /// 滚动终点，缺省为页面底部
    #[arg(long)]
    to: Option<f32>,

    /// 每次滚动的距离（px）
    #[arg(long, default_value_t = 40.0)]
    step: f32,

    /// 每帧时长（ms）
    #[arg(long, default_value_t = 16.0)]
    dt: f32,

    /// 每次滚动之间推进的帧数
    #[arg(long, default_value_t = 2)]
    frames: u32,

    /// 滚动结束后继续推进的时长（ms）
    #[arg(long, default_value_t = 1500.0)]
    settle: f32,

    /// 到达终点后滚回顶部
    #[arg(long)]
    round_trip: bool,

    /// 到达终点后把视口宽度改为该值并刷新
    #[arg(long)]
    resize_to: Option<f32>,

    #[arg(long, value_enum, default_value_t = SplitterMode::Ready)]
    splitter: SplitterMode,

    /// 延迟就绪的拆字模块加载耗时（ms）
    #[arg(long, default_value_t = 120.0)]
    split_delay: f64,

    /// 只做配置检查，不模拟
    #[arg(long)]
    check: bool,

    /// 以 JSON 输出结果
    #[arg(long)]
    json: bool,

    /// 日志详细程度（-v / -vv）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match real_main(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("collision-sim error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn real_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut spec: PageSpec = read_json(&cli.page)?;
    if let Some(width) = cli.viewport_width {
        spec.viewport.width = width;
    }
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => cli
            .page
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("config.json"),
    };
    let text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("无法读取配置: {}", config_path.display()))?;
    let page = PageConfig::from_json(&text)
        .with_context(|| format!("配置解析失败: {}", config_path.display()))?;

    let mut dom = MemoryDom::from_spec(&spec);
    info!(
        nodes = dom.all_elements().len(),
        instances = page.instances.len(),
        "页面已加载"
    );

    let mut has_errors = false;
    for instance in &page.instances {
        let result = analyze_config(instance, Some(&dom as &dyn Dom));
        for diag in &result.diagnostics {
            eprintln!("{diag}");
        }
        has_errors |= result.has_errors();
    }
    if cli.check {
        return Ok(if has_errors {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        });
    }
    if has_errors {
        warn!("配置存在错误，相关实例将被跳过");
    }

    let options = SimOptions {
        to: cli.to,
        step: cli.step,
        dt_ms: cli.dt,
        frames_per_step: cli.frames,
        settle_ms: cli.settle,
        round_trip: cli.round_trip,
        resize_to: cli.resize_to,
    };
    options.validate()?;

    let mode = cli.splitter;
    let delay = cli.split_delay;
    let bootstrap = Bootstrap::start(page, &mut dom, 0.0, |_| make_splitter(mode, delay));
    let report = sim::run(bootstrap, &mut dom, &options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let unbalanced = report.engines.iter().any(|e| e.pauses != e.resumes);
    Ok(if unbalanced || !report.failures.is_empty() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn make_splitter(mode: SplitterMode, delay: f64) -> Box<dyn TextSplitter> {
    match mode {
        SplitterMode::Ready => Box::new(CharSplitter::new()),
        SplitterMode::Deferred => Box::new(DeferredSplitter::new(delay)),
        SplitterMode::Unavailable => Box::new(UnavailableSplitter::new("拆字模块未加载")),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("无法读取: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("JSON 解析失败: {}", path.display()))
}

fn print_report(report: &SimReport) {
    for failure in &report.failures {
        println!("[{}] 初始化失败: {}", failure.id, failure.error);
    }
    for engine in &report.engines {
        println!(
            "[{}] {} 个区域, 暂停 {} 次, 恢复 {} 次{}",
            engine.id,
            engine.triggers,
            engine.pauses,
            engine.resumes,
            if engine.pristine { "" } else { ", logo 未还原" }
        );
        for entry in engine.journal.entries() {
            println!("  {entry}");
        }
    }
}
