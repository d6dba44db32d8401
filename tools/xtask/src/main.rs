//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 collision-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `config-check`: 检查实例配置文件（选择器、效果编号、覆盖参数）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use collision_runtime::{DiagnosticResult, Dom, MemoryDom, PageConfig, PageSpec, analyze_config};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "collision-runtime", "--html"]);
            run("cargo llvm-cov -p collision-runtime --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask 自身
            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "--workspace", "--exclude", "xtask", "--html"]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "config-check" => {
            let mut path = None;
            let mut page = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--page" => {
                        let Some(value) = args.next() else {
                            anyhow::bail!("--page 需要一个文件路径");
                        };
                        page = Some(PathBuf::from(value));
                    }
                    _ => path = Some(arg),
                }
            }
            config_check(path.as_deref(), page.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 collision-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  config-check    检查实例配置文件

CONFIG-CHECK:
  cargo xtask config-check [path] [--page page.json]

  不带路径：检查 demos/ 下所有 *config.json 文件
  带路径参数：检查指定文件或目录
  --page：同时对照页面描述检查选择器命中情况

  检查内容：
    - JSON 格式与字段类型
    - logo / 区域 / 映射 / 事件目标选择器
    - 效果编号与覆盖参数
    - 缓动名称

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo config-check  -> cargo xtask config-check
"#
    );
}

//=============================================================================
// config-check 命令实现
//=============================================================================

/// 默认配置目录（相对于 workspace root）
const DEFAULT_CONFIG_DIR: &str = "demos";

/// 配置检查结果
struct ConfigCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 实例数量
    instances_checked: usize,
    /// 解析错误数量
    parse_errors: usize,
    diagnostics: DiagnosticResult,
}

/// 执行配置检查
fn config_check(path: Option<&str>, page: Option<&Path>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_config_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_CONFIG_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认配置目录不存在: {}\n请在 workspace 根目录运行，或指定配置路径",
                    dir.display()
                );
            }
            collect_config_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到配置文件（*config.json）");
        return Ok(());
    }

    let dom = match page {
        Some(page) => {
            let text = std::fs::read_to_string(page)?;
            let spec: PageSpec = serde_json::from_str(&text)?;
            Some(MemoryDom::from_spec(&spec))
        }
        None => None,
    };

    eprintln!("==> 检查 {} 个配置文件...\n", files.len());

    let mut result = ConfigCheckResult {
        files_checked: 0,
        instances_checked: 0,
        parse_errors: 0,
        diagnostics: DiagnosticResult::new(),
    };

    for file in &files {
        check_config_file(file, dom.as_ref().map(|d| d as &dyn Dom), &mut result);
    }

    print_check_result(&result);

    if result.parse_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("配置检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有配置文件
fn collect_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with("config.json"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// 检查单个配置文件
fn check_config_file(file: &Path, dom: Option<&dyn Dom>, result: &mut ConfigCheckResult) {
    let name = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", name, e);
            result.parse_errors += 1;
            return;
        }
    };

    let page = match PageConfig::from_json(&content) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", name, e);
            result.parse_errors += 1;
            return;
        }
    };

    for (n, mut instance) in page.instances.into_iter().enumerate() {
        if instance.id.trim().is_empty() {
            instance.id = format!("{}#{}", name, n + 1);
        }
        result.instances_checked += 1;
        result.diagnostics.merge(analyze_config(&instance, dom));
    }
}

/// 输出检查结果
fn print_check_result(result: &ConfigCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个文件, {} 个实例",
        result.files_checked, result.instances_checked
    );
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count = result.parse_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
