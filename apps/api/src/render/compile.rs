//! Typesetting engine driver.
//!
//! Runs the first LaTeX engine found on PATH (tectonic, latexmk, pdflatex)
//! inside a temp directory with a hard 180s ceiling. The engine log is
//! captured for error bodies, truncated to its tail so responses stay
//! bounded.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

const COMPILE_TIMEOUT: Duration = Duration::from_secs(180);
const LOG_TAIL_CHARS: usize = 8000;

/// Candidate engines, in preference order, with their invocation args.
const ENGINES: &[(&str, &[&str])] = &[
    ("tectonic", &["--keep-intermediates", "--keep-logs", "resume.tex"]),
    ("latexmk", &["-pdf", "-interaction=nonstopmode", "resume.tex"]),
    ("pdflatex", &["-interaction=nonstopmode", "resume.tex"]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub pdf: Vec<u8>,
    pub pages: u32,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("no LaTeX engine (tectonic/latexmk/pdflatex) found on PATH")]
    EngineUnavailable,
    #[error("compilation failed: {reason}")]
    Failed { reason: String, log: String },
    #[error("compiler io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, source: &str) -> Result<Compiled, CompileError>;
}

/// Production compiler shelling out to a local LaTeX installation.
pub struct LatexCompiler;

#[async_trait]
impl Compiler for LatexCompiler {
    async fn compile(&self, source: &str) -> Result<Compiled, CompileError> {
        let &(engine, args) = ENGINES
            .iter()
            .find(|(name, _)| on_path(name))
            .ok_or(CompileError::EngineUnavailable)?;
        debug!(engine, "compiling document");

        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join("resume.tex"), source).await?;

        let output = tokio::time::timeout(
            COMPILE_TIMEOUT,
            Command::new(engine)
                .args(args)
                .current_dir(dir.path())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CompileError::Failed {
            reason: format!("{engine} exceeded the {}s limit", COMPILE_TIMEOUT.as_secs()),
            log: String::new(),
        })??;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push('\n');
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        if let Ok(engine_log) = tokio::fs::read_to_string(dir.path().join("resume.log")).await {
            log.push_str("\n\n");
            log.push_str(&engine_log);
        }

        if !output.status.success() {
            warn!(engine, status = %output.status, "engine exited nonzero");
            return Err(CompileError::Failed {
                reason: format!("{engine} exited with {}", output.status),
                log: tail(&log, LOG_TAIL_CHARS),
            });
        }

        let pdf = tokio::fs::read(dir.path().join("resume.pdf"))
            .await
            .map_err(|_| CompileError::Failed {
                reason: "engine succeeded but produced no PDF".into(),
                log: tail(&log, LOG_TAIL_CHARS),
            })?;

        let pages = pages_from_log(&log).unwrap_or_else(|| count_page_objects(&pdf));
        Ok(Compiled { pdf, pages })
    }
}

fn on_path(cmd: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|p: std::path::PathBuf| {
                let candidate: std::path::PathBuf = Path::new(&p).join(cmd);
                candidate.is_file()
            })
        })
        .unwrap_or(false)
}

/// Last `max` chars of a log, for bounded error bodies.
pub fn tail(log: &str, max: usize) -> String {
    let count = log.chars().count();
    if count <= max {
        return log.to_string();
    }
    log.chars().skip(count - max).collect()
}

/// Engines report "Output written on resume.pdf (2 pages, ...)".
fn pages_from_log(log: &str) -> Option<u32> {
    let idx = log.rfind(" page")?;
    let head = &log[..idx];
    let open = head.rfind('(')?;
    head[open + 1..].trim().parse().ok()
}

/// Counts `/Type /Page` object markers in the raw PDF (writers emit the pair
/// with or without whitespace), excluding `/Pages` tree nodes and other
/// longer names like `/PageLabels`. Coarse but engine-independent.
fn count_page_objects(pdf: &[u8]) -> u32 {
    const TYPE_TAG: &[u8] = b"/Type";
    const PAGE_TAG: &[u8] = b"/Page";
    let mut count = 0u32;
    let mut i = 0;
    while i + TYPE_TAG.len() <= pdf.len() {
        if &pdf[i..i + TYPE_TAG.len()] != TYPE_TAG {
            i += 1;
            continue;
        }
        let mut j = i + TYPE_TAG.len();
        while pdf.get(j).map_or(false, |b| b.is_ascii_whitespace()) {
            j += 1;
        }
        let is_page = pdf.get(j..j + PAGE_TAG.len()) == Some(PAGE_TAG)
            && !pdf
                .get(j + PAGE_TAG.len())
                .map_or(false, |b| b.is_ascii_alphanumeric());
        if is_page {
            count += 1;
            i = j + PAGE_TAG.len();
        } else {
            i += TYPE_TAG.len();
        }
    }
    count.max(1)
}
