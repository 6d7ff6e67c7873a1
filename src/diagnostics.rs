//! 运行诊断
//!
//! 收集一次运行中产生的事件（缺失翻译、空输入、已写入的文件等），
//! 并累积“源文件 -> 生成文件”的汇总。诊断只用于报告，不影响流程控制。
//! 每条事件在记录时同时以 `tracing` 事件输出，如何展示由调用方决定。

use std::fmt;
use std::path::{Path, PathBuf};

/// 诊断严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// 没有找到任何模板文件
    DiscoveryEmpty { output_dir: PathBuf },
    /// 某语言的翻译表中没有该 key
    MissingTranslation {
        key: String,
        language: String,
        file: PathBuf,
    },
    ArtifactWritten {
        source: PathBuf,
        language: String,
        destination: PathBuf,
    },
    SourceDeleted { path: PathBuf },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DiscoveryEmpty { .. } => Severity::Warning,
            DiagnosticKind::MissingTranslation { .. } => Severity::Warning,
            DiagnosticKind::ArtifactWritten { .. } => Severity::Info,
            DiagnosticKind::SourceDeleted { .. } => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::DiscoveryEmpty { output_dir } => write!(
                f,
                "no HTML files found in {}, nothing to localize",
                output_dir.display()
            ),
            DiagnosticKind::MissingTranslation {
                key,
                language,
                file,
            } => write!(
                f,
                "missing translation for key \"{}\" in language \"{}\" ({})",
                key,
                language,
                file.display()
            ),
            DiagnosticKind::ArtifactWritten {
                source,
                language,
                destination,
            } => write!(
                f,
                "{} [{}] -> {}",
                source.display(),
                language,
                destination.display()
            ),
            DiagnosticKind::SourceDeleted { path } => {
                write!(f, "deleted source {}", path.display())
            }
        }
    }
}

/// 一次运行的诊断记录
#[derive(Debug, Clone)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
    summary: Vec<(PathBuf, Vec<PathBuf>)>,
    verbose: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_verbose(true)
    }

    /// 非 verbose 模式下，写入文件的记录只以 debug 级别输出
    pub fn with_verbose(verbose: bool) -> Self {
        Self {
            events: Vec::new(),
            summary: Vec::new(),
            verbose,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// 记录事件并立即输出对应的日志
    pub fn record(&mut self, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            severity: kind.severity(),
            kind,
        };

        match &diagnostic.kind {
            DiagnosticKind::ArtifactWritten {
                source,
                destination,
                ..
            } => {
                if self.verbose {
                    tracing::info!("{}", diagnostic);
                } else {
                    tracing::debug!("{}", diagnostic);
                }
                self.push_summary(source, destination);
            }
            DiagnosticKind::SourceDeleted { .. } => tracing::debug!("{}", diagnostic),
            _ => tracing::warn!("{}", diagnostic),
        }

        self.events.push(diagnostic);
    }

    fn push_summary(&mut self, source: &Path, destination: &Path) {
        match self.summary.iter_mut().find(|(path, _)| path == source) {
            Some((_, outputs)) => outputs.push(destination.to_path_buf()),
            None => self
                .summary
                .push((source.to_path_buf(), vec![destination.to_path_buf()])),
        }
    }

    /// 所有事件，按记录顺序
    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    /// 源文件及其生成的文件，按处理顺序
    pub fn summary(&self) -> &[(PathBuf, Vec<PathBuf>)] {
        &self.summary
    }

    /// 已报告的缺失翻译 `(key, language)`
    pub fn missing_translations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.events.iter().filter_map(|event| match &event.kind {
            DiagnosticKind::MissingTranslation { key, language, .. } => {
                Some((key.as_str(), language.as_str()))
            }
            _ => None,
        })
    }

    pub fn artifact_count(&self) -> usize {
        self.summary.iter().map(|(_, outputs)| outputs.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.severity == Severity::Warning)
            .count()
    }

    pub fn is_discovery_empty(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event.kind, DiagnosticKind::DiscoveryEmpty { .. }))
    }
}
