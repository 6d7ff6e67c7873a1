//! 模板文件发现
//!
//! 给定输出目录，返回需要本地化的模板文件列表。默认实现基于 `glob`，
//! 只匹配目录下一层的 `*.html` 文件，因此生成的 `<lang>/` 子目录不会被再次处理。

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};

use crate::core::{LocalizeError, LocalizeResult};

/// 默认匹配模式
pub const DEFAULT_GLOB: &str = "*.html";

/// 模板文件发现接口
pub trait FileDiscovery {
    /// 返回需要处理的文件；空列表是合法结果
    fn discover(&self, output_dir: &Path) -> LocalizeResult<Vec<PathBuf>>;
}

type PatternSource = Box<dyn Fn(&Path) -> Vec<String>>;

/// 基于 glob 模式的文件发现
///
/// 模式由输出目录计算得到；相对模式相对于输出目录解析。
pub struct GlobDiscovery {
    patterns: PatternSource,
}

impl GlobDiscovery {
    /// 使用固定的一组模式
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        Self {
            patterns: Box::new(move |_| patterns.clone()),
        }
    }

    /// 根据输出目录动态计算模式
    pub fn from_fn<F>(patterns: F) -> Self
    where
        F: Fn(&Path) -> Vec<String> + 'static,
    {
        Self {
            patterns: Box::new(patterns),
        }
    }

    /// 计算某个输出目录下实际使用的绝对模式
    pub fn resolve_patterns(&self, output_dir: &Path) -> Vec<String> {
        let escaped_dir = Pattern::escape(&output_dir.to_string_lossy());

        (self.patterns)(output_dir)
            .into_iter()
            .map(|pattern| {
                if Path::new(&pattern).is_absolute() {
                    pattern
                } else {
                    Path::new(&escaped_dir)
                        .join(&pattern)
                        .to_string_lossy()
                        .into_owned()
                }
            })
            .collect()
    }
}

impl Default for GlobDiscovery {
    fn default() -> Self {
        Self::new([DEFAULT_GLOB])
    }
}

impl FileDiscovery for GlobDiscovery {
    fn discover(&self, output_dir: &Path) -> LocalizeResult<Vec<PathBuf>> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut files = Vec::new();

        for pattern in self.resolve_patterns(output_dir) {
            let entries = glob(&pattern).map_err(|e| {
                LocalizeError::Config(format!("invalid glob pattern \"{}\": {}", pattern, e))
            })?;

            for entry in entries {
                let path = entry.map_err(|e| LocalizeError::Read {
                    path: e.path().to_path_buf(),
                    source: io::Error::from(e),
                })?;

                if path.is_file() && seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        tracing::debug!(count = files.len(), dir = %output_dir.display(), "discovered template files");
        Ok(files)
    }
}

impl<F> FileDiscovery for F
where
    F: Fn(&Path) -> LocalizeResult<Vec<PathBuf>>,
{
    fn discover(&self, output_dir: &Path) -> LocalizeResult<Vec<PathBuf>> {
        self(output_dir)
    }
}
