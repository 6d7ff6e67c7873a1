//! # localize-html
//!
//! 把一组 HTML 模板生成为按语言划分的静态副本：对每个选中的元素提取翻译 key，
//! 替换为对应语言的内容，并写入 `<dir>/<language>/<name>.html`。
//!
//! ## 模块组织
//!
//! - `core` - 核心处理流程、运行选项和错误类型
//! - `parsers` - HTML 解析、元素选择器和序列化
//! - `translations` - 翻译表的加载和查询
//! - `discovery` - 模板文件发现
//! - `diagnostics` - 运行诊断和汇总
//! - `config` - 配置文件管理
//! - `env` - 环境变量
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use localize_html::{key_from_attribute, localize_html_files, LocalizeOptions, TranslationTable};
//!
//! let table = TranslationTable::new()
//!     .with_language("en", [("hello", "Hello")])
//!     .with_language("fr", [("hello", "Bonjour")]);
//! let options = LocalizeOptions::new(table, "[data-i18n]", key_from_attribute("data-i18n"))
//!     .with_delete_source_html_files(true);
//!
//! localize_html_files(Path::new("dist"), &options).unwrap();
//! ```

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod discovery;
pub mod env;
pub mod parsers;
pub mod translations;

// Re-export commonly used items for convenience
pub use crate::config::{ConfigManager, ContentMode, LocalizeConfig};
pub use crate::core::*;
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use crate::discovery::{FileDiscovery, GlobDiscovery};
pub use crate::translations::{TranslationTable, Translations};
