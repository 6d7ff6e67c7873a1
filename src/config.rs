//! 配置管理
//!
//! 提供统一的配置接口，支持配置文件（TOML 或 JSON）、`.env` 文件、环境变量和默认值。
//! 优先级从低到高：默认值、配置文件、环境变量、CLI 参数（由调用方应用）。

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::core::{
    key_from_attribute, EncodingValidator, LocalizeError, LocalizeOptions, LocalizeResult,
};
use crate::discovery::{GlobDiscovery, DEFAULT_GLOB};
use crate::env::EnvConfig;
use crate::parsers::html::{get_document_element, set_node_attr};
use crate::translations::TranslationTable;

/// 未指定配置文件时按顺序查找
pub const CONFIG_PATHS: &[&str] = &[
    "localize-html.toml",
    ".localize-html.toml",
    "localize-html.json",
];

const ENV_FILES: &[&str] = &[".env.local", ".env"];

pub const DEFAULT_SELECTOR: &str = "[data-i18n]";
pub const DEFAULT_KEY_ATTRIBUTE: &str = "data-i18n";

/// 翻译值插入元素的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// 作为 HTML 片段插入
    #[default]
    Html,
    /// 转义后作为纯文本插入
    Text,
}

/// 本地化配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocalizeConfig {
    /// 翻译文件或目录；相对路径相对于配置文件所在目录
    pub translations: Option<PathBuf>,
    pub selector: String,
    pub key_attribute: String,
    pub glob: Vec<String>,
    pub delete_source_html_files: bool,
    pub verbose: bool,
    /// 匹配的 key 缺失时不报告
    pub ignore_missing: Vec<String>,
    pub content: ContentMode,
    /// 在每份输出的 `<html>` 上设置 `lang`
    pub set_lang_attribute: bool,
    pub encoding: Option<String>,
}

impl Default for LocalizeConfig {
    fn default() -> Self {
        Self {
            translations: None,
            selector: DEFAULT_SELECTOR.to_string(),
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
            glob: vec![DEFAULT_GLOB.to_string()],
            delete_source_html_files: false,
            verbose: true,
            ignore_missing: Vec::new(),
            content: ContentMode::Html,
            set_lang_attribute: false,
            encoding: None,
        }
    }
}

impl LocalizeConfig {
    /// 验证配置
    pub fn validate(&self) -> LocalizeResult<()> {
        if self.selector.trim().is_empty() {
            return Err(LocalizeError::Config("selector must not be empty".to_string()));
        }

        if self.key_attribute.trim().is_empty() {
            return Err(LocalizeError::Config(
                "key_attribute must not be empty".to_string(),
            ));
        }

        if self.glob.is_empty() {
            return Err(LocalizeError::Config(
                "glob must contain at least one pattern".to_string(),
            ));
        }

        self.compile_ignore_patterns()?;

        if let Some(encoding) = &self.encoding {
            EncodingValidator::new().validate_label(encoding)?;
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self, env: &EnvConfig) {
        if let Some(verbose) = env.verbose {
            self.verbose = verbose;
        }

        if let Some(delete) = env.delete_sources {
            self.delete_source_html_files = delete;
            tracing::info!("环境变量覆盖 delete_source_html_files: {}", delete);
        }
    }

    /// 把相对的翻译路径解析为相对于 `base_dir`
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if let Some(translations) = &self.translations {
            if translations.is_relative() {
                self.translations = Some(base_dir.join(translations));
            }
        }
    }

    fn compile_ignore_patterns(&self) -> LocalizeResult<Vec<Regex>> {
        self.ignore_missing
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    LocalizeError::Config(format!(
                        "invalid ignore_missing pattern \"{}\": {}",
                        pattern, e
                    ))
                })
            })
            .collect()
    }

    /// 加载翻译表并构建运行选项
    pub fn build_options(&self) -> LocalizeResult<LocalizeOptions> {
        self.validate()?;

        let path = self.translations.as_ref().ok_or_else(|| {
            LocalizeError::Config("no translations file configured".to_string())
        })?;
        let translations = TranslationTable::load(path)?;

        let mut options = LocalizeOptions::new(
            translations,
            &self.selector,
            key_from_attribute(&self.key_attribute),
        )
        .with_discovery(GlobDiscovery::new(self.glob.clone()))
        .with_delete_source_html_files(self.delete_source_html_files)
        .with_verbose(self.verbose);

        if let Some(encoding) = &self.encoding {
            options = options.with_encoding(encoding);
        }

        let ignored = self.compile_ignore_patterns()?;
        if !ignored.is_empty() {
            options = options.with_missing_translation_verbose_filter(move |key, _, _| {
                !ignored.iter().any(|pattern| pattern.is_match(key))
            });
        }

        if self.content == ContentMode::Text {
            options = options.with_format_translation(|value, _| {
                Ok(html_escape::encode_text(value).into_owned())
            });
        }

        if self.set_lang_attribute {
            options = options.with_modify_document_before(|dom, meta| {
                if let Some(html) = get_document_element(dom) {
                    set_node_attr(&html, "lang", Some(meta.language.to_string()));
                }
                Ok(())
            });
        }

        Ok(options)
    }
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    config: LocalizeConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 加载配置
    ///
    /// 查找顺序：`explicit`、`LOCALIZE_HTML_CONFIG`、当前目录下的 [`CONFIG_PATHS`]。
    /// 都不存在时使用默认配置。
    pub fn load(explicit: Option<&Path>) -> LocalizeResult<Self> {
        Self::load_dotenv();

        let env = EnvConfig::from_env().map_err(|e| LocalizeError::Config(e.to_string()))?;

        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env
                .config_path
                .clone()
                .or_else(|| Self::find_config_in(Path::new("."))),
        };

        let mut manager = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("未找到配置文件，使用默认配置");
                Self {
                    config: LocalizeConfig::default(),
                    source: None,
                }
            }
        };

        manager.config.apply_env_overrides(&env);
        manager.config.validate()?;

        Ok(manager)
    }

    /// 从指定文件加载配置，不读取环境变量
    pub fn from_file(path: &Path) -> LocalizeResult<Self> {
        tracing::info!("加载配置文件: {}", path.display());

        let mut config = Self::load_from_file(path)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }

        Ok(Self {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    /// 在目录中查找第一个存在的配置文件
    pub fn find_config_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_PATHS
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn config(&self) -> &LocalizeConfig {
        &self.config
    }

    pub fn into_config(self) -> LocalizeConfig {
        self.config
    }

    /// 配置来源文件
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn load_from_file(path: &Path) -> LocalizeResult<LocalizeConfig> {
        let content = fs::read_to_string(path).map_err(|e| LocalizeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| {
                LocalizeError::Config(format!("{}: invalid JSON config: {}", path.display(), e))
            })
        } else {
            toml::from_str(&content).map_err(|e| {
                LocalizeError::Config(format!("{}: invalid TOML config: {}", path.display(), e))
            })
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::debug!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }
}
