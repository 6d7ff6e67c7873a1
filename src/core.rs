use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use markup5ever_rcdom::{Handle, RcDom};
use thiserror::Error;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::discovery::{FileDiscovery, GlobDiscovery};
use crate::parsers::html::{
    get_node_attr, html_to_dom, serialize_document, set_inner_html, SelectorList,
};
use crate::translations::{TranslationTable, Translations};

/// 调用方提供的函数返回的错误
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// 调用方提供的函数的返回值
pub type HookResult<T> = Result<T, HookError>;

/// 可以失败的调用方函数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    GetTranslationKey,
    FormatTranslation,
    ModifyElement,
    ModifyDocumentBefore,
    ModifyDocumentAfter,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::GetTranslationKey => "get_translation_key",
            HookKind::FormatTranslation => "format_translation",
            HookKind::ModifyElement => "modify_element",
            HookKind::ModifyDocumentBefore => "modify_document_before",
            HookKind::ModifyDocumentAfter => "modify_document_after",
        };
        write!(f, "{}", name)
    }
}

/// Errors that abort a localization run
///
/// 所有错误都是致命的：运行在第一个错误处停止，不做重试。
/// 缺失翻译和空输入不是错误，它们只产生诊断。
#[derive(Error, Debug)]
pub enum LocalizeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("translation error: {0}")]
    Translations(String),

    #[error("{hook} failed for {} [{language}]: {source}", .file.display())]
    Hook {
        hook: HookKind,
        file: PathBuf,
        language: String,
        source: HookError,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to delete {}: {source}", .path.display())]
    Delete { path: PathBuf, source: io::Error },

    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize { path: PathBuf, source: io::Error },
}

pub type LocalizeResult<T> = Result<T, LocalizeError>;

/// 传给元素级函数的上下文
#[derive(Clone, Copy, Debug)]
pub struct TranslationMeta<'a> {
    pub key: &'a str,
    pub language: &'a str,
    pub translations: &'a Translations,
}

/// 传给文档级函数的上下文
#[derive(Clone, Copy, Debug)]
pub struct DocumentMeta<'a> {
    pub language: &'a str,
    pub translations: &'a Translations,
}

/// 从元素中提取翻译 key；`None` 表示跳过该元素
pub type KeyExtractor = Box<dyn Fn(&Handle) -> HookResult<Option<String>>>;
/// 把翻译值转换成要插入的 HTML
pub type FormatHook = Box<dyn Fn(&str, &TranslationMeta<'_>) -> HookResult<String>>;
/// 替换内容之后修改元素，收到的是格式化之前的值
pub type ElementHook = Box<dyn Fn(&Handle, &str, &TranslationMeta<'_>) -> HookResult<()>>;
pub type DocumentHook = Box<dyn Fn(&RcDom, &DocumentMeta<'_>) -> HookResult<()>>;
/// 决定某个缺失翻译是否需要报告：`(key, language, translations)`
pub type MissingFilter = Box<dyn Fn(&str, &str, &Translations) -> bool>;

/// Options for [`localize_html_files`]
///
/// `translations`、`selector` 和 `get_translation_key` 是必需的，其余都有默认值。
pub struct LocalizeOptions {
    pub discovery: Box<dyn FileDiscovery>,
    pub translations: TranslationTable,
    pub selector: String,
    pub get_translation_key: KeyExtractor,
    pub format_translation: Option<FormatHook>,
    pub modify_element: Option<ElementHook>,
    pub modify_document_before: Option<DocumentHook>,
    pub modify_document_after: Option<DocumentHook>,
    pub delete_source_html_files: bool,
    pub verbose: bool,
    pub missing_translation_verbose_filter: Option<MissingFilter>,
    pub encoding: Option<String>,
}

impl LocalizeOptions {
    pub fn new<F>(translations: TranslationTable, selector: &str, get_translation_key: F) -> Self
    where
        F: Fn(&Handle) -> HookResult<Option<String>> + 'static,
    {
        Self {
            discovery: Box::new(GlobDiscovery::default()),
            translations,
            selector: selector.to_string(),
            get_translation_key: Box::new(get_translation_key),
            format_translation: None,
            modify_element: None,
            modify_document_before: None,
            modify_document_after: None,
            delete_source_html_files: false,
            verbose: true,
            missing_translation_verbose_filter: None,
            encoding: None,
        }
    }

    pub fn with_discovery<D>(mut self, discovery: D) -> Self
    where
        D: FileDiscovery + 'static,
    {
        self.discovery = Box::new(discovery);
        self
    }

    pub fn with_format_translation<F>(mut self, format: F) -> Self
    where
        F: Fn(&str, &TranslationMeta<'_>) -> HookResult<String> + 'static,
    {
        self.format_translation = Some(Box::new(format));
        self
    }

    pub fn with_modify_element<F>(mut self, modify: F) -> Self
    where
        F: Fn(&Handle, &str, &TranslationMeta<'_>) -> HookResult<()> + 'static,
    {
        self.modify_element = Some(Box::new(modify));
        self
    }

    pub fn with_modify_document_before<F>(mut self, modify: F) -> Self
    where
        F: Fn(&RcDom, &DocumentMeta<'_>) -> HookResult<()> + 'static,
    {
        self.modify_document_before = Some(Box::new(modify));
        self
    }

    pub fn with_modify_document_after<F>(mut self, modify: F) -> Self
    where
        F: Fn(&RcDom, &DocumentMeta<'_>) -> HookResult<()> + 'static,
    {
        self.modify_document_after = Some(Box::new(modify));
        self
    }

    pub fn with_delete_source_html_files(mut self, delete: bool) -> Self {
        self.delete_source_html_files = delete;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_missing_translation_verbose_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &str, &Translations) -> bool + 'static,
    {
        self.missing_translation_verbose_filter = Some(Box::new(filter));
        self
    }

    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = Some(encoding.to_string());
        self
    }

    /// 校验选项并返回解析后的选择器
    pub fn validate(&self) -> LocalizeResult<SelectorList> {
        self.translations.validate()?;

        let encoding_validator = EncodingValidator::new();
        encoding_validator.validate_options(self)?;

        if self.selector.trim().is_empty() {
            return Err(LocalizeError::Config("selector must not be empty".to_string()));
        }

        SelectorList::parse(&self.selector).map_err(|e| {
            LocalizeError::Config(format!("invalid selector \"{}\": {}", self.selector, e))
        })
    }

    /// 输入和输出使用的字符编码
    pub fn document_encoding(&self) -> &str {
        self.encoding.as_deref().unwrap_or("utf-8")
    }

    fn should_report_missing(&self, key: &str, language: &str, translations: &Translations) -> bool {
        self.verbose
            && self
                .missing_translation_verbose_filter
                .as_ref()
                .map_or(true, |filter| filter(key, language, translations))
    }
}

impl fmt::Debug for LocalizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizeOptions")
            .field("translations", &self.translations)
            .field("selector", &self.selector)
            .field("format_translation", &self.format_translation.is_some())
            .field("modify_element", &self.modify_element.is_some())
            .field("modify_document_before", &self.modify_document_before.is_some())
            .field("modify_document_after", &self.modify_document_after.is_some())
            .field("delete_source_html_files", &self.delete_source_html_files)
            .field("verbose", &self.verbose)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// 读取属性值作为翻译 key
///
/// ```
/// use localize_html::core::{key_from_attribute, LocalizeOptions};
/// use localize_html::translations::TranslationTable;
///
/// let table = TranslationTable::new().with_language("en", [("hello", "Hello")]);
/// let options = LocalizeOptions::new(table, "[data-i18n]", key_from_attribute("data-i18n"));
/// assert_eq!(options.selector, "[data-i18n]");
/// ```
pub fn key_from_attribute(attr_name: &str) -> impl Fn(&Handle) -> HookResult<Option<String>> {
    let attr_name = attr_name.to_string();
    move |node: &Handle| Ok(get_node_attr(node, &attr_name))
}

/// Localizes every discovered template into one copy per language
///
/// 对每种语言（按翻译表顺序）和每个模板文件（按发现顺序）：
/// 重新解析文档，依次执行 before 钩子、逐元素替换、after 钩子，
/// 然后写入 `<dir>/<language>/<name>`。启用删除时，源文件在所有语言
/// 都写完之后才删除，中途失败的运行不会删除任何源文件。
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use localize_html::core::{key_from_attribute, localize_html_files, LocalizeOptions};
/// use localize_html::translations::TranslationTable;
///
/// let table = TranslationTable::new()
///     .with_language("en", [("hello", "Hello")])
///     .with_language("fr", [("hello", "Bonjour")]);
/// let options = LocalizeOptions::new(table, "[data-i18n]", key_from_attribute("data-i18n"));
///
/// let diagnostics = localize_html_files(Path::new("dist"), &options).unwrap();
/// println!("{} files written", diagnostics.artifact_count());
/// ```
pub fn localize_html_files(
    output_dir: &Path,
    options: &LocalizeOptions,
) -> LocalizeResult<Diagnostics> {
    let selector = options.validate()?;
    let mut diagnostics = Diagnostics::with_verbose(options.verbose);

    let mut files = options.discovery.discover(output_dir)?;
    let mut seen = HashSet::new();
    files.retain(|file| seen.insert(file.clone()));

    if files.is_empty() {
        diagnostics.record(DiagnosticKind::DiscoveryEmpty {
            output_dir: output_dir.to_path_buf(),
        });
        return Ok(diagnostics);
    }

    tracing::info!(
        files = files.len(),
        languages = options.translations.len(),
        dir = %output_dir.display(),
        "localizing templates"
    );

    let processor = DocumentProcessor::new(options, &selector);
    let writer = OutputWriter::new();

    for (language, translations) in options.translations.iter() {
        for source in &files {
            let artifact = processor.process_file(source, language, translations, &mut diagnostics)?;
            let destination = writer.write(&artifact)?;
            diagnostics.record(DiagnosticKind::ArtifactWritten {
                source: artifact.source,
                language: artifact.language,
                destination,
            });
        }
    }

    if options.delete_source_html_files {
        for source in &files {
            writer.delete_source(source)?;
            diagnostics.record(DiagnosticKind::SourceDeleted {
                path: source.clone(),
            });
        }
    }

    Ok(diagnostics)
}

/// 输出路径：`<dir(source)>/<language>/<base(source)>`
pub fn format_output_path(source: &Path, language: &str) -> PathBuf {
    let file_name = source.file_name().unwrap_or_default();

    source
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(language)
        .join(file_name)
}

/// 一份本地化后的文档
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputArtifact {
    pub source: PathBuf,
    pub language: String,
    pub html: Vec<u8>,
}

impl OutputArtifact {
    pub fn destination(&self) -> PathBuf {
        format_output_path(&self.source, &self.language)
    }
}

/// 文档处理器，负责单个 (文件, 语言) 的完整处理流程
pub struct DocumentProcessor<'a> {
    options: &'a LocalizeOptions,
    selector: &'a SelectorList,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(options: &'a LocalizeOptions, selector: &'a SelectorList) -> Self {
        Self { options, selector }
    }

    /// 读取并处理一个模板文件
    pub fn process_file(
        &self,
        source: &Path,
        language: &str,
        translations: &Translations,
        diagnostics: &mut Diagnostics,
    ) -> LocalizeResult<OutputArtifact> {
        let data = fs::read(source).map_err(|e| LocalizeError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;

        let html = self.process_document(source, &data, language, translations, diagnostics)?;

        Ok(OutputArtifact {
            source: source.to_path_buf(),
            language: language.to_string(),
            html,
        })
    }

    /// 处理文档数据并返回序列化结果
    pub fn process_document(
        &self,
        source: &Path,
        data: &[u8],
        language: &str,
        translations: &Translations,
        diagnostics: &mut Diagnostics,
    ) -> LocalizeResult<Vec<u8>> {
        tracing::debug!(file = %source.display(), language, "processing document");

        // 1. 解析（每个语言都重新解析，互不影响）
        let encoding = self.options.document_encoding();
        let dom = html_to_dom(data, encoding).map_err(|e| LocalizeError::Parse {
            path: source.to_path_buf(),
            source: e,
        })?;

        let document_meta = DocumentMeta {
            language,
            translations,
        };

        // 2. before 钩子
        if let Some(modify) = &self.options.modify_document_before {
            modify(&dom, &document_meta).map_err(|e| {
                hook_error(HookKind::ModifyDocumentBefore, source, language, e)
            })?;
        }

        // 3. 选择元素，文档顺序
        let elements = self.selector.select(&dom);

        // 4. 逐元素替换
        for element in &elements {
            self.process_element(element, source, language, translations, diagnostics)?;
        }

        // 5. after 钩子
        if let Some(modify) = &self.options.modify_document_after {
            modify(&dom, &document_meta).map_err(|e| {
                hook_error(HookKind::ModifyDocumentAfter, source, language, e)
            })?;
        }

        // 6. 序列化
        serialize_document(&dom, encoding).map_err(|e| LocalizeError::Serialize {
            path: source.to_path_buf(),
            source: e,
        })
    }

    fn process_element(
        &self,
        element: &Handle,
        source: &Path,
        language: &str,
        translations: &Translations,
        diagnostics: &mut Diagnostics,
    ) -> LocalizeResult<()> {
        let key = match (self.options.get_translation_key)(element)
            .map_err(|e| hook_error(HookKind::GetTranslationKey, source, language, e))?
        {
            Some(key) => key,
            None => return Ok(()),
        };

        let value = match translations.get(&key) {
            Some(value) => value.as_str(),
            None => {
                if self.options.should_report_missing(&key, language, translations) {
                    diagnostics.record(DiagnosticKind::MissingTranslation {
                        key: key.clone(),
                        language: language.to_string(),
                        file: source.to_path_buf(),
                    });
                }
                ""
            }
        };

        let meta = TranslationMeta {
            key: &key,
            language,
            translations,
        };

        let rendered = match &self.options.format_translation {
            Some(format) => format(value, &meta)
                .map_err(|e| hook_error(HookKind::FormatTranslation, source, language, e))?,
            None => value.to_string(),
        };

        set_inner_html(element, &rendered).map_err(|e| LocalizeError::Parse {
            path: source.to_path_buf(),
            source: e,
        })?;

        if let Some(modify) = &self.options.modify_element {
            modify(element, value, &meta)
                .map_err(|e| hook_error(HookKind::ModifyElement, source, language, e))?;
        }

        Ok(())
    }
}

fn hook_error(hook: HookKind, file: &Path, language: &str, source: HookError) -> LocalizeError {
    LocalizeError::Hook {
        hook,
        file: file.to_path_buf(),
        language: language.to_string(),
        source,
    }
}

/// 编码验证器
pub struct EncodingValidator;

impl EncodingValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_options(&self, options: &LocalizeOptions) -> LocalizeResult<()> {
        match &options.encoding {
            Some(encoding) => self.validate_label(encoding),
            None => Ok(()),
        }
    }

    /// 编码标签必须能被 encoding_rs 识别，且不是 replacement 编码
    pub fn validate_label(&self, label: &str) -> LocalizeResult<()> {
        if Encoding::for_label_no_replacement(label.as_bytes()).is_none() {
            return Err(LocalizeError::Config(format!("unknown encoding \"{}\"", label)));
        }
        Ok(())
    }
}

impl Default for EncodingValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// 输出写入器
///
/// 语言目录用 `create_dir_all` 创建，已存在的输出文件直接覆盖。
pub struct OutputWriter;

impl OutputWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, artifact: &OutputArtifact) -> LocalizeResult<PathBuf> {
        let destination = artifact.destination();

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| LocalizeError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(&destination, &artifact.html).map_err(|e| LocalizeError::Write {
            path: destination.clone(),
            source: e,
        })?;

        Ok(destination)
    }

    pub fn delete_source(&self, source: &Path) -> LocalizeResult<()> {
        fs::remove_file(source).map_err(|e| LocalizeError::Delete {
            path: source.to_path_buf(),
            source: e,
        })
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}
