//! 翻译表
//!
//! 翻译表是语言代码到 `key -> 文本` 映射的有序集合。语言的迭代顺序即声明顺序，
//! 从 JSON 加载时与文件中对象键的顺序一致（`serde_json` 的 `preserve_order`）。
//!
//! 支持的文件格式：
//!
//! - 单个 JSON 文件：`{"en": {"hello": "Hello"}, "fr": {"hello": "Bonjour"}}`
//! - 目录：每个 `<lang>.json` 文件包含一种语言，按文件名排序
//!
//! 嵌套对象会被展开为以点分隔的键，例如 `{"nav": {"home": "Home"}}` 得到 `nav.home`。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::core::{LocalizeError, LocalizeResult};
use crate::parsers::html::is_valid_language_segment;

/// 单一语言的翻译：key -> 文本
pub type Translations = HashMap<String, String>;

/// 按声明顺序保存的多语言翻译表
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslationTable {
    languages: Vec<(String, Translations)>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加（或替换）一种语言，便于链式构建
    pub fn with_language<I, K, V>(mut self, language: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let translations = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.insert(language, translations);
        self
    }

    /// 插入一种语言；已存在时替换其内容并保留原有位置
    pub fn insert(&mut self, language: &str, translations: Translations) {
        if let Some((_, existing)) = self
            .languages
            .iter_mut()
            .find(|(code, _)| code.as_str() == language)
        {
            *existing = translations;
        } else {
            self.languages.push((language.to_string(), translations));
        }
    }

    pub fn get(&self, language: &str) -> Option<&Translations> {
        self.languages
            .iter()
            .find(|(code, _)| code.as_str() == language)
            .map(|(_, translations)| translations)
    }

    /// 按声明顺序遍历语言
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Translations)> {
        self.languages
            .iter()
            .map(|(code, translations)| (code.as_str(), translations))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|(code, _)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// 校验翻译表：至少一种语言，且每个语言代码都能作为目录名
    pub fn validate(&self) -> LocalizeResult<()> {
        if self.is_empty() {
            return Err(LocalizeError::Config(
                "translations must declare at least one language".to_string(),
            ));
        }

        for language in self.languages() {
            if !is_valid_language_segment(language) {
                return Err(LocalizeError::Config(format!(
                    "language code \"{}\" cannot be used as a directory name",
                    language
                )));
            }
        }

        Ok(())
    }

    /// 从 JSON 文本解析 `{lang: {key: value}}`
    pub fn from_json_str(content: &str) -> LocalizeResult<Self> {
        let json: Value = serde_json::from_str(content)
            .map_err(|e| LocalizeError::Translations(format!("invalid JSON: {}", e)))?;

        let Value::Object(languages) = json else {
            return Err(LocalizeError::Translations(
                "top level must be an object of languages".to_string(),
            ));
        };

        let mut table = TranslationTable::new();
        for (language, entries) in languages {
            let Value::Object(entries) = entries else {
                return Err(LocalizeError::Translations(format!(
                    "translations for \"{}\" must be an object",
                    language
                )));
            };
            table.insert(&language, flatten_entries(&entries)?);
        }

        Ok(table)
    }

    /// 从单个 JSON 文件或包含 `<lang>.json` 文件的目录加载
    pub fn load(path: &Path) -> LocalizeResult<Self> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            let content = read_translation_file(path)?;
            Self::from_json_str(&content).map_err(|e| with_path(e, path))
        }
    }

    fn load_dir(dir: &Path) -> LocalizeResult<Self> {
        let entries = fs::read_dir(dir).map_err(|source| LocalizeError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LocalizeError::Read {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut table = TranslationTable::new();
        for file in files {
            let Some(language) = file.file_stem().and_then(|stem| stem.to_str()) else {
                return Err(LocalizeError::Translations(format!(
                    "{}: file name is not a valid language code",
                    file.display()
                )));
            };

            let content = read_translation_file(&file)?;
            let json: Value = serde_json::from_str(&content).map_err(|e| {
                LocalizeError::Translations(format!("{}: invalid JSON: {}", file.display(), e))
            })?;
            let Value::Object(entries) = json else {
                return Err(LocalizeError::Translations(format!(
                    "{}: top level must be an object of translations",
                    file.display()
                )));
            };

            let translations = flatten_entries(&entries).map_err(|e| with_path(e, &file))?;
            table.insert(language, translations);
        }

        Ok(table)
    }
}

fn read_translation_file(path: &Path) -> LocalizeResult<String> {
    fs::read_to_string(path).map_err(|source| LocalizeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn with_path(error: LocalizeError, path: &Path) -> LocalizeError {
    match error {
        LocalizeError::Translations(message) => {
            LocalizeError::Translations(format!("{}: {}", path.display(), message))
        }
        other => other,
    }
}

fn flatten_entries(entries: &Map<String, Value>) -> LocalizeResult<Translations> {
    let mut translations = Translations::new();
    for (key, value) in entries {
        flatten_value(key.clone(), value, &mut translations)?;
    }
    Ok(translations)
}

fn flatten_value(key: String, value: &Value, out: &mut Translations) -> LocalizeResult<()> {
    match value {
        Value::String(text) => insert_flat(key, text.clone(), out)?,
        Value::Number(number) => insert_flat(key, number.to_string(), out)?,
        Value::Bool(flag) => insert_flat(key, flag.to_string(), out)?,
        // null 视为未翻译
        Value::Null => {}
        Value::Object(children) => {
            for (child_key, child_value) in children {
                flatten_value(format!("{}.{}", key, child_key), child_value, out)?;
            }
        }
        Value::Array(_) => {
            return Err(LocalizeError::Translations(format!(
                "value for \"{}\" must not be an array",
                key
            )));
        }
    }
    Ok(())
}

// `"a.b"` 和 `{"a": {"b": ..}}` 展开后是同一个 key
fn insert_flat(key: String, text: String, out: &mut Translations) -> LocalizeResult<()> {
    if out.contains_key(&key) {
        return Err(LocalizeError::Translations(format!(
            "key \"{}\" is defined more than once",
            key
        )));
    }
    out.insert(key, text);
    Ok(())
}
