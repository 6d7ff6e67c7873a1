// 集成测试公共模块
//
// 提供临时站点目录和翻译表等共享工具

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use localize_html::translations::TranslationTable;

pub const HELLO_TEMPLATE: &str = r#"<!DOCTYPE html><html><head><title>Site</title></head><body><div data-i18n="hello">x</div></body></html>"#;

pub const HELLO_TRANSLATIONS: &str = r#"{"en": {"hello": "Hello"}, "fr": {"hello": "Bonjour"}}"#;

/// 带有若干模板文件的临时输出目录
pub struct Site {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Site {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let site = Self::new();
        for (path, content) in files {
            site.write(path, content);
        }
        site
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn read_bytes(&self, relative: &str) -> Vec<u8> {
        fs::read(self.path(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}

pub fn hello_table() -> TranslationTable {
    TranslationTable::from_json_str(HELLO_TRANSLATIONS).unwrap()
}
