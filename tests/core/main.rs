#[path = "../common/mod.rs"]
mod common;

mod localize_html_files;
