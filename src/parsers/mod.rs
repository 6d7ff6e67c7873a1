//! # 解析器模块
//!
//! 这个模块包含模板文档的解析与序列化功能：
//!
//! - HTML解析和DOM操作
//! - 元素选择器匹配
//!
//! # 模块组织
//!
//! - `html` - HTML文档解析、DOM操作、选择器、序列化

pub mod html;

// Re-export commonly used items for convenience
pub use html::{
    get_node_attr, get_text_content, html_to_dom, serialize_document, set_inner_html,
    set_node_attr, SelectorList,
};
