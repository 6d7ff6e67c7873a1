//! HTML解析和处理模块
//!
//! - `utils`: 基础工具函数和常量
//! - `dom`: 基础DOM操作（解析、属性、内部内容）
//! - `selector`: 元素选择器的解析与匹配
//! - `serializer`: 序列化功能

pub mod dom;
pub mod selector;
pub mod serializer;
pub mod utils;

pub use dom::{
    clear_children, find_elements, get_child_node_by_name, get_document_element, get_node_attr,
    get_node_name, get_parent_element, get_parent_node, get_text_content, html_to_dom,
    set_inner_html, set_node_attr,
};
pub use selector::SelectorList;
pub use serializer::{serialize_document, serialize_node_children};
pub use utils::{
    is_valid_language_segment, is_void_element, split_html_whitespace, VOID_ELEMENTS, WHITESPACES,
};
