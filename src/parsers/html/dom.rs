use std::io;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::{format_tendril, TendrilSink};
use html5ever::{namespace_url, ns, parse_document, parse_fragment, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::utils::is_void_element;

/// 将 HTML 字节转换为 DOM
///
/// 按照给定的字符集标签解码输入；标签无法识别时按 UTF-8（有损）处理。
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> io::Result<RcDom> {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.into_owned()
    } else {
        String::from_utf8_lossy(data).into_owned()
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 按文档顺序收集满足条件的元素节点
pub fn find_elements<F>(node: &Handle, predicate: &F) -> Vec<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut found_nodes = Vec::new();
    collect_elements(node, predicate, &mut found_nodes);
    found_nodes
}

fn collect_elements<F>(node: &Handle, predicate: &F, found_nodes: &mut Vec<Handle>)
where
    F: Fn(&Handle) -> bool,
{
    if let NodeData::Element { .. } = node.data {
        if predicate(node) {
            found_nodes.push(node.clone());
        }
    }

    for child_node in node.children.borrow().iter() {
        collect_elements(child_node, predicate, found_nodes);
    }
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取文档的根元素（`<html>`）
pub fn get_document_element(dom: &RcDom) -> Option<Handle> {
    get_child_node_by_name(&dom.document, "html")
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点
///
/// `parent` 存放在 `Cell` 中，读取时需要取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak_parent = child.parent.take();
    let parent = weak_parent.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak_parent);
    parent
}

/// 获取父元素；文档节点不算作元素
pub fn get_parent_element(child: &Handle) -> Option<Handle> {
    get_parent_node(child).filter(|parent| matches!(parent.data, NodeData::Element { .. }))
}

/// 获取位于节点之前的兄弟元素，最近的排在最前
pub fn get_preceding_sibling_elements(node: &Handle) -> Vec<Handle> {
    let Some(parent) = get_parent_node(node) else {
        return Vec::new();
    };

    let children = parent.children.borrow();
    let position = children
        .iter()
        .position(|child| Rc::ptr_eq(child, node))
        .unwrap_or(0);

    children[..position]
        .iter()
        .rev()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// 设置节点属性
///
/// `attr_value` 为 `None` 时移除该属性。
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 获取节点的文本内容（所有后代文本节点拼接）
pub fn get_text_content(node: &Handle) -> String {
    let mut text = String::new();
    push_text_content(node, &mut text);
    text
}

fn push_text_content(node: &Handle, text: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        text.push_str(&contents.borrow());
    }

    for child_node in node.children.borrow().iter() {
        push_text_content(child_node, text);
    }
}

/// 移除节点的全部子节点
pub fn clear_children(node: &Handle) {
    for child_node in node.children.borrow_mut().drain(..) {
        child_node.parent.set(None);
    }
}

/// 用 HTML 片段替换元素的内部内容
///
/// 片段以目标元素为上下文进行解析，因此 `<td>`、`<option>` 等元素中的内容
/// 与浏览器中设置 `innerHTML` 的结果一致。非元素节点和 void 元素（`<input>`、
/// `<img>` 等）保持不变。
pub fn set_inner_html(node: &Handle, html: &str) -> io::Result<()> {
    let context_name = match &node.data {
        NodeData::Element { name, .. } => name.clone(),
        _ => return Ok(()),
    };

    if context_name.ns == ns!(html) && is_void_element(&context_name.local) {
        return Ok(());
    }

    clear_children(node);

    if html.is_empty() {
        return Ok(());
    }

    let fragment = parse_fragment(RcDom::default(), Default::default(), context_name, vec![])
        .from_utf8()
        .read_from(&mut html.as_bytes())?;

    // 片段解析的结果挂在一个合成的 <html> 根元素之下
    let fragment_root = match fragment.document.children.borrow().first() {
        Some(root) => root.clone(),
        None => return Ok(()),
    };

    let fragment_nodes: Vec<Handle> = fragment_root.children.borrow_mut().drain(..).collect();
    let mut children = node.children.borrow_mut();
    for fragment_node in fragment_nodes {
        fragment_node.parent.set(Some(Rc::downgrade(node)));
        children.push(fragment_node);
    }

    Ok(())
}
