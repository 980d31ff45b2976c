//! Generic element tree handed over by the document parser
//!
//! The parser itself lives outside this crate. It delivers a tree of
//! [`Node`]s that the extraction step queries by tag name and attribute,
//! once, before anything else in the pipeline runs.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// One element of the source document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Tag without any `{namespace}` prefix
    pub fn local_name(&self) -> &str {
        match self.tag.rfind('}') {
            Some(pos) => &self.tag[pos + 1..],
            None => &self.tag,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.local_name() == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All descendants with the given tag, depth-first in document order
    pub fn descendants<'a, 't>(
        &'a self,
        tag: &'t str,
    ) -> impl Iterator<Item = &'a Node> + use<'a, 't> {
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        std::iter::from_fn(move || {
            while let Some(node) = stack.pop() {
                stack.extend(node.children.iter().rev());
                if node.is(tag) {
                    return Some(node);
                }
            }
            None
        })
    }

    pub fn first_descendant(&self, tag: &str) -> Option<&Node> {
        self.descendants(tag).next()
    }

    /// Direct children with the given tag
    pub fn children_named<'a, 't>(
        &'a self,
        tag: &'t str,
    ) -> impl Iterator<Item = &'a Node> + use<'a, 't> {
        self.children.iter().filter(move |c| c.is(tag))
    }

    /// Attribute parsed as an unsigned integer
    pub fn attr_usize(&self, name: &str) -> Result<Option<usize>, ConvertError> {
        self.attr(name)
            .map(|v| {
                v.trim().parse().map_err(|_| ConvertError::InvalidNumber {
                    element: self.local_name().to_string(),
                    token: v.to_string(),
                })
            })
            .transpose()
    }

    pub fn floats(&self) -> Result<Vec<f32>, ConvertError> {
        parse_numbers(self.local_name(), &self.text)
    }

    pub fn uints(&self) -> Result<Vec<u32>, ConvertError> {
        parse_numbers(self.local_name(), &self.text)
    }

    pub fn ints(&self) -> Result<Vec<i32>, ConvertError> {
        parse_numbers(self.local_name(), &self.text)
    }

    /// Whitespace separated tokens, e.g. a `Name_array`
    pub fn tokens(&self) -> Vec<String> {
        self.text.split_whitespace().map(str::to_string).collect()
    }
}

/// Parse whitespace separated numbers, failing on the first bad token
pub fn parse_numbers<T: std::str::FromStr>(
    element: &str,
    text: &str,
) -> Result<Vec<T>, ConvertError> {
    text.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| ConvertError::InvalidNumber {
                element: element.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}
