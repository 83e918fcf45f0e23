//! Mapping-template language.
//!
//! Templates are plain text with a handful of tags:
//!
//! - `{{ path.to.value }}` substitutes a value from the JSON data context.
//!   Strings are written raw, `null` as nothing, arrays and objects as compact
//!   JSON.
//! - `{{> name }}` includes a partial (the request or response fragment).
//! - `{{#if path }} .. {{else}} .. {{/if}}` renders a branch on truthiness.
//!   A missing path counts as false.
//!
//! A substitution whose path does not resolve is an execution error.

use crate::error::RenderError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("Invalid template tag regex"));
static PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("Invalid template path regex")
});

const MAX_PARTIAL_DEPTH: usize = 8;

/// Named partials available to `{{> name }}`.
pub type Partials = HashMap<String, Template>;

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Text(String),
    Value(String),
    Partial(String),
    If {
        path: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

struct Frame {
    path: String,
    then: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [Frame]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(Frame {
            otherwise: Some(nodes),
            ..
        }) => nodes,
        Some(frame) => &mut frame.then,
        None => root,
    }
}

/// Parse template source. `name` is used in error messages only.
pub fn compile(name: &str, source: &str) -> Result<Template, RenderError> {
    let syntax = |message: String| RenderError::TemplateSyntax {
        name: name.to_string(),
        message,
    };
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let push_text = |nodes: &mut Vec<Node>, text: &str| -> Result<(), RenderError> {
        if text.contains("{{") {
            return Err(syntax("unterminated '{{' tag".to_string()));
        }
        if !text.is_empty() {
            nodes.push(Node::Text(text.to_string()));
        }
        Ok(())
    };

    let mut last = 0;
    for m in TAG_REGEX.find_iter(source) {
        push_text(current(&mut root, &mut stack), &source[last..m.start()])?;
        last = m.end();

        let tag = m.as_str();
        let inner = tag[2..tag.len() - 2].trim();
        if let Some(partial) = inner.strip_prefix('>') {
            let partial = partial.trim();
            if !PATH_REGEX.is_match(partial) {
                return Err(syntax(format!("invalid partial name in '{}'", tag)));
            }
            current(&mut root, &mut stack).push(Node::Partial(partial.to_string()));
        } else if let Some(path) = inner.strip_prefix("#if") {
            let path = path.trim();
            if !PATH_REGEX.is_match(path) {
                return Err(syntax(format!("invalid condition in '{}'", tag)));
            }
            stack.push(Frame {
                path: path.to_string(),
                then: Vec::new(),
                otherwise: None,
            });
        } else if inner == "else" {
            match stack.last_mut() {
                Some(frame) if frame.otherwise.is_none() => frame.otherwise = Some(Vec::new()),
                _ => return Err(syntax("'{{else}}' outside of '{{#if}}'".to_string())),
            }
        } else if inner == "/if" {
            let frame = stack
                .pop()
                .ok_or_else(|| syntax("'{{/if}}' without matching '{{#if}}'".to_string()))?;
            current(&mut root, &mut stack).push(Node::If {
                path: frame.path,
                then: frame.then,
                otherwise: frame.otherwise.unwrap_or_default(),
            });
        } else if PATH_REGEX.is_match(inner) {
            current(&mut root, &mut stack).push(Node::Value(inner.to_string()));
        } else {
            return Err(syntax(format!("invalid tag '{}'", tag)));
        }
    }
    push_text(current(&mut root, &mut stack), &source[last..])?;

    if let Some(frame) = stack.last() {
        return Err(syntax(format!("unclosed '{{{{#if {}}}}}'", frame.path)));
    }
    Ok(Template {
        name: name.to_string(),
        nodes: root,
    })
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, context: &Value, partials: &Partials) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_nodes(&self.nodes, context, partials, 0, &mut out)?;
        Ok(out)
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        context: &Value,
        partials: &Partials,
        depth: usize,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Value(path) => {
                    let value = lookup(context, path)
                        .ok_or_else(|| self.execution(format!("no value at '{}'", path)))?;
                    write_value(value, out);
                }
                Node::Partial(name) => {
                    if depth >= MAX_PARTIAL_DEPTH {
                        return Err(self.execution(format!("partial '{}' nested too deeply", name)));
                    }
                    let partial = partials
                        .get(name)
                        .ok_or_else(|| self.execution(format!("unknown partial '{}'", name)))?;
                    partial.render_nodes(&partial.nodes, context, partials, depth + 1, out)?;
                }
                Node::If {
                    path,
                    then,
                    otherwise,
                } => {
                    let branch = if lookup(context, path).is_some_and(truthy) {
                        then
                    } else {
                        otherwise
                    };
                    self.render_nodes(branch, context, partials, depth, out)?;
                }
            }
        }
        Ok(())
    }

    fn execution(&self, message: String) -> RenderError {
        RenderError::TemplateExecution {
            name: self.name.clone(),
            message,
        }
    }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |value, key| value.get(key))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}
