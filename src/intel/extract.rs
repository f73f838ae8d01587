// Symbol and edge extraction from parsed trees

use tree_sitter::{Node, Tree};

use super::parser::LanguageSpec;
use super::{EdgeKind, EdgeRecord, SymbolKind, SymbolRecord};

/// Walk a parse tree and collect declarations and edges. One walker serves
/// every language; the spec's node-kind tables say what to look for and a
/// few per-language quirks are keyed off the spec tag.
pub fn extract(
    tree: &Tree,
    source: &str,
    spec: &LanguageSpec,
) -> (Vec<SymbolRecord>, Vec<EdgeRecord>) {
    let mut walker = Walker {
        source,
        spec,
        symbols: Vec::new(),
        edges: Vec::new(),
        scope: Vec::new(),
    };
    walker.walk(tree.root_node());
    (walker.symbols, walker.edges)
}

struct Scope {
    name: String,
    is_class: bool,
}

struct Walker<'a> {
    source: &'a str,
    spec: &'a LanguageSpec,
    symbols: Vec<SymbolRecord>,
    edges: Vec<EdgeRecord>,
    /// Enclosing declarations, innermost last
    scope: Vec<Scope>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: Node<'a>) {
        let kind = node.kind();

        if self.spec.function_kinds.contains(&kind) {
            self.on_function(node);
            return;
        }
        if self.spec.class_kinds.contains(&kind) {
            self.on_container(node, SymbolKind::Class);
            return;
        }
        if self.spec.module_kinds.contains(&kind) {
            self.on_container(node, SymbolKind::Module);
            return;
        }
        if self.spec.variable_kinds.contains(&kind) {
            self.on_variable(node, SymbolKind::Variable);
        } else if self.spec.constant_kinds.contains(&kind) {
            self.on_variable(node, SymbolKind::Constant);
        } else if self.spec.import_kinds.contains(&kind) {
            self.on_import(node);
        } else if self.spec.export_kinds.contains(&kind) {
            self.on_export(node);
        } else if self.spec.call_kinds.contains(&kind) {
            self.on_call(node);
        } else if kind == "impl_item" {
            // Rust impl blocks contribute scope (their functions become
            // methods of the type) without being symbols themselves.
            self.walk_impl(node);
            return;
        }

        self.walk_children(node);
    }

    fn walk_children(&mut self, node: Node<'a>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn on_function(&mut self, node: Node<'a>) {
        let Some(name) = self.field_text(node, "name") else {
            self.walk_children(node);
            return;
        };

        let in_class = self.scope.last().map(|s| s.is_class).unwrap_or(false);
        let kind = if in_class {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let signature = node
            .child_by_field_name("parameters")
            .map(|params| format!("{}{}", name, self.text(params)));

        self.push_symbol(node, &name, kind, signature);
        self.scope.push(Scope {
            name,
            is_class: false,
        });
        self.walk_children(node);
        self.scope.pop();
    }

    fn on_container(&mut self, node: Node<'a>, kind: SymbolKind) {
        let Some(name) = self.field_text(node, "name") else {
            self.walk_children(node);
            return;
        };

        self.push_symbol(node, &name, kind, None);
        self.scope.push(Scope {
            name,
            is_class: kind == SymbolKind::Class,
        });
        self.walk_children(node);
        self.scope.pop();
    }

    fn walk_impl(&mut self, node: Node<'a>) {
        let type_name = node
            .child_by_field_name("type")
            .map(|t| self.text(t))
            .unwrap_or_default();
        self.scope.push(Scope {
            name: type_name,
            is_class: true,
        });
        self.walk_children(node);
        self.scope.pop();
    }

    fn on_variable(&mut self, node: Node<'a>, default_kind: SymbolKind) {
        // Only module-level bindings become symbols; locals are noise.
        if !self.scope.is_empty() {
            return;
        }

        let name = match self.spec.tag {
            // Python assignment: identifier on the left-hand side
            "python" => node
                .child_by_field_name("left")
                .filter(|n| n.kind() == "identifier")
                .map(|n| self.text(n)),
            _ => self.field_text(node, "name"),
        };
        let Some(name) = name else { return };

        // Python __all__ entries are the language's export declarations.
        if self.spec.tag == "python" && name == "__all__" {
            self.python_all_exports(node);
            return;
        }

        let kind = if default_kind == SymbolKind::Variable
            && !name.is_empty()
            && name.chars().all(|c| !c.is_ascii_lowercase())
        {
            SymbolKind::Constant
        } else {
            default_kind
        };
        self.push_symbol(node, &name, kind, None);
    }

    fn python_all_exports(&mut self, node: Node<'a>) {
        let Some(right) = node.child_by_field_name("right") else {
            return;
        };
        let mut cursor = right.walk();
        for child in right.named_children(&mut cursor) {
            if child.kind() == "string" {
                let name = self.text(child);
                self.push_edge(EdgeKind::Exports, strip_quotes(&name), node);
            }
        }
    }

    fn on_import(&mut self, node: Node<'a>) {
        match self.spec.tag {
            "python" => match node.kind() {
                // import a.b, c (aliases import the real module name)
                "import_statement" => {
                    let mut cursor = node.walk();
                    for child in node.named_children(&mut cursor) {
                        match child.kind() {
                            "dotted_name" => {
                                let target = self.text(child);
                                self.push_edge(EdgeKind::Imports, &target, node);
                            }
                            "aliased_import" => {
                                if let Some(target) = self.field_text(child, "name") {
                                    self.push_edge(EdgeKind::Imports, &target, node);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                // from a.b import x
                _ => {
                    if let Some(module) = self.field_text(node, "module_name") {
                        self.push_edge(EdgeKind::Imports, &module, node);
                    }
                }
            },
            "javascript" => {
                if let Some(source) = self.field_text(node, "source") {
                    self.push_edge(EdgeKind::Imports, strip_quotes(&source), node);
                }
            }
            _ => {
                // Rust use declarations carry the full path text.
                if let Some(argument) = self.field_text(node, "argument") {
                    self.push_edge(EdgeKind::Imports, &argument, node);
                }
            }
        }
    }

    fn on_export(&mut self, node: Node<'a>) {
        // export function f() {} / export class C {} / export { a, b }
        if let Some(declaration) = node.child_by_field_name("declaration") {
            if let Some(name) = self.field_text(declaration, "name") {
                self.push_edge(EdgeKind::Exports, &name, node);
            }
        } else {
            let mut names = Vec::new();
            collect_export_names(node, self.source, &mut names);
            for name in names {
                self.push_edge(EdgeKind::Exports, &name, node);
            }
        }
        // walk() recurses afterwards, so the exported declaration and any
        // nested calls still get visited.
    }

    fn on_call(&mut self, node: Node<'a>) {
        if let Some(function) = node.child_by_field_name("function") {
            if let Some(callee) = self.callee_name(function) {
                self.push_edge(EdgeKind::References, &callee, node);
            }
        }
    }

    /// The rightmost identifier of a callee expression: `obj.method()`
    /// references `method`, `mod::f()` references `f`.
    fn callee_name(&self, node: Node<'a>) -> Option<String> {
        match node.kind() {
            "identifier" | "property_identifier" | "field_identifier" => Some(self.text(node)),
            "attribute" => self.field_text(node, "attribute"),
            "member_expression" => self.field_text(node, "property"),
            "scoped_identifier" => self.field_text(node, "name"),
            "field_expression" => self.field_text(node, "field"),
            "generic_function" => node
                .child_by_field_name("function")
                .and_then(|f| self.callee_name(f)),
            "parenthesized_expression" => {
                node.named_child(0).and_then(|inner| self.callee_name(inner))
            }
            _ => None,
        }
    }

    // --- Record helpers ---

    fn push_symbol(&mut self, node: Node<'a>, name: &str, kind: SymbolKind, signature: Option<String>) {
        self.symbols.push(SymbolRecord {
            name: name.to_string(),
            kind,
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            signature,
            parent: self.scope.last().map(|s| s.name.clone()),
        });
    }

    fn push_edge(&mut self, kind: EdgeKind, target: &str, node: Node<'a>) {
        self.edges.push(EdgeRecord {
            kind,
            source: self.scope.last().map(|s| s.name.clone()).unwrap_or_default(),
            target: target.to_string(),
            line: node.start_position().row + 1,
        });
    }

    fn text(&self, node: Node<'a>) -> String {
        self.source[node.byte_range()].to_string()
    }

    fn field_text(&self, node: Node<'a>, field: &str) -> Option<String> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }
}

fn collect_export_names(node: Node<'_>, source: &str, names: &mut Vec<String>) {
    if node.kind() == "export_specifier" {
        if let Some(name) = node.child_by_field_name("name") {
            names.push(source[name.byte_range()].to_string());
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_export_names(child, source, names);
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::parser::{by_tag, parse};

    fn run(tag: &str, source: &str) -> (Vec<SymbolRecord>, Vec<EdgeRecord>) {
        let spec = by_tag(tag).unwrap();
        let tree = parse(source, spec, "test").unwrap();
        extract(&tree, source, spec)
    }

    fn symbol<'a>(symbols: &'a [SymbolRecord], name: &str) -> &'a SymbolRecord {
        symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no symbol named {}", name))
    }

    #[test]
    fn test_python_functions_classes_and_methods() {
        let source = "\
class Greeter:
    def greet(self, name):
        return name

def shout(text):
    return text.upper()
";
        let (symbols, _) = run("python", source);

        let class = symbol(&symbols, "Greeter");
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.start_line, 1);

        let method = symbol(&symbols, "greet");
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.parent.as_deref(), Some("Greeter"));
        assert_eq!(method.signature.as_deref(), Some("greet(self, name)"));

        let func = symbol(&symbols, "shout");
        assert_eq!(func.kind, SymbolKind::Function);
        assert_eq!(func.parent, None);
    }

    #[test]
    fn test_python_imports_and_exports() {
        let source = "\
import os, json
from collections import abc
import numpy as np

__all__ = [\"shout\", \"Greeter\"]
";
        let (_, edges) = run("python", source);

        let imports: Vec<&str> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Imports)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(imports, vec!["os", "json", "collections", "numpy"]);

        let exports: Vec<&str> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Exports)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(exports, vec!["shout", "Greeter"]);
    }

    #[test]
    fn test_python_call_attributed_to_innermost_symbol() {
        let source = "\
def outer():
    def inner():
        helper()
    inner()
";
        let (_, edges) = run("python", source);

        let refs: Vec<(&str, &str)> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::References)
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        // helper() belongs to inner, not outer; inner() belongs to outer.
        assert!(refs.contains(&("inner", "helper")));
        assert!(refs.contains(&("outer", "inner")));
    }

    #[test]
    fn test_python_module_level_variables_and_constants() {
        let source = "\
MAX_RETRIES = 3
threshold = 0.5

def f():
    local = 1
";
        let (symbols, _) = run("python", source);

        assert_eq!(symbol(&symbols, "MAX_RETRIES").kind, SymbolKind::Constant);
        assert_eq!(symbol(&symbols, "threshold").kind, SymbolKind::Variable);
        assert!(symbols.iter().all(|s| s.name != "local"));
    }

    #[test]
    fn test_javascript_imports_exports_and_methods() {
        let source = "\
import { render } from './view.js';

export function main() {
    render();
}

export { helper };

class App {
    start() {
        main();
    }
}
";
        let (symbols, edges) = run("javascript", source);

        assert_eq!(symbol(&symbols, "main").kind, SymbolKind::Function);
        let start = symbol(&symbols, "start");
        assert_eq!(start.kind, SymbolKind::Method);
        assert_eq!(start.parent.as_deref(), Some("App"));

        let imports: Vec<&str> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Imports)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(imports, vec!["./view.js"]);

        let exports: Vec<&str> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Exports)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(exports, vec!["main", "helper"]);

        assert!(edges
            .iter()
            .any(|e| e.kind == EdgeKind::References && e.source == "main" && e.target == "render"));
    }

    #[test]
    fn test_rust_items_and_method_calls() {
        let source = "\
use std::collections::HashMap;

const LIMIT: usize = 10;

struct Engine {
    map: HashMap<String, usize>,
}

impl Engine {
    fn run(&self) {
        self.step();
    }
}

fn step_all(engine: &Engine) {
    engine.run();
}
";
        let (symbols, edges) = run("rust", source);

        assert_eq!(symbol(&symbols, "Engine").kind, SymbolKind::Class);
        assert_eq!(symbol(&symbols, "LIMIT").kind, SymbolKind::Constant);

        let run_fn = symbol(&symbols, "run");
        assert_eq!(run_fn.kind, SymbolKind::Method);
        assert_eq!(run_fn.parent.as_deref(), Some("Engine"));
        assert_eq!(symbol(&symbols, "step_all").kind, SymbolKind::Function);

        let imports: Vec<&str> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Imports)
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(imports, vec!["std::collections::HashMap"]);

        assert!(edges
            .iter()
            .any(|e| e.kind == EdgeKind::References && e.source == "run" && e.target == "step"));
        assert!(edges.iter().any(
            |e| e.kind == EdgeKind::References && e.source == "step_all" && e.target == "run"
        ));
    }

    #[test]
    fn test_module_level_call_has_empty_source() {
        let source = "setup()\n";
        let (_, edges) = run("python", source);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "");
        assert_eq!(edges[0].target, "setup");
    }
}
