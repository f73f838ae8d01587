// Language registration and tree-sitter parsing

use std::path::Path;

use tree_sitter::{Language, Node, Parser as TreeParser, Tree};

use crate::error::{Error, Result};

/// Everything the front end knows about one language: how to detect it,
/// which grammar parses it, and which node kinds the extractor should
/// treat as declarations, imports, exports, and calls.
#[derive(Debug)]
pub struct LanguageSpec {
    pub tag: &'static str,
    pub extensions: &'static [&'static str],
    language: fn() -> Language,
    pub function_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub variable_kinds: &'static [&'static str],
    pub constant_kinds: &'static [&'static str],
    pub module_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
    pub export_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
}

fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

fn javascript_language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn rust_language() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}

/// The supported languages. Grammar authoring stays in the upstream
/// tree-sitter crates; adding a language here is a table entry.
pub static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        tag: "python",
        extensions: &["py"],
        language: python_language,
        function_kinds: &["function_definition"],
        class_kinds: &["class_definition"],
        variable_kinds: &["assignment"],
        constant_kinds: &[],
        module_kinds: &[],
        import_kinds: &["import_statement", "import_from_statement"],
        export_kinds: &[],
        call_kinds: &["call"],
    },
    LanguageSpec {
        tag: "javascript",
        extensions: &["js", "mjs", "cjs", "jsx"],
        language: javascript_language,
        function_kinds: &[
            "function_declaration",
            "generator_function_declaration",
            "method_definition",
        ],
        class_kinds: &["class_declaration"],
        variable_kinds: &["variable_declarator"],
        constant_kinds: &[],
        module_kinds: &[],
        import_kinds: &["import_statement"],
        export_kinds: &["export_statement"],
        call_kinds: &["call_expression"],
    },
    LanguageSpec {
        tag: "rust",
        extensions: &["rs"],
        language: rust_language,
        function_kinds: &["function_item"],
        class_kinds: &["struct_item", "enum_item", "trait_item"],
        variable_kinds: &["static_item"],
        constant_kinds: &["const_item"],
        module_kinds: &["mod_item"],
        import_kinds: &["use_declaration"],
        export_kinds: &[],
        call_kinds: &["call_expression"],
    },
];

/// Look a language up by its tag.
pub fn by_tag(tag: &str) -> Result<&'static LanguageSpec> {
    LANGUAGES
        .iter()
        .find(|spec| spec.tag == tag)
        .ok_or_else(|| Error::UnsupportedLanguage(tag.to_string()))
}

/// Detect the language of a file from its extension.
pub fn detect(path: &Path) -> Result<&'static LanguageSpec> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedLanguage(path.display().to_string()))?;

    LANGUAGES
        .iter()
        .find(|spec| spec.extensions.contains(&ext))
        .ok_or_else(|| Error::UnsupportedLanguage(ext.to_string()))
}

/// True when `path` has an extension some language claims.
pub fn is_recognized(path: &Path) -> bool {
    detect(path).is_ok()
}

/// Parse `source` with the spec's grammar. A tree containing syntax
/// errors is rejected with the position of the first error node; callers
/// never see partial trees.
pub fn parse(source: &str, spec: &LanguageSpec, file: &str) -> Result<Tree> {
    let mut parser = TreeParser::new();
    parser
        .set_language(&(spec.language)())
        .map_err(|e| Error::Storage(format!("grammar load for {}: {}", spec.tag, e)))?;

    let tree = parser.parse(source, None).ok_or_else(|| Error::Parse {
        file: file.to_string(),
        line: 0,
        column: 0,
        message: format!("{} parser produced no tree", spec.tag),
    })?;

    if let Some(node) = first_error_node(tree.root_node()) {
        let pos = node.start_position();
        return Err(Error::Parse {
            file: file.to_string(),
            line: pos.row + 1,
            column: pos.column + 1,
            message: if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "syntax error".to_string()
            },
        });
    }

    Ok(tree)
}

fn first_error_node(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }

    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // Descend only into subtrees that actually contain the error.
        if cursor.goto_first_child() {
            while !cursor.node().has_error() {
                if !cursor.goto_next_sibling() {
                    return Some(node);
                }
            }
            continue;
        }
        return Some(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect(Path::new("src/app.py")).unwrap().tag, "python");
        assert_eq!(detect(Path::new("lib/util.mjs")).unwrap().tag, "javascript");
        assert_eq!(detect(Path::new("src/main.rs")).unwrap().tag, "rust");
    }

    #[test]
    fn test_detect_unknown_extension() {
        let err = detect(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(ref e) if e == "txt"));
        assert!(detect(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_by_tag() {
        assert_eq!(by_tag("rust").unwrap().tag, "rust");
        assert!(matches!(
            by_tag("cobol").unwrap_err(),
            Error::UnsupportedLanguage(_)
        ));
    }

    #[test]
    fn test_parse_valid_python() {
        let spec = by_tag("python").unwrap();
        let tree = parse("def greet(name):\n    return name\n", spec, "a.py").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }

    #[test]
    fn test_parse_reports_first_error_position() {
        let spec = by_tag("python").unwrap();
        let err = parse("x = (\n", spec, "broken.py").unwrap_err();
        match err {
            Error::Parse { file, line, .. } => {
                assert_eq!(file, "broken.py");
                assert!(line >= 1);
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_javascript_and_rust() {
        let js = by_tag("javascript").unwrap();
        assert!(parse("export function f() { return 1; }\n", js, "a.js").is_ok());

        let rs = by_tag("rust").unwrap();
        assert!(parse("fn main() { println!(\"hi\"); }\n", rs, "a.rs").is_ok());
    }
}
