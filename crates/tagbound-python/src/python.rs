//! Python language extractor using Tree-sitter.

use tagbound_core::utils::{parse_ignore_directive, SuppressedLines};
use tagbound_core::{ExtractOptions, ImportedNames, LanguageExtractor, ParseError, RawImport};
use tree_sitter::{Language, Node, Parser, Tree};

const INTERFACE_NAME: &str = "__all__";

/// Extracts import statements and `__all__` declarations from Python source.
pub struct PythonExtractor {
    language: Language,
}

impl PythonExtractor {
    /// Creates a new Python extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Parses source, failing on the first syntax error.
    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language).map_err(|e| ParseError {
            line: 1,
            column: 1,
            message: e.to_string(),
        })?;
        let tree = parser.parse(source, None).ok_or_else(|| ParseError {
            line: 1,
            column: 1,
            message: "parser returned no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let bad = first_error(root).unwrap_or(root);
            let pos = bad.start_position();
            let message = if bad.is_missing() {
                format!("missing {}", bad.kind())
            } else {
                "invalid syntax".to_string()
            };
            return Err(ParseError {
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            });
        }
        Ok(tree)
    }

    fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
        node.utf8_text(src).unwrap_or("")
    }

    /// Dotted path of a `dotted_name` or the name inside an `aliased_import`.
    fn imported_path(node: &Node<'_>, src: &[u8]) -> String {
        match node.kind() {
            "aliased_import" => node
                .child_by_field_name("name")
                .map(|n| Self::dotted(&n, src))
                .unwrap_or_default(),
            _ => Self::dotted(node, src),
        }
    }

    /// Joins identifier children of a `dotted_name` with dots, dropping any
    /// whitespace or comments between them.
    fn dotted(node: &Node<'_>, src: &[u8]) -> String {
        if node.kind() != "dotted_name" {
            return Self::text(node, src).to_owned();
        }
        let mut parts = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "identifier" {
                parts.push(Self::text(&child, src));
            }
        }
        parts.join(".")
    }

    /// `import a.b, c as d`: one wildcard record per imported module.
    fn extract_import(node: &Node<'_>, src: &[u8], out: &mut Vec<RawImport>) {
        let (line, column) = position(node);
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let module = Self::imported_path(&name, src);
            if !module.is_empty() {
                out.push(RawImport::new(line, column, module, ImportedNames::Wildcard));
            }
        }
    }

    /// `from [.]a.b import X, Y as Z` or `from a import *`.
    fn extract_import_from(node: &Node<'_>, src: &[u8]) -> Option<RawImport> {
        let (line, column) = position(node);
        let module_node = node.child_by_field_name("module_name")?;

        let (level, module) = if module_node.kind() == "relative_import" {
            let mut level = 0;
            let mut module = String::new();
            let mut cursor = module_node.walk();
            for child in module_node.children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => {
                        level = Self::text(&child, src).chars().filter(|c| *c == '.').count();
                    }
                    "dotted_name" => module = Self::dotted(&child, src),
                    _ => {}
                }
            }
            (level, module)
        } else {
            (0, Self::dotted(&module_node, src))
        };

        let mut cursor = node.walk();
        let wildcard = node
            .children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");
        let names = if wildcard {
            ImportedNames::Wildcard
        } else {
            let mut cursor = node.walk();
            let names: Vec<String> = node
                .children_by_field_name("name", &mut cursor)
                .map(|n| Self::imported_path(&n, src))
                .filter(|n| !n.is_empty())
                .collect();
            ImportedNames::Names(names)
        };

        Some(RawImport::new(line, column, module, names).with_level(level))
    }

    /// Suppressed lines from `# tagbound: ignore` comments.
    fn suppressed_lines(root: Node<'_>, src: &[u8]) -> SuppressedLines {
        let mut lines = SuppressedLines::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "comment" {
                if let Some(directive) = parse_ignore_directive(Self::text(&node, src)) {
                    let line_start = src[..node.start_byte()]
                        .iter()
                        .rposition(|b| *b == b'\n')
                        .map_or(0, |i| i + 1);
                    let standalone = src[line_start..node.start_byte()]
                        .iter()
                        .all(u8::is_ascii_whitespace);
                    lines.record(node.start_position().row + 1, standalone, directive);
                }
                continue;
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
        lines
    }

    fn is_type_checking_guard(node: &Node<'_>, src: &[u8]) -> bool {
        node.child_by_field_name("condition")
            .map(|c| Self::text(&c, src).trim())
            .is_some_and(|c| c == "TYPE_CHECKING" || c == "typing.TYPE_CHECKING")
    }

    /// String literals of a `list` or `tuple` node.
    fn string_items(node: &Node<'_>, src: &[u8]) -> Vec<String> {
        let mut items = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "string" {
                continue;
            }
            let mut inner = child.walk();
            let content: String = child
                .named_children(&mut inner)
                .filter(|c| c.kind() == "string_content")
                .map(|c| Self::text(&c, src))
                .collect();
            if !content.is_empty() {
                items.push(content);
            }
        }
        items
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py"]
    }

    fn entry_module_name(&self) -> &'static str {
        "__init__.py"
    }

    fn extract_imports(
        &self,
        source: &str,
        options: ExtractOptions,
    ) -> Result<Vec<RawImport>, ParseError> {
        let tree = self.parse(source)?;
        let src = source.as_bytes();
        let root = tree.root_node();
        let suppressed = Self::suppressed_lines(root, src);

        let mut imports = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let first = imports.len();
            match node.kind() {
                "import_statement" => Self::extract_import(&node, src, &mut imports),
                "import_from_statement" => {
                    imports.extend(Self::extract_import_from(&node, src));
                }
                "future_import_statement" => {}
                "if_statement"
                    if options.ignore_type_checking_imports
                        && Self::is_type_checking_guard(&node, src) =>
                {
                    let mut cursor = node.walk();
                    stack.extend(node.children_by_field_name("alternative", &mut cursor));
                }
                _ => {
                    let mut cursor = node.walk();
                    stack.extend(node.named_children(&mut cursor));
                }
            }
            if imports.len() == first {
                continue;
            }
            // A directive anywhere on the statement's lines covers all of it.
            let span = node.start_position().row + 1..=node.end_position().row + 1;
            if let Some(directive) = suppressed.find(span) {
                for import in &mut imports[first..] {
                    import.suppressed = true;
                    import.ignore_reason.clone_from(&directive.reason);
                }
            }
        }

        imports.sort_by_key(|i| (i.line, i.column));
        Ok(imports)
    }

    fn public_symbols(&self, source: &str) -> Result<Option<Vec<String>>, ParseError> {
        let tree = self.parse(source)?;
        let src = source.as_bytes();
        let root = tree.root_node();

        let mut symbols: Option<Vec<String>> = None;
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(expr) = statement.named_child(0) else {
                continue;
            };
            let extend = match expr.kind() {
                "assignment" => false,
                "augmented_assignment" => true,
                _ => continue,
            };
            let is_interface = expr
                .child_by_field_name("left")
                .is_some_and(|l| Self::text(&l, src) == INTERFACE_NAME);
            let Some(right) = expr.child_by_field_name("right") else {
                continue;
            };
            if !is_interface || !matches!(right.kind(), "list" | "tuple") {
                continue;
            }

            let items = Self::string_items(&right, src);
            match (&mut symbols, extend) {
                (Some(existing), true) => existing.extend(items),
                _ => symbols = Some(items),
            }
        }
        Ok(symbols)
    }
}

fn position(node: &Node<'_>) -> (usize, usize) {
    let p = node.start_position();
    (p.row + 1, p.column + 1)
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    let mut found: Option<Node<'_>> = None;
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let earlier = found.map_or(true, |f| node.start_byte() < f.start_byte());
            if earlier {
                found = Some(node);
            }
            continue;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
    }
    found
}
