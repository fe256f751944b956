//! Template lookup and expansion
//!
//! Templates are looked up along an ordered list of search paths; the first
//! path that provides the template wins. For every path the on-disk template
//! directory is consulted before the built-in templates, so a project can
//! override a single file while inheriting the rest.
//!
//! Expansion happens in two steps. Condition blocks are resolved first:
//!
//! ```text
//! $if DARTIUM
//! ...
//! $else
//! ...
//! $endif
//! ```
//!
//! Then holes are filled: `$NAME` or `${NAME}` where `NAME` starts with an
//! uppercase letter followed by uppercase letters, digits and underscores.
//! `$$` produces a literal `$`;
//! any other `$` is copied through unchanged.

use crate::GenerationError;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::trace;

/// Values for template holes
pub type Holes<'a> = BTreeMap<&'a str, String>;

const HEADER: &str = "// WARNING: Do not edit - generated code.\n";

/// Built-in templates, keyed by `search_path/name`
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "interface.darttemplate",
        "$HEADER
$if DARTIUM
// Bound natively to $NATIVE_NAME.
$endif
interface $ID$EXTENDS {
$MEMBERS}
",
    ),
    (
        "callback.darttemplate",
        "$HEADER
typedef $RETURN $ID($PARAMS);
",
    ),
    (
        "html/interface/interface.darttemplate",
        "$HEADER
/// Html binding of $NATIVE_NAME.
interface $ID$EXTENDS {
$MEMBERS}
",
    ),
    (
        "dom/dummy/impl.darttemplate",
        "$HEADER
class ${ID}Impl implements $ID {
$MEMBERS}
",
    ),
    (
        "dom/dummy/library.darttemplate",
        "$HEADER
#library('dom_dummy');

$SOURCES",
    ),
    (
        "dom/frog/impl.darttemplate",
        "$HEADER
class ${ID}Js$EXTENDS implements $ID native \"*$NATIVE_NAME\" {
$MEMBERS}
",
    ),
    (
        "dom/frog/library.darttemplate",
        "$HEADER
#library('dom_frog');
$if FROG

#native('dom_frog_natives.js');
$endif

$SOURCES",
    ),
    (
        "html/impl/impl.darttemplate",
        "$HEADER
$if DARTIUM
class ${ID}Impl extends _DOMWrapperBase implements $ID {
$else
class ${ID}Impl$EXTENDS implements $ID native \"*$NATIVE_NAME\" {
$endif
$MEMBERS}
",
    ),
    (
        "html/impl/support.darttemplate",
        "$HEADER
$if DARTIUM
class _DOMWrapperBase {
  _DOMWrapperBase();
}
$else
class _FrogSupport {
  static void ensureNative() {}
}
$endif
",
    ),
    (
        "html/library.darttemplate",
        "$HEADER
$if DARTIUM
#library('html_dartium');

#import('dart:nativewrappers');
$else
#library('html_frog');
$endif

$SOURCES",
    ),
];

fn builtin(key: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, text)| *text)
}

fn join_key(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", path.trim_end_matches('/'), name)
    }
}

/// Ordered template lookup bound to one set of condition flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLoader {
    root: Option<PathBuf>,
    paths: Vec<String>,
    conditions: BTreeMap<String, bool>,
}

impl TemplateLoader {
    pub fn new(root: Option<PathBuf>, paths: Vec<String>, conditions: BTreeMap<String, bool>) -> Self {
        Self { root, paths, conditions }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn conditions(&self) -> &BTreeMap<String, bool> {
        &self.conditions
    }

    /// Candidate keys for `name`, in lookup order
    pub fn lookup_order(&self, name: &str) -> Vec<String> {
        self.paths.iter().map(|path| join_key(path, name)).collect()
    }

    /// Raw text of the first matching template
    pub fn find(&self, name: &str) -> Result<String, GenerationError> {
        let candidates = self.lookup_order(name);
        for key in &candidates {
            if let Some(root) = &self.root {
                let path = root.join(key);
                if path.is_file() {
                    trace!("Template {} from {}", name, path.display());
                    return fs::read_to_string(&path).map_err(|error| GenerationError::Io { path, error });
                }
            }
            if let Some(text) = builtin(key) {
                trace!("Template {} from builtin {}", name, key);
                return Ok(text.to_string());
            }
        }
        Err(GenerationError::TemplateNotFound {
            name: name.to_string(),
            searched: candidates,
        })
    }

    /// Look up `name`, resolve its condition blocks and fill its holes
    pub fn render(&self, name: &str, holes: &Holes) -> Result<String, GenerationError> {
        let text = self.find(name)?;
        let text = expand_conditions(name, &text, &self.conditions)?;
        let mut holes = holes.clone();
        holes.entry("HEADER").or_insert_with(|| HEADER.to_string());
        fill_holes(name, &text, &holes)
    }
}

/// Keep the lines selected by the `$if`/`$else`/`$endif` blocks
pub fn expand_conditions(
    template: &str,
    text: &str,
    conditions: &BTreeMap<String, bool>,
) -> Result<String, GenerationError> {
    // (branch taken, currently in the else part)
    let mut stack: Vec<(bool, bool)> = Vec::new();
    let mut out = String::with_capacity(text.len());

    for (index, line) in text.lines().enumerate() {
        let directive = line.trim();
        if let Some(flag) = directive.strip_prefix("$if ") {
            let flag = flag.trim();
            let value = conditions.get(flag).copied().ok_or_else(|| GenerationError::UnknownCondition {
                template: template.to_string(),
                flag: flag.to_string(),
            })?;
            stack.push((value, false));
            continue;
        }
        if directive == "$else" {
            match stack.last_mut() {
                Some(top) if !top.1 => top.1 = true,
                _ => return Err(unbalanced(template, index)),
            }
            continue;
        }
        if directive == "$endif" {
            if stack.pop().is_none() {
                return Err(unbalanced(template, index));
            }
            continue;
        }

        if stack.iter().all(|&(taken, in_else)| taken != in_else) {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !stack.is_empty() {
        return Err(unbalanced(template, text.lines().count()));
    }
    if !text.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

fn unbalanced(template: &str, index: usize) -> GenerationError {
    GenerationError::UnbalancedBlock {
        template: template.to_string(),
        line: index + 1,
    }
}

fn is_hole_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

/// Substitute `$NAME` and `${NAME}` holes
pub fn fill_holes(template: &str, text: &str, holes: &Holes) -> Result<String, GenerationError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 && braced[..end].chars().all(is_hole_char) => {
                    (&braced[..end], &braced[end + 1..])
                }
                _ => ("", after),
            }
        } else if after.starts_with(|c: char| c.is_ascii_uppercase()) {
            let end = after.find(|c: char| !is_hole_char(c)).unwrap_or(after.len());
            (&after[..end], &after[end..])
        } else {
            ("", after)
        };

        if name.is_empty() {
            out.push('$');
        } else {
            let value = holes.get(name).ok_or_else(|| GenerationError::UnboundHole {
                template: template.to_string(),
                hole: name.to_string(),
            })?;
            out.push_str(value);
        }
        rest = tail;
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn flags(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_conditions_select_branches() {
        let text = "a\n$if DARTIUM\nnative\n$else\nfrog\n$endif\nz\n";
        let dartium = expand_conditions("t", text, &flags(&[("DARTIUM", true)])).unwrap();
        assert_eq!(dartium, "a\nnative\nz\n");
        let frog = expand_conditions("t", text, &flags(&[("DARTIUM", false)])).unwrap();
        assert_eq!(frog, "a\nfrog\nz\n");
    }

    #[test]
    fn test_nested_conditions() {
        let text = "$if A\n$if B\nab\n$else\na\n$endif\n$endif\n";
        let out = expand_conditions("t", text, &flags(&[("A", true), ("B", false)])).unwrap();
        assert_eq!(out, "a\n");
        let out = expand_conditions("t", text, &flags(&[("A", false), ("B", true)])).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_condition_errors() {
        let err = expand_conditions("t", "$if NOPE\n$endif\n", &flags(&[])).unwrap_err();
        assert!(matches!(err, GenerationError::UnknownCondition { flag, .. } if flag == "NOPE"));

        let err = expand_conditions("t", "$endif\n", &flags(&[])).unwrap_err();
        assert!(matches!(err, GenerationError::UnbalancedBlock { line: 1, .. }));

        let err = expand_conditions("t", "$if A\nx\n", &flags(&[("A", true)])).unwrap_err();
        assert!(matches!(err, GenerationError::UnbalancedBlock { .. }));
    }

    #[test]
    fn test_fill_holes() {
        let mut holes = Holes::new();
        holes.insert("ID", "Node".to_string());
        holes.insert("EXTENDS", String::new());

        let out = fill_holes("t", "class ${ID}Impl$EXTENDS { '$x' costs $$5 }", &holes).unwrap();
        assert_eq!(out, "class NodeImpl { '$x' costs $5 }");

        let err = fill_holes("t", "$MISSING", &holes).unwrap_err();
        assert!(matches!(err, GenerationError::UnboundHole { hole, .. } if hole == "MISSING"));
    }

    #[test]
    fn test_first_search_path_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("dom/frog")).unwrap();
        std::fs::write(dir.path().join("dom/frog/interface.darttemplate"), "override $ID\n").unwrap();

        let paths = vec!["dom/frog".to_string(), "dom".to_string(), String::new()];
        let loader = TemplateLoader::new(Some(dir.path().to_path_buf()), paths.clone(), flags(&[]));
        let mut holes = Holes::new();
        holes.insert("ID", "Node".to_string());
        assert_eq!(loader.render("interface.darttemplate", &holes).unwrap(), "override Node\n");

        // without the override the root builtin is used
        let loader = TemplateLoader::new(None, paths, flags(&[("DARTIUM", false)]));
        let text = loader.find("interface.darttemplate").unwrap();
        assert!(text.contains("interface $ID$EXTENDS"));
    }

    #[test]
    fn test_missing_template_reports_search_chain() {
        let loader = TemplateLoader::new(None, vec!["html/frog".to_string(), "html".to_string()], flags(&[]));
        match loader.find("missing.darttemplate") {
            Err(GenerationError::TemplateNotFound { searched, .. }) => {
                assert_eq!(searched, vec!["html/frog/missing.darttemplate", "html/missing.darttemplate"]);
            }
            other => panic!("expected template not found, got {:?}", other),
        }
    }
}
