//! Export shapes: splitting a nested JSON document into a directory of files.
//!
//! A shape is declared as dotted path templates. A literal segment names a
//! property; a `{field}` segment says the array at that point is split into
//! one child per element, keyed by the element's `field` value:
//!
//! ```text
//! space.kapps.{slug}
//! space.kapps.{slug}.forms.{slug}
//! space.teams.{name}
//! ```
//!
//! Exporting `{"space": {"kapps": [{"slug": "k1", "forms": [...]}]}}` with
//! that shape writes `space.json`, `space/kapps/k1.json` and
//! `space/kapps/k1/forms/<slug>.json`. Properties the shape doesn't name stay
//! inline in their parent's file. Each element's file is named after its
//! discriminating field. When that name is the exact field value the field
//! is dropped from the file; otherwise (a value that needed slugifying, or a
//! sibling already took the name) the field stays in the file.
//!
//! Data that doesn't fit the shape (a `{field}` level that isn't an array,
//! an element without the field) is skipped and logged at `warn`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::Result;

/// Suffix of every exported file.
const FILE_EXTENSION: &str = "json";

// ─────────────────────────────────────────────────────────────────────────────
// Shape tree
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ShapeNode {
    children: BTreeMap<String, ShapeNode>,
    variable: Option<Variable>,
}

/// Marks a level whose array elements are keyed by `field`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Variable {
    field: String,
    node: Box<ShapeNode>,
}

/// Declarative export layout built from dotted path templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportShape {
    root: ShapeNode,
}

impl ExportShape {
    /// Build a shape from templates such as `"space.kapps.{slug}"`.
    pub fn from_templates<S: AsRef<str>>(templates: &[S]) -> Self {
        let mut root = ShapeNode::default();
        for template in templates {
            let mut node = &mut root;
            for segment in template.as_ref().split('.').filter(|s| !s.is_empty()) {
                node = match variable_name(segment) {
                    Some(field) => {
                        let variable = node.variable.get_or_insert_with(|| Variable {
                            field: field.to_string(),
                            node: Box::default(),
                        });
                        if variable.field != field {
                            tracing::warn!(
                                template = template.as_ref(),
                                existing = %variable.field,
                                ignored = field,
                                "Conflicting variable names at the same level; keeping the first"
                            );
                        }
                        &mut *variable.node
                    }
                    None => node.children.entry(segment.to_string()).or_default(),
                };
            }
        }
        Self { root }
    }

    /// Whether the value at a dotted path gets its own file.
    ///
    /// Walks the shape in lockstep with the path; a variable level consumes
    /// whatever segment is at that position. A missing node means inline.
    pub fn should_extract(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        !segments.is_empty() && self.node_at(&segments).is_some()
    }

    /// The discriminating field declared for the array at `path`, if any.
    pub fn variable_at(&self, path: &str) -> Option<&str> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        self.variable_for(&segments)
    }

    fn node_at<S: AsRef<str>>(&self, segments: &[S]) -> Option<&ShapeNode> {
        let mut node = &self.root;
        for segment in segments {
            node = match &node.variable {
                Some(variable) => &*variable.node,
                None => node.children.get(segment.as_ref())?,
            };
        }
        Some(node)
    }

    fn variable_for<S: AsRef<str>>(&self, segments: &[S]) -> Option<&str> {
        self.node_at(segments)?
            .variable
            .as_ref()
            .map(|v| v.field.as_str())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    /// Write `document` under `directory` according to this shape.
    ///
    /// The root object itself produces no file. Returns the files written.
    pub fn process_export(&self, directory: &Path, document: &Value) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        match document {
            Value::Object(object) => {
                self.export_object(directory, &mut Vec::new(), object, &mut written)?
            }
            _ => tracing::warn!("Export document is not an object; nothing written"),
        }
        Ok(written)
    }

    fn export_object(
        &self,
        directory: &Path,
        path: &mut Vec<String>,
        object: &Map<String, Value>,
        written: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let mut inline = Map::new();

        for (key, value) in object {
            path.push(key.clone());
            if self.node_at(path.as_slice()).is_none() {
                inline.insert(key.clone(), value.clone());
                path.pop();
                continue;
            }

            match (self.variable_for(path.as_slice()), value) {
                (Some(field), Value::Array(items)) => {
                    let mut stems = BTreeSet::new();
                    for item in items {
                        let Some(element) = item.as_object() else {
                            tracing::warn!(path = %path.join("."), "Skipping non-object array element");
                            continue;
                        };
                        let Some(discriminator) = element.get(field).and_then(scalar_text) else {
                            tracing::warn!(
                                path = %path.join("."),
                                field,
                                "Skipping array element without its key field"
                            );
                            continue;
                        };
                        let stem = unique_stem(&mut stems, &discriminator);
                        let mut element = element.clone();
                        // The file name carries the key only when it is the key
                        if stem == discriminator {
                            element.remove(field);
                        }
                        path.push(stem);
                        self.export_object(directory, path, &element, written)?;
                        path.pop();
                    }
                }
                (Some(field), _) => {
                    tracing::warn!(
                        path = %path.join("."),
                        field,
                        "Expected an array to split; skipping"
                    );
                }
                (None, Value::Object(child)) => {
                    self.export_object(directory, path, child, written)?;
                }
                (None, other) => {
                    written.push(write_file(directory, path, other)?);
                }
            }
            path.pop();
        }

        if !path.is_empty() {
            written.push(write_file(directory, path, &Value::Object(inline))?);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Import
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild a document from a directory written by [`process_export`].
    ///
    /// Split arrays are rebuilt in file-name order. A key field missing from
    /// an element's file is restored from its file stem.
    ///
    /// [`process_export`]: ExportShape::process_export
    pub fn assemble(&self, directory: &Path) -> Result<Value> {
        let mut path = Vec::new();
        let document = self.assemble_node(None, Some(directory), &mut path)?;
        Ok(document)
    }

    fn assemble_node(
        &self,
        file: Option<&Path>,
        directory: Option<&Path>,
        path: &mut Vec<String>,
    ) -> Result<Value> {
        let mut value = match file {
            Some(file) => serde_json::from_slice(&std::fs::read(file)?)?,
            None => Value::Object(Map::new()),
        };

        let Some(directory) = directory else {
            return Ok(value);
        };
        let Value::Object(object) = &mut value else {
            tracing::warn!(path = %path.join("."), "Non-object file has a sibling directory; ignoring it");
            return Ok(value);
        };

        for entry in list_entries(directory)? {
            path.push(entry.name.clone());
            let child = match self.variable_for(path.as_slice()) {
                Some(field) => {
                    let field = field.to_string();
                    let mut items = Vec::new();
                    if let Some(dir) = &entry.directory {
                        for element in list_entries(dir)? {
                            path.push(element.name.clone());
                            let mut item = self.assemble_node(
                                element.file.as_deref(),
                                element.directory.as_deref(),
                                path,
                            )?;
                            if let Value::Object(map) = &mut item {
                                map.entry(field.clone())
                                    .or_insert_with(|| Value::String(element.name.clone()));
                            }
                            items.push(item);
                            path.pop();
                        }
                    }
                    Value::Array(items)
                }
                None => {
                    self.assemble_node(entry.file.as_deref(), entry.directory.as_deref(), path)?
                }
            };
            object.insert(entry.name, child);
            path.pop();
        }
        Ok(value)
    }
}

/// File stem for an array element, unique among its siblings.
///
/// Keys that slugify to an already used stem get a numeric suffix.
fn unique_stem(used: &mut BTreeSet<String>, key: &str) -> String {
    let base = slugify(key);
    let mut stem = base.clone();
    let mut n = 2;
    while used.contains(&stem) {
        stem = format!("{}-{}", base, n);
        n += 1;
    }
    if stem != base {
        tracing::warn!(key, file = %stem, "Export key collides with a sibling; renamed file");
    }
    used.insert(stem.clone());
    stem
}

fn variable_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|s| !s.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// Make a name safe for use as one path segment.
///
/// Keeps ASCII letters, digits, `-` and `_`; anything else becomes `-`,
/// with runs collapsed and ends trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "_".to_string()
    } else {
        slug.to_string()
    }
}

/// File path for a logical path: segments become directories, the last
/// one a `.json` file.
pub fn file_path(directory: &Path, path: &[String]) -> PathBuf {
    let mut file = directory.to_path_buf();
    if let Some((last, parents)) = path.split_last() {
        for segment in parents {
            file.push(slugify(segment));
        }
        file.push(format!("{}.{}", slugify(last), FILE_EXTENSION));
    }
    file
}

fn write_file(directory: &Path, path: &[String], value: &Value) -> Result<PathBuf> {
    let file = file_path(directory, path);
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file, serde_json::to_vec_pretty(value)?)?;
    tracing::debug!(path = %file.display(), "Wrote export file");
    Ok(file)
}

/// A name present in a directory as `name.json`, `name/`, or both.
struct Entry {
    name: String,
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
}

fn list_entries(directory: &Path) -> Result<Vec<Entry>> {
    let mut files = BTreeMap::new();
    let mut directories = BTreeMap::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                directories.insert(name.to_string(), path.clone());
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION)
            && let Some(stem) = path.file_stem().and_then(|n| n.to_str())
        {
            files.insert(stem.to_string(), path.clone());
        }
    }

    let names: BTreeSet<String> = files.keys().chain(directories.keys()).cloned().collect();
    Ok(names
        .into_iter()
        .map(|name| Entry {
            file: files.remove(&name),
            directory: directories.remove(&name),
            name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(path: &Path) -> Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn test_should_extract_walks_variables() {
        let shape = ExportShape::from_templates(&["space.kapps.{slug}.forms.{slug}"]);
        assert!(shape.should_extract("space"));
        assert!(shape.should_extract("space.kapps"));
        assert!(shape.should_extract("space.kapps.services"));
        assert!(shape.should_extract("space.kapps.services.forms"));
        assert!(shape.should_extract("space.kapps.services.forms.request"));
    }

    #[test]
    fn test_should_extract_missing_node_is_inline() {
        let shape = ExportShape::from_templates(&["space.kapps.{slug}.forms.{slug}"]);
        assert!(!shape.should_extract("space.name"));
        assert!(!shape.should_extract("space.kapps.services.attributes"));
        assert!(!shape.should_extract("space.kapps.services.forms.request.fields"));
        assert!(!shape.should_extract("other"));
        assert!(!shape.should_extract(""));
    }

    #[test]
    fn test_variable_at() {
        let shape = ExportShape::from_templates(&["space.kapps.{slug}", "space.teams.{name}"]);
        assert_eq!(shape.variable_at("space.kapps"), Some("slug"));
        assert_eq!(shape.variable_at("space.teams"), Some("name"));
        assert_eq!(shape.variable_at("space"), None);
    }

    #[test]
    fn test_templates_share_prefixes() {
        let a = ExportShape::from_templates(&["space.kapps.{slug}", "space.kapps.{slug}.forms.{slug}"]);
        let b = ExportShape::from_templates(&["space.kapps.{slug}.forms.{slug}"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_export_nested_forms() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.kapps.{slug}.forms.{slug}"]);
        let document = json!({
            "space": {"kapps": [{"slug": "k1", "forms": [{"slug": "f1", "name": "N"}]}]}
        });

        shape.process_export(dir.path(), &document).unwrap();

        let form = dir.path().join("space/kapps/k1/forms/f1.json");
        assert_eq!(read(&form), json!({"name": "N"}));

        // space.json holds only what wasn't extracted
        let space = read(&dir.path().join("space.json"));
        assert!(space.get("kapps").is_none());
    }

    #[test]
    fn test_export_inlines_unshaped_properties() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.kapps.{slug}"]);
        let document = json!({
            "space": {
                "name": "Acme",
                "attributes": [{"name": "Theme", "values": ["dark"]}],
                "kapps": [{"slug": "services", "name": "Services"}]
            }
        });

        let written = shape.process_export(dir.path(), &document).unwrap();
        assert_eq!(written.len(), 2);

        assert_eq!(
            read(&dir.path().join("space.json")),
            json!({"name": "Acme", "attributes": [{"name": "Theme", "values": ["dark"]}]})
        );
        assert_eq!(
            read(&dir.path().join("space/kapps/services.json")),
            json!({"name": "Services"})
        );
    }

    #[test]
    fn test_export_whole_array_without_variable() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.webhooks"]);
        let document = json!({"space": {"webhooks": [{"name": "a"}, {"name": "b"}]}});

        shape.process_export(dir.path(), &document).unwrap();
        assert_eq!(
            read(&dir.path().join("space/webhooks.json")),
            json!([{"name": "a"}, {"name": "b"}])
        );
    }

    #[test]
    fn test_export_skips_shapeless_data() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.kapps.{slug}"]);
        let document = json!({
            "space": {"kapps": [{"name": "no slug"}, "not an object", {"slug": "ok"}]}
        });

        shape.process_export(dir.path(), &document).unwrap();
        let kapps: Vec<_> = std::fs::read_dir(dir.path().join("space/kapps"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(kapps, vec!["ok.json".to_string()]);
    }

    #[test]
    fn test_export_variable_expecting_array() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.kapps.{slug}"]);
        let document = json!({"space": {"kapps": {"slug": "x"}}});

        let written = shape.process_export(dir.path(), &document).unwrap();
        assert_eq!(written, vec![dir.path().join("space.json")]);
        assert_eq!(read(&written[0]), json!({}));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("services"), "services");
        assert_eq!(slugify("IT Help Desk"), "IT-Help-Desk");
        assert_eq!(slugify("a / b :: c"), "a-b-c");
        assert_eq!(slugify("***"), "_");
    }

    #[test]
    fn test_file_path_slugifies_segments() {
        let path = file_path(
            Path::new("/export"),
            &["space".into(), "teams".into(), "Default Team".into()],
        );
        assert_eq!(path, PathBuf::from("/export/space/teams/Default-Team.json"));
    }

    #[test]
    fn test_assemble_reverses_export() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&[
            "space.kapps.{slug}",
            "space.kapps.{slug}.forms.{slug}",
            "space.webhooks",
        ]);
        let document = json!({
            "space": {
                "name": "Acme",
                "webhooks": [{"name": "hook"}],
                "kapps": [
                    {"slug": "admin", "name": "Admin", "forms": []},
                    {"slug": "services", "name": "Services", "forms": [
                        {"slug": "ipad", "name": "iPad"},
                        {"slug": "laptop", "name": "Laptop"}
                    ]}
                ]
            }
        });

        shape.process_export(dir.path(), &document).unwrap();
        let rebuilt = shape.assemble(dir.path()).unwrap();

        assert_eq!(rebuilt["space"]["name"], "Acme");
        assert_eq!(rebuilt["space"]["webhooks"], json!([{"name": "hook"}]));
        let kapps = rebuilt["space"]["kapps"].as_array().unwrap();
        assert_eq!(kapps.len(), 2);
        assert_eq!(kapps[1]["slug"], "services");
        assert_eq!(
            kapps[1]["forms"],
            json!([
                {"slug": "ipad", "name": "iPad"},
                {"slug": "laptop", "name": "Laptop"}
            ])
        );
    }

    #[test]
    fn test_names_needing_slugs_survive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.teams.{name}"]);
        let document = json!({
            "space": {"teams": [
                {"name": "Role::Data Admin", "slug": "abc"},
                {"name": "Plain", "slug": "def"}
            ]}
        });

        shape.process_export(dir.path(), &document).unwrap();

        // Lossy file name keeps the real key inside the file
        assert_eq!(
            read(&dir.path().join("space/teams/Role-Data-Admin.json")),
            json!({"name": "Role::Data Admin", "slug": "abc"})
        );
        assert_eq!(read(&dir.path().join("space/teams/Plain.json")), json!({"slug": "def"}));

        let rebuilt = shape.assemble(dir.path()).unwrap();
        assert_eq!(
            rebuilt["space"]["teams"],
            json!([
                {"slug": "def", "name": "Plain"},
                {"name": "Role::Data Admin", "slug": "abc"}
            ])
        );
    }

    #[test]
    fn test_colliding_keys_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.teams.{name}"]);
        let document = json!({"space": {"teams": [{"name": "A B"}, {"name": "A/B"}]}});

        let written = shape.process_export(dir.path(), &document).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("space/teams/A-B.json"),
                dir.path().join("space/teams/A-B-2.json"),
                dir.path().join("space.json"),
            ]
        );

        let rebuilt = shape.assemble(dir.path()).unwrap();
        let mut names: Vec<&str> = rebuilt["space"]["teams"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        names.sort();
        assert_eq!(names, vec!["A B", "A/B"]);
    }

    #[test]
    fn test_exact_key_colliding_with_slugged_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let shape = ExportShape::from_templates(&["space.teams.{name}"]);
        let document = json!({"space": {"teams": [{"name": "A B"}, {"name": "A-B"}]}});

        shape.process_export(dir.path(), &document).unwrap();
        let rebuilt = shape.assemble(dir.path()).unwrap();
        let mut names: Vec<&str> = rebuilt["space"]["teams"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        names.sort();
        assert_eq!(names, vec!["A B", "A-B"]);
    }
}
