//! Maven POM model, property table and `${...}` placeholder resolution.
//!
//! A POM's property table is its own `<properties>` plus synthetic `project.*`
//! keys, then whatever its parent and grandparent define that the child does
//! not. Placeholders are substituted against that merged, immutable table.

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{ParseError, PropertyError};
use crate::models::UNKNOWN_VERSION;

/// Upper bound on nested placeholder expansion. Guarantees termination on
/// cyclic or self-referential properties.
pub const MAX_SUBSTITUTION_DEPTH: usize = 10;

/// Longest expansion kept for a single value.
pub const MAX_RESOLVED_LEN: usize = 4096;

/// `<parent>` coordinates of a POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ParentRef {
    /// Substitute placeholders in the parent coordinates.
    fn resolved(&self, table: &PropertyTable) -> Self {
        Self {
            group_id: table.resolve(&self.group_id),
            artifact_id: table.resolve(&self.artifact_id),
            version: table.resolve(&self.version),
        }
    }
}

impl std::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// A `<dependency>` entry before placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDependency {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

/// The parts of a POM the scanner cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub parent: Option<ParentRef>,
    /// `<properties>` in document order.
    pub properties: Vec<(String, String)>,
    /// Direct `project/dependencies/dependency` entries.
    pub dependencies: Vec<RawDependency>,
    /// `project/licenses/license/name` values.
    pub licenses: Vec<String>,
}

impl Pom {
    /// This POM's own property table, without any ancestor.
    pub fn local_properties(&self) -> PropertyTable {
        let mut table = PropertyTable::default();
        for (key, value) in &self.properties {
            table.insert(key, value);
        }

        let parent = self.parent.as_ref();
        let version = self
            .version
            .as_deref()
            .or(parent.map(|p| p.version.as_str()));
        let group_id = self
            .group_id
            .as_deref()
            .or(parent.map(|p| p.group_id.as_str()));

        if let Some(version) = version {
            table.insert("project.version", version);
        }
        if let Some(group_id) = group_id {
            table.insert("project.groupId", group_id);
        }
        if let Some(artifact_id) = &self.artifact_id {
            table.insert("project.artifactId", artifact_id);
        }
        if let Some(parent) = parent {
            table.insert("project.parent.version", &parent.version);
            table.insert("project.parent.groupId", &parent.group_id);
        }
        table
    }
}

#[derive(Default)]
struct PartialParent {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

/// Parse POM XML. Element names are matched on their local part, so both
/// namespaced (`xmlns="http://maven.apache.org/POM/4.0.0"`) and bare POMs work.
pub fn parse_pom(content: &str) -> Result<Pom, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_project = false;

    let mut parent = PartialParent::default();
    let mut dependency = RawDependency::default();
    let mut license_name: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = local_name(e);
                if stack.is_empty() {
                    if name != "project" {
                        return Err(ParseError::MissingProject);
                    }
                    saw_project = true;
                }
                stack.push(name);
                text.clear();
                match path_of(&stack).as_slice() {
                    ["project", "dependencies", "dependency"] => {
                        dependency = RawDependency::default();
                    }
                    ["project", "licenses", "license"] => license_name = None,
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                let name = local_name(e);
                if stack.is_empty() {
                    if name != "project" {
                        return Err(ParseError::MissingProject);
                    }
                    saw_project = true;
                    continue;
                }
                stack.push(name);
                text.clear();
                apply_leaf(
                    &path_of(&stack),
                    "",
                    &mut pom,
                    &mut parent,
                    &mut dependency,
                    &mut license_name,
                );
                stack.pop();
            }
            Event::Text(ref e) => {
                let unescaped = e.unescape().map_err(|err| ParseError::Xml(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(ref e) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(_) => {
                match path_of(&stack).as_slice() {
                    ["project", "dependencies", "dependency"] => {
                        let done = std::mem::take(&mut dependency);
                        if done.group_id.is_some() && done.artifact_id.is_some() {
                            pom.dependencies.push(done);
                        } else {
                            debug!("skipping dependency without groupId/artifactId: {:?}", done);
                        }
                    }
                    ["project", "parent"] => {
                        let partial = std::mem::take(&mut parent);
                        match (partial.group_id, partial.artifact_id, partial.version) {
                            (Some(group_id), Some(artifact_id), Some(version)) => {
                                pom.parent = Some(ParentRef {
                                    group_id,
                                    artifact_id,
                                    version,
                                });
                            }
                            _ => debug!("ignoring incomplete <parent> block"),
                        }
                    }
                    ["project", "licenses", "license"] => {
                        if let Some(name) = license_name.take() {
                            pom.licenses.push(name);
                        }
                    }
                    leaf => {
                        let value = text.trim().to_string();
                        apply_leaf(
                            leaf,
                            &value,
                            &mut pom,
                            &mut parent,
                            &mut dependency,
                            &mut license_name,
                        );
                    }
                }
                text.clear();
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml(format!(
            "unexpected end of document inside <{}>",
            stack.join("/")
        )));
    }
    if !saw_project {
        return Err(ParseError::MissingProject);
    }
    Ok(pom)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

fn path_of(stack: &[String]) -> Vec<&str> {
    stack.iter().map(String::as_str).collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Record the text of a leaf element at `path`.
fn apply_leaf(
    path: &[&str],
    value: &str,
    pom: &mut Pom,
    parent: &mut PartialParent,
    dependency: &mut RawDependency,
    license_name: &mut Option<String>,
) {
    match path {
        ["project", "groupId"] => pom.group_id = non_empty(value),
        ["project", "artifactId"] => pom.artifact_id = non_empty(value),
        ["project", "version"] => pom.version = non_empty(value),
        ["project", "parent", "groupId"] => parent.group_id = non_empty(value),
        ["project", "parent", "artifactId"] => parent.artifact_id = non_empty(value),
        ["project", "parent", "version"] => parent.version = non_empty(value),
        ["project", "properties", key] => {
            pom.properties.push((key.to_string(), value.to_string()));
        }
        ["project", "dependencies", "dependency", "groupId"] => {
            dependency.group_id = non_empty(value)
        }
        ["project", "dependencies", "dependency", "artifactId"] => {
            dependency.artifact_id = non_empty(value)
        }
        ["project", "dependencies", "dependency", "version"] => {
            dependency.version = non_empty(value)
        }
        ["project", "licenses", "license", "name"] => *license_name = non_empty(value),
        _ => {}
    }
}

/// Property name to raw value. Values may still contain `${...}` placeholders;
/// [`PropertyTable::resolve`] substitutes them without mutating the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTable(BTreeMap<String, String>);

impl PropertyTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Merge an ancestor's table. Keys already present (from the child or a
    /// nearer ancestor) keep their value.
    pub fn inherit(&mut self, ancestor: &PropertyTable) {
        for (key, value) in &ancestor.0 {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substitute every `${name}` in `value` with [`MAX_SUBSTITUTION_DEPTH`].
    pub fn resolve(&self, value: &str) -> String {
        substitute(value, self, MAX_SUBSTITUTION_DEPTH)
    }
}

impl FromIterator<(String, String)> for PropertyTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Replace each `${name}` in `value` by its recursively substituted table
/// value. Missing keys, cycles, chains deeper than `depth` and expansions
/// longer than [`MAX_RESOLVED_LEN`] become `"unknown"`. An unterminated `${`
/// is kept verbatim.
pub fn substitute(value: &str, table: &PropertyTable, depth: usize) -> String {
    Expansion::new(table).substitute(value, depth)
}

/// One substitution pass: the keys being expanded, and what each key
/// expanded to at a given remaining depth.
struct Expansion<'a> {
    table: &'a PropertyTable,
    visiting: Vec<&'a str>,
    memo: HashMap<(&'a str, usize), String>,
}

impl<'a> Expansion<'a> {
    fn new(table: &'a PropertyTable) -> Self {
        Self {
            table,
            visiting: Vec::new(),
            memo: HashMap::new(),
        }
    }

    fn substitute(&mut self, value: &str, depth: usize) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                break;
            };
            out.push_str(&rest[..start]);
            out.push_str(&self.placeholder(after[..end].trim(), depth));
            rest = &after[end + 1..];
            if out.len() > MAX_RESOLVED_LEN {
                warn!("property expansion exceeds {} bytes; using '{}'", MAX_RESOLVED_LEN, UNKNOWN_VERSION);
                return UNKNOWN_VERSION.to_string();
            }
        }

        out.push_str(rest);
        out
    }

    fn placeholder(&mut self, name: &str, depth: usize) -> String {
        let Some((key, raw)) = self.table.0.get_key_value(name) else {
            warn!("property ${{{}}} is not defined; using '{}'", name, UNKNOWN_VERSION);
            return UNKNOWN_VERSION.to_string();
        };
        let key = key.as_str();
        if self.visiting.contains(&key) {
            warn!("property ${{{}}} is cyclic; using '{}'", name, UNKNOWN_VERSION);
            return UNKNOWN_VERSION.to_string();
        }
        if depth == 0 {
            warn!("property ${{{}}} nests too deeply; using '{}'", name, UNKNOWN_VERSION);
            return UNKNOWN_VERSION.to_string();
        }
        if let Some(done) = self.memo.get(&(key, depth)) {
            return done.clone();
        }

        self.visiting.push(key);
        let resolved = self.substitute(raw, depth - 1);
        self.visiting.pop();
        self.memo.insert((key, depth), resolved.clone());
        resolved
    }
}

/// Repository path of a POM: `{base}/{group/as/path}/{artifact}/{version}/{artifact}-{version}.pom`.
pub fn pom_url(base: &str, group_id: &str, artifact_id: &str, version: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}-{}.pom",
        base.trim_end_matches('/'),
        group_id.replace('.', "/"),
        artifact_id,
        version,
        artifact_id,
        version
    )
}

/// Builds merged property tables by fetching parent POMs from Maven repositories.
#[derive(Debug, Clone)]
pub struct PomResolver {
    client: Client,
    repositories: Vec<String>,
    parent_depth: usize,
}

impl PomResolver {
    pub fn new(client: Client, repositories: Vec<String>, parent_depth: usize) -> Self {
        Self {
            client,
            repositories,
            parent_depth,
        }
    }

    /// The merged table for `pom`: its own properties, then each ancestor up
    /// to the depth bound, child values winning. An ancestor that cannot be
    /// fetched ends the walk; what was collected so far is kept.
    pub async fn property_table(&self, pom: &Pom) -> PropertyTable {
        let mut table = pom.local_properties();
        let mut next = pom.parent.clone();

        for _ in 0..self.parent_depth {
            let Some(parent_ref) = next.take() else {
                break;
            };
            let parent_ref = parent_ref.resolved(&table);
            match self.fetch_pom(&parent_ref).await {
                Ok(parent) => {
                    debug!("inheriting properties from parent {}", parent_ref);
                    table.inherit(&parent.local_properties());
                    next = parent.parent;
                }
                Err(err) => {
                    warn!("{}; continuing with the properties resolved so far", err);
                    break;
                }
            }
        }

        table
    }

    /// Fetch and parse a POM, trying each repository in order.
    pub async fn fetch_pom(&self, coords: &ParentRef) -> Result<Pom, PropertyError> {
        for repository in &self.repositories {
            let url = pom_url(
                repository,
                &coords.group_id,
                &coords.artifact_id,
                &coords.version,
            );
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(err) => {
                    debug!("GET {} failed: {}", url, err);
                    continue;
                }
            };
            if response.status() != reqwest::StatusCode::OK {
                debug!("GET {} returned {}", url, response.status());
                continue;
            }
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    debug!("reading {} failed: {}", url, err);
                    continue;
                }
            };
            return parse_pom(&body).map_err(|source| PropertyError::ParentMalformed {
                coordinate: coords.to_string(),
                source,
            });
        }

        Err(PropertyError::ParentUnavailable {
            coordinate: coords.to_string(),
        })
    }
}
