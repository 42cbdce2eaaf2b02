//! Kubernetes Secret manifests from annotated entries
//!
//! An entry takes part when its Notes carry `secret-type=<opaque|docker|tls>`.
//! `secret-namespace` (comma-separated) emits one manifest per namespace and
//! `secret-tags` (comma-separated) is matched against the tag filter.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use crate::entry::{Entry, PASSWORD, TITLE, URL, USER_NAME};
use crate::flatten::EntryMap;
use crate::notes::{self, Notes};
use crate::report::Report;

/// Separator placed between manifests
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Manifest shape selected by `secret-type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretType {
    Opaque,
    Docker,
    Tls,
    Unknown,
}

impl SecretType {
    pub fn from_str(s: &str) -> Self {
        match s {
            "opaque" => Self::Opaque,
            "docker" => Self::Docker,
            "tls" => Self::Tls,
            _ => Self::Unknown,
        }
    }

    /// Value of the manifest's `type` attribute
    pub fn kubernetes_type(&self) -> Option<&'static str> {
        match self {
            Self::Opaque => Some("Opaque"),
            Self::Docker => Some("kubernetes.io/dockerconfigjson"),
            Self::Tls => Some("kubernetes.io/tls"),
            Self::Unknown => None,
        }
    }
}

/// Options for one `secrets` run
#[derive(Debug, Clone)]
pub struct SecretOptions {
    /// Only entries tagged with this; `None` matches everything
    pub tag: Option<String>,
    /// Email written into docker config auths
    pub docker_email: String,
}

impl Default for SecretOptions {
    fn default() -> Self {
        Self {
            tag: None,
            docker_email: ksecret_core::config::DEFAULT_DOCKER_EMAIL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Metadata {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretManifest {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    #[serde(rename = "type")]
    secret_type: &'static str,
    data: Mapping,
}

impl SecretManifest {
    fn new(kind: SecretType, name: &str, namespace: &str) -> Self {
        Self {
            api_version: "v1",
            kind: "Secret",
            metadata: Metadata {
                name: name.to_string(),
                namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            },
            secret_type: kind.kubernetes_type().unwrap_or_default(),
            data: Mapping::new(),
        }
    }

    fn insert(&mut self, key: &str, value: String) {
        self.data
            .insert(Value::String(key.to_string()), Value::String(value));
    }
}

#[derive(Debug, Serialize)]
struct DockerAuth<'a> {
    username: &'a str,
    password: &'a str,
    email: &'a str,
    auth: String,
}

#[derive(Debug, Serialize)]
struct DockerConfig<'a> {
    auths: BTreeMap<&'a str, DockerAuth<'a>>,
}

/// Output lines of all manifests, separated by `---`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretDocument {
    lines: Vec<String>,
    count: usize,
}

impl SecretDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, manifest: &SecretManifest) -> Result<(), serde_yaml::Error> {
        let yaml = serde_yaml::to_string(manifest)?;

        if self.count > 0 {
            self.lines.push(String::new());
            self.lines.push(DOCUMENT_SEPARATOR.to_string());
        }
        self.lines.extend(yaml.lines().map(str::to_string));
        self.count += 1;
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of manifests
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Full text, one trailing newline per line
    pub fn to_text(&self) -> String {
        self.lines.iter().map(|l| format!("{}\n", l)).collect()
    }
}

/// Render every annotated entry of `map`
pub fn generate(
    map: &EntryMap,
    options: &SecretOptions,
    report: &mut Report,
) -> Result<SecretDocument, serde_yaml::Error> {
    let mut document = SecretDocument::new();
    for (path, entry) in map.iter() {
        render_entry(path, entry, options, &mut document, report)?;
    }
    Ok(document)
}

/// Append the manifests of one entry (one per namespace)
pub fn render_entry(
    path: &str,
    entry: &Entry,
    options: &SecretOptions,
    document: &mut SecretDocument,
    report: &mut Report,
) -> Result<(), serde_yaml::Error> {
    let notes = Notes::parse(entry);

    if !matches_tag(&notes.list(notes::TAGS), options.tag.as_deref()) {
        return Ok(());
    }

    let secret_type = SecretType::from_str(notes.get(notes::TYPE));
    for namespace in notes.list(notes::NAMESPACE) {
        let manifest = match secret_type {
            SecretType::Opaque => opaque_secret(path, namespace, &notes, entry, report),
            SecretType::Docker => docker_secret(path, namespace, entry, options, report),
            SecretType::Tls => tls_secret(path, namespace, entry, report),
            SecretType::Unknown => None,
        };

        if let Some(manifest) = manifest {
            document.push(&manifest)?;
        }
    }

    Ok(())
}

/// Empty filter matches all; otherwise the tag must be listed exactly
fn matches_tag(tags: &[&str], filter: Option<&str>) -> bool {
    match filter {
        None | Some("") => true,
        Some(tag) => tags.contains(&tag),
    }
}

/// Non-empty value of a required field, reporting when it is missing
fn required<'a>(path: &str, entry: &'a Entry, field: &str, report: &mut Report) -> Option<&'a str> {
    let value = entry.value_or_empty(field);
    if value.is_empty() {
        let label = if field == TITLE { "title" } else { field };
        report.error(format!("missing {} for entry '{}'", label, path));
        return None;
    }
    Some(value)
}

fn opaque_secret(
    path: &str,
    namespace: &str,
    notes: &Notes,
    entry: &Entry,
    report: &mut Report,
) -> Option<SecretManifest> {
    let title = required(path, entry, TITLE, report)?;
    let mut manifest = SecretManifest::new(SecretType::Opaque, title, namespace);

    let keys: Vec<&str> = notes
        .keys()
        .into_iter()
        .filter(|key| *key != notes::NAMESPACE)
        .collect();
    report.info(format!(
        "secret opaque name={} fields={}",
        title,
        keys.join(",")
    ));

    for key in keys {
        let field = notes.get(key);
        match entry.value(field) {
            Some(value) => {
                let name = key.strip_prefix(':').unwrap_or(key);
                manifest.insert(name, STANDARD.encode(value));
            }
            None => report.error(format!(
                "entry '{}' does not contain value '{}'",
                path, field
            )),
        }
    }

    Some(manifest)
}

fn docker_secret(
    path: &str,
    namespace: &str,
    entry: &Entry,
    options: &SecretOptions,
    report: &mut Report,
) -> Option<SecretManifest> {
    let title = required(path, entry, TITLE, report)?;
    let username = required(path, entry, USER_NAME, report)?;
    let password = required(path, entry, PASSWORD, report)?;
    let url = required(path, entry, URL, report)?;

    report.info(format!(
        "secret docker name={} url={} username={}",
        title, url, username
    ));

    let auth = DockerAuth {
        username,
        password,
        email: &options.docker_email,
        auth: STANDARD.encode(format!("{}:{}", username, password)),
    };
    let config = DockerConfig {
        auths: BTreeMap::from([(url, auth)]),
    };
    // Serializing plain string fields cannot fail
    let json = serde_json::to_string(&config).unwrap_or_default();

    let mut manifest = SecretManifest::new(SecretType::Docker, title, namespace);
    manifest.insert(".dockerconfigjson", STANDARD.encode(json));
    Some(manifest)
}

fn tls_secret(
    path: &str,
    namespace: &str,
    entry: &Entry,
    report: &mut Report,
) -> Option<SecretManifest> {
    let title = required(path, entry, TITLE, report)?;
    let crt = required(path, entry, USER_NAME, report)?;
    let key = required(path, entry, PASSWORD, report)?;

    report.info(format!(
        "secret tls name={} crt={} bytes key={} bytes",
        title,
        crt.len(),
        key.len()
    ));

    let mut manifest = SecretManifest::new(SecretType::Tls, title, namespace);
    manifest.insert("tls.crt", STANDARD.encode(crt));
    manifest.insert("tls.key", STANDARD.encode(key));
    Some(manifest)
}
