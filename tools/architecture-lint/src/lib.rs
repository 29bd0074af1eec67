//! Import guardrails for the social backend.
//!
//! Every source file under `backend/src` belongs to exactly one layer,
//! inferred from its path. Each layer carries a list of internal modules and
//! infrastructure crate families it may not name:
//!
//! | Layer | Internal modules it may not name | Crate families it may not name |
//! | --- | --- | --- |
//! | `domain` | adapters, `server`, `settings`, `test_support` | Postgres, Redis, HTTP |
//! | `inbound`, `middleware` | `outbound`, `server`, `test_support` | Postgres, Redis |
//! | `outbound` | `inbound`, `middleware`, `server`, `test_support` | HTTP |
//! | `server` | `test_support` | Postgres, Redis |
//! | `settings` | every other layer | Postgres, Redis, HTTP |
//! | `test_support` | adapters, `server` | Postgres, Redis, HTTP |
//!
//! `lib.rs` and `main.rs` are composition roots and are not checked. Any
//! other file that matches no layer is reported so new modules get a rule.
//!
//! Run it with `cargo run -p architecture-lint [backend-dir]`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Name the backend library is imported under from the binary.
const LIBRARY_CRATE: &str = "social_backend";

/// Files wiring the layers together; exempt from layer rules.
const COMPOSITION_ROOTS: [&str; 2] = ["lib.rs", "main.rs"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    Io(io::Error),
    /// A file could not be parsed as Rust.
    Parse { file: PathBuf, message: String },
    /// A file sits outside every known layer.
    Unclassified { file: PathBuf },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read backend sources: {err}"),
            Self::Parse { file, message } => {
                write!(f, "{} does not parse: {message}", file.display())
            }
            Self::Unclassified { file } => write!(
                f,
                "{} belongs to no layer; add it to the architecture lint",
                file.display()
            ),
            Self::Violations(violations) => {
                writeln!(f, "{} layer boundary violation(s):", violations.len())?;
                for violation in violations {
                    writeln!(f, "  {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } | Self::Unclassified { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub contents: String,
}

impl LintSource {
    pub fn new(file: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            contents: contents.into(),
        }
    }
}

/// Infrastructure crates grouped by the backing service they talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CrateFamily {
    Postgres,
    Redis,
    Http,
}

impl CrateFamily {
    const fn label(self) -> &'static str {
        match self {
            Self::Postgres => "Postgres",
            Self::Redis => "Redis",
            Self::Http => "HTTP",
        }
    }

    const fn crates(self) -> &'static [&'static str] {
        match self {
            Self::Postgres => &["bb8", "diesel", "diesel_async", "scoped_futures"],
            Self::Redis => &["bb8_redis", "redis"],
            Self::Http => &["actix_http", "actix_service", "actix_web"],
        }
    }

    fn of_crate(name: &str) -> Option<Self> {
        [Self::Postgres, Self::Redis, Self::Http]
            .into_iter()
            .find(|family| family.crates().contains(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Middleware,
    Outbound,
    Server,
    Settings,
    TestSupport,
}

/// Top-level modules of the backend, as named in `crate::` paths.
const MODULES: [&str; 7] = [
    "domain",
    "inbound",
    "middleware",
    "outbound",
    "server",
    "settings",
    "test_support",
];

impl Layer {
    /// Classify a path relative to `backend/src` by its first component.
    fn of_file(relative: &Path) -> Option<Self> {
        let first = relative.components().next()?.as_os_str().to_str()?;
        let module = first.strip_suffix(".rs").unwrap_or(first);
        match module {
            "domain" => Some(Self::Domain),
            "inbound" => Some(Self::Inbound),
            "middleware" => Some(Self::Middleware),
            "outbound" => Some(Self::Outbound),
            "server" => Some(Self::Server),
            "settings" => Some(Self::Settings),
            "test_support" => Some(Self::TestSupport),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Middleware => "middleware",
            Self::Outbound => "outbound",
            Self::Server => "server",
            Self::Settings => "settings",
            Self::TestSupport => "test_support",
        }
    }

    const fn forbidden_modules(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &[
                "inbound",
                "middleware",
                "outbound",
                "server",
                "settings",
                "test_support",
            ],
            Self::Inbound | Self::Middleware => &["outbound", "server", "test_support"],
            Self::Outbound => &["inbound", "middleware", "server", "test_support"],
            Self::Server => &["test_support"],
            Self::Settings => &[
                "domain",
                "inbound",
                "middleware",
                "outbound",
                "server",
                "test_support",
            ],
            Self::TestSupport => &["inbound", "middleware", "outbound", "server"],
        }
    }

    const fn forbidden_families(self) -> &'static [CrateFamily] {
        match self {
            Self::Domain | Self::Settings | Self::TestSupport => {
                &[CrateFamily::Postgres, CrateFamily::Redis, CrateFamily::Http]
            }
            Self::Inbound | Self::Middleware | Self::Server => {
                &[CrateFamily::Postgres, CrateFamily::Redis]
            }
            Self::Outbound => &[CrateFamily::Http],
        }
    }
}

/// Lint the backend crate sources on disk.
///
/// `backend_dir` is the directory holding the backend `Cargo.toml`.
///
/// # Errors
/// Returns [`ArchitectureLintError`] when reading or parsing fails, when a
/// file matches no layer, or when any boundary is crossed.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    collect_sources(&src_dir, &src_dir, &mut sources)?;
    sources.retain(|source| {
        !COMPOSITION_ROOTS
            .iter()
            .any(|root| source.file == Path::new(root))
    });
    sources.sort_by(|left, right| left.file.cmp(&right.file));
    lint_sources(&sources)
}

/// Lint in-memory sources whose paths are relative to `backend/src`.
///
/// # Errors
/// See [`lint_backend_sources`].
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let layer = Layer::of_file(&source.file).ok_or_else(|| {
            ArchitectureLintError::Unclassified {
                file: source.file.clone(),
            }
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(check_file(&source.file, layer, &parsed));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// What a referenced path points at, as far as the layer rules care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Target<'a> {
    Module(&'a str),
    Crate(CrateFamily, &'a str),
}

fn classify(segments: &[String]) -> Option<Target<'_>> {
    let (first, rest) = segments.split_first()?;
    let first = first.as_str();
    if first == LIBRARY_CRATE {
        return rest
            .first()
            .map(String::as_str)
            .filter(|module| MODULES.contains(module))
            .map(Target::Module);
    }
    if matches!(first, "crate" | "self" | "super") {
        return rest
            .iter()
            .map(String::as_str)
            .find(|segment| !matches!(*segment, "self" | "super"))
            .filter(|module| MODULES.contains(module))
            .map(Target::Module);
    }
    if MODULES.contains(&first) && !rest.is_empty() {
        return Some(Target::Module(first));
    }
    CrateFamily::of_crate(first).map(|family| Target::Crate(family, first))
}

fn check_file(file: &Path, layer: Layer, parsed: &syn::File) -> Vec<Violation> {
    let mut collector = PathCollector::default();
    collector.visit_file(parsed);

    let own = layer.name();
    let offending: BTreeSet<Target<'_>> = collector
        .paths
        .iter()
        .filter_map(|segments| classify(segments))
        .filter(|target| match *target {
            Target::Module(module) => module != own && layer.forbidden_modules().contains(&module),
            Target::Crate(family, _) => layer.forbidden_families().contains(&family),
        })
        .collect();

    offending
        .into_iter()
        .map(|target| Violation {
            file: file.to_path_buf(),
            message: match target {
                Target::Module(module) => {
                    format!("{own} must not reach into crate::{module}")
                }
                Target::Crate(family, name) => {
                    format!("{own} must not use {} crate `{name}`", family.label())
                }
            },
        })
        .collect()
}

/// Gathers every path mentioned by a file, including `use` trees expanded
/// into one entry per leaf.
#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn flatten_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.flatten_use(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                let mut leaf = prefix.clone();
                leaf.push(ident.to_string());
                self.paths.insert(leaf);
            }
            syn::UseTree::Glob(_) => {
                if !prefix.is_empty() {
                    self.paths.insert(prefix.clone());
                }
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.flatten_use(item, prefix);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !segments.is_empty() {
            self.paths.insert(segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.flatten_use(&node.tree, &mut Vec::new());
    }
}

fn collect_sources(
    src_root: &Path,
    dir: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources(src_root, &path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let relative = path.strip_prefix(src_root).unwrap_or(&path).to_path_buf();
            sources.push(LintSource::new(relative, fs::read_to_string(&path)?));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
