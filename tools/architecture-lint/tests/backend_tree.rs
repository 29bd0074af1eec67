//! Lints backend trees on disk: synthetic ones and the real workspace.

use std::fs;
use std::path::{Path, PathBuf};

use architecture_lint::{ArchitectureLintError, lint_backend_sources};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Backend {
    dir: TempDir,
}

impl Backend {
    fn with(self, relative: &str, contents: &str) -> Self {
        let path = self.dir.path().join("src").join(relative);
        let parent = path.parent().expect("source files have a parent");
        fs::create_dir_all(parent).expect("create source dir");
        fs::write(&path, contents).expect("write source file");
        self
    }

    fn lint(&self) -> Result<(), ArchitectureLintError> {
        lint_backend_sources(self.dir.path())
    }
}

#[fixture]
fn backend() -> Backend {
    Backend {
        dir: TempDir::new().expect("temp dir"),
    }
}

fn violating_files(result: Result<(), ArchitectureLintError>) -> Vec<String> {
    let Err(ArchitectureLintError::Violations(violations)) = result else {
        panic!("expected violations, got {result:?}");
    };
    violations
        .iter()
        .map(|violation| violation.file.display().to_string())
        .collect()
}

#[rstest]
fn layered_tree_passes(backend: Backend) {
    let backend = backend
        .with("lib.rs", "pub mod domain; pub mod outbound; pub mod settings;")
        .with("main.rs", "use diesel::prelude::*; mod server; fn main() {}")
        .with("domain/mod.rs", "pub mod post; use crate::domain::post::Post;")
        .with("domain/post.rs", "pub struct Post;")
        .with("outbound/cache/mod.rs", "use bb8_redis::redis; use crate::domain::post::Post;")
        .with("server/mod.rs", "use social_backend::outbound::cache; use actix_web::App;")
        .with("settings.rs", "use ortho_config::OrthoConfig;")
        .with("test_support.rs", "mod clock; use crate::domain::post::Post;");

    assert!(backend.lint().is_ok(), "{:?}", backend.lint());
}

#[rstest]
fn violations_carry_paths_relative_to_src(backend: Backend) {
    let backend = backend
        .with("domain/ports/entity_cache.rs", "use redis::AsyncCommands;")
        .with("inbound/http/posts.rs", "use crate::outbound::persistence::DbPool;")
        .with("server/state_builders.rs", "use social_backend::test_support::MemoryStore;");

    assert_eq!(
        violating_files(backend.lint()),
        [
            "domain/ports/entity_cache.rs",
            "inbound/http/posts.rs",
            "server/state_builders.rs",
        ]
    );
}

#[rstest]
fn new_top_level_modules_must_be_classified(backend: Backend) {
    let backend = backend.with("reports.rs", "pub fn render() {}");

    assert!(matches!(
        backend.lint(),
        Err(ArchitectureLintError::Unclassified { file }) if file == Path::new("reports.rs")
    ));
}

#[rstest]
fn unparsable_sources_are_errors(backend: Backend) {
    let backend = backend.with("domain/broken.rs", "fn (");

    assert!(matches!(backend.lint(), Err(ArchitectureLintError::Parse { .. })));
}

#[rstest]
fn workspace_backend_respects_its_layers() {
    let backend = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("backend");

    if let Err(err) = lint_backend_sources(&backend) {
        panic!("{err}");
    }
}
