//! Head tag resolution over a decoded manifest.
//!
//! For an entry point, the resolver walks static imports depth-first and
//! emits, per visited node:
//!
//! 1. the node's own script tag (`<script type='module'>` for entries,
//!    `<link rel='modulepreload'>` for everything else),
//! 2. the tags of each `.js` import, recursively, in listed order,
//! 3. one stylesheet link per `css` file.
//!
//! Dynamic imports are never followed. Shared dependencies reached through
//! different imports are emitted once per path; the output is not
//! de-duplicated. The walk keeps its own stack, so import depth is bounded
//! only by memory.

use std::collections::HashSet;

use crate::error::ResolveError;
use crate::manifest::{is_script, Manifest, ManifestEntry};

/// Path Vite's dev server serves its HMR client from.
pub const DEV_CLIENT_PATH: &str = "@vite/client";

/// One tag in the document head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadTag<'a> {
    /// Module script for an entry chunk
    EntryScript { href: &'a str },
    /// Eager preload hint for a non-entry chunk
    ModulePreload { href: &'a str },
    Stylesheet { href: &'a str },
    /// Script served by the dev server (no `crossorigin`)
    DevScript { href: &'a str },
}

impl HeadTag<'_> {
    /// Render the tag, prefixing its href with `base`.
    ///
    /// The stylesheet link omits the closing quote of its `href` attribute;
    /// pages rendered against existing templates depend on the exact bytes.
    pub fn render(&self, base: &str) -> String {
        match self {
            HeadTag::EntryScript { href } => {
                format!("<script type='module' crossorigin src='{base}{href}'></script>")
            }
            HeadTag::ModulePreload { href } => {
                format!("<link rel='modulepreload' crossorigin href='{base}{href}'>")
            }
            HeadTag::Stylesheet { href } => {
                format!("<link rel='stylesheet' crossorigin href='{base}{href}>")
            }
            HeadTag::DevScript { href } => {
                format!("<script type='module' src='{base}/{href}'></script>")
            }
        }
    }
}

/// Resolve the ordered head fragments for `entrypoint`.
///
/// Fails with [`ResolveError::EntryNotFound`] when the entry point or any
/// transitively imported `.js` key is missing from the manifest, and with
/// [`ResolveError::CyclicImport`] when a key imports itself through its own
/// chain of static imports.
pub fn resolve_heads(
    manifest: &Manifest,
    entrypoint: &str,
    base_path: &str,
) -> Result<Vec<String>, ResolveError> {
    let mut heads = Vec::new();
    // Keys on the current path, in order and as a set for the cycle check.
    let mut chain: Vec<&str> = Vec::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut stack = vec![Step::Enter(entrypoint)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(key) => {
                // Only the current path counts; siblings may share dependencies.
                if on_path.contains(key) {
                    let mut cycle: Vec<String> = chain.iter().map(|k| k.to_string()).collect();
                    cycle.push(key.to_string());
                    return Err(ResolveError::CyclicImport(cycle));
                }

                let entry = manifest
                    .get(key)
                    .ok_or_else(|| ResolveError::EntryNotFound(key.to_string()))?;

                if entry.is_script() {
                    let tag = if entry.is_entry {
                        HeadTag::EntryScript { href: &entry.file }
                    } else {
                        HeadTag::ModulePreload { href: &entry.file }
                    };
                    heads.push(tag.render(base_path));
                }

                chain.push(key);
                on_path.insert(key);
                stack.push(Step::Exit(entry));
                stack.extend(
                    entry
                        .imports
                        .iter()
                        .rev()
                        .filter(|import| is_script(import))
                        .map(|import| Step::Enter(import.as_str())),
                );
            }
            Step::Exit(entry) => {
                if let Some(key) = chain.pop() {
                    on_path.remove(key);
                }
                heads.extend(
                    entry
                        .css
                        .iter()
                        .map(|href| HeadTag::Stylesheet { href }.render(base_path)),
                );
            }
        }
    }

    Ok(heads)
}

/// Pending work for [`resolve_heads`]; imports are visited before the
/// importer's stylesheets.
enum Step<'m> {
    Enter(&'m str),
    Exit(&'m ManifestEntry),
}

/// Heads pointing at a running dev server instead of built assets.
///
/// Always two tags: the HMR client followed by the entry module itself.
pub fn dev_heads(dev_host: &str, entrypoint: &str) -> Vec<String> {
    vec![
        HeadTag::DevScript {
            href: DEV_CLIENT_PATH,
        }
        .render(dev_host),
        HeadTag::DevScript { href: entrypoint }.render(dev_host),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;

    fn entry(file: &str, is_entry: bool, imports: &[&str], css: &[&str]) -> ManifestEntry {
        ManifestEntry {
            file: file.to_string(),
            is_entry,
            imports: imports.iter().map(|s| s.to_string()).collect(),
            css: css.iter().map(|s| s.to_string()).collect(),
            ..ManifestEntry::default()
        }
    }

    fn manifest(entries: Vec<(&str, ManifestEntry)>) -> Manifest {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_entry_with_import_and_css() {
        let m = manifest(vec![
            (
                "a.html",
                entry("assets/a.js", true, &["dep.js"], &["assets/a.css"]),
            ),
            ("dep.js", entry("assets/dep.js", false, &[], &[])),
        ]);

        let heads = resolve_heads(&m, "a.html", "vite/").unwrap();
        assert_eq!(
            heads,
            [
                "<script type='module' crossorigin src='vite/assets/a.js'></script>",
                "<link rel='modulepreload' crossorigin href='vite/assets/dep.js'>",
                "<link rel='stylesheet' crossorigin href='vite/assets/a.css>",
            ]
        );
    }

    #[test]
    fn test_single_fragment_for_bare_entry() {
        let m = manifest(vec![
            ("main.ts", entry("assets/main.js", true, &[], &[])),
            ("chunk.js", entry("assets/chunk.js", false, &[], &[])),
        ]);

        assert_eq!(
            resolve_heads(&m, "main.ts", "/").unwrap(),
            ["<script type='module' crossorigin src='/assets/main.js'></script>"]
        );
        assert_eq!(
            resolve_heads(&m, "chunk.js", "/").unwrap(),
            ["<link rel='modulepreload' crossorigin href='/assets/chunk.js'>"]
        );
    }

    #[test]
    fn test_order_is_depth_first_then_own_css() {
        let m = manifest(vec![
            ("index.html", entry("e.js", true, &["a.js", "b.js"], &["own.css"])),
            ("a.js", entry("a.js", false, &["c.js"], &["c1.css"])),
            ("b.js", entry("b.js", false, &[], &["b1.css", "b2.css"])),
            ("c.js", entry("c.js", false, &[], &[])),
        ]);

        let heads = resolve_heads(&m, "index.html", "").unwrap();
        assert_eq!(heads.len(), 8);
        assert!(heads[0].starts_with("<script") && heads[0].contains("'e.js'"));
        assert!(heads[1].contains("'a.js'"));
        assert!(heads[2].contains("'c.js'"));
        assert!(heads[3].contains("c1.css"));
        assert!(heads[4].contains("'b.js'"));
        assert!(heads[5].contains("b1.css"));
        assert!(heads[6].contains("b2.css"));
        assert!(heads[7].contains("own.css"));
    }

    #[test]
    fn test_shared_dependency_is_repeated() {
        let m = manifest(vec![
            ("index.html", entry("e.js", true, &["a.js", "b.js"], &[])),
            ("a.js", entry("a.js", false, &["shared.js"], &[])),
            ("b.js", entry("b.js", false, &["shared.js"], &[])),
            ("shared.js", entry("shared.js", false, &[], &[])),
        ]);

        let heads = resolve_heads(&m, "index.html", "").unwrap();
        let shared = heads.iter().filter(|h| h.contains("'shared.js'")).count();
        assert_eq!(shared, 2);
    }

    #[test]
    fn test_non_script_imports_and_dynamic_imports_are_skipped() {
        let mut root = entry("e.js", true, &["styles.css", "a.js"], &[]);
        root.dynamic_imports = vec!["lazy.js".to_string()];
        let m = manifest(vec![
            ("index.html", root),
            ("a.js", entry("a.js", false, &[], &[])),
            ("lazy.js", entry("lazy.js", false, &[], &[])),
        ]);

        let heads = resolve_heads(&m, "index.html", "").unwrap();
        assert_eq!(heads.len(), 2);
        assert!(!heads.iter().any(|h| h.contains("lazy.js")));
    }

    #[test]
    fn test_css_only_entry_emits_only_stylesheets() {
        let m = manifest(vec![(
            "style.css",
            entry("assets/style.css", true, &[], &["assets/style.css"]),
        )]);

        assert_eq!(
            resolve_heads(&m, "style.css", "b/").unwrap(),
            ["<link rel='stylesheet' crossorigin href='b/assets/style.css>"]
        );
    }

    #[test]
    fn test_missing_entry_point() {
        let m = Manifest::default();
        assert_eq!(
            resolve_heads(&m, "nope.html", "").unwrap_err(),
            ResolveError::EntryNotFound("nope.html".to_string())
        );
    }

    #[test]
    fn test_missing_import_reports_import_key() {
        let m = manifest(vec![("index.html", entry("e.js", true, &["gone.js"], &[]))]);
        assert_eq!(
            resolve_heads(&m, "index.html", "").unwrap_err(),
            ResolveError::EntryNotFound("gone.js".to_string())
        );
    }

    #[test]
    fn test_self_import_is_cycle() {
        let m = manifest(vec![("a.js", entry("a.js", true, &["a.js"], &[]))]);
        assert_eq!(
            resolve_heads(&m, "a.js", "").unwrap_err(),
            ResolveError::CyclicImport(vec!["a.js".to_string(), "a.js".to_string()])
        );
    }

    #[test]
    fn test_mutual_import_is_cycle() {
        let m = manifest(vec![
            ("index.html", entry("e.js", true, &["a.js"], &[])),
            ("a.js", entry("a.js", false, &["b.js"], &[])),
            ("b.js", entry("b.js", false, &["a.js"], &[])),
        ]);

        match resolve_heads(&m, "index.html", "").unwrap_err() {
            ResolveError::CyclicImport(chain) => {
                assert_eq!(chain, ["index.html", "a.js", "b.js", "a.js"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_deep_import_chain_resolves() {
        const DEPTH: usize = 50_000;
        let m: Manifest = (0..DEPTH)
            .map(|i| {
                let imports: Vec<String> = if i + 1 < DEPTH {
                    vec![format!("m{}.js", i + 1)]
                } else {
                    Vec::new()
                };
                let node = ManifestEntry {
                    file: format!("m{i}.js"),
                    is_entry: i == 0,
                    imports,
                    css: vec![format!("m{i}.css")],
                    ..ManifestEntry::default()
                };
                (format!("m{i}.js"), node)
            })
            .collect();

        let heads = resolve_heads(&m, "m0.js", "").unwrap();
        assert_eq!(heads.len(), 2 * DEPTH);
        assert!(heads[0].contains("'m0.js'"));
        assert!(heads[DEPTH - 1].contains("'m49999.js'"));
        // Stylesheets unwind innermost first.
        assert!(heads[DEPTH].contains("m49999.css"));
        assert!(heads[2 * DEPTH - 1].contains("m0.css"));
    }

    #[test]
    fn test_deep_cycle_is_reported() {
        const DEPTH: usize = 20_000;
        let m: Manifest = (0..DEPTH)
            .map(|i| {
                let node = ManifestEntry {
                    file: format!("m{i}.js"),
                    imports: vec![format!("m{}.js", (i + 1) % DEPTH)],
                    ..ManifestEntry::default()
                };
                (format!("m{i}.js"), node)
            })
            .collect();

        match resolve_heads(&m, "m0.js", "").unwrap_err() {
            ResolveError::CyclicImport(chain) => {
                assert_eq!(chain.len(), DEPTH + 1);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_dev_heads() {
        assert_eq!(
            dev_heads("http://localhost:5173", "src/main.ts"),
            [
                "<script type='module' src='http://localhost:5173/@vite/client'></script>",
                "<script type='module' src='http://localhost:5173/src/main.ts'></script>",
            ]
        );
    }
}
