//! Loads and validates a root configuration, optionally amended by an
//! extension (§4.E, §12). The loader is a pure function of its inputs: a
//! config path and the documents found under it, nothing ambient (§12).

use std::collections::HashMap;
use std::path::Path;

use super::error::{ConfigurationError, ConfigurationResult};
use super::schema::{ExtensionConfig, GroupSpec, RootConfig, SetSpec};
use crate::transform::TriggerClass;

/// The resolved, validated configuration the pipeline runs against.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub sets: Vec<SetSpec>,
    pub groups: Vec<GroupSpec>,
    pub params: HashMap<String, String>,
    /// Text of each set document, keyed by set name, read relative to the
    /// config path.
    pub set_documents: HashMap<String, String>,
}

impl ResolvedConfig {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Load `root_path` (and, if given, `extension_path`) from `config_dir`,
/// validating version compatibility before anything else is touched (§12).
pub fn load(
    config_dir: &Path,
    root_path: &Path,
    extension_path: Option<&Path>,
) -> ConfigurationResult<ResolvedConfig> {
    let root_text = read(config_dir, root_path)?;
    let root: RootConfig = toml::from_str(&root_text).map_err(|e| ConfigurationError::Malformed {
        path: root_path.display().to_string(),
        reason: e.to_string(),
    })?;

    check_version(&root.version)?;

    let mut sets = root.sets;
    let mut groups = root.groups;
    let mut params = root.params;

    if let Some(ext_path) = extension_path {
        let ext_text = read(config_dir, ext_path)?;
        let ext: ExtensionConfig =
            toml::from_str(&ext_text).map_err(|e| ConfigurationError::Malformed {
                path: ext_path.display().to_string(),
                reason: e.to_string(),
            })?;
        if let Some(replacement) = ext.sets {
            sets = replacement;
        }
        if let Some(replacement) = ext.groups {
            groups = replacement;
        }
        params.extend(ext.params);
    }

    validate_groups(&groups)?;

    let mut set_documents = HashMap::new();
    for set in &sets {
        let text = read(config_dir, Path::new(&set.path)).map_err(|_| ConfigurationError::MissingSet {
            name: set.name.clone(),
            path: set.path.clone(),
        })?;
        set_documents.insert(set.name.clone(), text);
    }

    Ok(ResolvedConfig {
        sets,
        groups,
        params,
        set_documents,
    })
}

fn read(config_dir: &Path, path: &Path) -> ConfigurationResult<String> {
    let full = config_dir.join(path);
    std::fs::read_to_string(&full).map_err(|e| ConfigurationError::Malformed {
        path: full.display().to_string(),
        reason: e.to_string(),
    })
}

fn validate_groups(groups: &[GroupSpec]) -> ConfigurationResult<()> {
    let mut seen = std::collections::HashSet::new();
    for group in groups {
        if !seen.insert(group.name.as_str()) {
            return Err(ConfigurationError::DuplicateGroup(group.name.clone()));
        }
        if group.class.trim().is_empty() {
            return Err(ConfigurationError::MissingClass {
                group: group.name.clone(),
            });
        }
        if group.block && group.trigger == TriggerClass::TranslationUnit {
            return Err(ConfigurationError::TranslationUnitBlock {
                group: group.name.clone(),
            });
        }
    }
    Ok(())
}

/// Major.minor lexicographic comparison of `declared` against this crate's
/// own version (§4.E, §12): the engine must be at least as new.
fn check_version(declared: &str) -> ConfigurationResult<()> {
    let engine = env!("CARGO_PKG_VERSION");
    if major_minor(declared) >= major_minor(engine) {
        Ok(())
    } else {
        Err(ConfigurationError::VersionMismatch {
            engine: engine.to_string(),
            declared: declared.to_string(),
        })
    }
}

fn major_minor(version: &str) -> (u32, u32) {
    let mut parts = version.split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn version_mismatch_is_rejected_before_touching_sets() {
        let err = check_version("0.0.1").unwrap_err();
        assert!(matches!(err, ConfigurationError::VersionMismatch { .. }));
    }

    #[test]
    fn newer_declared_version_is_accepted() {
        assert!(check_version("999.0.0").is_ok());
    }

    #[test]
    fn loads_root_config_and_resolves_sets() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "root.toml",
            r#"
                version = "0.1.0"

                [[sets]]
                name = "core"
                path = "core.toml"

                [[groups]]
                name = "fuse"
                class = "trellis_engine::transform::loop_fusion::LoopFusion"
                kind = "dependent"
                trigger = "directive"
            "#,
        );
        write_file(dir.path(), "core.toml", "# transformation set\n");

        let resolved = load(dir.path(), Path::new("root.toml"), None).unwrap();
        assert_eq!(resolved.groups.len(), 1);
        assert!(resolved.set_documents.contains_key("core"));
    }

    #[test]
    fn rejects_duplicate_group_names() {
        let groups = vec![
            GroupSpec {
                name: "a".to_string(),
                class: "x".to_string(),
                kind: crate::transform::TransformationClass::Independent,
                trigger: TriggerClass::Directive,
                block: false,
            },
            GroupSpec {
                name: "a".to_string(),
                class: "y".to_string(),
                kind: crate::transform::TransformationClass::Independent,
                trigger: TriggerClass::Directive,
                block: false,
            },
        ];
        let err = validate_groups(&groups).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateGroup(_)));
    }

    #[test]
    fn rejects_translation_unit_block_combination() {
        let groups = vec![GroupSpec {
            name: "blk".to_string(),
            class: "x".to_string(),
            kind: crate::transform::TransformationClass::Independent,
            trigger: TriggerClass::TranslationUnit,
            block: true,
        }];
        let err = validate_groups(&groups).unwrap_err();
        assert!(matches!(err, ConfigurationError::TranslationUnitBlock { .. }));
    }
}
