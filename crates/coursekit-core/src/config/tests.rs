use std::io::Write;
use std::path::Path;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 8] = [
    "COURSEKIT_CONFIG",
    "COURSEKIT_ROOT",
    "COURSEKIT_OUTPUT_DIR",
    "COURSEKIT_GATEWAY_BIND",
    "COURSEKIT_GATEWAY_PORT",
    "COURSEKIT_LINKS_CONCURRENCY",
    "COURSEKIT_LINKS_TIMEOUT",
    "COURSEKIT_TUTOR_MODEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
#[serial]
fn defaults_when_file_missing() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/coursekit.toml")).unwrap();
    assert_eq!(config.project.root, Path::new("."));
    assert_eq!(config.project.exclude, vec!["dist", "node_modules", "_archived", "target"]);
    assert_eq!(config.knowledge.output_file, "ai_knowledge_base.json");
    assert_eq!(config.pages.chapters.len(), 3);
    assert_eq!(config.gateway.port, 5000);
    assert_eq!(config.tutor.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(config.pipeline.max_fix_passes, 3);
}

#[test]
#[serial]
fn parse_partial_toml() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[project]
root = "/srv/site"
output_dir = "build"

[audit]
min_contrast = 7.0

[audit.links]
check_external = false

[fix]
split_paragraphs = false

[pipeline]
max_fix_passes = 1
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.project.root, Path::new("/srv/site"));
    assert_eq!(config.output_dir(), Path::new("/srv/site/build"));
    assert_eq!(
        config.knowledge_path(),
        Path::new("/srv/site/build/ai_knowledge_base.json")
    );
    assert!((config.audit.min_contrast - 7.0).abs() < f64::EPSILON);
    assert!(!config.audit.links.check_external);
    assert_eq!(config.audit.links.concurrency, 10);
    assert!(!config.fix.split_paragraphs);
    assert!(config.fix.disable_missing_links);
    assert_eq!(config.pipeline.max_fix_passes, 1);
    assert!(!config.project.exclude.is_empty());
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[gateway]\nport = \"not a port\"\n").unwrap();
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("invalid config in"));
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    unsafe {
        std::env::set_var("COURSEKIT_ROOT", "/tmp/course");
        std::env::set_var("COURSEKIT_OUTPUT_DIR", "out");
        std::env::set_var("COURSEKIT_GATEWAY_BIND", "0.0.0.0");
        std::env::set_var("COURSEKIT_GATEWAY_PORT", "8080");
        std::env::set_var("COURSEKIT_LINKS_CONCURRENCY", "4");
        std::env::set_var("COURSEKIT_LINKS_TIMEOUT", "3");
        std::env::set_var("COURSEKIT_TUTOR_MODEL", "claude-haiku-4-5");
    }
    let config = Config::load(Path::new("/nonexistent/coursekit.toml")).unwrap();
    clear_env();

    assert_eq!(config.output_dir(), Path::new("/tmp/course/out"));
    assert_eq!(config.gateway.bind, "0.0.0.0");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.audit.links.concurrency, 4);
    assert_eq!(config.audit.links.timeout_secs, 3);
    assert_eq!(config.tutor.model, "claude-haiku-4-5");
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("COURSEKIT_GATEWAY_PORT", "99999");
        std::env::set_var("COURSEKIT_LINKS_CONCURRENCY", "0");
        std::env::set_var("COURSEKIT_LINKS_TIMEOUT", "soon");
        std::env::set_var("COURSEKIT_ROOT", "  ");
    }
    let config = Config::load(Path::new("/nonexistent/coursekit.toml")).unwrap();
    clear_env();

    assert_eq!(config.gateway.port, 5000);
    assert_eq!(config.audit.links.concurrency, 10);
    assert_eq!(config.audit.links.timeout_secs, 10);
    assert_eq!(config.project.root, Path::new("."));
}

#[test]
#[serial]
fn tutor_knowledge_follows_output_dir() {
    clear_env();
    let mut config = Config::default();
    config.project.output_dir = "site".into();
    assert_eq!(
        config.tutor_knowledge_path(),
        Path::new("./site/ai_knowledge_base.json")
    );
    config.tutor.knowledge_file = "/data/kb.json".into();
    assert_eq!(config.tutor_knowledge_path(), Path::new("/data/kb.json"));
}

// --- config path resolution ---

#[test]
#[serial]
fn config_path_prefers_flag_then_env() {
    clear_env();
    assert_eq!(resolve_config_path(None), Path::new(DEFAULT_CONFIG_PATH));

    unsafe { std::env::set_var("COURSEKIT_CONFIG", "/etc/coursekit.toml") };
    assert_eq!(resolve_config_path(None), Path::new("/etc/coursekit.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("local.toml"))),
        Path::new("local.toml")
    );
    clear_env();
}

#[test]
#[serial]
fn shipped_default_toml_matches_defaults() {
    clear_env();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = Config::load(&path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.project.exclude, defaults.project.exclude);
    assert_eq!(config.knowledge.source_dirs, defaults.knowledge.source_dirs);
    assert_eq!(config.pages.chapters, defaults.pages.chapters);
    assert_eq!(config.fix.link_rules, defaults.fix.link_rules);
    assert_eq!(config.tutor, defaults.tutor);
    assert_eq!(config.gateway, defaults.gateway);
    assert_eq!(config.audit.links.user_agent, defaults.audit.links.user_agent);
}
