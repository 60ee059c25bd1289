use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use coursekit_core::{Config, Pipeline};
use coursekit_tutor::{ErrorKind, TutorRequest, TutorService, load_knowledge};
use serial_test::serial;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

const INDEX: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>Course Dashboard</title>
<link rel="stylesheet" href="design-system.css"></head>
<body>
<h1>Course Dashboard</h1>
<p class="text-gray-400">Pick a chapter to start.</p>
<img src="hero.png">
<a href="chapter-6.html">Personal Finance</a>
<a href="english_tutor.html">Writing help</a>
</body></html>"#;

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "course_materials/chapter_6/interest.md",
        "## Simple Interest\n\n**I = Prt**\n\nStep 1 identify P\nStep 2 multiply\n",
    );
    write(
        root,
        "english/unit_2/compare.md",
        "Compare and contrast two articles. Cite them in MLA format.",
    );
    write(root, "index.html", INDEX);
    write(root, "tutor.html", "<!DOCTYPE html><html lang=\"en\"><head><title>Tutor</title></head><body><h1>Tutor</h1></body></html>");
    write(root, "design-system.css", "body {}");
    write(root, "hero.png", "png");
    write(root, "node_modules/pkg/broken.html", r#"<a href="nowhere.html">x</a>"#);
    dir
}

fn load_config(root: &Path) -> Config {
    for key in ["COURSEKIT_ROOT", "COURSEKIT_OUTPUT_DIR", "COURSEKIT_TUTOR_MODEL"] {
        unsafe { std::env::remove_var(key) };
    }
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[project]
root = "{}"

[knowledge]
source_dirs = ["course_materials", "english"]

[audit.links]
check_external = false

[tutor]
api_key_env = "COURSEKIT_IT_ABSENT_KEY"
"#,
        root.display()
    )
    .unwrap();
    Config::load(file.path()).unwrap()
}

#[tokio::test]
#[serial]
async fn pipeline_builds_audits_and_fixes_the_site() {
    let dir = site();
    let root = dir.path();
    let pipeline = Pipeline::new(load_config(root));

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.knowledge.files_extracted, 2);
    assert_eq!(summary.pages.len(), 3);
    assert!(!summary.fix_passes.is_empty());
    assert!(!summary.audit.links.has_broken());

    for artifact in [
        "ai_knowledge_base.json",
        "chapter-1.html",
        "chapter-4.html",
        "chapter-6.html",
        "accessibility_report.json",
        "accessibility_report.html",
        "link_check_report.json",
        "link_check_report.html",
    ] {
        assert!(root.join(artifact).exists(), "{artifact} missing");
    }

    let index = std::fs::read_to_string(root.join("index.html")).unwrap();
    assert!(index.contains(r#"href="tutor.html""#));
    assert!(!index.contains("english_tutor.html"));
    assert!(index.contains("alt="));

    let chapter6 = std::fs::read_to_string(root.join("chapter-6.html")).unwrap();
    assert!(chapter6.contains("I = Prt"));

    // excluded directories are never touched
    let vendored = std::fs::read_to_string(root.join("node_modules/pkg/broken.html")).unwrap();
    assert_eq!(vendored, r#"<a href="nowhere.html">x</a>"#);
}

#[tokio::test]
#[serial]
async fn second_fix_run_changes_nothing() {
    let dir = site();
    let pipeline = Pipeline::new(load_config(dir.path()));
    pipeline.generate().await.unwrap();

    let first = pipeline.fix(false).await.unwrap();
    assert!(first.files_changed >= 1);
    let second = pipeline.fix(false).await.unwrap();
    assert_eq!(second.files_changed, 0);
    assert_eq!(second.total_fixes(), 0);
}

#[tokio::test]
#[serial]
async fn tutor_answers_from_extracted_knowledge() {
    let dir = site();
    let config = load_config(dir.path());
    let pipeline = Pipeline::new(config.clone());
    pipeline.extract().await.unwrap();

    let knowledge = load_knowledge(&config.tutor_knowledge_path()).await;
    assert_eq!(knowledge.english.essay_types["unit_2"].len(), 1);

    unsafe { std::env::remove_var("COURSEKIT_IT_ABSENT_KEY") };
    let tutor = TutorService::from_config(&config.tutor, Arc::new(knowledge)).unwrap();
    let request = TutorRequest::new("How do I calculate simple interest?").with_chapter("6");
    let response = tutor.respond(&request).await;
    assert!(response.success);
    assert_eq!(response.error_kind, Some(ErrorKind::MissingCredentials));
    assert!(response.answer_html.contains("How do I calculate simple interest?"));
    assert!(response.answer_html.contains("I = Prt"));
}
