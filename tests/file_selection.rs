use qc_review::config::Config;
use qc_review::sanitize::sanitize_code;
use qc_review::select::{collect_sources, SelectionRules};

fn rules() -> SelectionRules {
    SelectionRules::parse(
        r#"
explicit_allow_list: [Dockerfile, setup.py]
implicit_allow_extensions: [".py", ".tf"]
explicit_deny_list: [setup.py, conftest.py]
"#,
    )
    .expect("parse rules")
}

#[test]
fn deny_list_always_wins() {
    let r = rules();
    assert!(!r.is_allowed("setup.py"));
    assert!(!r.is_allowed("conftest.py"));
}

#[test]
fn allow_list_and_extensions_include() {
    let r = rules();
    assert!(r.is_allowed("Dockerfile"));
    assert!(r.is_allowed("main.tf"));
    assert!(r.is_allowed("app.py"));
    assert!(!r.is_allowed("README.md"));
}

#[test]
fn missing_keys_default_to_empty() {
    let r = SelectionRules::parse("implicit_allow_extensions: ['.rs']\n").unwrap();
    assert!(r.is_allowed("lib.rs"));
    assert!(SelectionRules::parse("").unwrap().explicit_allow_list.is_empty());
}

#[test]
fn sanitize_strips_comments_and_blank_lines() {
    let cfg = Config::default();
    assert_eq!(
        sanitize_code(&cfg.sanitize, "print(1)\n# comment\n"),
        "print(1)"
    );
    assert_eq!(
        sanitize_code(&cfg.sanitize, "  x = 1  # set x\r\n\r\n\ty = 2\n"),
        "x = 1\ny = 2"
    );
    assert_eq!(sanitize_code(&cfg.sanitize, "# only\n#comments\n"), "");
}

#[test]
fn collect_sources_walks_and_sanitizes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("pkg")).unwrap();
    std::fs::create_dir_all(root.join(".git")).unwrap();
    std::fs::write(root.join("pkg/foo.py"), "print(1)\n# comment\n").unwrap();
    std::fs::write(root.join("pkg/empty.py"), "# nothing here\n").unwrap();
    std::fs::write(root.join("setup.py"), "setup()\n").unwrap();
    std::fs::write(root.join("notes.md"), "# notes\n").unwrap();
    std::fs::write(root.join(".git/hook.py"), "x = 1\n").unwrap();

    let cfg = Config::default();
    let files = collect_sources(root, &rules(), &cfg).unwrap();

    let names: Vec<_> = files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["empty.py", "foo.py"]);
    assert_eq!(files[0].payload, "");
    assert_eq!(files[1].payload, "print(1)");
}

#[test]
fn non_utf8_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("bad.py"), [0x66u8, 0x6f, 0xff, 0xfe, 0x0a]).unwrap();
    std::fs::write(root.join("good.py"), "ok = True\n").unwrap();

    let files = collect_sources(root, &rules(), &Config::default()).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path.file_name().unwrap(), "good.py");
    assert_eq!(files[0].payload, "ok = True");
}

#[test]
fn unicode_is_left_alone_unless_enabled() {
    let mut cfg = Config::default();
    let code = "name = \"\u{FB01}le\"\nwide = \"\u{FF21}\"\n";
    assert_eq!(
        sanitize_code(&cfg.sanitize, code),
        "name = \"\u{FB01}le\"\nwide = \"\u{FF21}\""
    );

    cfg.sanitize.normalize_unicode = true;
    assert_eq!(
        sanitize_code(&cfg.sanitize, code),
        "name = \"file\"\nwide = \"A\""
    );
}
