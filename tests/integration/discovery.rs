//! Scaffolded test cases are found and load cleanly.

use rattest_app::scaffold_template;
use rattest_config::{discover_tests, load_test_case};
use rattest_types::{CONFIG_FILE_NAME, PostProcessKind};
use std::fs;

#[test]
fn scaffolded_cases_are_discovered_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["zeta", "alpha", "nested/muon"] {
        let dir = tmp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        let test_name = name.rsplit('/').next().unwrap();
        scaffold_template(&dir, test_name).unwrap();
    }

    let configs = discover_tests(&[tmp.path()]).unwrap();
    let names: Vec<String> = configs
        .iter()
        .map(|p| load_test_case(p).unwrap().name)
        .collect();
    assert_eq!(names, vec!["alpha", "muon", "zeta"]);
}

#[test]
fn scaffolded_case_resolves_every_path() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("electron");
    fs::create_dir(&dir).unwrap();
    scaffold_template(&dir, "electron").unwrap();

    let tc = load_test_case(&dir.join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(tc.stage_macros, vec![dir.join("electron.mac")]);
    assert_eq!(tc.event_file, dir.join("electron.root"));
    assert_eq!(tc.post_kind, PostProcessKind::InterpretedMacro);
    assert_eq!(tc.seed, None);
    assert_eq!(tc.ks_threshold, 0.01);
    assert!(!tc.plot_options.log_x && !tc.plot_options.log_y);
}
