use std::fs::{self, File};
use std::path::Path;

use confgen::{generate, package, GenerateOptions, PackageOptions};
use flate2::read::GzDecoder;
use tempfile::TempDir;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn entry_names(archive: &Path) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(archive).unwrap()));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_generate_then_package() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(&root.join("resources/app.conf"), "url=${host}");
    write(&root.join("resources/log/level.txt"), "${level}");
    write(&root.join("filters/dev/app.properties"), "host=localhost\nlevel=DEBUG\n");
    write(&root.join("filters/prod/app.properties"), "host=prodhost\nlevel=WARN\n");

    let generated = generate(&GenerateOptions {
        resources_dir: root.join("resources"),
        filters_dir: root.join("filters"),
        output_dir: root.join("target/config"),
        ..GenerateOptions::default()
    })
    .unwrap();
    assert_eq!(generated.environments.len(), 2);

    let artifacts = package(&PackageOptions {
        input_dir: root.join("target/config"),
        output_dir: root.join("target"),
        final_name: "service-2.1".to_string(),
        ..PackageOptions::default()
    })
    .unwrap();

    let classifiers: Vec<_> = artifacts.iter().map(|a| a.attached_classifier()).collect();
    assert_eq!(classifiers, vec!["dev-config", "prod-config", "templates-config"]);
    for artifact in &artifacts {
        assert!(artifact.path.exists(), "{} missing", artifact.path.display());
        assert_eq!(entry_names(&artifact.path), vec!["app.conf", "log/level.txt"]);
    }
    assert_eq!(
        artifacts[1].path,
        root.join("target/service-2.1-prod-config.tar.gz")
    );
}

#[test]
fn test_custom_classifier_affixes() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("config/uat/app.conf"), "x");

    let artifacts = package(&PackageOptions {
        input_dir: tmp.path().join("config"),
        output_dir: tmp.path().join("dist"),
        final_name: "app".to_string(),
        classifier_prefix: ".".to_string(),
        classifier_postfix: String::new(),
        ..PackageOptions::default()
    })
    .unwrap();

    assert_eq!(artifacts[0].classifier, ".uat");
    assert_eq!(artifacts[0].attached_classifier(), ".uat");
    assert_eq!(artifacts[0].path, tmp.path().join("dist/app.uat.tar.gz"));
}
