use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn portainer_deploy() -> assert_cmd::Command {
    cargo_bin_cmd!("portainer-deploy")
}

fn write_config(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("deploy.json");
    std::fs::write(&path, contents).unwrap();
    format!("config={}", path.display())
}

// ── Help / Version ──

#[test]
fn shows_help() {
    portainer_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Build the current directory and deploy it as a container through Portainer",
        ));
}

#[test]
fn shows_version() {
    portainer_deploy()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("portainer-deploy"));
}

// ── Arguments ──

#[test]
fn requires_config_argument() {
    portainer_deploy()
        .arg("username=admin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config=<path>"));
}

#[test]
fn rejects_argument_without_equals() {
    portainer_deploy()
        .arg("deploy.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

// ── Config loading ──

#[test]
fn missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.json");

    portainer_deploy()
        .current_dir(tmp.path())
        .arg(format!("config={}", missing.display()))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Reading config file at"))
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn invalid_json_config_fails() {
    let tmp = TempDir::new().unwrap();
    let arg = write_config(&tmp, "{ not json");

    portainer_deploy()
        .current_dir(tmp.path())
        .arg(arg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn config_without_host_fails() {
    let tmp = TempDir::new().unwrap();
    let arg = write_config(&tmp, r#"{ "portainerPort": 9000 }"#);

    portainer_deploy()
        .current_dir(tmp.path())
        .arg(arg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("portainerHost"));
}

// ── Remote ──

#[test]
fn unreachable_portainer_fails_without_leaving_archive() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("package.json"),
        r#"{ "name": "app", "version": "1.0.0" }"#,
    )
    .unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
    let arg = write_config(
        &tmp,
        r#"{ "portainerHost": "127.0.0.1", "portainerPort": 1, "containerName": "app" }"#,
    );

    portainer_deploy()
        .current_dir(tmp.path())
        .arg(arg)
        .write_stdin("admin\nsecret\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter username"))
        .stderr(predicate::str::contains("request to portainer failed"));

    assert!(!tmp.path().join("dist/build-ctx-tmp.tar.gz").exists());
}

#[test]
fn username_argument_skips_username_prompt() {
    let tmp = TempDir::new().unwrap();
    let arg = write_config(
        &tmp,
        r#"{ "portainerHost": "127.0.0.1", "portainerPort": 1, "imageName": "app", "imageVersion": "1.0.0" }"#,
    );

    portainer_deploy()
        .current_dir(tmp.path())
        .args([arg.as_str(), "username=admin"])
        .write_stdin("secret\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter username").not())
        .stdout(predicate::str::contains("Enter password"))
        .stderr(predicate::str::contains("request to portainer failed"));
}
