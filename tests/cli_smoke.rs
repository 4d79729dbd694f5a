use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_shotreel")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "shotreel.exe"
            } else {
                "shotreel"
            });
            p
        })
}

#[test]
fn cli_scan_of_empty_folder_writes_empty_shot_list() {
    let dir = PathBuf::from("target").join("cli_smoke");
    let folder = dir.join("empty");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&folder).unwrap();
    let out_path = dir.join("shots.json");

    let status = std::process::Command::new(exe())
        .arg("scan")
        .arg("--folder")
        .arg(&folder)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let shots = shotreel::load_shot_list(&out_path).unwrap();
    assert!(shots.is_empty());
}

#[test]
fn cli_build_requires_a_footage_source() {
    let out = std::process::Command::new(exe())
        .args(["build", "--shot", "S010", "--out", "target/cli_smoke/never.mp4"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}
