mod common;

use std::sync::Arc;

use common::{FakeTool, touch};
use shotreel::{Config, ShotreelError, mask_file, scan_folder};

#[test]
fn scan_lists_readable_videos_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "B.mp4", 0);
    let a = touch(dir.path(), "A.mov", 0);
    touch(dir.path(), "notes.txt", 0);
    let broken = touch(dir.path(), "broken.mp4", 0);
    touch(dir.path(), "nested/C.mp4", 0);

    let mut tool = FakeTool::new();
    tool.rates.insert(broken, "0/0".to_string());
    tool.durations.insert(a, 3.5);

    let shots = scan_folder(dir.path(), &tool).unwrap();
    let names: Vec<&str> = shots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);
    assert!(shots.iter().all(|s| s.start_frame == 0));
    assert_eq!(shots[0].duration_seconds, 3.5);
    assert_eq!(shots[1].duration_seconds, 2.0);
    assert_eq!(shots[1].fps, Some(24.0));
}

#[test]
fn scan_of_missing_folder_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(scan_folder(&dir.path().join("nope"), &FakeTool::new()).is_err());
}

#[test]
fn mask_writes_stamped_copy_next_to_stem() {
    let dir = tempfile::tempdir().unwrap();
    let src = touch(dir.path(), "in/S010.mov", 0);
    let out_dir = dir.path().join("out");
    let tool = FakeTool::new();

    let out = mask_file(Arc::new(Config::default()), &src, &out_dir, &tool).unwrap();
    assert_eq!(out, out_dir.join("S010_shotmask.mp4"));
    assert!(out.is_file());

    let renders = tool.renders();
    assert_eq!(renders.len(), 1);
    assert_eq!(renders[0].output, out);
}

#[test]
fn mask_of_missing_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let err = mask_file(
        Arc::new(Config::default()),
        &dir.path().join("gone.mp4"),
        dir.path(),
        &FakeTool::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ShotreelError::Probe(_)));
}
