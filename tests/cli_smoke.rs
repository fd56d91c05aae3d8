use std::path::PathBuf;

use boardgif::{BoardState, Game, Outcome};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_boardgif")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "boardgif.exe"
            } else {
                "boardgif"
            });
            p
        })
}

fn write_game(dir: &std::path::Path) {
    let positions = vec![
        BoardState::initial(),
        BoardState::new("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
        BoardState::new("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"),
    ];
    let mut tags = std::collections::BTreeMap::new();
    tags.insert("White".to_string(), "Alice".to_string());
    let game = Game::new("bR4b8jno", positions, tags, Outcome::Draw).unwrap();

    std::fs::create_dir_all(dir).unwrap();
    let f = std::fs::File::create(dir.join("bR4b8jno.json")).unwrap();
    serde_json::to_writer_pretty(f, &game).unwrap();
}

#[test]
fn cli_render_writes_gif() {
    let dir = PathBuf::from("target").join("cli_smoke");
    let games = dir.join("games");
    let scratch = dir.join("scratch");
    let out_path = dir.join("out.gif");
    let _ = std::fs::remove_file(&out_path);
    write_game(&games);

    let status = std::process::Command::new(exe())
        .args(["render", "--game", "bR4b8jnoWhite", "--speed", "2", "--concurrency", "2"])
        .arg("--games-dir")
        .arg(&games)
        .arg("--scratch-dir")
        .arg(&scratch)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(&out_path).unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[test]
fn cli_rejects_short_id() {
    let out_path = PathBuf::from("target").join("cli_smoke").join("short.gif");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .args(["render", "--game", "abc", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!out_path.exists());
}

#[test]
fn cli_lists_themes() {
    let out = std::process::Command::new(exe())
        .arg("themes")
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    for name in ["brown", "blue", "green", "purple"] {
        assert!(text.contains(name));
    }
}
