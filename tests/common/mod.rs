use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_crg") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "crg.exe" } else { "crg" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve crg binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_env(case_name, args, &[])
}

pub fn run_cli_case_env(case_name: &str, args: &[&str], envs: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("crg-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command.args(args).env("RUST_BACKTRACE", "1");
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command.output().expect("execute crg command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Build a small export archive from `(entry_name, content)` pairs.
pub fn build_archive(dir: &Path, file_name: &str, entries: &[(&str, &str)]) -> PathBuf {
    use zip::write::SimpleFileOptions;

    let path = dir.join(file_name);
    let file = File::create(&path).expect("create fixture archive");
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(*name, options).expect("start fixture entry");
        zip.write_all(content.as_bytes())
            .expect("write fixture entry");
    }
    zip.finish().expect("finish fixture archive");
    path
}

/// The canonical small fixture: a user listing and two channels, one of them
/// with a merged announcement, a bot prompt with a reply, and a junk entry.
pub fn standard_fixture(dir: &Path) -> PathBuf {
    build_archive(
        dir,
        "export.zip",
        &[
            (
                "users.json",
                r#"[{"id": "u1", "name": "Alice"}, {"id": "u2", "name": "Bob"}]"#,
            ),
            (
                "general/2024-01-01.json",
                r#"[
                    {"user": "u1", "text": "hello"},
                    {"user": "u2", "text": "PR #1 speed-up merged :white_check_mark:"},
                    {"user": "u9", "text": ":thinking_face: Hello from reflection bot! :thinking_face: PR #1 speed-up was merged", "reply_count": 2}
                ]"#,
            ),
            (
                "general/2024-01-02.json",
                r#"[{"user": "u1", "text": "follow-up"}]"#,
            ),
            ("quiet/2024-01-01.json", r#"[{"user": "u2", "text": "hi"}]"#),
            ("general/broken.json", "not json"),
        ],
    )
}
