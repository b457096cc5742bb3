// Shared helpers for tests that assemble and run compiled programs

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

fn scratch_dir() -> PathBuf {
    let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("crustcc-test-{}-{}", std::process::id(), id))
}

fn have_cc() -> bool {
    Command::new("cc").arg("--version").output().is_ok()
}

/// Compile `source`, link it with `cc` and return the process exit status.
///
/// Returns `None` when the host cannot run the result (not x86-64 Linux, or
/// no `cc` on the path), so callers skip instead of failing.
pub fn run(source: &str) -> Option<i32> {
    if !cfg!(all(target_arch = "x86_64", target_os = "linux")) || !have_cc() {
        eprintln!("skipping: needs x86-64 Linux with cc");
        return None;
    }

    let asm = crustcc::compile(source).expect("compilation failed");

    let dir = scratch_dir();
    fs::create_dir_all(&dir).expect("cannot create scratch dir");
    let asm_path = dir.join("prog.s");
    let exe_path = dir.join("prog");
    fs::write(&asm_path, &asm).expect("cannot write assembly");

    let link = Command::new("cc")
        .arg("-o")
        .arg(&exe_path)
        .arg(&asm_path)
        .output()
        .expect("cannot run cc");
    assert!(
        link.status.success(),
        "cc rejected the output:\n{}\n--- assembly ---\n{}",
        String::from_utf8_lossy(&link.stderr),
        asm
    );

    let status = Command::new(&exe_path)
        .status()
        .expect("cannot run compiled program");
    let _ = fs::remove_dir_all(&dir);

    status.code()
}

/// Exit status of a program whose `main` has the given body
pub fn run_main(body: &str) -> Option<i32> {
    run(&format!("int main() {{ {} }}", body))
}
