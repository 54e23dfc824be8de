use std::error::Error;
use std::process::Command;

fn run_command(bin: &str, args: &[&str]) -> Result<String, Box<dyn Error>> {
    let command = Command::new(bin).args(args).output()?;
    if command.status.success() {
        String::from_utf8(command.stdout).map_err(|e| e.into())
    } else {
        Err(format!("{} {:?} failed", bin, args).into())
    }
}

fn main() {
    let mut commit_hash = String::from("unknown");
    let mut commit_date = String::new();
    if let Ok(git_path) = run_command("git", &["rev-parse", "--show-cdup"]) {
        // Only trust the .git repository if it belongs to this workspace; release tarballs have none
        if git_path.trim_end() == "../" {
            match run_command("git", &["rev-parse", "HEAD"]) {
                Ok(hash) if hash.len() >= 7 => commit_hash = hash[0..7].to_string(),
                Ok(_) => {}
                Err(e) => {
                    println!("cargo:warning=Error getting commit hash, error: {}", e)
                }
            }
            match run_command("git", &["log", "-1", "--format=%cd"]) {
                Ok(date) => commit_date = date.trim_end().to_string(),
                Err(e) => {
                    println!("cargo:warning=Error getting commit date, error: {}", e)
                }
            }
        }
    };
    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit_hash);
    println!("cargo:rustc-env=GIT_COMMIT_DATE={}", commit_date);
}
