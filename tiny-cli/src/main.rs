use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tiny_core::{compile_cpp, token_trace};

/// Command-line driver for the tiny → C++ translator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Path to the source file (defaults to stdin)")]
    input: Option<String>,

    #[arg(short, long, help = "Path of the generated C++ file")]
    output: String,

    #[arg(long, help = "Print the token trace to stderr before compiling")]
    trace_tokens: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let source = match cli.input {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if cli.trace_tokens {
        for line in token_trace(&source) {
            eprintln!("{line}");
        }
    }

    // Nothing is written when compilation reported an error.
    let cpp = compile_cpp(&source)?;
    write_output(&cli.output, cpp.as_bytes())?;
    Ok(())
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn compiles_file_to_cpp() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("hello.tiny");
        fs::write(&input_path, "main() {\nconsole << \"Hi\"\n}\n").expect("write input");
        let output_path = dir.path().join("out.cpp");

        Command::cargo_bin("tiny-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .assert()
            .success();

        let cpp = fs::read_to_string(&output_path).expect("read output");
        assert!(cpp.contains("int main(){std::cout<<\"Hi\";return 0;}"));
    }

    #[test]
    fn reads_source_from_stdin() {
        let dir = tempdir().expect("tempdir");
        let output_path = dir.path().join("out.cpp");

        Command::cargo_bin("tiny-cli")
            .expect("binary exists")
            .arg("--output")
            .arg(&output_path)
            .write_stdin("main() {\nconsole << \"Hi\"\n}\n")
            .assert()
            .success();

        assert!(output_path.exists(), "cpp output was not created");
    }

    #[test]
    fn prints_token_trace_to_stderr() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("hello.tiny");
        fs::write(&input_path, "main() {\nconsole << \"Hi\"\n}\n").expect("write input");
        let output_path = dir.path().join("out.cpp");

        Command::cargo_bin("tiny-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .arg("--trace-tokens")
            .assert()
            .success()
            .stderr(predicate::str::contains("new line"));
    }

    #[test]
    fn failed_compiles_write_no_output() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("bad.tiny");
        fs::write(&input_path, "main() {\ngreet()\n}\n").expect("write input");
        let output_path = dir.path().join("out.cpp");

        Command::cargo_bin("tiny-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Error on line 2: Function 'greet' does not exist.",
            ));

        assert!(!output_path.exists(), "output must be gated on success");
    }

    #[test]
    fn reports_missing_input_file() {
        let dir = tempdir().expect("tempdir");
        let output_path = dir.path().join("out.cpp");

        Command::cargo_bin("tiny-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(dir.path().join("missing.tiny"))
            .arg("--output")
            .arg(&output_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read input file"));
    }
}
