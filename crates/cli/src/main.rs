use std::process::ExitCode;

fn main() -> ExitCode {
    ipms_cli::run()
}
