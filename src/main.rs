use std::process::ExitCode;

fn main() -> ExitCode {
    pgplan::run()
}
