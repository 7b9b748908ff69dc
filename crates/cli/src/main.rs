use std::process::ExitCode;

fn main() -> ExitCode {
    ringi_cli::run()
}
