use std::process::ExitCode;

fn main() -> ExitCode {
    bird_sentry::run_cli()
}
