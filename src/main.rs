use std::process::ExitCode;

fn main() -> ExitCode {
    match foodcast::cli::run_from_env() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
