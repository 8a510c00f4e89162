use std::process::ExitCode;

fn main() -> ExitCode {
    match knowledgec_lib::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
