use websend_core::logging;

mod cli;

fn main() {
    // stdout carries replies (and frames in session mode), so logs never go there.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    match cli::run_from_args() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("websend: {:#}", err);
            std::process::exit(1);
        }
    }
}
