//! quorum CLI binary
//!
//! All logic is in the library; `cli::run()` prints every message and
//! returns the exit code on failure.

fn main() {
    if let Err(code) = quorum::cli::run() {
        std::process::exit(code.as_i32());
    }
}
