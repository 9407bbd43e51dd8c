use anyhow::Result;
use env_logger::Target;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Writer that mirrors every log line to stderr and a log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Initialize logging at info level, teeing to `log_file` inside the run's
/// output directory. `RUST_LOG` still overrides the level.
pub fn init(log_file: &Path) -> Result<()> {
    let file = File::create(log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(Tee { file })))
        .try_init()?;
    Ok(())
}
