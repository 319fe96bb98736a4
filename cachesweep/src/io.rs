use std::fs::File;
use std::io::BufRead;

pub fn get_reader(file: File) -> Result<Box<dyn BufRead>, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::{BufReader, Cursor};
        use memmap2::{Advice, Mmap};
        let len = file.metadata().map_err(|e| format!("Couldn't read the file metadata: {e}"))?.len();
        // Empty files can't be mapped
        if len == 0 {
            return Ok(Box::new(BufReader::new(file)));
        }
        // SAFETY: the trace is only read, and is assumed not to be truncated while mapped
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Box::new(Cursor::new(m)))
        }
    }
}
