//! Test data generator.
//!
//! Produces files of `"<number>. <text>"` records where the number is a random non-negative `i32`
//! and the text is a random string of 2 to 255 ASCII letters.

use std::io;
use std::io::prelude::*;
use std::path::Path;

use log;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chunk::create_writer;
use crate::line;
use crate::observer::ProgressObserver;
use crate::order::SEPARATOR;

const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Default number of generated lines.
pub const DEFAULT_LINES_NUMBER: u64 = 5_000_000;

/// Generates a single random record.
pub fn random_record<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number = rng.gen_range(0..i32::MAX);
    let len = rng.gen_range(2..256);
    let text: String = (0..len)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect();

    return format!("{}{}{}", number, SEPARATOR, text);
}

/// Writes `lines_number` random records to the writer, reporting progress every `progress_interval` lines.
pub fn generate<W, R>(
    writer: &mut W,
    lines_number: u64,
    rng: &mut R,
    observer: &dyn ProgressObserver,
    progress_interval: u64,
) -> io::Result<()>
where
    W: Write,
    R: Rng + ?Sized,
{
    let progress_interval = progress_interval.max(1);

    for idx in 0..lines_number {
        line::write_line(writer, &random_record(rng))?;

        if idx % progress_interval == 0 {
            observer.report_progress(idx, lines_number);
        }
    }

    return Ok(());
}

/// Generates a file of random records. The same `seed` always produces the same file;
/// without a seed the generator is seeded from system entropy.
pub fn generate_file(
    path: &Path,
    lines_number: u64,
    seed: Option<u64>,
    observer: &dyn ProgressObserver,
) -> io::Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    observer.log(&format!("Generating {} random lines to the file {}", lines_number, path.display()));

    let mut writer = create_writer(path, None)?;
    generate(&mut writer, lines_number, &mut rng, observer, 5000)?;
    writer.flush()?;

    log::info!("{} lines generated", lines_number);
    observer.log("File generated");

    return Ok(());
}
