use std::error::Error;
use std::path;
use std::process;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use file_sort::generate::{generate_file, DEFAULT_LINES_NUMBER};
use file_sort::{
    Descending, FileSorterBuilder, LineOrder, LogObserver, MergeStrategy, NumberTextOrder, OrdinalOrder,
};

fn main() {
    let arg_parser = build_arg_parser();

    let (command, args) = match arg_parser.subcommand() {
        Some(subcommand) => subcommand,
        None => {
            eprintln!("a subcommand is required, see --help");
            process::exit(2);
        }
    };

    let log_level: LogLevel = args.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let result = match command {
        "generate" => generate(args),
        _ => sort(args),
    };

    if let Err(err) = result {
        log::error!("{} failed: {}", command, err);
        process::exit(1);
    }
}

fn generate(args: &clap::ArgMatches) -> Result<(), Box<dyn Error>> {
    let output = args.value_of("output").ok_or("output file is required")?;
    let lines: u64 = args
        .is_present("lines")
        .then(|| args.value_of_t_or_exit("lines"))
        .unwrap_or(DEFAULT_LINES_NUMBER);
    let seed: Option<u64> = args.is_present("seed").then(|| args.value_of_t_or_exit("seed"));

    generate_file(path::Path::new(output), lines, seed, &LogObserver)?;

    return Ok(());
}

fn sort(args: &clap::ArgMatches) -> Result<(), Box<dyn Error>> {
    let input = args.value_of("input").ok_or("input file is required")?;
    let output = args.value_of("output").ok_or("output file is required")?;

    let record: Record = args.value_of_t_or_exit("record");
    let order: Order = args.value_of_t_or_exit("sort");
    let merge: Merge = args.value_of_t_or_exit("merge");
    let chunk_size: ByteSize = args.value_of_t_or_exit("chunk_size");
    let memory: ByteSize = args.value_of_t_or_exit("memory");
    let record_size: u64 = args.value_of_t_or_exit("record_size");
    let estimated_records: u64 = args.value_of_t_or_exit("estimated_records");
    let threads: Option<usize> = args
        .is_present("threads")
        .then(|| args.value_of_t_or_exit("threads"));
    let chunk_dir: Option<&str> = args.value_of("chunk_dir");

    let mut sorter_builder = FileSorterBuilder::new()
        .with_observer(LogObserver)
        .with_max_chunk_size(chunk_size.as_u64())
        .with_memory_limit(memory.as_u64())
        .with_record_size(record_size)
        .with_estimated_records(estimated_records)
        .with_merge_strategy(match merge {
            Merge::Heap => MergeStrategy::BinaryHeap,
            Merge::Linear => MergeStrategy::LinearScan,
        });

    if let Some(threads) = threads {
        sorter_builder = sorter_builder.with_threads_number(threads);
    }

    if let Some(chunk_dir) = chunk_dir {
        sorter_builder = sorter_builder.with_chunk_dir(path::Path::new(chunk_dir));
    }

    let (input, output) = (path::Path::new(input), path::Path::new(output));
    match (record, order) {
        (Record::NumberText, Order::Asc) => run_sort(sorter_builder.with_order(NumberTextOrder), input, output),
        (Record::NumberText, Order::Desc) => {
            run_sort(sorter_builder.with_order(Descending(NumberTextOrder)), input, output)
        }
        (Record::Ordinal, Order::Asc) => run_sort(sorter_builder.with_order(OrdinalOrder), input, output),
        (Record::Ordinal, Order::Desc) => run_sort(sorter_builder.with_order(Descending(OrdinalOrder)), input, output),
    }
}

fn run_sort<O: LineOrder>(
    sorter_builder: FileSorterBuilder<O>,
    input: &path::Path,
    output: &path::Path,
) -> Result<(), Box<dyn Error>> {
    let sorter = sorter_builder.build()?;
    sorter.sort(input, output)?;

    return Ok(());
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Order::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Order as clap::ArgEnum>::from_str(s, false)
    }
}

/// Record format, selects the line ordering.
#[derive(Copy, Clone, clap::ArgEnum)]
enum Record {
    NumberText,
    Ordinal,
}

impl Record {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Record::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for Record {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Record as clap::ArgEnum>::from_str(s, false)
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum Merge {
    Heap,
    Linear,
}

impl Merge {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Merge::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for Merge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Merge as clap::ArgEnum>::from_str(s, false)
    }
}

fn byte_size_validator(v: &str) -> Result<(), String> {
    match v.parse::<ByteSize>() {
        Ok(_) => Ok(()),
        Err(err) => Err(format!("size format incorrect: {}", err)),
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("file-sort")
        .about("external sorter of line-oriented text files")
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .global(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .subcommand(
            clap::App::new("generate")
                .about("generates a file of random \"<number>. <text>\" records")
                .arg(
                    clap::Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("file to be generated")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("lines")
                        .short('n')
                        .long("lines")
                        .help("number of lines to generate (default: 5000000)")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("seed")
                        .long("seed")
                        .help("random generator seed")
                        .takes_value(true),
                ),
        )
        .subcommand(
            clap::App::new("sort")
                .about("sorts a file")
                .arg(
                    clap::Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("file to be sorted")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("result file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("record")
                        .short('r')
                        .long("record")
                        .help("record format")
                        .takes_value(true)
                        .default_value("number-text")
                        .possible_values(Record::possible_values()),
                )
                .arg(
                    clap::Arg::new("sort")
                        .short('s')
                        .long("sort")
                        .help("sorting order")
                        .takes_value(true)
                        .default_value("asc")
                        .possible_values(Order::possible_values()),
                )
                .arg(
                    clap::Arg::new("merge")
                        .short('m')
                        .long("merge")
                        .help("merge algorithm")
                        .takes_value(true)
                        .default_value("heap")
                        .possible_values(Merge::possible_values()),
                )
                .arg(
                    clap::Arg::new("threads")
                        .short('t')
                        .long("threads")
                        .help("number of threads to use for parallel chunk sorting")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("chunk_dir")
                        .short('d')
                        .long("chunk-dir")
                        .help("directory to be used to store chunk files (default: next to the input file)")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("chunk_size")
                        .short('c')
                        .long("chunk-size")
                        .help("chunk size")
                        .takes_value(true)
                        .default_value("50MiB")
                        .validator(byte_size_validator),
                )
                .arg(
                    clap::Arg::new("memory")
                        .long("memory")
                        .help("total memory of merge read buffers")
                        .takes_value(true)
                        .default_value("500MB")
                        .validator(byte_size_validator),
                )
                .arg(
                    clap::Arg::new("record_size")
                        .long("record-size")
                        .help("estimated record size in bytes")
                        .takes_value(true)
                        .default_value("100"),
                )
                .arg(
                    clap::Arg::new("estimated_records")
                        .long("estimated-records")
                        .help("estimated number of records, used for progress reporting")
                        .takes_value(true)
                        .default_value("10000000"),
                ),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
