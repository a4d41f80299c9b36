use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flate2::read::MultiGzDecoder;
use noodles::fasta;
use serde::Serialize;
use tracing::{info, span, warn, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};
use wide::i16x16;

use paraffine::aligner::cigar::Cigar;
use paraffine::aligner::config::{AlignmentConfig, AlignmentMethod, Band, GapCosts, OutputSelection, Parallelism};
use paraffine::aligner::score::ScoreType;
use paraffine::aligner::scoring::MatchMismatch;
use paraffine::aligner::simd::BatchAligner;
use paraffine::aligner::{AlignmentResult, PairwiseAligner};

/// The output formats supported by paraffine
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputType {
    /// Tab separated values, one alignment per line
    Tsv,

    /// One JSON object per alignment
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// What kind of alignment to perform
enum AlignmentSpan {
    /// Align both sequences end to end
    Global,

    /// Globally align the second sequence, allowing free gaps at both ends of the first
    SemiGlobal,

    /// Overhanging ends of either sequence are free
    Overlap,

    /// Align the best scoring pair of substrings
    Local,
}

impl From<AlignmentSpan> for AlignmentMethod {
    fn from(span: AlignmentSpan) -> Self {
        match span {
            AlignmentSpan::Global => AlignmentMethod::global(),
            AlignmentSpan::SemiGlobal => AlignmentMethod::semi_global(),
            AlignmentSpan::Overlap => AlignmentMethod::overlap(),
            AlignmentSpan::Local => AlignmentMethod::local(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<CliSubcommand>,
}

#[derive(Subcommand, Debug)]
enum CliSubcommand {
    /// Align the n-th sequence of the first file to the n-th sequence of the second file
    Align(AlignArgs),
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// First sequences of each pair in FASTA format, optionally gzipped.
    #[clap(help_heading = "Inputs")]
    sequences1: PathBuf,

    /// Second sequences of each pair in FASTA format, optionally gzipped.
    #[clap(help_heading = "Inputs")]
    sequences2: PathBuf,

    /// Number of worker threads. With a single thread, pairs are aligned on the main thread.
    #[arg(short = 'j', long, default_value = "1")]
    #[clap(help_heading = "Processing")]
    num_threads: usize,

    /// Align batches of pairs with SIMD vectors. Only scores and end positions are reported.
    /// Scores are 16 bit, so pairs that could exceed that range are rejected.
    #[arg(long)]
    #[clap(help_heading = "Processing")]
    vectorise: bool,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    output: Option<PathBuf>,

    /// Output file type.
    #[arg(value_enum, short = 'O', long, default_value = "tsv")]
    #[clap(help_heading = "Outputs")]
    output_type: OutputType,

    /// Only report scores and end positions, skipping the traceback.
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    score_only: bool,

    /// Distinguish sequence matches (=) from mismatches (X) in CIGAR strings.
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    extended_cigar: bool,

    /// Alignment span.
    #[arg(value_enum, short = 'm', long, default_value = "global")]
    #[clap(help_heading = "Alignment configuration")]
    alignment_span: AlignmentSpan,

    /// Score for matching bases
    #[arg(short = 'a', default_value = "2")]
    #[clap(help_heading = "Alignment configuration")]
    score_match: u32,

    /// Penalty for mismatching bases
    #[arg(short = 'n', default_value = "4")]
    #[clap(help_heading = "Alignment configuration")]
    cost_mismatch: u32,

    /// Penalty for opening a new gap, on top of the extension penalty. Use 0 for linear gap costs.
    #[arg(short = 'g', default_value = "6")]
    #[clap(help_heading = "Alignment configuration")]
    cost_gap_open: u32,

    /// Penalty for extending a gap
    #[arg(short = 'e', default_value = "2")]
    #[clap(help_heading = "Alignment configuration")]
    cost_gap_extend: u32,

    /// Lower diagonal of the band. Diagonal k holds the cells where the position in the first
    /// sequence minus the position in the second sequence equals k.
    #[arg(long, allow_hyphen_values = true, requires = "band_upper")]
    #[clap(help_heading = "Alignment configuration")]
    band_lower: Option<isize>,

    /// Upper diagonal of the band.
    #[arg(long, allow_hyphen_values = true, requires = "band_lower")]
    #[clap(help_heading = "Alignment configuration")]
    band_upper: Option<isize>,
}

struct SequenceRecord(String, Vec<u8>);

/// Build the stderr logger. `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log).init();
}

fn read_fasta(path: &Path) -> Result<Vec<SequenceRecord>> {
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");

    let file = File::open(path)
        .with_context(|| format!("Could not open {}", path.display()))?;

    let reader_inner: Box<dyn BufRead> = if is_gzipped {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut reader = fasta::io::Reader::new(reader_inner);
    let mut records = Vec::new();

    for record in reader.records() {
        let record = record
            .with_context(|| format!("Could not parse FASTA record from {}", path.display()))?;

        let name = String::from_utf8_lossy(record.name()).into_owned();
        records.push(SequenceRecord(name, record.sequence().as_ref().to_vec()));
    }

    Ok(records)
}

#[derive(Serialize)]
struct JsonRecord<'a, S> {
    sequence1: &'a str,
    sequence2: &'a str,

    #[serde(flatten)]
    result: &'a AlignmentResult<S>,

    #[serde(skip_serializing_if = "Option::is_none")]
    cigar: Option<String>,
}

struct ResultWriter<'a> {
    writer: Box<dyn Write>,
    output_type: OutputType,
    extended_cigar: bool,
    names: &'a [(String, String)],
}

impl ResultWriter<'_> {
    fn write<S>(&mut self, result: &AlignmentResult<S>) -> Result<()>
    where
        S: ScoreType + Serialize
    {
        let names = self.names;
        let (name1, name2) = result.sequence1_id
            .and_then(|id| names.get(id))
            .map(|(first, second)| (first.as_str(), second.as_str()))
            .unwrap_or(("*", "*"));

        let cigar = result.alignment.as_ref()
            .map(|alignment| Cigar::from_alignment(alignment, self.extended_cigar).to_string());

        match self.output_type {
            OutputType::Tsv => {
                let field = |value: Option<String>| value.unwrap_or_else(|| "*".to_string());

                writeln!(
                    self.writer,
                    "{name1}\t{name2}\t{}\t{}\t{}\t{}\t{}\t{}",
                    field(result.score.map(|s| s.to_string())),
                    field(result.sequence1_begin_position.map(|p| p.to_string())),
                    field(result.sequence1_end_position.map(|p| p.to_string())),
                    field(result.sequence2_begin_position.map(|p| p.to_string())),
                    field(result.sequence2_end_position.map(|p| p.to_string())),
                    field(cigar),
                )?;
            },
            OutputType::Json => {
                let record = JsonRecord { sequence1: name1, sequence2: name2, result, cigar };
                serde_json::to_writer(&mut self.writer, &record)?;
                writeln!(self.writer)?;
            }
        }

        Ok(())
    }
}

fn build_config(args: &AlignArgs) -> Result<AlignmentConfig> {
    let gap_costs = GapCosts::affine(-i64::from(args.cost_gap_open), -i64::from(args.cost_gap_extend));

    let parallelism = if args.num_threads > 1 {
        Parallelism::Parallel { threads: args.num_threads }
    } else {
        Parallelism::Sequential
    };

    let output = if args.score_only || args.vectorise {
        OutputSelection { score: true, end_position: true, sequence_ids: true, ..OutputSelection::default() }
    } else {
        OutputSelection::all()
    };

    let mut builder = AlignmentConfig::builder()
        .method(args.alignment_span.into())
        .gap_costs(gap_costs)
        .output(output)
        .parallelism(parallelism);

    if let (Some(lower), Some(upper)) = (args.band_lower, args.band_upper) {
        builder = builder.band(Band::new(lower, upper));
    }

    builder.build()
        .with_context(|| "Invalid alignment configuration.")
}

fn align_subcommand(args: &AlignArgs) -> Result<()> {
    let span = span!(Level::INFO, "align_subcommand");
    let _enter = span.enter();

    let config = build_config(args)?;

    let records1 = read_fasta(&args.sequences1)?;
    let records2 = read_fasta(&args.sequences2)?;
    if records1.len() != records2.len() {
        warn!(
            "Input files contain a different number of sequences ({} and {}), only the first {} pairs are aligned.",
            records1.len(), records2.len(), records1.len().min(records2.len())
        );
    }

    let (names, pairs): (Vec<_>, Vec<_>) = records1.into_iter()
        .zip(records2)
        .map(|(SequenceRecord(name1, seq1), SequenceRecord(name2, seq2))| ((name1, name2), (seq1, seq2)))
        .unzip();

    info!("Aligning {} sequence pairs...", pairs.len());

    let writer: Box<dyn Write> = if let Some(path) = &args.output {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?
        }

        let file = File::create(path)
            .with_context(|| format!("Could not create output file {}", path.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    let mut output = ResultWriter {
        writer,
        output_type: args.output_type,
        extended_cigar: args.extended_cigar,
        names: &names,
    };

    let match_score = i64::from(args.score_match);
    let mismatch_score = -i64::from(args.cost_mismatch);

    if args.vectorise {
        let scoring = MatchMismatch::<i16>::new(match_score, mismatch_score)?;
        let aligner = BatchAligner::<i16x16, _>::new(config, scoring)?;

        let (tx, rx) = crossbeam_channel::unbounded();
        aligner.align_all(pairs, move |result| {
            // The receiver lives until all pairs are aligned
            let _ = tx.send(result);
        })?;

        let mut results: Vec<AlignmentResult<i16>> = rx.into_iter().collect();
        results.sort_by_key(|result| result.sequence1_id);

        for result in &results {
            output.write(result)?;
        }
    } else {
        let scoring = MatchMismatch::<i32>::new(match_score, mismatch_score)?;
        let aligner = PairwiseAligner::<i32, _>::new(config, scoring)?;

        for result in aligner.align_ordered(pairs)? {
            output.write(&result?)?;
        }
    }

    output.writer.flush()?;
    info!("Done.");

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match &args.command {
        Some(CliSubcommand::Align(v)) => align_subcommand(v)?,
        None => anyhow::bail!("No subcommand given."),
    };

    Ok(())
}
