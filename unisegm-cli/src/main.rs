use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use unisegm::corpus::{format_segmentation, load_corpus, save_segmentations, write_segmentations};
use unisegm::get_version;
use unisegm::language_model::{ModelParams, WordLanguageModel};
use unisegm::segmenter::Segmenter;
use unisegm::trainer::Trainer;

#[derive(Debug, Args)]
#[clap(author,
    about = "Learn a segmentation of a corpus",
    version = get_version(),
)]
struct TrainArgs {
    #[arg(short, long, default_value = "100")]
    epochs: usize,

    /// Seed for reproducible runs; a random seed is used when omitted.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Also write the learned word model as JSON.
    #[arg(short, long)]
    model_file: Option<PathBuf>,

    /// Print the segmentations to stdout before and after training.
    #[arg(short, long)]
    print: bool,

    #[arg(long, default_value = "10.0")]
    alpha: f64,

    #[arg(long, default_value = "5")]
    max_len: usize,

    #[arg(long, default_value = "2.0")]
    mean_len: f64,

    corpus_file: PathBuf,
    result_file: PathBuf,
}

#[derive(Debug, Args)]
#[clap(author,
    about = "Segment sentences read from stdin with a learned model",
    version = get_version(),
)]
struct SegmentArgs {
    model_file: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Train(TrainArgs),
    Segment(SegmentArgs),
}

#[derive(Debug, Parser)]
#[clap(
    name = "unisegm",
    author,
    about = "Unsupervised word segmentation command line interface",
    version = get_version(),
)]
struct CommandArgs {
    #[clap(subcommand)]
    command: Commands,
}

fn train(args: TrainArgs) -> Result<(), Box<dyn Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        if r.load(Ordering::SeqCst) {
            r.store(false, Ordering::SeqCst);
        } else {
            std::process::exit(0);
        }
    })?;

    let params = ModelParams {
        alpha: args.alpha,
        max_len: args.max_len,
        mean_len: args.mean_len,
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let corpus = load_corpus(args.corpus_file.as_path())?;
    info!("loaded {} sentences from {}", corpus.len(), args.corpus_file.display());

    let mut trainer = Trainer::new(corpus, params, rng)?;
    trainer.initialize()?;
    if args.print {
        print_segmentations(trainer.segmentations())?;
    }
    trainer.train(args.epochs, &running)?;
    if args.print {
        print_segmentations(trainer.segmentations())?;
    }

    save_segmentations(args.result_file.as_path(), trainer.segmentations())?;
    if let Some(model_path) = &args.model_file {
        trainer.into_model().save(model_path.as_path())?;
    }

    println!("Training completed successfully.");
    Ok(())
}

fn print_segmentations(segmentations: &[Vec<String>]) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    writeln!(writer, "-------------------------------")?;
    write_segmentations(&mut writer, segmentations)?;
    writer.flush()?;
    Ok(())
}

fn segment(args: SegmentArgs) -> Result<(), Box<dyn Error>> {
    let model = WordLanguageModel::load(args.model_file.as_path())?;
    let segmenter = Segmenter::new(model);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let words = segmenter.segment(&line);
        writeln!(writer, "{}", format_segmentation(&words))?;
    }
    writer.flush()?;

    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = CommandArgs::parse();

    match args.command {
        Commands::Train(args) => train(args),
        Commands::Segment(args) => segment(args),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
