use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use ngram_predict_core::io::read_tokens;
use ngram_predict_core::model::multigram_model::{ModelStats, MultiGramModel};
use ngram_predict_core::model::prediction_input::{PredictionInput, DEFAULT_MAX_N, DEFAULT_TOP_K};
use ngram_predict_core::model::predictor::{Prediction, Predictor};
use ngram_predict_core::text::split_input;

#[derive(Parser, Debug)]
#[command(name = "ngram-predict")]
#[command(about = "N-gram word predictor and autocomplete")]
struct Args {
    /// Path to the training text file
    #[arg(short, long, default_value = "train.txt")]
    path: PathBuf,

    /// Highest n-gram order (3 for trigrams, at least 2)
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_N)]
    max_n: usize,

    /// Number of suggestions shown
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Build the model on every CPU core
    #[arg(long)]
    parallel: bool,
}

/// Formats one query result as printed to the console.
fn render(title: &str, prediction: &Prediction) -> String {
    let mut out = format!("{title}\n  {}\n", prediction.explanation);
    for suggestion in &prediction.suggestions {
        out.push_str(&format!("  → '{}' ({})\n", suggestion.token, suggestion.formatted_percentage()));
    }
    out
}

/// Formats the summary printed once the models are built.
fn render_stats(stats: &ModelStats) -> String {
    let mut out = format!("Models trained on {} words (up to {}-grams)\n", stats.token_count, stats.max_n);
    for (n, contexts) in &stats.contexts {
        out.push_str(&format!("  {n}-gram: {contexts} contexts\n"));
    }
    out
}

/// Runs both queries on one line of user input.
///
/// Returns `None` for a blank line.
fn answer(predictor: &Predictor<'_>, line: &str) -> Option<String> {
    let input_words = split_input(line);
    let partial = input_words.last()?;

    let mut out = render(&format!("Autocomplete '{partial}':"), &predictor.autocomplete(&input_words));
    out.push_str(&render(
        &format!("Next word after '{}':", input_words.join(" ")),
        &predictor.predict_next(&input_words),
    ));
    Some(out)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Validate before the (possibly long) build
    let input = PredictionInput::new(args.max_n, args.top_k)?;

    let tokens = read_tokens(&args.path)?;
    let models = if args.parallel {
        MultiGramModel::build_parallel(&tokens, input.max_n())?
    } else {
        MultiGramModel::build(&tokens, input.max_n())?
    };
    info!("models trained on {} words", models.token_count());
    print!("{}", render_stats(&models.stats()));

    let predictor = Predictor::new(&models, input);
    println!("Enter text to get autocomplete and next-word predictions ('exit' to quit).");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        match answer(&predictor, &line) {
            Some(out) => println!("{out}"),
            None => println!("Please enter some text."),
        }
    }

    Ok(())
}
