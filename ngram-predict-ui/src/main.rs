use std::env;
use std::time::Duration;

use eframe::{egui, Frame};
use egui::{Context, RichText};

use reqwest::blocking::Client;
use reqwest::Result;
use serde::Serialize;

use ngram_predict_core::io::read_text;
use ngram_predict_core::model::multigram_model::ModelStats;
use ngram_predict_core::model::predictor::Prediction;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

const DEFAULT_TRAINING_TEXT: &str = "the quick brown fox jumps over the lazy dog. \
the lazy dog sleeps all day. the lazy cat sleeps too. \
the quick cat jumps over the lazy dog.";

/// JSON body of `POST /v1/train`.
#[derive(Serialize)]
struct TrainRequest<'a> {
    text: &'a str,
    max_n: usize,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
    base_url: String,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(30, 0))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Sends a POST request to `/v1/train` with the training text.
    fn post_train(&self, text: &str, max_n: usize) -> Result<ModelStats> {
        self.client
            .post(format!("{}/v1/train", self.base_url))
            .json(&TrainRequest { text, max_n })
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a PUT request to `/v1/train` for a corpus of the server data directory.
    fn put_train(&self, name: &str, max_n: usize) -> Result<ModelStats> {
        self.client
            .put(format!("{}/v1/train", self.base_url))
            .query(&[("name", name.to_owned()), ("max_n", max_n.to_string())])
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a GET request to `/v1/corpora`.
    fn get_corpora(&self) -> Result<Vec<String>> {
        let response = self.client
            .get(format!("{}/v1/corpora", self.base_url))
            .send()?
            .error_for_status()?;

        Ok(response
            .text()?
            .lines()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Sends a GET request to `/v1/autocomplete` or `/v1/predict`.
    fn get_prediction(&self, endpoint: &str, text: &str) -> Result<Prediction> {
        self.client
            .get(format!("{}/v1/{}", self.base_url, endpoint))
            .query(&[("text", text)])
            .send()?
            .error_for_status()?
            .json()
    }
}

/// One line per suggestion, as shown in the result columns.
fn suggestion_lines(prediction: &Prediction) -> Vec<(String, String)> {
    prediction
        .suggestions
        .iter()
        .map(|s| (s.token.clone(), format!("({})", s.formatted_percentage())))
        .collect()
}

/// Global UI state (MUST persist between frames in egui).
struct PredictorUI {
    rest: RESTContext,
    status: Option<String>,

    training_text: String,
    max_n: usize,
    corpora: Vec<String>,
    selected_corpus: String,
    stats: Option<ModelStats>,

    user_input: String,
    autocomplete: Option<Prediction>,
    next_word: Option<Prediction>,
}

impl PredictorUI {
    /// Initializes the UI with sane defaults.
    fn new() -> Result<Self> {
        let base_url = env::var("NGRAM_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_owned());
        let mut ui = Self {
            rest: RESTContext::new(base_url)?,
            status: None,

            training_text: read_text("train.txt").unwrap_or_else(|_| DEFAULT_TRAINING_TEXT.to_owned()),
            max_n: 3,
            corpora: Vec::new(),
            selected_corpus: String::new(),
            stats: None,

            user_input: "the lazy".to_owned(),
            autocomplete: None,
            next_word: None,
        };
        ui.get_corpora();
        Ok(ui)
    }

    /// Performs the get corpora request.
    fn get_corpora(&mut self) {
        match self.rest.get_corpora() {
            Ok(corpora) => {
                if let Some(first) = corpora.first() {
                    self.selected_corpus = first.clone();
                }
                self.corpora = corpora;
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Trains on the text area content.
    fn train_text(&mut self) {
        if self.training_text.trim().is_empty() {
            self.status = Some("Training text cannot be empty.".to_owned());
            return;
        }
        let result = self.rest.post_train(&self.training_text, self.max_n);
        self.on_trained(result);
    }

    /// Trains on the selected server corpus.
    fn train_corpus(&mut self) {
        let result = self.rest.put_train(&self.selected_corpus, self.max_n);
        self.on_trained(result);
    }

    fn on_trained(&mut self, result: Result<ModelStats>) {
        match result {
            Ok(stats) => {
                self.status = Some(format!(
                    "Model trained on {} words (up to {}-grams).",
                    stats.token_count, stats.max_n
                ));
                self.stats = Some(stats);
                self.refresh();
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Re-runs both queries for the current input.
    fn refresh(&mut self) {
        if self.stats.is_none() || self.user_input.trim().is_empty() {
            self.autocomplete = None;
            self.next_word = None;
            return;
        }

        let autocomplete = self.rest.get_prediction("autocomplete", &self.user_input);
        let next_word = self.rest.get_prediction("predict", &self.user_input);
        match (autocomplete, next_word) {
            (Ok(autocomplete), Ok(next_word)) => {
                self.autocomplete = Some(autocomplete);
                self.next_word = Some(next_word);
            }
            (Err(e), _) | (_, Err(e)) => self.status = Some(format!("Error: {e}")),
        }
    }

    fn show_prediction(ui: &mut egui::Ui, title: &str, prediction: Option<&Prediction>) {
        ui.heading(title);
        let Some(prediction) = prediction else {
            ui.label("Train a model and type some text.");
            return;
        };

        ui.label(RichText::new(&prediction.explanation).italics());
        for (token, percentage) in suggestion_lines(prediction) {
            ui.horizontal(|ui| {
                ui.label(RichText::new(token).strong());
                ui.label(percentage);
            });
        }
    }
}

impl eframe::App for PredictorUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::SidePanel::left("model_configuration")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Model Configuration");
                ui.separator();

                ui.label("1. Enter training text");
                egui::ScrollArea::vertical().max_height(250.0).show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.training_text)
                            .desired_rows(12)
                            .desired_width(f32::INFINITY),
                    );
                });

                ui.add(egui::Slider::new(&mut self.max_n, 2..=5).text("Max n-gram size"));

                if ui.add_sized([200.0, 32.0], egui::Button::new("Train model")).clicked() {
                    self.train_text();
                }

                if !self.corpora.is_empty() {
                    ui.separator();
                    egui::ComboBox::from_label("Corpus")
                        .selected_text(self.selected_corpus.as_str())
                        .show_ui(ui, |ui| {
                            for corpus in &self.corpora {
                                ui.selectable_value(&mut self.selected_corpus, corpus.clone(), corpus);
                            }
                        });
                    if ui.button("Train on corpus").clicked() {
                        self.train_corpus();
                    }
                }

                ui.separator();
                if let Some(status) = &self.status {
                    ui.label(status.as_str());
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Get Predictions");
            ui.horizontal(|ui| {
                ui.label("Enter text here:");
                if ui.text_edit_singleline(&mut self.user_input).changed() {
                    self.refresh();
                }
            });

            if let Some(partial) = self.user_input.split_whitespace().last() {
                ui.label(format!("Completing the last word: `{}`", partial.to_lowercase()));
            }
            ui.separator();

            ui.columns(2, |columns| {
                Self::show_prediction(&mut columns[0], "Autocomplete Suggestions", self.autocomplete.as_ref());
                Self::show_prediction(&mut columns[1], "Next Word Predictions", self.next_word.as_ref());
            });
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 520.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "ngram-predict",
        options,
        Box::new(|_| Ok(Box::new(PredictorUI::new()?))),
    )
}
