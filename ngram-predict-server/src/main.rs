use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use actix_cors::Cors;
use actix_web::{get, middleware, post, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use ngram_predict_core::cache::ModelCache;
use ngram_predict_core::io::{list_files, read_text};
use ngram_predict_core::model::multigram_model::{ModelStats, MultiGramModel};
use ngram_predict_core::model::prediction_input::{PredictionInput, DEFAULT_MAX_N, DEFAULT_TOP_K};
use ngram_predict_core::model::predictor::{Prediction, Predictor};
use ngram_predict_core::text::split_input;
use ngram_predict_core::ModelError;

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_CACHE_CAPACITY: usize = 8;
/// Highest order a training request may ask for.
const MAX_ORDER: usize = 10;

/// Server settings, read from `NGRAM_*` environment variables.
struct Config {
	bind: String,
	data_dir: PathBuf,
	cache_capacity: usize,
}

impl Config {
	fn from_env() -> Result<Self, String> {
		let cache_capacity = match env::var("NGRAM_CACHE_CAPACITY") {
			Ok(s) => s
				.parse::<usize>()
				.map_err(|_| format!("NGRAM_CACHE_CAPACITY must be an integer, got {s}"))?,
			Err(_) => DEFAULT_CACHE_CAPACITY,
		};

		Ok(Self {
			bind: env::var("NGRAM_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned()),
			data_dir: env::var("NGRAM_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
			cache_capacity,
		})
	}
}

/// Query parameters for `/v1/autocomplete` and `/v1/predict`
#[derive(Deserialize)]
struct PredictParams {
	text: Option<String>,
	top_k: Option<usize>,
}

/// Query parameters for `PUT /v1/train`
#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
	max_n: Option<usize>,
}

/// JSON body for `POST /v1/train`
#[derive(Serialize, Deserialize)]
struct TrainRequest {
	text: String,
	max_n: Option<usize>,
}

enum ServiceError {
	Model(ModelError),
	Lock,
}

impl From<ModelError> for ServiceError {
	fn from(e: ModelError) -> Self {
		ServiceError::Model(e)
	}
}

impl ServiceError {
	fn response(&self) -> HttpResponse {
		match self {
			ServiceError::Model(ModelError::InvalidArgument(message)) => HttpResponse::BadRequest().body(message.clone()),
			ServiceError::Model(ModelError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
				HttpResponse::NotFound().body("Corpus not found")
			}
			ServiceError::Model(e) => HttpResponse::InternalServerError().body(e.to_string()),
			ServiceError::Lock => HttpResponse::InternalServerError().body("Model lock failed"),
		}
	}
}

/// State shared by every worker.
///
/// `model` is an immutable snapshot: training builds a new family outside
/// the lock and only swaps the pointer, so queries never wait on a build.
struct SharedData {
	data_dir: PathBuf,
	model: RwLock<Option<Arc<MultiGramModel>>>,
	cache: Mutex<ModelCache>,
}

impl SharedData {
	fn new(data_dir: PathBuf, cache_capacity: usize) -> Result<Self, ModelError> {
		Ok(Self { data_dir, model: RwLock::new(None), cache: Mutex::new(ModelCache::new(cache_capacity)?) })
	}

	/// Builds (or fetches from the cache) the family for `text` and makes it current.
	fn train(&self, text: &str, max_n: usize) -> Result<ModelStats, ServiceError> {
		let model = {
			let mut cache = self.cache.lock().map_err(|_| ServiceError::Lock)?;
			cache.get_or_build(text, max_n)?
		};
		let stats = model.stats();

		let mut current = self.model.write().map_err(|_| ServiceError::Lock)?;
		*current = Some(model);
		info!("trained model: max_n={} tokens={}", stats.max_n, stats.token_count);
		Ok(stats)
	}

	/// Reads `<data_dir>/<name>.txt` and trains on it.
	fn train_corpus(&self, name: &str, max_n: usize) -> Result<ModelStats, ServiceError> {
		let text = read_text(self.data_dir.join(format!("{name}.txt")))?;
		self.train(&text, max_n)
	}

	fn current(&self) -> Result<Option<Arc<MultiGramModel>>, ServiceError> {
		let current = self.model.read().map_err(|_| ServiceError::Lock)?;
		Ok(current.clone())
	}
}

/// Runs a training job on the blocking thread pool.
async fn run_training<F>(job: F) -> HttpResponse
where
	F: FnOnce() -> Result<ModelStats, ServiceError> + Send + 'static,
{
	match web::block(job).await {
		Ok(Ok(stats)) => HttpResponse::Ok().json(stats),
		Ok(Err(e)) => e.response(),
		Err(e) => {
			warn!("training task failed: {e}");
			HttpResponse::InternalServerError().body("Training task failed")
		}
	}
}

/// Answers a query against the current snapshot.
fn run_query<F>(data: &SharedData, params: &PredictParams, query: F) -> HttpResponse
where
	F: Fn(&Predictor<'_>, &[String]) -> Prediction,
{
	let model = match data.current() {
		Ok(Some(model)) => model,
		Ok(None) => return HttpResponse::Conflict().body("no model trained"),
		Err(e) => return e.response(),
	};

	let input = match PredictionInput::new(model.max_n(), params.top_k.unwrap_or(DEFAULT_TOP_K)) {
		Ok(input) => input,
		Err(e) => return ServiceError::from(e).response(),
	};

	let words = split_input(params.text.as_deref().unwrap_or_default());
	let predictor = Predictor::new(&model, input);
	HttpResponse::Ok().json(query(&predictor, words.as_slice()))
}

/// HTTP GET endpoint `/v1/corpora`
///
/// Lists the `.txt` corpora available in the data directory, one per line.
#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<SharedData>) -> impl Responder {
	match list_files(&data.data_dir, "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

/// Resolves the requested order, rejecting values above `MAX_ORDER`.
///
/// The lower bound is left to the model builder.
fn training_order(max_n: Option<usize>) -> Result<usize, HttpResponse> {
	match max_n.unwrap_or(DEFAULT_MAX_N) {
		n if n > MAX_ORDER => Err(HttpResponse::BadRequest().body(format!("max_n must be <= {MAX_ORDER}, got {n}"))),
		n => Ok(n),
	}
}

/// HTTP PUT endpoint `/v1/train?name=..&max_n=..`
///
/// Trains on a corpus file of the data directory.
#[put("/v1/train")]
async fn put_train(data: web::Data<SharedData>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.starts_with('.') {
		return HttpResponse::BadRequest().body("Invalid corpus name");
	}

	let max_n = match training_order(query.max_n) {
		Ok(n) => n,
		Err(response) => return response,
	};
	run_training(move || data.train_corpus(&name, max_n)).await
}

/// HTTP POST endpoint `/v1/train`
///
/// Trains on the text of a JSON body `{ "text": "...", "max_n": 3 }`.
#[post("/v1/train")]
async fn post_train(data: web::Data<SharedData>, body: web::Json<TrainRequest>) -> impl Responder {
	let TrainRequest { text, max_n } = body.into_inner();
	if text.trim().is_empty() {
		return HttpResponse::BadRequest().body("training text cannot be empty");
	}

	let max_n = match training_order(max_n) {
		Ok(n) => n,
		Err(response) => return response,
	};
	run_training(move || data.train(&text, max_n)).await
}

/// HTTP GET endpoint `/v1/autocomplete?text=..&top_k=..`
#[get("/v1/autocomplete")]
async fn get_autocomplete(data: web::Data<SharedData>, query: web::Query<PredictParams>) -> impl Responder {
	run_query(&data, &query, |predictor, words| predictor.autocomplete(words))
}

/// HTTP GET endpoint `/v1/predict?text=..&top_k=..`
#[get("/v1/predict")]
async fn get_predict(data: web::Data<SharedData>, query: web::Query<PredictParams>) -> impl Responder {
	run_query(&data, &query, |predictor, words| predictor.predict_next(words))
}

/// HTTP GET endpoint `/v1/model`
///
/// Statistics of the current model.
#[get("/v1/model")]
async fn get_model(data: web::Data<SharedData>) -> impl Responder {
	match data.current() {
		Ok(Some(model)) => HttpResponse::Ok().json(model.stats()),
		Ok(None) => HttpResponse::Conflict().body("no model trained"),
		Err(e) => e.response(),
	}
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_corpora)
		.service(put_train)
		.service(post_train)
		.service(get_autocomplete)
		.service(get_predict)
		.service(get_model);
}

/// Main entry point for the server.
///
/// Starts with no model; clients train one through `/v1/train`.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	let shared_data = SharedData::new(config.data_dir.clone(), config.cache_capacity).map_err(io::Error::other)?;
	let shared_data = web::Data::new(shared_data);

	info!("serving on {} (data: {})", config.bind, config.data_dir.display());
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.wrap(middleware::Logger::default())
			.app_data(shared_data.clone())
			.configure(routes)
	})
		.bind(config.bind.as_str())?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use std::fs;

	const LAZY: &str = "The lazy dog the lazy cat\n the lazy dog";

	fn shared(data_dir: PathBuf) -> web::Data<SharedData> {
		web::Data::new(SharedData::new(data_dir, 4).unwrap())
	}

	#[actix_web::test]
	async fn queries_need_a_model() {
		let app = test::init_service(App::new().app_data(shared(PathBuf::from("."))).configure(routes)).await;

		for uri in ["/v1/predict?text=the+lazy", "/v1/autocomplete?text=the+l", "/v1/model"] {
			let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
			assert_eq!(resp.status(), StatusCode::CONFLICT, "{uri}");
		}
	}

	#[actix_web::test]
	async fn trains_then_answers() {
		let app = test::init_service(App::new().app_data(shared(PathBuf::from("."))).configure(routes)).await;

		let req = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(TrainRequest { text: LAZY.to_owned(), max_n: Some(3) })
			.to_request();
		let stats: ModelStats = test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats.max_n, 3);
		assert_eq!(stats.token_count, 9);

		let req = test::TestRequest::get().uri("/v1/predict?text=The+lazy").to_request();
		let prediction: Prediction = test::call_and_read_body_json(&app, req).await;
		let tokens: Vec<&str> = prediction.suggestions.iter().map(|s| s.token.as_str()).collect();
		assert_eq!(tokens, vec!["dog", "cat"]);
		assert_eq!(prediction.suggestions[0].percentage, 66.67);
		assert_eq!(prediction.source.map(|s| s.order), Some(3));

		let req = test::TestRequest::get().uri("/v1/autocomplete?text=the+lazy+c&top_k=1").to_request();
		let prediction: Prediction = test::call_and_read_body_json(&app, req).await;
		assert_eq!(prediction.suggestions.len(), 1);
		assert_eq!(prediction.suggestions[0].token, "cat");
		assert_eq!(prediction.suggestions[0].percentage, 33.33);

		let req = test::TestRequest::get().uri("/v1/autocomplete?text=dog").to_request();
		let prediction: Prediction = test::call_and_read_body_json(&app, req).await;
		assert!(prediction.suggestions.is_empty());
		assert!(prediction.explanation.contains("first word"));
	}

	#[actix_web::test]
	async fn rejects_bad_training_and_query_parameters() {
		let app = test::init_service(App::new().app_data(shared(PathBuf::from("."))).configure(routes)).await;

		let req = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(TrainRequest { text: "  \n ".to_owned(), max_n: None })
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(TrainRequest { text: LAZY.to_owned(), max_n: Some(1) })
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(TrainRequest { text: LAZY.to_owned(), max_n: Some(MAX_ORDER + 1) })
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		// rejected before the corpus is looked up
		let req = test::TestRequest::put().uri("/v1/train?name=lazy&max_n=1000000000").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(TrainRequest { text: LAZY.to_owned(), max_n: Some(MAX_ORDER) })
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::post()
			.uri("/v1/train")
			.set_json(TrainRequest { text: LAZY.to_owned(), max_n: None })
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/predict?text=the&top_k=0").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn trains_from_data_directory() {
		let dir = env::temp_dir().join(format!("ngram-predict-server-{}", std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		fs::write(dir.join("lazy.txt"), LAZY).unwrap();

		let app = test::init_service(App::new().app_data(shared(dir.clone())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/corpora").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, web::Bytes::from_static(b"lazy"));

		let req = test::TestRequest::put().uri("/v1/train?name=lazy&max_n=2").to_request();
		let stats: ModelStats = test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats.max_n, 2);

		let req = test::TestRequest::put().uri("/v1/train?name=missing").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

		let req = test::TestRequest::put().uri("/v1/train?name=..%2Fsecret").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/train").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		fs::remove_dir_all(dir).unwrap();
	}
}
