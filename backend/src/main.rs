//! Crop Yield Prediction - Backend Server
//!
//! Estimates crop production for Indian districts from a trained regression
//! model, live weather and soil metrics, and returns farming recommendations.

use axum::Router;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

pub use config::Config;

use config::LogFormat;
use external::{ArtifactStore, NominatimClient, OpenWeatherClient, StaticSoilSource};
use services::predictor::RegressionModel;
use services::{
    AdvisoryEngine, DistrictTable, EnvironmentProvider, GeoResolver, PredictionPipeline,
    YieldPredictor,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<PredictionPipeline>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::from_env());
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    init_tracing(config.logging.format);

    tracing::info!("Starting Crop Yield Prediction Server");
    tracing::info!("Environment: {}", config.environment);

    let pipeline = build_pipeline(&config).await?;

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        pipeline: Arc::new(pipeline),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cyp_server=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Load artifacts and wire up the inference pipeline.
///
/// Missing or invalid artifacts abort startup.
async fn build_pipeline(config: &Config) -> anyhow::Result<PredictionPipeline> {
    let download_client = external::http_client(
        Duration::from_secs(config.model.download_timeout_secs),
        &config.geocoding.user_agent,
    )?;
    tracing::info!("Loading model artifacts from {}", config.model.dir.display());
    let artifacts = ArtifactStore::new(config.model.clone(), download_client)
        .load()
        .await?;
    tracing::info!(
        trees = artifacts.model.n_estimators(),
        states = artifacts.encoders.class_count(shared::CategoricalField::State),
        crops = artifacts.encoders.class_count(shared::CategoricalField::Crop),
        "Model artifacts loaded"
    );

    let table = match &config.geocoding.district_table_path {
        Some(path) => DistrictTable::with_csv(path)?,
        None => DistrictTable::builtin(),
    };
    tracing::info!("District postal code table has {} entries", table.entry_count());

    let geocoding_client = external::http_client(
        Duration::from_secs(config.geocoding.timeout_secs),
        &config.geocoding.user_agent,
    )?;
    let geocoder = NominatimClient::new(
        geocoding_client,
        config.geocoding.base_url.clone(),
        config.geocoding.country.clone(),
    );
    let geo = GeoResolver::new(table, Arc::new(geocoder), config.geocoding.fallback());

    if config.weather.api_key.is_empty() {
        tracing::warn!("No weather API key configured; predictions will use fallback weather");
    }
    let weather_client = external::http_client(
        Duration::from_secs(config.weather.timeout_secs),
        &config.geocoding.user_agent,
    )?;
    let weather = OpenWeatherClient::with_base_url(
        weather_client,
        config.weather.api_key.clone(),
        config.weather.api_endpoint.clone(),
    );
    let environment = EnvironmentProvider::new(
        Arc::new(weather),
        Arc::new(StaticSoilSource::default()),
        Duration::from_secs(config.weather.timeout_secs),
        config.weather.max_retries,
    );

    let catalog = match &config.advisory.catalog_path {
        Some(path) => AdvisoryEngine::load_catalog(path)?,
        None => shared::MessageCatalog::default(),
    };
    let advisory = AdvisoryEngine::new(catalog, config.advisory.languages.clone());

    Ok(PredictionPipeline::new(
        Arc::new(artifacts.encoders),
        geo,
        environment,
        YieldPredictor::new(Arc::new(artifacts.model)),
        advisory,
    ))
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_routes())
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use services::environment::tests::{live_reading, MockWeather, WeatherBehavior};
    use services::geo::tests::MockGeocoder;
    use services::predictor::tests::stump_forest_json;
    use services::predictor::{ForestArtifact, RandomForestRegressor};
    use shared::{Coordinates, EncoderClasses, EncoderTable, Language, MessageCatalog};
    use tower::ServiceExt; // for oneshot

    fn test_app(weather: WeatherBehavior) -> Router {
        let encoders = EncoderTable::from_classes(EncoderClasses {
            state: vec!["Punjab".into()],
            district: vec!["Ludhiana".into(), "Patiala".into()],
            season: vec!["Kharif".into(), "Rabi".into()],
            crop: vec!["Rice".into(), "Wheat".into()],
        })
        .unwrap();
        let artifact: ForestArtifact = serde_json::from_str(&stump_forest_json()).unwrap();
        let model = RandomForestRegressor::from_artifact(artifact).unwrap();

        let geocoder = MockGeocoder::with("141001", Coordinates::new(30.9010, 75.8573));
        let pipeline = PredictionPipeline::new(
            Arc::new(encoders),
            GeoResolver::new(DistrictTable::builtin(), Arc::new(geocoder), Coordinates::delhi()),
            EnvironmentProvider::new(
                Arc::new(MockWeather::new(weather)),
                Arc::new(StaticSoilSource::default()),
                Duration::from_millis(50),
                0,
            ),
            YieldPredictor::new(Arc::new(model)),
            AdvisoryEngine::new(MessageCatalog::default(), vec![Language::English]),
        );

        create_app(AppState {
            config: Arc::new(Config::for_tests()),
            pipeline: Arc::new(pipeline),
        })
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn wheat_request(area: Value) -> String {
        json!({
            "state": "Punjab",
            "district": "Ludhiana",
            "season": "Kharif",
            "crop": "Wheat",
            "area": area
        })
        .to_string()
    }

    // =========================================================================
    // Health and metadata
    // =========================================================================

    #[tokio::test]
    async fn test_health_reports_model() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["environment"], "test");
        assert_eq!(body["model"]["trees"], 2);
        assert_eq!(body["model"]["features"], 11);
        assert_eq!(body["encoders"]["district"], 2);
    }

    #[tokio::test]
    async fn test_versioned_health_route() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_options_lists_labels() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(Request::builder().uri("/options").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_response(response).await;
        assert_eq!(body["crops"], json!(["Rice", "Wheat"]));
        assert_eq!(body["states"], json!(["Punjab"]));
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    #[tokio::test]
    async fn test_predict_success() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(post_json("/predict", wheat_request(json!(2.0))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["unit"], "tonnes");
        assert_eq!(body["predicted_production"], 10.0);
        assert_eq!(body["yield_per_hectare"], 5.0);
        assert_eq!(body["weather_data"]["temperature"], 31.0);
        assert_eq!(body["soil_data"]["ph"], 6.5);
        assert_eq!(body["location"]["method"], "postal_code");
        assert!(body["recommendations"].as_array().unwrap().is_empty());
        assert!(body["prediction_id"].is_string());
        assert!(body["generated_at"].is_string());
    }

    #[tokio::test]
    async fn test_predict_accepts_numeric_string_area() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(post_json("/api/v1/predict", wheat_request(json!("1.0"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["predicted_production"], 3.0);
        assert_eq!(body["yield_per_hectare"], 3.0);
    }

    #[tokio::test]
    async fn test_predict_weather_outage_still_succeeds() {
        let app = test_app(WeatherBehavior::NetworkError);
        let response = app
            .oneshot(post_json("/predict", wheat_request(json!(2.0))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["weather_data"]["temperature"], 25.0);
        assert_eq!(body["weather_data"]["source"], "fallback");
    }

    #[tokio::test]
    async fn test_predict_unknown_crop() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let body = json!({
            "state": "Punjab",
            "district": "Ludhiana",
            "season": "Kharif",
            "crop": "Banana",
            "area": 2.0
        });
        let response = app
            .oneshot(post_json("/predict", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNRECOGNIZED_LABEL");
        assert_eq!(body["field"], "crop");
        assert!(body["error"].as_str().unwrap().contains("Banana"));
    }

    #[tokio::test]
    async fn test_predict_rejects_non_positive_area() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(post_json("/predict", wheat_request(json!(0))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "area");
    }

    #[tokio::test]
    async fn test_predict_rejects_malformed_json() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let response = app
            .oneshot(post_json("/predict", "{\"state\": ".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_field() {
        let app = test_app(WeatherBehavior::Reading(live_reading()));
        let body = json!({ "state": "Punjab", "district": "Ludhiana", "area": 2.0 });
        let response = app
            .oneshot(post_json("/predict", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_response(response).await["code"], "INVALID_INPUT");
    }
}
