use actix_web::error::{InternalError, UrlencodedError};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::rt::time::timeout;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::PredictError;
use crate::inference::InferenceAdapter;
use crate::models::{HealthResponse, PredictForm};
use crate::templates;

/// Per-app settings the handlers read.
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub inference_timeout: Duration,
}

pub async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(templates::home_page())
}

pub async fn predict(
    adapter: web::Data<InferenceAdapter>,
    limits: web::Data<RequestLimits>,
    form: web::Form<PredictForm>,
) -> Result<HttpResponse, PredictError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let message = form.into_inner().message;
    score(adapter, *limits.into_inner(), message)
        .instrument(span)
        .await
}

async fn score(
    adapter: web::Data<InferenceAdapter>,
    limits: RequestLimits,
    message: Option<String>,
) -> Result<HttpResponse, PredictError> {
    let message = message.ok_or(PredictError::MissingField("message"))?;

    // Vectorizing and scoring are CPU-bound; keep them off the async workers
    let adapter = adapter.into_inner();
    let text = message.clone();
    let job = web::block(move || adapter.predict(&text));

    let millis = limits.inference_timeout.as_millis() as u64;
    let outcome = match timeout(limits.inference_timeout, job).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("blocking pool failed: {}", e);
            return Err(PredictError::inference(e.to_string()));
        }
        Err(_) => {
            warn!(timeout_ms = millis, "inference timed out");
            return Err(PredictError::Timeout(millis));
        }
    };

    let prediction = match outcome {
        Ok(p) => p,
        Err(e @ PredictError::Inference(_)) => {
            error!("{}", e);
            return Err(e);
        }
        Err(e) => {
            info!("rejected: {}", e);
            return Err(e);
        }
    };

    info!(
        label = prediction.label,
        probability = prediction.probability,
        chars = message.chars().count(),
        "prediction served"
    );

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(templates::result_page(&message, &prediction)))
}

pub async fn health(adapter: web::Data<InferenceAdapter>) -> HttpResponse {
    let models = adapter.models();
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        classes: models.classifier.classes().to_vec(),
        n_features: models.vectorizer.n_features(),
    })
}

/// Malformed form bodies become a 400 page instead of actix's plain-text default.
pub fn form_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    warn!("bad form body: {}", err);
    let status = match &err {
        UrlencodedError::Overflow { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    let response = HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(templates::error_page(status, &err.to_string()));
    InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server;
    use crate::store::{tests::write_spam_ham, ModelStore};
    use actix_web::{test, App};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state() -> (InferenceAdapter, RequestLimits) {
        let dir = TempDir::new().unwrap();
        let (v, c) = write_spam_ham(&dir);
        let models = ModelStore::load(&v, &c).unwrap();
        (
            InferenceAdapter::new(Arc::new(models), 1000),
            RequestLimits {
                inference_timeout: Duration::from_secs(5),
            },
        )
    }

    fn routes(
        adapter: InferenceAdapter,
        limits: RequestLimits,
    ) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg| server::configure(cfg, adapter, limits, 64 * 1024, &[])
    }

    async fn body_string(resp: actix_web::dev::ServiceResponse) -> String {
        let bytes = test::read_body(resp).await;
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[actix_rt::test]
    async fn home_renders_form() {
        let (adapter, limits) = state();
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains(r#"name="message""#));
    }

    #[actix_rt::test]
    async fn predict_renders_result() {
        let (adapter, limits) = state();
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("message", "free money now")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_string(resp).await;
        assert!(body.contains("free money now"));
        assert!(body.contains(r#"<strong id="prediction">1</strong>"#));
        assert!(body.contains(r#"<strong id="pred_prob">"#));
    }

    #[actix_rt::test]
    async fn missing_message_is_bad_request() {
        let (adapter, limits) = state();
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("text", "free money")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(resp).await.contains("message"));
    }

    #[actix_rt::test]
    async fn empty_message_is_bad_request() {
        let (adapter, limits) = state();
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("message", "   ")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn slow_inference_is_service_unavailable() {
        let (adapter, _) = state();
        let limits = RequestLimits {
            inference_timeout: Duration::from_nanos(1),
        };
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("message", "free money now")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_string(resp).await.contains("timed out"));
    }

    #[actix_rt::test]
    async fn wrong_content_type_is_bad_request() {
        let (adapter, limits) = state();
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .insert_header(ContentType::json())
            .set_payload(r#"{"message": "free money"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn health_reports_model_shape() {
        let (adapter, limits) = state();
        let app = test::init_service(App::new().configure(routes(adapter, limits))).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["classes"], serde_json::json!([0, 1]));
        assert_eq!(body["n_features"], 5);
    }
}
