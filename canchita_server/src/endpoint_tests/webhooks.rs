use actix_web::{http::StatusCode, test, test::TestRequest, web, App, HttpResponse};
use canchita_engine::{events::EventProducers, OrderFlowApi};
use cnc_common::Secret;
use gateway_tools::{GatewayApi, GatewayConfig};
use serde_json::json;

use crate::{
    data_objects::JsonResponse,
    endpoint_tests::mocks::MockBackend,
    helpers::{calculate_hmac, WEBHOOK_HMAC_HEADER},
    middleware::HmacMiddlewareFactory,
    webhook_routes::GatewayWebhookRoute,
};

#[actix_web::test]
async fn unknown_notification_shapes_are_acknowledged_and_ignored() {
    let _ = env_logger::try_init().ok();
    // No expectations: an unrecognized shape must never reach the backend
    let backend = MockBackend::new();
    let api = OrderFlowApi::new(backend, EventProducers::default());
    let gateway = GatewayApi::new(GatewayConfig::default()).unwrap();
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway))
        .service(GatewayWebhookRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhook")
        .set_json(json!({ "topic": "chargebacks", "resource": "/v1/chargebacks/1166" }))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(body.success);
    assert_eq!(body.message, "Notification ignored.");
}

//----------------------------------------------   HMAC checks  -------------------------------------------------

const HMAC_KEY: &str = "s3cret";

async fn echo() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

fn signed_scope(enabled: bool) -> impl actix_web::dev::HttpServiceFactory {
    let factory = HmacMiddlewareFactory::new(WEBHOOK_HMAC_HEADER, Secret::new(HMAC_KEY.into()), enabled);
    web::scope("/gateway").wrap(factory).route("/webhook", web::post().to(echo))
}

#[actix_web::test]
async fn a_correctly_signed_webhook_passes_the_hmac_check() {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().service(signed_scope(true))).await;
    let payload = r#"{"type":"payment","data":{"id":"789"}}"#;
    let signature = calculate_hmac(HMAC_KEY, payload.as_bytes());
    let req = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header((WEBHOOK_HMAC_HEADER, signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload)
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn a_tampered_body_fails_the_hmac_check() {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().service(signed_scope(true))).await;
    let signature = calculate_hmac(HMAC_KEY, b"original body");
    let req = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header((WEBHOOK_HMAC_HEADER, signature))
        .set_payload("tampered body")
        .to_request();
    let err = test::try_call_service(&service, req).await.expect_err("the middleware should reject this");
    assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn a_missing_signature_header_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().service(signed_scope(true))).await;
    let req = TestRequest::post().uri("/gateway/webhook").set_payload("{}").to_request();
    let err = test::try_call_service(&service, req).await.expect_err("the middleware should reject this");
    assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn hmac_checks_can_be_disabled_for_local_development() {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().service(signed_scope(false))).await;
    let req = TestRequest::post().uri("/gateway/webhook").set_payload("{}").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}
