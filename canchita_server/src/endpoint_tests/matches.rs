use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use canchita_engine::{events::EventProducers, JoinOutcome, MatchFlowApi};
use serde_json::json;

use crate::{
    data_objects::JsonResponse,
    endpoint_tests::mocks::{sample_seat, MockBackend},
    routes::{JoinMatchRoute, MatchRosterRoute},
};

#[actix_web::test]
async fn roster_for_unknown_match_is_404() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_match().returning(|_| Ok(None));
    let api = MatchFlowApi::new(backend, EventProducers::default());
    let app =
        App::new().app_data(web::Data::new(api)).service(MatchRosterRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/matches/42").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn joining_a_full_match_is_a_409_not_an_error() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_join_match().returning(|_, _, _| Ok(JoinOutcome::MatchFull));
    let api = MatchFlowApi::new(backend, EventProducers::default());
    let app = App::new().app_data(web::Data::new(api)).service(JoinMatchRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/matches/42/join")
        .set_json(json!({ "team_id": 1, "user_id": 9 }))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(!body.success);
    assert_eq!(body.message, "Match is full.");
}

#[actix_web::test]
async fn a_successful_join_returns_the_seat() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_join_match().returning(|m, t, u| Ok(JoinOutcome::Joined(sample_seat(m, t, u))));
    // No producers are registered, so the joined hook does not touch the backend again
    let api = MatchFlowApi::new(backend, EventProducers::default());
    let app = App::new().app_data(web::Data::new(api)).service(JoinMatchRoute::<MockBackend>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/matches/42/join")
        .set_json(json!({ "team_id": 1, "user_id": 9 }))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["match_id"], 42);
    assert_eq!(body["team_id"], 1);
    assert_eq!(body["player_id"], 9);
}
