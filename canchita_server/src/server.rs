use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use canchita_engine::{
    events::{EventHandlers, EventProducers},
    MatchFlowApi,
    OrderFlowApi,
    RatingApi,
    SqliteDatabase,
    WalletApi,
};
use gateway_tools::GatewayApi;
use log::info;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::WEBHOOK_HMAC_HEADER,
    integrations::push::{build_event_hooks, ExpoPushNotifier, NullNotifier},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        BonoJoinRoute,
        CheckoutRoute,
        CreateMatchBatchRoute,
        JoinMatchRoute,
        LeaveMatchRoute,
        MatchRatingsRoute,
        MatchRosterRoute,
        OrdersForUserRoute,
        PaidJoinRoute,
        SubmitRatingsRoute,
        UserStatsRoute,
        WalletBalanceRoute,
        WalletHistoryRoute,
    },
    sweep_worker::{start_cancellation_worker, start_reminder_worker},
    webhook_routes::{ConfirmPaymentRoute, GatewayWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let hooks = if config.push.enabled {
        build_event_hooks(ExpoPushNotifier::new(&config.push)?)
    } else {
        build_event_hooks(NullNotifier)
    };
    let handlers = EventHandlers::new(32, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Event handlers started");
    start_cancellation_worker(db.clone(), producers.clone(), config.sweep_interval);
    start_reminder_worker(db.clone(), producers.clone(), config.sweep_interval);
    let gateway = GatewayApi::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, producers, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    gateway: GatewayApi,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let matches_api = MatchFlowApi::new(db.clone(), producers.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let wallet_api = WalletApi::new(db.clone());
        let rating_api = RatingApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cnc::access_log"))
            .app_data(web::Data::new(matches_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(wallet_api))
            .app_data(web::Data::new(rating_api))
            .app_data(web::Data::new(gateway.clone()));
        let api_scope = web::scope("/api")
            .service(CreateMatchBatchRoute::<SqliteDatabase>::new())
            .service(SubmitRatingsRoute::<SqliteDatabase>::new())
            .service(MatchRatingsRoute::<SqliteDatabase>::new())
            .service(JoinMatchRoute::<SqliteDatabase>::new())
            .service(PaidJoinRoute::<SqliteDatabase>::new())
            .service(BonoJoinRoute::<SqliteDatabase>::new())
            .service(LeaveMatchRoute::<SqliteDatabase>::new())
            .service(MatchRosterRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(OrdersForUserRoute::<SqliteDatabase>::new())
            .service(WalletHistoryRoute::<SqliteDatabase>::new())
            .service(WalletBalanceRoute::<SqliteDatabase>::new())
            .service(UserStatsRoute::<SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new());
        // Webhook deliveries are authenticated by body signature, not by session
        let gateway_scope = web::scope("/gateway")
            .wrap(HmacMiddlewareFactory::new(
                WEBHOOK_HMAC_HEADER,
                config.gateway.webhook_secret.clone(),
                config.hmac_checks,
            ))
            .service(GatewayWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(gateway_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
