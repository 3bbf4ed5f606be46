//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls, gateway
//! calls) must be awaited rather than blocked on.

use actix_web::{get, web, HttpResponse, Responder};
use canchita_engine::{
    db_types::NewOrder,
    JoinOutcome,
    LeaveOutcome,
    MatchFlowApi,
    MatchManagement,
    OrderFlowApi,
    PaymentTracking,
    RatingApi,
    RatingManagement,
    RatingSubmitOutcome,
    WalletApi,
    WalletManagement,
};
use chrono::Utc;
use gateway_tools::{CheckoutItem, GatewayApi, NewPreference};
use log::*;
use serde_json::json;

use crate::{
    data_objects::{
        BatchResponse,
        BonoJoinRequest,
        CheckoutResponse,
        JoinRequest,
        JsonResponse,
        LeaveRequest,
        MatchBatchRequest,
        NewOrderRequest,
        PaidJoinRequest,
        RatingSubmission,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $bound:path $(, $bounds:path)*) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $bound $(+ $bounds)* + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Matches  ----------------------------------------------------

route!(create_match_batch => Post "/matches/batch" impl MatchManagement);
/// Route handler for batch match creation
///
/// Expands the requested weekdays and time slots in the target week into concrete match slots. Occupied
/// slots are reported as skipped; a malformed request aborts before any slot is created.
pub async fn create_match_batch<B: MatchManagement>(
    body: web::Json<MatchBatchRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let template = body.into_inner().into_template()?;
    debug!("🏟️ POST batch creation for field {}", template.field_id);
    let today = Utc::now().date_naive();
    let report = api.create_match_batch(template, today).await?;
    Ok(HttpResponse::Ok().json(BatchResponse::from(report)))
}

route!(match_roster => Get "/matches/{id}" impl MatchManagement);
pub async fn match_roster<B: MatchManagement>(
    path: web::Path<i64>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    debug!("🏟️ GET roster for match {match_id}");
    let roster = api.roster(match_id).await?;
    Ok(HttpResponse::Ok().json(roster))
}

route!(join_match => Post "/matches/{id}/join" impl MatchManagement);
pub async fn join_match<B: MatchManagement>(
    path: web::Path<i64>,
    body: web::Json<JoinRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    let req = body.into_inner();
    debug!("🏟️ POST join match {match_id} for user {}", req.user_id);
    let outcome = api.join_match(match_id, req.team_id, req.user_id).await?;
    Ok(join_response(outcome))
}

route!(paid_join => Post "/matches/{id}/paid_join" impl MatchManagement);
/// Claim a seat backed by an already-completed order. Safe to repeat: if the webhook seated the player
/// first, the existing seat is returned.
pub async fn paid_join<B: MatchManagement>(
    path: web::Path<i64>,
    body: web::Json<PaidJoinRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    let req = body.into_inner();
    debug!("🏟️ POST paid join for match {match_id}, user {}, payment {}", req.user_id, req.payment_id);
    let outcome = api.paid_join(match_id, req.team_id, req.user_id, &req.payment_id).await?;
    Ok(join_response(outcome))
}

route!(bono_join => Post "/matches/{id}/bono_join" impl MatchManagement);
pub async fn bono_join<B: MatchManagement>(
    path: web::Path<i64>,
    body: web::Json<BonoJoinRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    let req = body.into_inner();
    debug!("🏟️ POST bono join for match {match_id}, user {}, bono {}", req.user_id, req.bono_id);
    let outcome = api.bono_join(match_id, req.team_id, req.user_id, req.bono_id, Utc::now()).await?;
    Ok(join_response(outcome))
}

route!(leave_match => Post "/matches/{id}/leave" impl MatchManagement);
pub async fn leave_match<B: MatchManagement>(
    path: web::Path<i64>,
    body: web::Json<LeaveRequest>,
    api: web::Data<MatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let match_id = path.into_inner();
    let req = body.into_inner();
    debug!("🏟️ POST leave match {match_id} for user {}", req.user_id);
    match api.leave_match(match_id, req.user_id).await? {
        LeaveOutcome::Left => Ok(HttpResponse::Ok().json(JsonResponse::success("Seat released."))),
        LeaveOutcome::NotJoined => {
            Ok(HttpResponse::NotFound().json(JsonResponse::failure("User is not on this match's roster.")))
        },
    }
}

fn join_response(outcome: JoinOutcome) -> HttpResponse {
    match outcome {
        JoinOutcome::Joined(seat) => HttpResponse::Ok().json(seat),
        JoinOutcome::MatchNotOpen => HttpResponse::Conflict().json(JsonResponse::failure("Match is not open.")),
        JoinOutcome::MatchFull => HttpResponse::Conflict().json(JsonResponse::failure("Match is full.")),
        JoinOutcome::TeamFull => HttpResponse::Conflict().json(JsonResponse::failure("Team is full.")),
        JoinOutcome::AlreadyJoined => {
            HttpResponse::Conflict().json(JsonResponse::failure("User already joined this match."))
        },
        JoinOutcome::TeamMismatch => {
            HttpResponse::BadRequest().json(JsonResponse::failure("Team does not belong to this match."))
        },
        JoinOutcome::PaymentNotVerified => HttpResponse::PaymentRequired()
            .json(JsonResponse::failure("No completed order exists for this payment reference.")),
        JoinOutcome::BonoExpired => {
            HttpResponse::PaymentRequired().json(JsonResponse::failure("The bono pack has expired."))
        },
        JoinOutcome::BonoExhausted => {
            HttpResponse::PaymentRequired().json(JsonResponse::failure("The bono pack has no entries left."))
        },
    }
}

//----------------------------------------------   Checkout  ----------------------------------------------------

route!(checkout => Post "/orders" impl PaymentTracking, MatchManagement);
/// Create a pending order and a matching checkout preference at the gateway.
///
/// The order id travels to the gateway as the preference's external reference, which is how webhook
/// notifications find their way back to the order.
pub async fn checkout<B>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<GatewayApi>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentTracking + MatchManagement,
{
    let req = body.into_inner();
    debug!("💳️ POST new order for user {} ({})", req.user_id, req.total);
    let order = api.create_order(NewOrder::new(req.user_id, req.total, req.purpose.clone())).await?;
    let item = CheckoutItem::new(order_item_title(&req), 1, req.total);
    let preference = NewPreference::new(
        vec![item],
        order.id.to_string(),
        gateway.config().notification_url.clone(),
    );
    let preference = gateway.create_preference(preference).await?;
    info!("💳️ Order #{} has checkout preference {}", order.id, preference.id);
    let response = CheckoutResponse { order_id: order.id, preference_id: preference.id, init_point: preference.init_point };
    Ok(HttpResponse::Ok().json(response))
}

fn order_item_title(req: &NewOrderRequest) -> String {
    use canchita_engine::db_types::PaymentPurpose::*;
    match &req.purpose {
        MatchJoin { match_id, .. } => format!("Match entry #{match_id}"),
        BonoPurchase { bono_type, entries, .. } => format!("Bono {bono_type} x{entries}"),
        WalletTopUp => "Wallet top-up".to_string(),
    }
}

route!(orders_for_user => Get "/orders/user/{id}" impl PaymentTracking, MatchManagement);
pub async fn orders_for_user<B>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentTracking + MatchManagement,
{
    let user_id = path.into_inner();
    debug!("💳️ GET orders for user {user_id}");
    let orders = api.orders_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Wallet  ----------------------------------------------------

route!(wallet_balance => Get "/wallet/{user_id}" impl WalletManagement);
pub async fn wallet_balance<B: WalletManagement>(
    path: web::Path<i64>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💰️ GET balance for user {user_id}");
    let balance = api.balance(user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "balance": balance })))
}

route!(wallet_history => Get "/wallet/{user_id}/history" impl WalletManagement);
pub async fn wallet_history<B: WalletManagement>(
    path: web::Path<i64>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💰️ GET ledger history for user {user_id}");
    let history = api.history(user_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   Ratings  ----------------------------------------------------

route!(submit_ratings => Post "/matches/{id}/ratings" impl RatingManagement, MatchManagement);
/// Store one rater's batch of post-match ratings, including their MVP vote.
pub async fn submit_ratings<B>(
    path: web::Path<i64>,
    body: web::Json<RatingSubmission>,
    api: web::Data<RatingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: RatingManagement + MatchManagement,
{
    let match_id = path.into_inner();
    let req = body.into_inner();
    debug!("📊️ POST ratings for match {match_id} from rater {}", req.rater_id);
    let outcome = api.submit_ratings(match_id, req.rater_id, &req.entries, req.mvp_vote, Utc::now()).await?;
    let response = match outcome {
        RatingSubmitOutcome::Submitted { inserted } => {
            HttpResponse::Ok().json(json!({ "success": true, "inserted": inserted }))
        },
        RatingSubmitOutcome::AlreadyRated => {
            HttpResponse::Conflict().json(JsonResponse::failure("This rater already submitted a batch."))
        },
        RatingSubmitOutcome::NotParticipant => {
            HttpResponse::Forbidden().json(JsonResponse::failure("Only participants can rate this match."))
        },
        RatingSubmitOutcome::MatchNotFinished => {
            HttpResponse::Conflict().json(JsonResponse::failure("The match has not finished yet."))
        },
        RatingSubmitOutcome::MatchNotFound => {
            HttpResponse::NotFound().json(JsonResponse::failure("Match does not exist."))
        },
    };
    Ok(response)
}

route!(match_ratings => Get "/matches/{id}/ratings" impl RatingManagement, MatchManagement);
pub async fn match_ratings<B>(
    path: web::Path<i64>,
    api: web::Data<RatingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: RatingManagement + MatchManagement,
{
    let match_id = path.into_inner();
    debug!("📊️ GET ratings for match {match_id}");
    let ratings = api.ratings_for_match(match_id).await?;
    Ok(HttpResponse::Ok().json(ratings))
}

route!(user_stats => Get "/users/{id}/stats" impl RatingManagement, MatchManagement);
pub async fn user_stats<B>(
    path: web::Path<i64>,
    api: web::Data<RatingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: RatingManagement + MatchManagement,
{
    let user_id = path.into_inner();
    debug!("📊️ GET stats for user {user_id}");
    let stats = api.stats(user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}
