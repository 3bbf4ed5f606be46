//----------------------------------------------   Gateway webhooks  --------------------------------------------

use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use canchita_engine::{
    db_types::{GatewayPaymentStatus, PaymentConfirmation},
    AppliedEffect,
    MatchManagement,
    OrderFlowApi,
    PaymentOutcome,
    PaymentTracking,
};
use gateway_tools::{GatewayApi, PaymentInfo, WebhookNotification, WebhookPayload};
use log::{debug, info, trace, warn};

use crate::{data_objects::JsonResponse, errors::ServerError, route};

route!(gateway_webhook => Post "/webhook" impl PaymentTracking, MatchManagement);
/// Route handler for gateway payment notifications.
///
/// The gateway delivers two shapes: a payment event carrying the payment id directly, and a merchant
/// order event carrying a resource URL whose payments have to be fetched. Both funnel into the same
/// idempotent payment application, so duplicate and out-of-order deliveries are harmless. Responses
/// must stay in the 200 range, otherwise the gateway keeps retrying.
pub async fn gateway_webhook<B>(
    req: HttpRequest,
    body: web::Json<WebhookNotification>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<GatewayApi>,
) -> HttpResponse
where
    B: PaymentTracking + MatchManagement,
{
    trace!("🪝️ Received webhook request: {}", req.uri());
    let notification = body.into_inner();
    let result = match notification.payload() {
        None => {
            debug!("🪝️ Unrecognized notification shape. Acknowledging and ignoring.");
            JsonResponse::success("Notification ignored.")
        },
        Some(WebhookPayload::Payment { payment_id }) => match gateway.payment_info(&payment_id).await {
            Ok(info) => process_payment_info(info, &api).await,
            Err(e) => {
                warn!("🪝️ Could not fetch payment {payment_id} from the gateway. {e}");
                JsonResponse::failure("Could not fetch payment info.")
            },
        },
        Some(WebhookPayload::MerchantOrder { resource }) => match gateway.merchant_order(&resource).await {
            Ok(mo) => {
                let mut applied = 0;
                for payment in &mo.payments {
                    match gateway.payment_info(&payment.id.to_string()).await {
                        Ok(info) => {
                            process_payment_info(info, &api).await;
                            applied += 1;
                        },
                        Err(e) => warn!("🪝️ Could not fetch payment {} for merchant order {}. {e}", payment.id, mo.id),
                    }
                }
                JsonResponse::success(format!("{applied} payments processed for merchant order {}.", mo.id))
            },
            Err(e) => {
                warn!("🪝️ Could not fetch merchant order at {resource}. {e}");
                JsonResponse::failure("Could not fetch merchant order.")
            },
        },
    };
    HttpResponse::Ok().json(result)
}

route!(confirm_payment => Get "/payments/{payment_id}/confirm" impl PaymentTracking, MatchManagement);
/// Client polling path. Fetches the payment state from the gateway and funnels it into the same
/// idempotent application the webhooks use, so whichever path observes the approval first wins and the
/// other becomes a no-op.
pub async fn confirm_payment<B>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<GatewayApi>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentTracking + MatchManagement,
{
    let payment_id = path.into_inner();
    debug!("💳️ GET confirm payment {payment_id}");
    let info = gateway.payment_info(&payment_id).await?;
    let result = process_payment_info(info, &api).await;
    Ok(HttpResponse::Ok().json(result))
}

/// Normalise one gateway payment record and apply it to its order.
///
/// If the record carries our order id as external reference, the payment id is attached to the order
/// first, so that first-contact webhooks can find the order they belong to.
pub(crate) async fn process_payment_info<B>(info: PaymentInfo, api: &OrderFlowApi<B>) -> JsonResponse
where B: PaymentTracking + MatchManagement {
    let payment_id = info.payment_id();
    let status = match GatewayPaymentStatus::from_str(&info.status) {
        Ok(status) => status,
        Err(e) => {
            info!("🪝️ Payment {payment_id} has an unrecognized status '{}'. Ignoring. {e}", info.status);
            return JsonResponse::failure(format!("Unrecognized payment status: {}", info.status));
        },
    };
    if let Some(reference) = info.external_reference.as_deref() {
        match reference.parse::<i64>() {
            Ok(order_id) => {
                if let Err(e) = api.attach_payment_id(order_id, &payment_id).await {
                    warn!("🪝️ Could not attach payment {payment_id} to order {order_id}. {e}");
                }
            },
            Err(_) => debug!("🪝️ Payment {payment_id} carries a foreign external reference '{reference}'."),
        }
    }
    let confirmation =
        PaymentConfirmation { payment_id: payment_id.clone(), status, amount: info.transaction_amount, raw: info.raw };
    match api.apply_payment(confirmation).await {
        Ok(PaymentOutcome::Applied(effect)) => {
            info!("🪝️ Payment {payment_id} applied. {}", effect_summary(&effect));
            JsonResponse::success(effect_summary(&effect))
        },
        Ok(PaymentOutcome::AlreadyApplied(effect)) => {
            info!("🪝️ Payment {payment_id} was already applied.");
            JsonResponse::success(format!("Already applied. {}", effect_summary(&effect)))
        },
        Ok(PaymentOutcome::NotYetApproved(observed)) => {
            debug!("🪝️ Payment {payment_id} is not approved yet ({observed}).");
            JsonResponse::failure(format!("Payment not approved yet: {observed}"))
        },
        Ok(PaymentOutcome::UnknownPayment) => {
            warn!("🪝️ No order references payment {payment_id}.");
            JsonResponse::failure("No order references this payment.")
        },
        Err(e) => {
            warn!("🪝️ Could not apply payment {payment_id}. {e}");
            JsonResponse::failure("Could not apply payment.")
        },
    }
}

fn effect_summary(effect: &AppliedEffect) -> String {
    match effect {
        AppliedEffect::MatchJoined { order, seat: Some(seat) } => {
            format!("Order #{} seated player {} in match {}.", order.id, seat.player_id, seat.match_id)
        },
        AppliedEffect::MatchJoined { order, seat: None } => {
            format!("Order #{} completed; the seat is claimed separately.", order.id)
        },
        AppliedEffect::BonoGranted { order, bono } => {
            format!("Order #{} granted bono {} ({} entries).", order.id, bono.id, bono.matches_remaining)
        },
        AppliedEffect::WalletCredited { order, entry } => {
            format!("Order #{} credited {} to the wallet.", order.id, entry.amount)
        },
        AppliedEffect::SeatUnavailable { order, refund } => {
            format!("Order #{} completed but the seat was gone; {} parked on the wallet.", order.id, refund.amount)
        },
    }
}
