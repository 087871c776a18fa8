// Checkout: item selection, live pricing and the one-shot booking submission

use crate::api::{ApiError, TravelApi};
use crate::auth::AuthSession;
use crate::catalog::{BookableKind, Booking, BookingItem};
use crate::forms::{PaymentMethod, TravelerForm, TravelerInfo, ValidationError};
use crate::pricing::{PriceBreakdown, PricingPolicy, TravelerCount};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("A booking is already being submitted")]
    InFlight,

    #[error("Booking {booking_id} has already been confirmed")]
    AlreadyConfirmed { booking_id: u64 },
}

impl CheckoutError {
    // Text for the "Booking Failed" notice
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "Failed to complete booking".to_string()
        } else {
            message
        }
    }
}

/// The item picked on a detail page, as saved for the checkout page:
/// `{"type": "package", "item": {"id": 3}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSelection {
    #[serde(rename = "type")]
    pub kind: BookableKind,
    pub item: SelectedItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: u64,
}

impl CheckoutSelection {
    pub fn new(kind: BookableKind, id: u64) -> Self {
        Self {
            kind,
            item: SelectedItem { id },
        }
    }
}

/// Body posted to `/bookings/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub booking_type: BookableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<u64>,
    pub total_amount: i64,
    pub number_of_travelers: u32,
    pub traveler_info: TravelerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub payment_method: PaymentMethod,
    pub travel_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    pub status: String,
    pub payment_status: String,
    #[serde(skip)]
    pub pricing: PriceBreakdown,
}

impl BookingRequest {
    pub fn build(
        item: &BookingItem,
        travelers: TravelerCount,
        form: &TravelerForm,
        policy: &PricingPolicy,
        user_id: Option<u64>,
        travel_date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let traveler_info = form.validate()?;
        let pricing = policy.quote(&item.unit_price, travelers)?;
        let id_for = |kind: BookableKind| (item.kind == kind).then_some(item.id);

        Ok(BookingRequest {
            booking_type: item.kind,
            package_id: id_for(BookableKind::Package),
            flight_id: id_for(BookableKind::Flight),
            hotel_id: id_for(BookableKind::Hotel),
            total_amount: pricing.total,
            number_of_travelers: travelers.get(),
            traveler_info,
            special_requests: form.special_requests(),
            payment_method: form.payment_method,
            travel_date,
            user_id,
            status: "confirmed".to_string(),
            payment_status: "completed".to_string(),
            pricing,
        })
    }
}

/// Acknowledged booking plus the route of its confirmation page.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub booking: Booking,
    pub route: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionState {
    Idle,
    Pending,
    Confirmed(u64),
}

// Held for the duration of a request; a submission that never finishes (dropped or failed)
// puts the session back to idle
struct PendingGuard<'a> {
    state: &'a Mutex<SubmissionState>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if *state == SubmissionState::Pending {
            *state = SubmissionState::Idle;
        }
    }
}

pub struct CheckoutSession<A: TravelApi + ?Sized> {
    api: Arc<A>,
    auth: AuthSession,
    policy: PricingPolicy,
    item: BookingItem,
    travelers: TravelerCount,
    state: Mutex<SubmissionState>,
}

impl<A: TravelApi + ?Sized> CheckoutSession<A> {
    pub fn new(api: Arc<A>, auth: AuthSession, policy: PricingPolicy, item: BookingItem) -> Self {
        Self {
            api,
            auth,
            policy,
            item,
            travelers: TravelerCount::default(),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    // Loads the selected item, or the demo item when checkout was opened without one
    pub async fn open(
        api: Arc<A>,
        auth: AuthSession,
        policy: PricingPolicy,
        selection: Option<CheckoutSelection>,
    ) -> Result<Self, ApiError> {
        let item = match selection {
            Some(selection) => {
                api.get_booking_item(selection.kind, selection.item.id)
                    .await?
            }
            None => BookingItem::fallback(),
        };
        Ok(Self::new(api, auth, policy, item))
    }

    pub fn item(&self) -> &BookingItem {
        &self.item
    }

    pub fn travelers(&self) -> TravelerCount {
        self.travelers
    }

    pub fn set_travelers(&mut self, count: u32) -> Result<(), ValidationError> {
        self.travelers = TravelerCount::new(count)?;
        Ok(())
    }

    // Recomputed on every call so the summary follows the traveler selector
    pub fn quote(&self) -> Result<PriceBreakdown, ValidationError> {
        self.policy.quote(&self.item.unit_price, self.travelers)
    }

    pub fn is_pending(&self) -> bool {
        *self.state.lock() == SubmissionState::Pending
    }

    pub fn confirmed_booking(&self) -> Option<u64> {
        match *self.state.lock() {
            SubmissionState::Confirmed(id) => Some(id),
            _ => None,
        }
    }

    /// Validates the form and sends exactly one booking request.
    ///
    /// Validation failures send nothing. A second call while the first is in flight, or
    /// after it was acknowledged, is rejected without a request. A failed request returns
    /// the session to idle so the user can try again.
    pub async fn submit(&self, form: &TravelerForm) -> Result<Confirmation, CheckoutError> {
        let user_id = self.auth.current_user().map(|user| user.id);
        let request = BookingRequest::build(
            &self.item,
            self.travelers,
            form,
            &self.policy,
            user_id,
            Utc::now(),
        )?;

        let _pending = {
            let mut state = self.state.lock();
            match *state {
                SubmissionState::Pending => return Err(CheckoutError::InFlight),
                SubmissionState::Confirmed(booking_id) => {
                    return Err(CheckoutError::AlreadyConfirmed { booking_id })
                }
                SubmissionState::Idle => *state = SubmissionState::Pending,
            }
            PendingGuard { state: &self.state }
        };

        info!(
            kind = %self.item.kind,
            item_id = self.item.id,
            travelers = self.travelers.get(),
            total = request.total_amount,
            "submitting booking"
        );

        match self.api.create_booking(&request).await {
            Ok(booking) => {
                *self.state.lock() = SubmissionState::Confirmed(booking.id);
                info!(booking_id = booking.id, "booking confirmed");
                Ok(Confirmation {
                    route: booking.confirmation_route(),
                    booking,
                })
            }
            Err(e) => {
                warn!(error = %e, "booking failed");
                Err(CheckoutError::Api(e))
            }
        }
    }
}
