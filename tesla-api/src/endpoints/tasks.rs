use super::ReferenceNumber;
use crate::macros::setter;
use crate::{Endpoint, Host};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use tower_api_client::{Request, RequestData};

// Common

/// Task tree for one order. Every level keeps unknown fields in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub tasks: Option<Tasks>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderDetails {
    /// The gateway sometimes answers with an empty body or an empty `tasks`
    /// object; neither carries any order information.
    pub fn has_tasks(&self) -> bool {
        self.tasks.as_ref().is_some_and(|tasks| !tasks.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tasks {
    pub scheduling: Option<Scheduling>,
    pub registration: Option<Registration>,
    pub final_payment: Option<FinalPayment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tasks {
    pub fn is_empty(&self) -> bool {
        self.scheduling.is_none()
            && self.registration.is_none()
            && self.final_payment.is_none()
            && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    pub delivery_address_title: Option<String>,
    pub delivery_window_display: Option<String>,
    pub delivery_appointment_date: Option<String>,
    pub appt_date_time_address_str: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub expected_reg_date: Option<String>,
    pub order_details: Option<RegistrationOrderDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOrderDetails {
    pub reservation_date: Option<String>,
    pub order_booked_date: Option<String>,
    pub vehicle_odometer: Option<Value>,
    pub vehicle_odometer_type: Option<String>,
    pub vehicle_routing_location: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegistrationOrderDetails {
    /// Routing location id, sent either as a number or a numeric string.
    pub fn routing_location_id(&self) -> Option<u64> {
        match self.vehicle_routing_location.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalPayment {
    pub data: Option<FinalPaymentData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalPaymentData {
    pub eta_to_delivery_center: Option<String>,
    pub financing_intent: Option<Value>,
    pub financing_details: Option<FinancingDetails>,
    pub payment_details: Option<Vec<PaymentDetail>>,
    pub account_balance: Option<Value>,
    pub amount_due: Option<Value>,
    pub amount_due_financier: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingDetails {
    pub order_type: Option<String>,
    pub financial_product_type: Option<String>,
    pub tesla_finance_details: Option<TeslaFinanceDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeslaFinanceDetails {
    pub finance_partner_name: Option<String>,
    pub monthly_payment: Option<Value>,
    pub terms_in_months: Option<Value>,
    pub interest_rate: Option<Value>,
    pub mileage: Option<Value>,
    pub approved_loan_amount: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    pub amount_paid: Option<Value>,
    pub payment_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Requests

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderDetails {
    reference_number: ReferenceNumber,
    device_language: String,
    device_country: String,
    app_version: String,
}

impl GetOrderDetails {
    pub fn new(reference_number: ReferenceNumber) -> Self {
        Self {
            reference_number,
            device_language: "en".to_string(),
            device_country: "DE".to_string(),
            app_version: "9.99.9-9999".to_string(),
        }
    }

    setter!(device_language: String);
    setter!(device_country: String);
    setter!(app_version: String);
}

impl Request for GetOrderDetails {
    type Data = Self;
    type Response = OrderDetails;

    fn endpoint(&self) -> Cow<'_, str> {
        "/tasks".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Endpoint for GetOrderDetails {
    const HOST: Host = Host::Tasks;
}
