//! Plain text views of snapshots, change lists and history for the terminal.

use crate::catalog::{store_label, OptionCatalog};
use crate::diff::ChangeEvent;
use crate::history::HistoryEntry;
use crate::snapshot::{OrderSnapshot, SnapshotEntry};
use crate::storage::FileStatus;
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use tesla_api::endpoints::tasks::{FinalPaymentData, RegistrationOrderDetails, Scheduling};

const NA: &str = "N/A";
const RULE_WIDTH: usize = 45;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Hide the reference number and VIN and cut timestamps to the date
    pub share: bool,
    /// Include financing information
    pub details: bool,
}

pub struct SnapshotReport<'a> {
    snapshot: &'a OrderSnapshot,
    catalog: &'a OptionCatalog,
    options: ReportOptions,
}

impl<'a> SnapshotReport<'a> {
    pub fn new(
        snapshot: &'a OrderSnapshot,
        catalog: &'a OptionCatalog,
        options: ReportOptions,
    ) -> Self {
        Self {
            snapshot,
            catalog,
            options,
        }
    }

    fn timestamp<'t>(&self, value: Option<&'t str>) -> &'t str {
        match value {
            Some(ts) if self.options.share => ts.split('T').next().unwrap_or(ts),
            Some(ts) => ts,
            None => NA,
        }
    }

    fn write_order(&self, f: &mut Formatter<'_>, entry: &SnapshotEntry) -> fmt::Result {
        let order = &entry.order;
        let tasks = entry.details.tasks.as_ref();
        let scheduling = tasks.and_then(|t| t.scheduling.as_ref());
        let registration = tasks.and_then(|t| t.registration.as_ref());
        let order_info = registration.and_then(|r| r.order_details.as_ref());
        let payment = tasks
            .and_then(|t| t.final_payment.as_ref())
            .and_then(|p| p.data.as_ref());

        let rule = "-".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "{:^width$}", "ORDER INFORMATION", width = RULE_WIDTH)?;
        writeln!(f, "{rule}")?;

        writeln!(f, "Order Details:")?;
        if !self.options.share {
            writeln!(f, "- Order ID: {}", order.reference_number)?;
        }
        writeln!(f, "- Status: {}", or_na(order.order_status.as_deref()))?;
        writeln!(f, "- Model: {}", or_na(order.model_code.as_deref()))?;
        if !self.options.share {
            writeln!(f, "- VIN: {}", or_na(order.vin.as_deref()))?;
        }

        let decoded = self
            .catalog
            .decode(order.mkt_options.as_deref().unwrap_or_default());
        if !decoded.is_empty() {
            writeln!(f, "\nConfiguration Options:")?;
            for (code, description) in decoded {
                writeln!(f, "- {code}: {description}")?;
            }
        }

        let expected_registration = registration.and_then(|r| r.expected_reg_date.as_deref());
        self.write_timeline(f, order_info, expected_registration, payment, scheduling)?;

        writeln!(f, "\nVehicle Status:")?;
        writeln!(
            f,
            "- Vehicle Odometer: {} {}",
            value_or_na(order_info.and_then(|o| o.vehicle_odometer.as_ref())),
            or_na(order_info.and_then(|o| o.vehicle_odometer_type.as_deref())),
        )?;

        writeln!(f, "\nDelivery Information:")?;
        let routing = order_info.and_then(|o| o.vehicle_routing_location.as_ref());
        writeln!(
            f,
            "- Routing Location: {} ({})",
            value_or_na(routing),
            store_label(order_info.and_then(RegistrationOrderDetails::routing_location_id)),
        )?;
        writeln!(
            f,
            "- Delivery Center: {}",
            or_na(scheduling.and_then(|s| s.delivery_address_title.as_deref()))
        )?;
        writeln!(
            f,
            "- Delivery Window: {}",
            or_na(scheduling.and_then(|s| s.delivery_window_display.as_deref()))
        )?;
        writeln!(
            f,
            "- ETA to Delivery Center: {}",
            or_na(payment.and_then(|p| p.eta_to_delivery_center.as_deref()))
        )?;
        writeln!(
            f,
            "- Delivery Appointment: {}",
            or_na(scheduling.and_then(|s| s.appt_date_time_address_str.as_deref()))
        )?;

        if self.options.details {
            write_financing(f, payment)?;
        }

        writeln!(f, "{rule}")
    }

    fn write_timeline(
        &self,
        f: &mut Formatter<'_>,
        order_info: Option<&RegistrationOrderDetails>,
        expected_registration: Option<&str>,
        payment: Option<&FinalPaymentData>,
        scheduling: Option<&Scheduling>,
    ) -> fmt::Result {
        writeln!(f, "\nOrder Timeline:")?;
        writeln!(
            f,
            "- Reservation Date: {}",
            self.timestamp(order_info.and_then(|o| o.reservation_date.as_deref()))
        )?;
        writeln!(
            f,
            "- Order Booked Date: {}",
            self.timestamp(order_info.and_then(|o| o.order_booked_date.as_deref()))
        )?;
        if let Some(date) = expected_registration {
            writeln!(f, "- Expected Registration Date: {}", self.timestamp(Some(date)))?;
        }
        if let Some(eta) = payment.and_then(|p| p.eta_to_delivery_center.as_deref()) {
            writeln!(f, "- ETA To Delivery Center: {}", self.timestamp(Some(eta)))?;
        }
        if let Some(date) = scheduling.and_then(|s| s.delivery_appointment_date.as_deref()) {
            writeln!(f, "- Delivery Appointment Date: {}", self.timestamp(Some(date)))?;
        }
        Ok(())
    }
}

impl Display for SnapshotReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.snapshot.is_empty() {
            return writeln!(f, "No orders found.");
        }
        for entry in self.snapshot.entries() {
            writeln!(f)?;
            self.write_order(f, entry)?;
        }
        Ok(())
    }
}

fn write_financing(f: &mut Formatter<'_>, payment: Option<&FinalPaymentData>) -> fmt::Result {
    writeln!(f, "\nFinancing Information:")?;
    let financing = payment.and_then(|p| p.financing_details.as_ref());
    let is_cash = financing.and_then(|d| d.order_type.as_deref()) == Some("CASH")
        || !payment
            .and_then(|p| p.financing_intent.as_ref())
            .is_some_and(truthy);

    if is_cash {
        writeln!(f, "- Payment Type: Cash")?;
        if let Some(first) = payment
            .and_then(|p| p.payment_details.as_ref())
            .and_then(|details| details.first())
        {
            writeln!(f, "- Amount Paid: {}", value_or_na(first.amount_paid.as_ref()))?;
            writeln!(f, "- Payment Method: {}", or_na(first.payment_type.as_deref()))?;
        }
        let balance = payment.and_then(|p| p.account_balance.as_ref());
        optional_line(f, "Account Balance", balance, "")?;
        optional_line(f, "Amount Due", payment.and_then(|p| p.amount_due.as_ref()), "")?;
        return Ok(());
    }

    let tesla = financing.and_then(|d| d.tesla_finance_details.as_ref());
    writeln!(
        f,
        "- Finance Product: {}",
        or_na(financing.and_then(|d| d.financial_product_type.as_deref()))
    )?;
    writeln!(
        f,
        "- Finance Partner: {}",
        or_na(tesla.and_then(|t| t.finance_partner_name.as_deref()))
    )?;
    optional_line(f, "Monthly Payment", tesla.and_then(|t| t.monthly_payment.as_ref()), "")?;
    optional_line(f, "Term (months)", tesla.and_then(|t| t.terms_in_months.as_ref()), "")?;
    optional_line(f, "Interest Rate", tesla.and_then(|t| t.interest_rate.as_ref()), " %")?;
    optional_line(f, "Range per Year", tesla.and_then(|t| t.mileage.as_ref()), "")?;
    let financed = payment.and_then(|p| p.amount_due_financier.as_ref());
    optional_line(f, "Financed Amount", financed, "")?;
    let approved = tesla.and_then(|t| t.approved_loan_amount.as_ref());
    optional_line(f, "Approved Amount", approved, "")
}

fn optional_line(
    f: &mut Formatter<'_>,
    label: &str,
    value: Option<&Value>,
    suffix: &str,
) -> fmt::Result {
    match value.filter(|v| !v.is_null()) {
        Some(value) => writeln!(f, "- {label}: {}{suffix}", plain(value)),
        None => Ok(()),
    }
}

/// Changes detected by the current refresh.
pub struct ChangesReport<'a>(pub &'a [ChangeEvent]);

impl Display for ChangesReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No changes since the last check.");
        }
        writeln!(f, "Changes since the last check:")?;
        for change in self.0 {
            writeln!(f, "{change}")?;
        }
        Ok(())
    }
}

/// Full change history; entries from `today` are marked.
pub struct HistoryReport<'a> {
    pub entries: &'a [HistoryEntry],
    pub today: NaiveDate,
}

impl Display for HistoryReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "No changes recorded yet.");
        }
        writeln!(f, "Change History:")?;
        for entry in self.entries {
            let marker = if entry.timestamp == self.today { "*" } else { " " };
            for change in &entry.changes {
                writeln!(f, "{marker} {}: {change}", entry.timestamp)?;
            }
        }
        Ok(())
    }
}

pub struct FilesReport<'a>(pub &'a [FileStatus]);

impl Display for FilesReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for status in self.0 {
            if status.exists {
                writeln!(f, "{} ({} bytes)", status.path.display(), status.size)?;
            } else {
                writeln!(f, "{} (missing)", status.path.display())?;
            }
        }
        Ok(())
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NA)
}

fn value_or_na(value: Option<&Value>) -> String {
    value
        .filter(|v| !v.is_null())
        .map(plain)
        .unwrap_or_else(|| NA.to_string())
}

/// Strings without their JSON quotes, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
