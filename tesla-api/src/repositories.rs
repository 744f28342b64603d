use crate::endpoints::{ReferenceNumber, orders::ListOrders, tasks::GetOrderDetails};
use crate::settings::ApiSettings;

#[derive(Default)]
pub struct OrderEndpoints {
    settings: ApiSettings,
}

impl OrderEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: &ApiSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    pub fn list(&self) -> ListOrders {
        ListOrders::new()
    }

    pub fn details(&self, reference_number: impl Into<ReferenceNumber>) -> GetOrderDetails {
        GetOrderDetails::new(reference_number.into())
            .device_language(self.settings.device_language.clone())
            .device_country(self.settings.device_country.clone())
            .app_version(self.settings.app_version.clone())
    }
}
