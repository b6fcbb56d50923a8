pub mod request {
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[validate(length(min = 1, message = "phoneNumber is required"))]
        pub phone_number: String,
        #[validate(length(min = 1, message = "customerName is required"))]
        pub customer_name: String,
        #[validate(length(min = 1, message = "orderNumber is required"))]
        pub order_number: String,
        pub bill_token: Option<String>,
        /// Echoed back in the response detail; the current message body does
        /// not mention the advance amount.
        pub advance_amount: Option<f64>,
    }
}
