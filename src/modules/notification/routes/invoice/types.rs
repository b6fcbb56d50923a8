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
        pub total_amount: Option<f64>,
    }
}
